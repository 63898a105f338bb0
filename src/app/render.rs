use eframe::egui;

use crate::model::LngLat;

use super::geometry::MAX_MERCATOR_LAT_DEG;
use super::mapview::MapView;
use super::registry::OverlaySnapshot;

const GRATICULE_STEP_DEG: f64 = 30.0;
const FILL_ALPHA: u8 = 70;

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
}

/// Meridians and parallels every 30°, straight lines under Web Mercator.
/// The equator and prime meridian get a heavier stroke.
pub(super) fn draw_graticule(painter: &egui::Painter, rect: egui::Rect, map: &MapView) {
    let faint = egui::Stroke::new(0.5, egui::Color32::from_gray(70));
    let strong = egui::Stroke::new(1.0, egui::Color32::from_gray(110));

    let mut lng = -180.0;
    while lng <= 180.0 {
        let top = map.geo_to_screen(rect, LngLat::new(lng, MAX_MERCATOR_LAT_DEG));
        let bottom = map.geo_to_screen(rect, LngLat::new(lng, -MAX_MERCATOR_LAT_DEG));
        let stroke = if lng == 0.0 { strong } else { faint };
        painter.line_segment([top, bottom], stroke);
        lng += GRATICULE_STEP_DEG;
    }

    let mut lat = -60.0;
    while lat <= 60.0 {
        let left = map.geo_to_screen(rect, LngLat::new(-180.0, lat));
        let right = map.geo_to_screen(rect, LngLat::new(180.0, lat));
        let stroke = if lat == 0.0 { strong } else { faint };
        painter.line_segment([left, right], stroke);
        lat += GRATICULE_STEP_DEG;
    }

    // The Mercator world edge.
    for lat in [-MAX_MERCATOR_LAT_DEG, MAX_MERCATOR_LAT_DEG] {
        let left = map.geo_to_screen(rect, LngLat::new(-180.0, lat));
        let right = map.geo_to_screen(rect, LngLat::new(180.0, lat));
        painter.line_segment([left, right], faint);
    }
}

/// Draws the source boundaries faintly so a dragged copy can be compared
/// against where it came from.
pub(super) fn draw_boundaries(
    painter: &egui::Painter,
    rect: egui::Rect,
    map: &MapView,
    boundaries: &[crate::model::BoundaryFeature],
) {
    let stroke = egui::Stroke::new(0.6, egui::Color32::from_gray(95));
    for feature in boundaries {
        for ring in feature.geometry.rings() {
            if ring.len() < 3 {
                continue;
            }
            let pts: Vec<egui::Pos2> = ring.iter().map(|p| map.geo_to_screen(rect, *p)).collect();
            painter.add(egui::Shape::closed_line(pts, stroke));
        }
    }
}

pub(super) fn draw_overlay(
    painter: &egui::Painter,
    rect: egui::Rect,
    map: &MapView,
    snap: &OverlaySnapshot<'_>,
    is_selected: bool,
) {
    let fill = snap.color.with_alpha(FILL_ALPHA).to_color32();
    let stroke_width = if is_selected { 2.5 } else { 1.2 };
    let stroke = egui::Stroke::new(stroke_width, snap.color.to_color32());

    for ring in snap.current_geometry.rings() {
        if ring.len() < 3 {
            continue;
        }
        let pts: Vec<egui::Pos2> = ring.iter().map(|p| map.geo_to_screen(rect, *p)).collect();
        painter.add(egui::Shape::convex_polygon(pts.clone(), fill, egui::Stroke::NONE));
        painter.add(egui::Shape::closed_line(pts, stroke));
    }

    if let Ok(centroid) = super::geometry::centroid(&snap.current_geometry) {
        let pos = map.geo_to_screen(rect, centroid);
        let label = format!(
            "{} {:.0}%",
            snap.name,
            snap.mercator_scale_factor * 100.0
        );
        painter.text(
            pos,
            egui::Align2::CENTER_CENTER,
            label,
            egui::FontId::proportional(13.0),
            egui::Color32::WHITE,
        );
    }
}
