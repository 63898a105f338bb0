use eframe::egui;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use crate::model::{GeoError, LngLat};

use super::geometry::MAX_MERCATOR_LAT_DEG;

const TILE_SIZE: f64 = 256.0;
const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 12.0;

/// Web Mercator viewport: converts between screen pixels and geographic
/// coordinates and performs panning. Stateless with respect to overlays.
pub(super) struct MapView {
    center: LngLat,
    zoom: f64,
    default_panning: bool,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: LngLat::new(10.0, 30.0),
            zoom: 2.0,
            default_panning: true,
        }
    }
}

impl MapView {
    /// World coordinates in [0, 1]².
    fn project(p: LngLat) -> (f64, f64) {
        let x = (p.lng + 180.0) / 360.0;
        let lat = p
            .lat
            .clamp(-MAX_MERCATOR_LAT_DEG, MAX_MERCATOR_LAT_DEG)
            .to_radians();
        let y = 0.5 - (FRAC_PI_4 + lat * 0.5).tan().ln() / TAU;
        (x, y)
    }

    fn unproject(x: f64, y: f64) -> LngLat {
        let lng = x * 360.0 - 180.0;
        let lat = (2.0 * (PI * (1.0 - 2.0 * y)).exp().atan() - FRAC_PI_2).to_degrees();
        LngLat::new(lng, lat)
    }

    fn world_px(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom
    }

    pub fn geo_to_screen(&self, rect: egui::Rect, p: LngLat) -> egui::Pos2 {
        let (x, y) = Self::project(p);
        let (cx, cy) = Self::project(self.center);
        let s = self.world_px();
        egui::pos2(
            rect.center().x + ((x - cx) * s) as f32,
            rect.center().y + ((y - cy) * s) as f32,
        )
    }

    pub fn screen_to_geo(&self, rect: egui::Rect, pos: egui::Pos2) -> Result<LngLat, GeoError> {
        let (cx, cy) = Self::project(self.center);
        let s = self.world_px();
        let x = cx + (pos.x - rect.center().x) as f64 / s;
        let y = cy + (pos.y - rect.center().y) as f64 / s;
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Err(GeoError::OutOfProjectionRange);
        }
        Ok(Self::unproject(x, y))
    }

    /// Moves the viewport center by a screen-pixel delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        let (cx, cy) = Self::project(self.center);
        let s = self.world_px();
        let x = (cx + dx as f64 / s).clamp(0.0, 1.0);
        let y = (cy + dy as f64 / s).clamp(0.0, 1.0);
        self.center = Self::unproject(x, y);
    }

    pub fn zoom_about_screen_point(
        &mut self,
        rect: egui::Rect,
        screen_point: egui::Pos2,
        zoom_delta: f32,
    ) {
        let before = self.screen_to_geo(rect, screen_point);
        self.zoom = (self.zoom + (zoom_delta as f64).log2()).clamp(MIN_ZOOM, MAX_ZOOM);
        if let Ok(before) = before {
            let after = self.geo_to_screen(rect, before);
            self.pan_by(after.x - screen_point.x, after.y - screen_point.y);
        }
    }

    pub fn set_default_panning_enabled(&mut self, enabled: bool) {
        self.default_panning = enabled;
    }

    pub fn default_panning_enabled(&self) -> bool {
        self.default_panning
    }

    pub fn center_on(&mut self, p: LngLat) {
        let (x, y) = Self::project(p);
        self.center = Self::unproject(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn center_projects_to_screen_center() {
        let map = MapView::default();
        let p = map.geo_to_screen(rect(), LngLat::new(10.0, 30.0));
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn screen_geo_round_trip() {
        let map = MapView::default();
        let geo = map.screen_to_geo(rect(), egui::pos2(523.0, 214.0)).unwrap();
        let back = map.geo_to_screen(rect(), geo);
        assert!((back.x - 523.0).abs() < 1e-2);
        assert!((back.y - 214.0).abs() < 1e-2);
    }

    #[test]
    fn out_of_projection_domain_fails() {
        let mut map = MapView::default();
        map.center_on(LngLat::new(0.0, 84.0));
        // Far above the top of the Mercator world.
        let r = map.screen_to_geo(rect(), egui::pos2(400.0, -4000.0));
        assert_eq!(r, Err(GeoError::OutOfProjectionRange));
        assert!(map.screen_to_geo(rect(), egui::pos2(400.0, 300.0)).is_ok());
    }

    #[test]
    fn pan_by_shifts_view() {
        let mut map = MapView::default();
        let before = map.screen_to_geo(rect(), rect().center()).unwrap();
        map.pan_by(100.0, 0.0);
        let after = map.screen_to_geo(rect(), rect().center()).unwrap();
        assert!(after.lng > before.lng);
        assert!((after.lat - before.lat).abs() < 1e-9);
    }

    #[test]
    fn zoom_about_point_keeps_it_fixed() {
        let mut map = MapView::default();
        let anchor = egui::pos2(250.0, 420.0);
        let geo = map.screen_to_geo(rect(), anchor).unwrap();
        map.zoom_about_screen_point(rect(), anchor, 1.5);
        let back = map.geo_to_screen(rect(), geo);
        assert!((back.x - anchor.x).abs() < 0.5);
        assert!((back.y - anchor.y).abs() < 0.5);
    }
}
