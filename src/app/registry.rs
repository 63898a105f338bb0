use std::borrow::Cow;

use crate::model::{BoundaryFeature, GeoError, Geometry, LngLat, Rgba};

use super::gesture::GestureController;
use super::geometry;
use super::mapview::MapView;

const PALETTE: [Rgba; 8] = [
    Rgba::rgb(231, 111, 81),
    Rgba::rgb(42, 157, 143),
    Rgba::rgb(233, 196, 106),
    Rgba::rgb(69, 123, 157),
    Rgba::rgb(181, 101, 167),
    Rgba::rgb(94, 170, 73),
    Rgba::rgb(230, 57, 70),
    Rgba::rgb(96, 108, 212),
];

/// A draggable, rotatable copy of a boundary. The source geometry and its
/// centroid are set once at creation and never mutated; everything the user
/// sees is recomputed from them plus `offset`/`rotation_radians`.
pub(super) struct Overlay {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub country: String,
    pub area_km2: f64,
    pub color: Rgba,
    original_geometry: Geometry,
    original_centroid: LngLat,
    pub offset: LngLat,
    pub rotation_radians: f64,
    pub current_geometry: Geometry,
    pub current_centroid: LngLat,
    pub mercator_scale_factor: f64,
    pub edit_enabled: bool,
}

impl Overlay {
    pub fn original_centroid(&self) -> LngLat {
        self.original_centroid
    }

    /// Geometry for an arbitrary transform, recomputed from the original
    /// tree so repeated application accumulates no error.
    pub fn geometry_with(&self, offset: LngLat, rotation_radians: f64) -> Geometry {
        let center = self.original_centroid + offset;
        let moved = geometry::translate(&self.original_geometry, offset.lng, offset.lat);
        geometry::rotate(&moved, center, rotation_radians)
    }

    pub fn centroid_with(&self, offset: LngLat) -> LngLat {
        self.original_centroid + offset
    }

    pub fn scale_factor_with(&self, offset: LngLat) -> f64 {
        geometry::mercator_scale_factor(self.centroid_with(offset).lat)
            / geometry::mercator_scale_factor(self.original_centroid.lat)
    }

    fn recompute(&mut self) {
        self.current_centroid = self.centroid_with(self.offset);
        self.current_geometry = self.geometry_with(self.offset, self.rotation_radians);
        self.mercator_scale_factor = self.scale_factor_with(self.offset);
    }
}

/// Partial update covering exactly the transform-derived fields. The
/// original geometry and centroid have no representation here, so callers
/// cannot alter them.
#[derive(Default)]
pub(super) struct OverlayUpdate {
    pub offset: Option<LngLat>,
    pub rotation_radians: Option<f64>,
    pub current_geometry: Option<Geometry>,
    pub current_centroid: Option<LngLat>,
    pub mercator_scale_factor: Option<f64>,
}

/// Read-only view handed to the presentation layer.
pub(super) struct OverlaySnapshot<'a> {
    pub id: u64,
    pub name: &'a str,
    pub country: &'a str,
    pub area_km2: f64,
    pub color: Rgba,
    pub offset: LngLat,
    pub rotation_radians: f64,
    pub mercator_scale_factor: f64,
    pub current_geometry: Cow<'a, Geometry>,
}

pub(super) struct OverlayRegistry {
    overlays: Vec<Overlay>,
    selected: Option<u64>,
    next_id: u64,
    next_color: usize,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self {
            overlays: Vec::new(),
            selected: None,
            next_id: 1,
            next_color: 0,
        }
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn get(&self, id: u64) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Overlay> {
        self.overlays.iter_mut().find(|o| o.id == id)
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.selected
    }

    /// Creates an overlay from a boundary feature and selects it. Empty
    /// source geometry is rejected rather than stored.
    pub fn add_overlay(&mut self, feature: &BoundaryFeature) -> Result<u64, GeoError> {
        let original_centroid = geometry::centroid(&feature.geometry)?;
        let id = self.next_id;
        self.next_id += 1;
        let color = PALETTE[self.next_color % PALETTE.len()];
        self.next_color += 1;
        self.overlays.push(Overlay {
            id,
            name: feature.properties.name.clone(),
            code: feature.properties.code.clone(),
            country: feature.properties.country.clone(),
            area_km2: feature.properties.area_km2,
            color,
            original_geometry: feature.geometry.clone(),
            original_centroid,
            offset: LngLat::default(),
            rotation_radians: 0.0,
            current_geometry: feature.geometry.clone(),
            current_centroid: original_centroid,
            mercator_scale_factor: 1.0,
            edit_enabled: true,
        });
        self.selected = Some(id);
        tracing::info!(id, name = %feature.properties.name, "overlay added");
        Ok(id)
    }

    /// Removal releases any gesture lock on the same id in the same call,
    /// so no later move event can touch a removed overlay.
    pub fn remove_overlay(&mut self, id: u64, gesture: &mut GestureController, map: &mut MapView) {
        gesture.release_if(id, map);
        self.overlays.retain(|o| o.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        tracing::info!(id, "overlay removed");
    }

    pub fn clear_all(&mut self, gesture: &mut GestureController, map: &mut MapView) {
        gesture.cancel(map);
        self.overlays.clear();
        self.selected = None;
    }

    /// Merges transform-derived fields only.
    pub fn update_overlay(&mut self, id: u64, update: OverlayUpdate) {
        let Some(overlay) = self.get_mut(id) else {
            return;
        };
        if let Some(offset) = update.offset {
            overlay.offset = offset;
        }
        if let Some(rotation) = update.rotation_radians {
            overlay.rotation_radians = rotation;
        }
        if let Some(geometry) = update.current_geometry {
            overlay.current_geometry = geometry;
        }
        if let Some(centroid) = update.current_centroid {
            overlay.current_centroid = centroid;
        }
        if let Some(scale) = update.mercator_scale_factor {
            overlay.mercator_scale_factor = scale;
        }
    }

    /// Authoritative commit path: stores the transform and recomputes every
    /// derived field from the immutable original geometry.
    pub fn set_transform(&mut self, id: u64, offset: LngLat, rotation_radians: f64) {
        if let Some(overlay) = self.get_mut(id) {
            overlay.offset = offset;
            overlay.rotation_radians = rotation_radians;
            overlay.recompute();
        }
    }

    pub fn reset_overlay(&mut self, id: u64) {
        if let Some(overlay) = self.get_mut(id) {
            overlay.offset = LngLat::default();
            overlay.rotation_radians = 0.0;
            overlay.current_geometry = overlay.original_geometry.clone();
            overlay.current_centroid = overlay.original_centroid;
            overlay.mercator_scale_factor = 1.0;
        }
    }

    pub fn select_overlay(&mut self, id: u64) {
        if self.overlays.iter().any(|o| o.id == id) {
            self.selected = Some(id);
        }
    }

    pub fn toggle_edit_enabled(&mut self, id: u64) {
        if let Some(overlay) = self.get_mut(id) {
            overlay.edit_enabled = !overlay.edit_enabled;
        }
    }

    /// Topmost overlay whose current (committed or previewed) geometry
    /// contains the point.
    pub fn hit_test(
        &self,
        point: LngLat,
        preview: impl Fn(u64) -> Option<(LngLat, f64)>,
    ) -> Option<u64> {
        for overlay in self.overlays.iter().rev() {
            let hit = match preview(overlay.id) {
                Some((offset, rotation)) => {
                    geometry::contains(&overlay.geometry_with(offset, rotation), point)
                }
                None => geometry::contains(&overlay.current_geometry, point),
            };
            if hit {
                return Some(overlay.id);
            }
        }
        None
    }
}

/// Presentation snapshot; a gesture preview, when present, replaces the
/// committed transform without touching the registry.
pub(super) fn snapshot<'a>(
    overlay: &'a Overlay,
    preview: Option<(LngLat, f64)>,
) -> OverlaySnapshot<'a> {
    match preview {
        Some((offset, rotation)) => OverlaySnapshot {
            id: overlay.id,
            name: &overlay.name,
            country: &overlay.country,
            area_km2: overlay.area_km2,
            color: overlay.color,
            offset,
            rotation_radians: rotation,
            mercator_scale_factor: overlay.scale_factor_with(offset),
            current_geometry: Cow::Owned(overlay.geometry_with(offset, rotation)),
        },
        None => OverlaySnapshot {
            id: overlay.id,
            name: &overlay.name,
            country: &overlay.country,
            area_km2: overlay.area_km2,
            color: overlay.color,
            offset: overlay.offset,
            rotation_radians: overlay.rotation_radians,
            mercator_scale_factor: overlay.mercator_scale_factor,
            current_geometry: Cow::Borrowed(&overlay.current_geometry),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundaryProperties;

    pub(crate) fn feature(name: &str, center: LngLat, half: f64) -> BoundaryFeature {
        BoundaryFeature {
            geometry: Geometry::Polygon(vec![vec![
                LngLat::new(center.lng - half, center.lat - half),
                LngLat::new(center.lng + half, center.lat - half),
                LngLat::new(center.lng + half, center.lat + half),
                LngLat::new(center.lng - half, center.lat + half),
            ]]),
            properties: BoundaryProperties {
                name: name.to_string(),
                code: "XX".to_string(),
                country: "Nowhere".to_string(),
                area_km2: 1000.0,
            },
        }
    }

    #[test]
    fn add_overlay_initializes_and_selects() {
        let mut reg = OverlayRegistry::new();
        let id = reg
            .add_overlay(&feature("A", LngLat::new(4.0, 10.0), 1.0))
            .unwrap();
        assert_eq!(reg.selected_id(), Some(id));
        let o = reg.get(id).unwrap();
        assert_eq!(o.offset, LngLat::default());
        assert_eq!(o.rotation_radians, 0.0);
        assert_eq!(o.mercator_scale_factor, 1.0);
        assert_eq!(o.current_centroid, o.original_centroid());
        assert!((o.original_centroid().lng - 4.0).abs() < 1e-12);
    }

    #[test]
    fn add_overlay_rejects_empty_geometry() {
        let mut reg = OverlayRegistry::new();
        let f = BoundaryFeature {
            geometry: Geometry::MultiPolygon(vec![]),
            properties: BoundaryProperties {
                name: "empty".to_string(),
                code: String::new(),
                country: String::new(),
                area_km2: 0.0,
            },
        };
        assert_eq!(reg.add_overlay(&f), Err(GeoError::InvalidGeometry));
        assert_eq!(reg.len(), 0);
        assert_eq!(reg.selected_id(), None);
    }

    #[test]
    fn palette_rotates() {
        let mut reg = OverlayRegistry::new();
        let a = reg
            .add_overlay(&feature("A", LngLat::new(0.0, 0.0), 1.0))
            .unwrap();
        let b = reg
            .add_overlay(&feature("B", LngLat::new(5.0, 0.0), 1.0))
            .unwrap();
        assert_ne!(reg.get(a).unwrap().color, reg.get(b).unwrap().color);
    }

    #[test]
    fn selection_is_exclusive() {
        let mut reg = OverlayRegistry::new();
        let a = reg
            .add_overlay(&feature("A", LngLat::new(0.0, 0.0), 1.0))
            .unwrap();
        let b = reg
            .add_overlay(&feature("B", LngLat::new(5.0, 0.0), 1.0))
            .unwrap();
        assert_eq!(reg.selected_id(), Some(b));
        reg.select_overlay(a);
        assert_eq!(reg.selected_id(), Some(a));
    }

    #[test]
    fn update_overlay_merges_given_fields_only() {
        let mut reg = OverlayRegistry::new();
        let id = reg
            .add_overlay(&feature("A", LngLat::new(0.0, 0.0), 1.0))
            .unwrap();
        reg.update_overlay(
            id,
            OverlayUpdate {
                rotation_radians: Some(0.5),
                ..Default::default()
            },
        );
        let o = reg.get(id).unwrap();
        assert_eq!(o.rotation_radians, 0.5);
        assert_eq!(o.offset, LngLat::default());
        assert_eq!(o.original_centroid(), LngLat::new(0.0, 0.0));
    }

    #[test]
    fn set_transform_recomputes_derived_state() {
        let mut reg = OverlayRegistry::new();
        let id = reg
            .add_overlay(&feature("A", LngLat::new(0.0, 0.0), 1.0))
            .unwrap();
        // Dragged from the equator to 60°N: the Mercator secant doubles.
        reg.set_transform(id, LngLat::new(0.0, 60.0), 0.0);
        let o = reg.get(id).unwrap();
        assert!((o.mercator_scale_factor - 2.0).abs() < 1e-3);
        assert_eq!(o.current_centroid, LngLat::new(0.0, 60.0));
    }

    #[test]
    fn reset_restores_creation_state() {
        let mut reg = OverlayRegistry::new();
        let f = feature("A", LngLat::new(2.0, 40.0), 1.5);
        let id = reg.add_overlay(&f).unwrap();
        reg.set_transform(id, LngLat::new(-30.0, 12.0), 1.2);
        reg.reset_overlay(id);
        let o = reg.get(id).unwrap();
        assert_eq!(o.offset, LngLat::default());
        assert_eq!(o.rotation_radians, 0.0);
        assert_eq!(o.mercator_scale_factor, 1.0);
        assert_eq!(o.current_geometry, f.geometry);
        assert_eq!(o.current_centroid, o.original_centroid());
    }

    #[test]
    fn hit_test_finds_topmost() {
        let mut reg = OverlayRegistry::new();
        let a = reg
            .add_overlay(&feature("A", LngLat::new(0.0, 0.0), 2.0))
            .unwrap();
        let b = reg
            .add_overlay(&feature("B", LngLat::new(1.0, 0.0), 2.0))
            .unwrap();
        // Overlapping point: the later overlay wins.
        assert_eq!(reg.hit_test(LngLat::new(0.5, 0.0), |_| None), Some(b));
        assert_eq!(reg.hit_test(LngLat::new(-1.5, 0.0), |_| None), Some(a));
        assert_eq!(reg.hit_test(LngLat::new(50.0, 0.0), |_| None), None);
    }
}
