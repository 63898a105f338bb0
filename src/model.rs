use serde::{Deserialize, Serialize};
use eframe::egui;
use thiserror::Error;

/// A geographic position (or delta) in degrees. Serializes as the
/// two-element `[lng, lat]` array GeoJSON uses for leaf coordinates.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(a: [f64; 2]) -> Self {
        Self { lng: a[0], lat: a[1] }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

impl std::ops::Add for LngLat {
    type Output = LngLat;
    fn add(self, rhs: LngLat) -> LngLat {
        LngLat::new(self.lng + rhs.lng, self.lat + rhs.lat)
    }
}

impl std::ops::Sub for LngLat {
    type Output = LngLat;
    fn sub(self, rhs: LngLat) -> LngLat {
        LngLat::new(self.lng - rhs.lng, self.lat - rhs.lat)
    }
}

/// Nested coordinate tree of a boundary, in geographic degrees.
/// The serde representation matches a GeoJSON geometry object
/// (`{"type": "Polygon", "coordinates": [...]}`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Vec<LngLat>>),
    MultiPolygon(Vec<Vec<Vec<LngLat>>>),
}

impl Geometry {
    pub fn rings(&self) -> Box<dyn Iterator<Item = &[LngLat]> + '_> {
        match self {
            Geometry::Polygon(rings) => Box::new(rings.iter().map(|r| r.as_slice())),
            Geometry::MultiPolygon(polys) => {
                Box::new(polys.iter().flat_map(|p| p.iter().map(|r| r.as_slice())))
            }
        }
    }

    pub fn for_each_point(&self, mut f: impl FnMut(LngLat)) {
        for ring in self.rings() {
            for p in ring {
                f(*p);
            }
        }
    }

    /// Leaf-wise map preserving the tree shape (nesting depth, ring and
    /// point counts are invariant).
    pub fn map_points(&self, f: impl Fn(LngLat) -> LngLat) -> Geometry {
        match self {
            Geometry::Polygon(rings) => Geometry::Polygon(
                rings
                    .iter()
                    .map(|ring| ring.iter().map(|p| f(*p)).collect())
                    .collect(),
            ),
            Geometry::MultiPolygon(polys) => Geometry::MultiPolygon(
                polys
                    .iter()
                    .map(|rings| {
                        rings
                            .iter()
                            .map(|ring| ring.iter().map(|p| f(*p)).collect())
                            .collect()
                    })
                    .collect(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rings().all(|r| r.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.min_lng + self.max_lng) * 0.5,
            (self.min_lat + self.max_lat) * 0.5,
        )
    }
}

/// One feature of a boundary dataset, treated as opaque immutable input.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoundaryFeature {
    pub geometry: Geometry,
    pub properties: BoundaryProperties,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoundaryProperties {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub country: String,
    #[serde(rename = "areaKm2", alias = "area_km2", default)]
    pub area_km2: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<BoundaryFeature>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("geometry has no coordinates")]
    InvalidGeometry,
    #[error("screen point is outside the projection domain")]
    OutOfProjectionRange,
}
