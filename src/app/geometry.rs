use crate::model::{Bounds, GeoError, Geometry, LngLat};

pub(super) const MI2_PER_KM2: f64 = 0.386102;

/// Latitude clamp keeping the Mercator secant away from the ±90° asymptote.
pub(super) const MAX_MERCATOR_LAT_DEG: f64 = 85.0;

/// Arithmetic mean over all leaf points, independent of traversal order.
pub(super) fn centroid(tree: &Geometry) -> Result<LngLat, GeoError> {
    let mut sum_lng = 0.0;
    let mut sum_lat = 0.0;
    let mut count = 0usize;
    tree.for_each_point(|p| {
        sum_lng += p.lng;
        sum_lat += p.lat;
        count += 1;
    });
    if count == 0 {
        return Err(GeoError::InvalidGeometry);
    }
    Ok(LngLat::new(sum_lng / count as f64, sum_lat / count as f64))
}

pub(super) fn translate(tree: &Geometry, d_lng: f64, d_lat: f64) -> Geometry {
    tree.map_points(|p| LngLat::new(p.lng + d_lng, p.lat + d_lat))
}

/// 2D rotation about `center` in the lng/lat plane. A positive angle is
/// counter-clockwise in that plane; an angle derived from screen pixels
/// (y grows downward) must be negated before it gets here.
pub(super) fn rotate(tree: &Geometry, center: LngLat, angle_rad: f64) -> Geometry {
    let sin = angle_rad.sin();
    let cos = angle_rad.cos();
    tree.map_points(|p| {
        let x = p.lng - center.lng;
        let y = p.lat - center.lat;
        LngLat::new(
            center.lng + x * cos - y * sin,
            center.lat + x * sin + y * cos,
        )
    })
}

/// Visual inflation of the Mercator projection at a latitude: the secant,
/// clamped to ±85° and strictly increasing in |lat| below the clamp.
pub(super) fn mercator_scale_factor(lat_deg: f64) -> f64 {
    let lat = lat_deg.clamp(-MAX_MERCATOR_LAT_DEG, MAX_MERCATOR_LAT_DEG);
    1.0 / lat.to_radians().cos()
}

pub(super) fn bounds(tree: &Geometry) -> Result<Bounds, GeoError> {
    let mut out: Option<Bounds> = None;
    tree.for_each_point(|p| {
        let b = out.get_or_insert(Bounds {
            min_lng: p.lng,
            max_lng: p.lng,
            min_lat: p.lat,
            max_lat: p.lat,
        });
        b.min_lng = b.min_lng.min(p.lng);
        b.max_lng = b.max_lng.max(p.lng);
        b.min_lat = b.min_lat.min(p.lat);
        b.max_lat = b.max_lat.max(p.lat);
    });
    out.ok_or(GeoError::InvalidGeometry)
}

/// Even-odd ray cast across every ring.
pub(super) fn contains(tree: &Geometry, point: LngLat) -> bool {
    let mut inside = false;
    for ring in tree.rings() {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let a = ring[i];
            let b = ring[j];
            if (a.lat > point.lat) != (b.lat > point.lat)
                && point.lng
                    < (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng
            {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

pub(super) struct AreaDisplay {
    pub km2: String,
    pub mi2: String,
}

pub(super) fn format_area(area_km2: f64) -> AreaDisplay {
    AreaDisplay {
        km2: group_thousands(area_km2),
        mi2: group_thousands(area_km2 * MI2_PER_KM2),
    }
}

fn group_thousands(value: f64) -> String {
    let n = value.round() as i64;
    let digits = n.abs().to_string();
    let mut out = String::new();
    if n < 0 {
        out.push('-');
    }
    let first = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && i % 3 == first % 3 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(center: LngLat, half: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            LngLat::new(center.lng - half, center.lat - half),
            LngLat::new(center.lng + half, center.lat - half),
            LngLat::new(center.lng + half, center.lat + half),
            LngLat::new(center.lng - half, center.lat + half),
        ]])
    }

    fn assert_trees_close(a: &Geometry, b: &Geometry, tol: f64) {
        let mut pa = Vec::new();
        let mut pb = Vec::new();
        a.for_each_point(|p| pa.push(p));
        b.for_each_point(|p| pb.push(p));
        assert_eq!(pa.len(), pb.len());
        for (x, y) in pa.iter().zip(pb.iter()) {
            assert!((x.lng - y.lng).abs() < tol, "{x:?} vs {y:?}");
            assert!((x.lat - y.lat).abs() < tol, "{x:?} vs {y:?}");
        }
    }

    #[test]
    fn centroid_ignores_point_order() {
        let a = Geometry::Polygon(vec![vec![
            LngLat::new(0.0, 0.0),
            LngLat::new(4.0, 0.0),
            LngLat::new(4.0, 2.0),
            LngLat::new(0.0, 2.0),
        ]]);
        let b = Geometry::Polygon(vec![vec![
            LngLat::new(4.0, 2.0),
            LngLat::new(0.0, 2.0),
            LngLat::new(0.0, 0.0),
            LngLat::new(4.0, 0.0),
        ]]);
        let ca = centroid(&a).unwrap();
        let cb = centroid(&b).unwrap();
        assert!((ca.lng - cb.lng).abs() < 1e-12);
        assert!((ca.lat - cb.lat).abs() < 1e-12);
        assert!((ca.lng - 2.0).abs() < 1e-12);
        assert!((ca.lat - 1.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_empty_tree_is_an_error() {
        let empty = Geometry::MultiPolygon(vec![]);
        assert_eq!(centroid(&empty), Err(GeoError::InvalidGeometry));
        let empty_ring = Geometry::Polygon(vec![vec![]]);
        assert_eq!(centroid(&empty_ring), Err(GeoError::InvalidGeometry));
    }

    #[test]
    fn translate_round_trips() {
        let tree = square(LngLat::new(12.5, -3.25), 1.75);
        let back = translate(&translate(&tree, 10.3, -7.9), -10.3, 7.9);
        assert_trees_close(&tree, &back, 1e-9);
    }

    #[test]
    fn translate_preserves_tree_shape() {
        let tree = Geometry::MultiPolygon(vec![
            vec![vec![LngLat::new(0.0, 0.0), LngLat::new(1.0, 0.0), LngLat::new(1.0, 1.0)]],
            vec![vec![LngLat::new(5.0, 5.0), LngLat::new(6.0, 5.0), LngLat::new(6.0, 6.0)]],
        ]);
        let moved = translate(&tree, 2.0, 3.0);
        match (&tree, &moved) {
            (Geometry::MultiPolygon(a), Geometry::MultiPolygon(b)) => {
                assert_eq!(a.len(), b.len());
                for (pa, pb) in a.iter().zip(b.iter()) {
                    assert_eq!(pa.len(), pb.len());
                    for (ra, rb) in pa.iter().zip(pb.iter()) {
                        assert_eq!(ra.len(), rb.len());
                    }
                }
            }
            _ => panic!("tree restructured"),
        }
    }

    #[test]
    fn rotate_round_trips() {
        let tree = square(LngLat::new(-20.0, 40.0), 3.0);
        let center = LngLat::new(-18.0, 41.0);
        let theta = 0.7;
        let back = rotate(&rotate(&tree, center, theta), center, -theta);
        assert_trees_close(&tree, &back, 1e-9);
    }

    #[test]
    fn rotate_quarter_turn_is_ccw() {
        let tree = Geometry::Polygon(vec![vec![LngLat::new(1.0, 0.0)]]);
        let turned = rotate(&tree, LngLat::new(0.0, 0.0), std::f64::consts::FRAC_PI_2);
        let mut got = None;
        turned.for_each_point(|p| got = Some(p));
        let p = got.unwrap();
        assert!((p.lng - 0.0).abs() < 1e-12);
        assert!((p.lat - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mercator_scale_factor_matches_secant() {
        assert!((mercator_scale_factor(0.0) - 1.0).abs() < 1e-12);
        assert!((mercator_scale_factor(60.0) - 2.0).abs() < 1e-9);
        let mut prev = mercator_scale_factor(0.0);
        for lat in 1..85 {
            let s = mercator_scale_factor(lat as f64);
            assert!(s > prev, "not strictly increasing at {lat}");
            prev = s;
        }
        // Clamped beyond the asymptote guard.
        assert_eq!(mercator_scale_factor(89.9), mercator_scale_factor(85.0));
        assert!(mercator_scale_factor(90.0).is_finite());
    }

    #[test]
    fn bounds_covers_all_leaves() {
        let tree = Geometry::MultiPolygon(vec![
            vec![vec![LngLat::new(-3.0, 2.0), LngLat::new(1.0, -5.0)]],
            vec![vec![LngLat::new(7.0, 0.5)]],
        ]);
        let b = bounds(&tree).unwrap();
        assert_eq!(b.min_lng, -3.0);
        assert_eq!(b.max_lng, 7.0);
        assert_eq!(b.min_lat, -5.0);
        assert_eq!(b.max_lat, 2.0);
        assert!(bounds(&Geometry::Polygon(vec![])).is_err());
    }

    #[test]
    fn contains_hits_interior_only() {
        let tree = square(LngLat::new(0.0, 0.0), 2.0);
        assert!(contains(&tree, LngLat::new(0.0, 0.0)));
        assert!(contains(&tree, LngLat::new(1.5, -1.5)));
        assert!(!contains(&tree, LngLat::new(3.0, 0.0)));
        assert!(!contains(&tree, LngLat::new(0.0, -2.5)));
    }

    #[test]
    fn format_area_groups_and_converts() {
        let a = format_area(603_628.0);
        assert_eq!(a.km2, "603,628");
        assert_eq!(a.mi2, "233,062"); // 603628 * 0.386102
        let b = format_area(132.0);
        assert_eq!(b.km2, "132");
        assert_eq!(b.mi2, "51");
    }
}
