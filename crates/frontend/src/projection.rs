//! Plate carrée projection of GeoJSON outlines into SVG path data.

use std::fmt::Write;

use geojson::{FeatureCollection, Geometry, Value};

pub const MAP_WIDTH: f64 = 960.0;
pub const MAP_HEIGHT: f64 = 480.0;

/// Longitude/latitude in degrees to map pixels, origin top-left.
pub fn project(lon: f64, lat: f64) -> (f64, f64) {
    (
        (lon + 180.0) / 360.0 * MAP_WIDTH,
        (90.0 - lat.clamp(-90.0, 90.0)) / 180.0 * MAP_HEIGHT,
    )
}

fn push_ring(d: &mut String, ring: &[Vec<f64>]) {
    for (i, position) in ring.iter().enumerate() {
        let [lon, lat, ..] = position.as_slice() else {
            continue;
        };
        let (x, y) = project(*lon, *lat);
        let command = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{command}{x:.1},{y:.1}");
    }
    if !ring.is_empty() {
        d.push('Z');
    }
}

/// SVG path data for the polygonal parts of `geometry`. Points and lines
/// draw nothing.
pub fn geometry_path(geometry: &Geometry) -> String {
    let mut d = String::new();
    push_geometry(&mut d, &geometry.value);
    d
}

fn push_geometry(d: &mut String, value: &Value) {
    match value {
        Value::Polygon(rings) => rings.iter().for_each(|ring| push_ring(d, ring)),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .for_each(|ring| push_ring(d, ring)),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .for_each(|g| push_geometry(d, &g.value)),
        _ => {}
    }
}

/// One path per feature, aligned with the collection's feature order.
pub fn feature_paths(geo: &FeatureCollection) -> Vec<String> {
    geo.features
        .iter()
        .map(|f| f.geometry.as_ref().map(geometry_path).unwrap_or_default())
        .collect()
}
