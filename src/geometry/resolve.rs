use crate::error::Result;
use rusqlite::types::Value;
use serde::Serialize;

use super::node::{Coord, GeometryNode};
use super::raw::RawGeometry;

/// Representative location of a geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ResolvedPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl ResolvedPoint {
    fn from_coord(coord: &Coord) -> Self {
        Self {
            latitude: coord.lat,
            longitude: coord.lng,
        }
    }
}

// Running min/max over the finite values seen on one axis.
#[derive(Clone, Copy, Debug, Default)]
struct AxisRange(Option<(f64, f64)>);

impl AxisRange {
    fn add(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.0 = Some(match self.0 {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    fn midpoint(&self) -> Option<f64> {
        self.0.map(|(min, max)| (min + max) / 2.0)
    }
}

impl GeometryNode {
    /// Pick one point standing for the whole geometry.
    ///
    /// - A point is its own answer when both components are finite.
    /// - A collection answers with the first child, in order, that resolves.
    /// - Everything else answers with the center of the bounding box of all of its
    ///   coordinates. Non-finite components are skipped.
    ///
    /// The box center is not an area centroid and may fall outside a concave or
    /// multi-part shape.
    pub fn representative_point(&self) -> Option<ResolvedPoint> {
        match self {
            Self::Point(coord) => coord.is_finite().then(|| ResolvedPoint::from_coord(coord)),
            Self::GeometryCollection(children) => children
                .iter()
                .find_map(GeometryNode::representative_point)
                .or_else(|| self.bbox_center()),
            _ => self.bbox_center(),
        }
    }

    /// Center of the bounding box over every finite coordinate component.
    pub fn bbox_center(&self) -> Option<ResolvedPoint> {
        let mut lng = AxisRange::default();
        let mut lat = AxisRange::default();
        self.for_each_coord(&mut |coord: &Coord| {
            lng.add(coord.lng);
            lat.add(coord.lat);
        });

        Some(ResolvedPoint {
            latitude: lat.midpoint()?,
            longitude: lng.midpoint()?,
        })
    }
}

/// Decode a raw geometry and resolve its representative point.
pub fn resolve_geometry(raw: &RawGeometry<'_>) -> Result<Option<ResolvedPoint>> {
    let bytes = raw.to_bytes()?;
    let node = GeometryNode::decode(&bytes)?;
    Ok(node.representative_point())
}

/// Resolve a geometry column value. `NULL` resolves to `None`.
pub fn resolve_value(value: &Value) -> Result<Option<ResolvedPoint>> {
    match RawGeometry::from_value(value)? {
        Some(raw) => resolve_geometry(&raw),
        None => Ok(None),
    }
}
