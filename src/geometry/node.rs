use crate::error::{ParcelError, Result};
use geo_traits::{
    CoordTrait, GeometryCollectionTrait, GeometryTrait, LineStringTrait, MultiLineStringTrait,
    MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait,
};
use std::panic::{AssertUnwindSafe, catch_unwind};
use wkb::reader::Wkb;

use super::raw::wkb_payload;
use super::scan::check_wkb_layout;

/// A coordinate pair, longitude first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub lng: f64,
    pub lat: f64,
}

impl Coord {
    /// Coordinate of an empty point.
    pub const EMPTY: Self = Self {
        lng: f64::NAN,
        lat: f64::NAN,
    };

    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    fn from_coord<C: CoordTrait<T = f64>>(coord: &C) -> Self {
        let (x, y) = coord.x_y();
        Self::new(x, y)
    }
}

/// Kind tag of a [`GeometryNode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

/// Decoded geometry tree.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryNode {
    Point(Coord),
    LineString(Vec<Coord>),
    /// Rings, exterior first.
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<GeometryNode>),
}

impl GeometryNode {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::LineString(_) => GeometryKind::LineString,
            Self::Polygon(_) => GeometryKind::Polygon,
            Self::MultiPoint(_) => GeometryKind::MultiPoint,
            Self::MultiLineString(_) => GeometryKind::MultiLineString,
            Self::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Self::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    /// Decode WKB (optionally wrapped in a GeoPackage header or carrying an EWKB SRID).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let payload = wkb_payload(bytes)?;
        // Counts and nesting are bounded before the reader allocates or recurses.
        check_wkb_layout(payload)?;
        catch_unwind(AssertUnwindSafe(|| {
            let wkb = Wkb::try_new(payload)?;
            Self::from_geometry(&wkb)
        }))
        .unwrap_or(Err(ParcelError::DecodePanicked))
    }

    /// Copy any `geo_traits` geometry into an owned tree. Z and M are dropped.
    pub fn from_geometry<G: GeometryTrait<T = f64>>(geom: &G) -> Result<Self> {
        use geo_traits::GeometryType as GeoType;

        let node = match geom.as_type() {
            GeoType::Point(point) => Self::Point(point_coord(point)),
            GeoType::LineString(line) => Self::LineString(line_coords(line)),
            GeoType::Polygon(poly) => Self::Polygon(polygon_rings(poly)),
            GeoType::MultiPoint(multi) => {
                Self::MultiPoint(multi.points().map(|point| point_coord(&point)).collect())
            }
            GeoType::MultiLineString(multi) => Self::MultiLineString(
                multi
                    .line_strings()
                    .map(|line| line_coords(&line))
                    .collect(),
            ),
            GeoType::MultiPolygon(multi) => {
                Self::MultiPolygon(multi.polygons().map(|poly| polygon_rings(&poly)).collect())
            }
            GeoType::GeometryCollection(collection) => Self::GeometryCollection(
                collection
                    .geometries()
                    .map(|sub_geom| Self::from_geometry(&sub_geom))
                    .collect::<Result<Vec<_>>>()?,
            ),
            GeoType::Rect(_) => return Err(ParcelError::UnsupportedGeometryType("Rect".into())),
            GeoType::Triangle(_) => {
                return Err(ParcelError::UnsupportedGeometryType("Triangle".into()));
            }
            GeoType::Line(_) => return Err(ParcelError::UnsupportedGeometryType("Line".into())),
        };

        Ok(node)
    }

    /// Call `f` on every coordinate pair, at any depth, in storage order.
    pub fn for_each_coord<F: FnMut(&Coord)>(&self, f: &mut F) {
        match self {
            Self::Point(coord) => f(coord),
            Self::LineString(coords) | Self::MultiPoint(coords) => coords.iter().for_each(f),
            Self::Polygon(rings) | Self::MultiLineString(rings) => {
                rings.iter().flatten().for_each(f)
            }
            Self::MultiPolygon(polygons) => polygons.iter().flatten().flatten().for_each(f),
            Self::GeometryCollection(children) => {
                for child in children {
                    child.for_each_coord(f);
                }
            }
        }
    }

    /// Every coordinate pair reachable in the tree.
    pub fn flatten_coords(&self) -> Vec<Coord> {
        let mut coords = Vec::new();
        self.for_each_coord(&mut |coord: &Coord| coords.push(*coord));
        coords
    }
}

fn point_coord<P: PointTrait<T = f64>>(point: &P) -> Coord {
    point
        .coord()
        .map(|coord| Coord::from_coord(&coord))
        .unwrap_or(Coord::EMPTY)
}

fn line_coords<L: LineStringTrait<T = f64>>(line: &L) -> Vec<Coord> {
    line.coords()
        .map(|coord| Coord::from_coord(&coord))
        .collect()
}

fn polygon_rings<P: PolygonTrait<T = f64>>(poly: &P) -> Vec<Vec<Coord>> {
    let mut rings = Vec::with_capacity(poly.num_interiors() + 1);
    if let Some(ring) = poly.exterior() {
        rings.push(line_coords(&ring));
    }
    for ring in poly.interiors() {
        rings.push(line_coords(&ring));
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::{Coord, GeometryKind, GeometryNode};
    use crate::error::ParcelError;
    use geo_traits::GeometryTrait;
    use geo_types::{
        Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
        Point, Polygon,
    };
    use std::str::FromStr;
    use wkt::Wkt;

    fn encode<G: GeometryTrait<T = f64>>(geometry: &G) -> crate::Result<Vec<u8>> {
        let mut wkb = Vec::new();
        wkb::writer::write_geometry(&mut wkb, geometry, &Default::default())?;
        Ok(wkb)
    }

    fn square(x0: f64, y0: f64, size: f64) -> Polygon {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        )
    }

    #[test]
    fn decodes_point() -> crate::Result<()> {
        let node = GeometryNode::decode(&encode(&Point::new(-96.8, 32.78))?)?;
        assert_eq!(node, GeometryNode::Point(Coord::new(-96.8, 32.78)));
        assert_eq!(node.kind(), GeometryKind::Point);
        Ok(())
    }

    #[test]
    fn decodes_polygon_rings_exterior_first() -> crate::Result<()> {
        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)]),
            vec![LineString::from(vec![
                (1.0, 1.0),
                (2.0, 1.0),
                (2.0, 2.0),
                (1.0, 1.0),
            ])],
        );
        let node = GeometryNode::decode(&encode(&polygon)?)?;
        match node {
            GeometryNode::Polygon(rings) => {
                assert_eq!(rings.len(), 2);
                assert_eq!(rings[0][1], Coord::new(4.0, 0.0));
                assert_eq!(rings[1][0], Coord::new(1.0, 1.0));
            }
            other => panic!("expected polygon, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn decodes_every_kind() -> crate::Result<()> {
        let line = LineString::from(vec![(0.0, 0.0), (1.5, 1.0)]);
        let cases: Vec<(Geometry, GeometryKind)> = vec![
            (Geometry::LineString(line.clone()), GeometryKind::LineString),
            (Geometry::Polygon(square(0.0, 0.0, 1.0)), GeometryKind::Polygon),
            (
                Geometry::MultiPoint(MultiPoint::from(vec![
                    Point::new(1.0, 1.0),
                    Point::new(2.0, 2.0),
                ])),
                GeometryKind::MultiPoint,
            ),
            (
                Geometry::MultiLineString(MultiLineString::new(vec![line.clone()])),
                GeometryKind::MultiLineString,
            ),
            (
                Geometry::MultiPolygon(MultiPolygon::new(vec![
                    square(0.0, 0.0, 1.0),
                    square(5.0, 5.0, 1.0),
                ])),
                GeometryKind::MultiPolygon,
            ),
            (
                Geometry::GeometryCollection(GeometryCollection::from(vec![
                    Geometry::Point(Point::new(-1.0, -2.0)),
                    Geometry::LineString(line),
                ])),
                GeometryKind::GeometryCollection,
            ),
        ];

        for (geometry, kind) in cases {
            let node = GeometryNode::decode(&encode(&geometry)?)?;
            assert_eq!(node.kind(), kind);
        }
        Ok(())
    }

    #[test]
    fn flattens_nested_coordinates_in_order() -> crate::Result<()> {
        let multi = MultiPolygon::new(vec![square(0.0, 0.0, 1.0), square(10.0, 10.0, 2.0)]);
        let node = GeometryNode::decode(&encode(&multi)?)?;
        let coords = node.flatten_coords();
        assert_eq!(coords.len(), 10);
        assert_eq!(coords[0], Coord::new(0.0, 0.0));
        assert_eq!(coords[6], Coord::new(12.0, 10.0));
        Ok(())
    }

    #[test]
    fn drops_z_and_m() -> crate::Result<()> {
        let point_z = Wkt::from_str("POINT Z (1 2 3)")
            .map_err(|err| ParcelError::UnsupportedGeometryType(err.to_string()))?;
        let node = GeometryNode::decode(&encode(&point_z)?)?;
        assert_eq!(node, GeometryNode::Point(Coord::new(1.0, 2.0)));

        let line_zm = Wkt::from_str("LINESTRING ZM (0 0 1 10, 2 1 2 11)")
            .map_err(|err| ParcelError::UnsupportedGeometryType(err.to_string()))?;
        let node = GeometryNode::decode(&encode(&line_zm)?)?;
        assert_eq!(
            node,
            GeometryNode::LineString(vec![Coord::new(0.0, 0.0), Coord::new(2.0, 1.0)])
        );
        Ok(())
    }

    #[test]
    fn truncated_bytes_are_an_error() -> crate::Result<()> {
        let wkb = encode(&square(0.0, 0.0, 1.0))?;
        for len in [0, 1, 4, 9, wkb.len() / 2, wkb.len() - 1] {
            assert!(
                GeometryNode::decode(&wkb[..len]).is_err(),
                "decoding {len} of {} bytes should fail",
                wkb.len()
            );
        }
        Ok(())
    }

    #[test]
    fn decodes_ewkb_with_srid() -> crate::Result<()> {
        let mut ewkb = vec![0x01];
        ewkb.extend_from_slice(&(1u32 | 0x2000_0000).to_le_bytes());
        ewkb.extend_from_slice(&4326u32.to_le_bytes());
        ewkb.extend_from_slice(&(-96.8f64).to_le_bytes());
        ewkb.extend_from_slice(&32.78f64.to_le_bytes());

        let node = GeometryNode::decode(&ewkb)?;
        assert_eq!(node, GeometryNode::Point(Coord::new(-96.8, 32.78)));
        Ok(())
    }

    #[test]
    fn huge_declared_counts_fail_without_allocating() {
        let polygon = [0x01, 0x03, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff];
        let collection = [0x01, 0x07, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff];
        for buf in [polygon, collection] {
            assert!(matches!(
                GeometryNode::decode(&buf),
                Err(ParcelError::InvalidGeometryLength { .. })
            ));
        }
    }

    #[test]
    fn deep_nesting_fails_without_recursing() {
        let mut buf = Vec::new();
        for _ in 0..100_000 {
            buf.extend_from_slice(&[0x01, 0x07, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]);
        }
        assert!(matches!(
            GeometryNode::decode(&buf),
            Err(ParcelError::GeometryTooDeep { .. })
        ));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(GeometryNode::decode(b"not a geometry").is_err());
        assert!(GeometryNode::decode(&[0x01, 0xff, 0xff, 0xff, 0x7f]).is_err());
    }
}
