//! Geometry decoding and point resolution.
//!
//! A geometry column value is normalized to WKB bytes ([`RawGeometry`]), decoded into
//! an owned [`GeometryNode`] tree with the `wkb` reader, and reduced to a single
//! [`ResolvedPoint`].

mod node;
mod raw;
mod resolve;
mod scan;

pub use node::{Coord, GeometryKind, GeometryNode};
pub use raw::RawGeometry;
pub use resolve::{ResolvedPoint, resolve_geometry, resolve_value};
