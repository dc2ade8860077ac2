//! Filtered parcel reads over SQLite, with each parcel's geometry resolved to a
//! representative latitude/longitude.
//!
//! ## Overview
//!
//! - `FilterSpec` is the typed, validated set of optional filters for one request.
//! - `PredicateBuilder` turns a `FilterSpec` into a parameterized `WHERE` clause.
//! - `ParcelTable` runs the query against any `ParcelStore` (a `rusqlite::Connection`
//!   out of the box) and renders rows as JSON or CSV.
//! - `GeometryNode` is a decoded WKB geometry; `GeometryNode::representative_point`
//!   reduces it to one `ResolvedPoint`.
//! - `SavedFilterStore` keeps per-user filters in a JSON file.
//!
//! Filter text is parsed leniently: a value that is not a finite number is simply
//! absent. Geometry that fails to decode only costs that row its location; a store
//! failure fails the whole request.
//!
//! ## Reading parcels
//!
//! ```no_run
//! use parcel_query::{Config, FilterSpec, JsonOptions, ParcelTable};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let conn = rusqlite::Connection::open(&config.database_path)?;
//!     let table = ParcelTable::new(&conn, config.parcel_table.as_str());
//!
//!     let spec = FilterSpec::from_query([
//!         ("isAuthenticated", "false"),
//!         ("minPrice", "150000"),
//!         ("minSqft", "1200"),
//!         ("limit", "25"),
//!     ]);
//!     for parcel in table.read_json(&spec, JsonOptions::default())? {
//!         println!("{}", serde_json::Value::Object(parcel));
//!     }
//!
//!     print!("{}", table.export_csv(&spec)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Building the query by hand
//!
//! ```
//! use parcel_query::{FilterSpec, LimitPolicy, ParcelQuery};
//!
//! let spec = FilterSpec::from_query([("maxSqft", "2000"), ("limit", "10000")]);
//! let query = ParcelQuery::new("dallas_parcels", &spec, LimitPolicy::INTERACTIVE);
//!
//! assert_eq!(
//!     query.clause.where_clause().as_deref(),
//!     Some("LOWER(county) = ?1 AND (sqft IS NOT NULL AND sqft <= ?2)")
//! );
//! assert!(query.sql.ends_with("LIMIT ?3"));
//! assert_eq!(query.limit, 200);
//! ```
//!
//! ## Resolving a geometry
//!
//! ```
//! use parcel_query::{GeometryNode, Coord};
//!
//! let node = GeometryNode::LineString(vec![Coord::new(-97.0, 32.0), Coord::new(-96.0, 33.0)]);
//! let point = node.representative_point().unwrap();
//! assert_eq!((point.latitude, point.longitude), (32.5, -96.5));
//! ```
mod config;
mod error;
mod filter;
mod geometry;
mod parcels;
mod predicate;
mod saved_filters;
mod sql;
mod store;

pub use config::Config;
pub use error::{ParcelError, Result};
pub use filter::{FilterSpec, LimitPolicy, parse_bound, parse_finite, parse_flag, parse_limit};
pub use geometry::{
    Coord, GeometryKind, GeometryNode, RawGeometry, ResolvedPoint, resolve_geometry,
    resolve_value,
};
pub use parcels::{
    JsonOptions, ParcelTable, fetch_parcels, parcel_json, parcels_csv, parcels_json,
    row_location,
};
pub use predicate::{FilterClause, ParcelQuery, Predicate, PredicateBuilder, PUBLIC_COUNTY};
pub use saved_filters::{SavedFilterStore, SavedFilters};
pub use sql::create_parcels_table;
pub use store::{ParcelRow, ParcelStore};
