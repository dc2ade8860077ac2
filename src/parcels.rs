use crate::error::{ParcelError, Result};
use crate::filter::{FilterSpec, LimitPolicy};
use crate::geometry::{ResolvedPoint, resolve_geometry};
use crate::predicate::ParcelQuery;
use crate::sql::{COLUMN_GEOMETRY, CSV_COLUMNS};
use crate::store::{ParcelRow, ParcelStore};
use rusqlite::types::Value;
use serde_json::{Map, Number};
use tracing::{debug, error, warn};

/// Output field names added to JSON rows.
pub const FIELD_LATITUDE: &str = "latitude";
pub const FIELD_LONGITUDE: &str = "longitude";

/// Options for [`parcels_json`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Keep the geometry column in the output, rendered as hex WKB text.
    pub include_geometry: bool,
}

/// A parcel table read through a [`ParcelStore`].
#[derive(Debug)]
pub struct ParcelTable<'a, S: ?Sized> {
    store: &'a S,
    pub table_name: String,
}

impl<'a, S: ParcelStore + ?Sized> ParcelTable<'a, S> {
    pub fn new(store: &'a S, table_name: impl Into<String>) -> Self {
        Self {
            store,
            table_name: table_name.into(),
        }
    }

    /// Run the filtered query. A store failure fails the whole request.
    pub fn fetch(&self, spec: &FilterSpec, policy: LimitPolicy) -> Result<Vec<ParcelRow>> {
        fetch_parcels(self.store, &self.table_name, spec, policy)
    }

    /// Interactive read: JSON rows with resolved locations.
    ///
    /// Example:
    /// ```no_run
    /// use parcel_query::{FilterSpec, JsonOptions, ParcelTable};
    ///
    /// let conn = rusqlite::Connection::open("parcels.db")?;
    /// let table = ParcelTable::new(&conn, "dallas_parcels");
    /// let spec = FilterSpec::from_query([("minPrice", "100000"), ("limit", "20")]);
    /// for row in table.read_json(&spec, JsonOptions::default())? {
    ///     println!("{:?} {:?}", row.get("address"), row.get("latitude"));
    /// }
    /// # Ok::<(), parcel_query::ParcelError>(())
    /// ```
    pub fn read_json(
        &self,
        spec: &FilterSpec,
        options: JsonOptions,
    ) -> Result<Vec<Map<String, serde_json::Value>>> {
        let rows = self.fetch(spec, LimitPolicy::INTERACTIVE)?;
        Ok(parcels_json(&rows, options))
    }

    /// Export: CSV text with the fixed five columns. Geometry is never decoded.
    pub fn export_csv(&self, spec: &FilterSpec) -> Result<String> {
        let rows = self.fetch(spec, LimitPolicy::EXPORT)?;
        parcels_csv(&rows)
    }
}

/// Build the query for `spec` and run it against `store`.
pub fn fetch_parcels<S: ParcelStore + ?Sized>(
    store: &S,
    table: &str,
    spec: &FilterSpec,
    policy: LimitPolicy,
) -> Result<Vec<ParcelRow>> {
    let query = ParcelQuery::new(table, spec, policy);
    debug!(sql = %query.sql, params = query.params.len(), "querying parcels");

    store
        .query_rows(&query.sql, &query.params)
        .inspect_err(|err| error!(table, error = %err, "failed to fetch parcels"))
}

/// Resolve the representative point of a row's geometry.
///
/// Decode failures are logged and yield `None`; they never fail the batch.
pub fn row_location(row: &ParcelRow) -> Option<ResolvedPoint> {
    let resolved = row.geometry().and_then(|raw| match raw {
        Some(raw) => resolve_geometry(&raw),
        None => Ok(None),
    });

    match resolved {
        Ok(point) => point,
        Err(err) => {
            warn!(row = %row.label(), error = %err, "failed to resolve parcel geometry");
            None
        }
    }
}

/// Convert one row to a JSON object, adding `latitude`/`longitude` when resolvable.
pub fn parcel_json(row: &ParcelRow, options: JsonOptions) -> Map<String, serde_json::Value> {
    let mut object = Map::with_capacity(row.columns().len() + 2);
    for (name, value) in row.iter() {
        if name == COLUMN_GEOMETRY && !options.include_geometry {
            continue;
        }
        object.insert(name.to_string(), json_value(value));
    }

    if let Some(point) = row_location(row) {
        object.insert(FIELD_LATITUDE.to_string(), point.latitude.into());
        object.insert(FIELD_LONGITUDE.to_string(), point.longitude.into());
    }
    object
}

/// Convert rows to JSON objects, preserving order.
pub fn parcels_json(
    rows: &[ParcelRow],
    options: JsonOptions,
) -> Vec<Map<String, serde_json::Value>> {
    rows.iter().map(|row| parcel_json(row, options)).collect()
}

fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(v) => serde_json::Value::from(*v),
        Value::Real(v) => Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(v) => serde_json::Value::String(v.clone()),
        Value::Blob(v) => serde_json::Value::String(hex::encode(v)),
    }
}

/// Render rows as CSV: header plus `sl_uuid,address,county,sqft,total_value`.
///
/// Fields containing a comma, quote or newline are quoted with inner quotes
/// doubled. `NULL` and missing columns are written as empty fields.
pub fn parcels_csv(rows: &[ParcelRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_COLUMNS)?;

    for row in rows {
        let record = CSV_COLUMNS
            .iter()
            .map(|column| row.value(column).map(csv_field).unwrap_or_default());
        wtr.write_record(record)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|err| ParcelError::Io(err.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|err| ParcelError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => v.to_string(),
        Value::Text(v) => v.clone(),
        Value::Blob(v) => hex::encode(v),
    }
}
