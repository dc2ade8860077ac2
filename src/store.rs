use crate::error::{ParcelError, Result};
use crate::geometry::RawGeometry;
use crate::sql::COLUMN_GEOMETRY;
use rusqlite::params_from_iter;
use rusqlite::types::{FromSql, FromSqlError, Value, ValueRef};
use std::sync::Arc;

/// Anything that can run a parameterized `SELECT` and hand back rows.
///
/// Parameters are positional: `params[0]` binds to `?1`.
pub trait ParcelStore {
    fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<ParcelRow>>;
}

impl ParcelStore for rusqlite::Connection {
    fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<ParcelRow>> {
        let mut stmt = self.prepare(sql)?;
        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut values = Vec::with_capacity(columns.len());
                for idx in 0..columns.len() {
                    values.push(row.get::<_, Value>(idx)?);
                }
                Ok(ParcelRow {
                    columns: Arc::clone(&columns),
                    values,
                })
            })?
            .collect::<std::result::Result<Vec<ParcelRow>, _>>()?;

        Ok(rows)
    }
}

/// One result row: column names and owned values, in select order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParcelRow {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl ParcelRow {
    /// Build a row from parallel name/value lists. Extra values are dropped.
    pub fn new<I>(columns: &[&str], values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let columns: Arc<[String]> = columns.iter().map(|name| name.to_string()).collect();
        let values = values.into_iter().take(columns.len()).collect();
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|column| column == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Read a column using rusqlite's `FromSql` conversion.
    pub fn property<T: FromSql>(&self, name: &str) -> Result<T> {
        let idx = self
            .columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| ParcelError::Sql(rusqlite::Error::InvalidColumnName(name.to_string())))?;
        let value_ref = self
            .values
            .get(idx)
            .map(ValueRef::from)
            .unwrap_or(ValueRef::Null);

        FromSql::column_result(value_ref).map_err(|err| match err {
            FromSqlError::InvalidType => ParcelError::Sql(rusqlite::Error::InvalidColumnType(
                idx,
                name.to_string(),
                value_ref.data_type(),
            )),
            FromSqlError::OutOfRange(i) => {
                ParcelError::Sql(rusqlite::Error::IntegralValueOutOfRange(idx, i))
            }
            other => ParcelError::Sql(rusqlite::Error::FromSqlConversionFailure(
                idx,
                value_ref.data_type(),
                Box::new(other),
            )),
        })
    }

    /// The geometry column, if the row has one and it is not `NULL`.
    pub fn geometry(&self) -> Result<Option<RawGeometry<'_>>> {
        match self.value(COLUMN_GEOMETRY) {
            Some(value) => RawGeometry::from_value(value),
            None => Ok(None),
        }
    }

    /// Identifier column as text, for log messages.
    pub(crate) fn label(&self) -> String {
        match self.value(crate::sql::COLUMN_ID) {
            Some(Value::Text(id)) => id.clone(),
            Some(Value::Integer(id)) => id.to_string(),
            _ => String::from("?"),
        }
    }
}
