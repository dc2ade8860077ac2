// Column names of the parcel table. SELECT always lists them in this order.
pub(crate) const COLUMN_ID: &str = "sl_uuid";
pub(crate) const COLUMN_ADDRESS: &str = "address";
pub(crate) const COLUMN_COUNTY: &str = "county";
pub(crate) const COLUMN_SQFT: &str = "sqft";
pub(crate) const COLUMN_TOTAL_VALUE: &str = "total_value";
pub(crate) const COLUMN_GEOMETRY: &str = "geom";

pub(crate) const PARCEL_COLUMNS: [&str; 6] = [
    COLUMN_ID,
    COLUMN_ADDRESS,
    COLUMN_COUNTY,
    COLUMN_SQFT,
    COLUMN_TOTAL_VALUE,
    COLUMN_GEOMETRY,
];

// The CSV export omits the geometry.
pub(crate) const CSV_COLUMNS: [&str; 5] = [
    COLUMN_ID,
    COLUMN_ADDRESS,
    COLUMN_COUNTY,
    COLUMN_SQFT,
    COLUMN_TOTAL_VALUE,
];

/// Quote an identifier, doubling embedded quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!(r#""{}""#, name.replace('"', r#""""#))
}

pub(crate) fn sql_select_parcels(
    table: &str,
    where_clause: Option<&str>,
    limit_placeholder: usize,
) -> String {
    let columns = PARCEL_COLUMNS
        .iter()
        .map(|name| quote_identifier(name))
        .collect::<Vec<String>>()
        .join(", ");
    let table = quote_identifier(table);

    match where_clause {
        Some(clause) => {
            format!("SELECT {columns} FROM {table} WHERE {clause} LIMIT ?{limit_placeholder}")
        }
        None => format!("SELECT {columns} FROM {table} LIMIT ?{limit_placeholder}"),
    }
}

pub(crate) fn sql_create_parcels_table(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
  sl_uuid TEXT PRIMARY KEY,
  address TEXT,
  county TEXT,
  sqft DOUBLE,
  total_value INTEGER,
  geom BLOB
)",
        quote_identifier(table)
    )
}

/// Create the parcel table if it does not exist yet.
pub fn create_parcels_table(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&sql_create_parcels_table(table))
}

#[cfg(test)]
mod tests {
    use super::{quote_identifier, sql_select_parcels};

    #[test]
    fn select_without_where_clause() {
        let sql = sql_select_parcels("dallas_parcels", None, 1);
        assert_eq!(
            sql,
            concat!(
                r#"SELECT "sl_uuid", "address", "county", "sqft", "total_value", "geom" "#,
                r#"FROM "dallas_parcels" LIMIT ?1"#,
            )
        );
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn select_with_where_clause() {
        let sql = sql_select_parcels("dallas_parcels", Some("LOWER(county) = ?1"), 2);
        assert!(sql.ends_with(r#"FROM "dallas_parcels" WHERE LOWER(county) = ?1 LIMIT ?2"#));
    }

    #[test]
    fn identifiers_escape_quotes() {
        assert_eq!(quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }
}
