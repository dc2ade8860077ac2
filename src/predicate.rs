//! Parameterized WHERE clause construction.
//!
//! Conditions are appended in a fixed order (authorization, min price, max price,
//! min area, max area). Each condition carries exactly one `?N` placeholder whose
//! index is derived from the number of conditions already accumulated, so the
//! N-th fragment always binds the N-th value. The row limit is bound last.

use crate::filter::{FilterSpec, LimitPolicy, finite};
use crate::sql::{COLUMN_COUNTY, COLUMN_SQFT, COLUMN_TOTAL_VALUE, sql_select_parcels};
use rusqlite::types::Value;

/// County visible to unauthenticated callers.
pub const PUBLIC_COUNTY: &str = "dallas";

/// One accumulated condition and the value bound at its placeholder.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub sql: String,
    pub value: Value,
}

/// Ordered conditions produced by [`PredicateBuilder`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterClause {
    predicates: Vec<Predicate>,
}

impl FilterClause {
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// SQL fragments in placeholder order.
    pub fn conditions(&self) -> impl Iterator<Item = &str> {
        self.predicates.iter().map(|p| p.sql.as_str())
    }

    /// Bind values in placeholder order.
    pub fn values(&self) -> Vec<Value> {
        self.predicates.iter().map(|p| p.value.clone()).collect()
    }

    /// Conditions joined with `AND`, or `None` when there is nothing to filter on.
    ///
    /// `None` means the query has no `WHERE` at all, which is distinct from an
    /// always-true clause.
    pub fn where_clause(&self) -> Option<String> {
        if self.predicates.is_empty() {
            None
        } else {
            Some(self.conditions().collect::<Vec<&str>>().join(" AND "))
        }
    }

    /// Index of the placeholder following the last condition.
    pub fn next_placeholder(&self) -> usize {
        self.predicates.len() + 1
    }
}

/// Accumulates conditions for a [`FilterSpec`].
#[derive(Debug, Default)]
pub struct PredicateBuilder {
    predicates: Vec<Predicate>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the clause for `spec`. Never fails.
    ///
    /// ```
    /// use parcel_query::{FilterSpec, PredicateBuilder};
    ///
    /// let spec = FilterSpec {
    ///     min_price: Some(100.9),
    ///     ..Default::default()
    /// };
    /// let clause = PredicateBuilder::from_spec(&spec);
    /// assert_eq!(
    ///     clause.where_clause().as_deref(),
    ///     Some("LOWER(county) = ?1 AND total_value >= ?2")
    /// );
    /// ```
    pub fn from_spec(spec: &FilterSpec) -> FilterClause {
        let mut builder = Self::new();

        if !spec.authenticated {
            builder.push(
                |idx| format!("LOWER({COLUMN_COUNTY}) = ?{idx}"),
                Value::Text(PUBLIC_COUNTY.to_string()),
            );
        }
        if let Some(min_price) = finite(spec.min_price) {
            builder.push(
                |idx| format!("{COLUMN_TOTAL_VALUE} >= ?{idx}"),
                Value::Integer(floor_price(min_price)),
            );
        }
        if let Some(max_price) = finite(spec.max_price) {
            builder.push(
                |idx| format!("{COLUMN_TOTAL_VALUE} <= ?{idx}"),
                Value::Integer(floor_price(max_price)),
            );
        }
        // sqft is nullable; a bare comparison against NULL would silently drop the row
        // either way, so the guard is spelled out per bound.
        if let Some(min_sqft) = finite(spec.min_sqft) {
            builder.push(
                |idx| format!("({COLUMN_SQFT} IS NOT NULL AND {COLUMN_SQFT} >= ?{idx})"),
                Value::Real(min_sqft),
            );
        }
        if let Some(max_sqft) = finite(spec.max_sqft) {
            builder.push(
                |idx| format!("({COLUMN_SQFT} IS NOT NULL AND {COLUMN_SQFT} <= ?{idx})"),
                Value::Real(max_sqft),
            );
        }

        builder.finish()
    }

    /// Append a condition. `fragment` receives the placeholder index to use.
    pub fn push<F>(&mut self, fragment: F, value: Value) -> &mut Self
    where
        F: FnOnce(usize) -> String,
    {
        let idx = self.predicates.len() + 1;
        self.predicates.push(Predicate {
            sql: fragment(idx),
            value,
        });
        self
    }

    pub fn finish(self) -> FilterClause {
        FilterClause {
            predicates: self.predicates,
        }
    }
}

fn floor_price(value: f64) -> i64 {
    value.floor() as i64
}

/// A complete parcel `SELECT` with its positional parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ParcelQuery {
    pub sql: String,
    /// Condition values followed by the limit.
    pub params: Vec<Value>,
    pub limit: u32,
    pub clause: FilterClause,
}

impl ParcelQuery {
    pub fn new(table: &str, spec: &FilterSpec, policy: LimitPolicy) -> Self {
        let clause = PredicateBuilder::from_spec(spec);
        let limit = policy.resolve(spec.limit);
        let limit_placeholder = clause.next_placeholder();

        let sql = sql_select_parcels(table, clause.where_clause().as_deref(), limit_placeholder);
        let mut params = clause.values();
        params.push(Value::Integer(i64::from(limit)));

        Self {
            sql,
            params,
            limit,
            clause,
        }
    }

    /// Placeholder index the limit is bound to.
    pub fn limit_placeholder(&self) -> usize {
        self.clause.next_placeholder()
    }
}
