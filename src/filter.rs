//! Typed filter inputs.
//!
//! Every filter arrives as optional text. [`FilterSpec::from_query`] is the single
//! place where that text is coerced: anything that is not a usable number becomes
//! `None`, so nothing downstream ever sees raw strings or non-finite values.

/// Query keys of the filter input surface.
pub const KEY_AUTHENTICATED: &str = "isAuthenticated";
pub const KEY_LIMIT: &str = "limit";
pub const KEY_MIN_PRICE: &str = "minPrice";
pub const KEY_MAX_PRICE: &str = "maxPrice";
pub const KEY_MIN_SQFT: &str = "minSqft";
pub const KEY_MAX_SQFT: &str = "maxSqft";

/// Default and ceiling for the row cap of one kind of read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitPolicy {
    pub default: u32,
    pub ceiling: u32,
}

impl LimitPolicy {
    /// Interactive JSON reads.
    pub const INTERACTIVE: Self = Self {
        default: 50,
        ceiling: 200,
    };

    /// CSV export.
    pub const EXPORT: Self = Self {
        default: 5000,
        ceiling: 5000,
    };

    /// `min(requested ?? default, ceiling)`.
    pub fn resolve(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.default).min(self.ceiling)
    }
}

/// Validated set of optional constraints for one parcel query.
///
/// Bounds are `None` or finite. Prices are floored when the predicate is built,
/// areas are used as given.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSpec {
    pub authenticated: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_sqft: Option<f64>,
    pub max_sqft: Option<f64>,
    /// Requested row cap before the [`LimitPolicy`] is applied.
    pub limit: Option<u32>,
}

impl FilterSpec {
    /// Build a spec from `key=value` query pairs.
    ///
    /// Unknown keys are ignored and a repeated key keeps its last value. Values
    /// that do not parse are dropped rather than reported.
    ///
    /// ```
    /// use parcel_query::FilterSpec;
    ///
    /// let spec = FilterSpec::from_query([("minPrice", "100.9"), ("maxSqft", "abc")]);
    /// assert_eq!(spec.min_price, Some(100.9));
    /// assert_eq!(spec.max_sqft, None);
    /// assert!(!spec.authenticated);
    /// ```
    pub fn from_query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut spec = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                KEY_AUTHENTICATED => spec.authenticated = parse_flag(value),
                KEY_LIMIT => spec.limit = parse_limit(value),
                KEY_MIN_PRICE => spec.min_price = parse_bound(value),
                KEY_MAX_PRICE => spec.max_price = parse_bound(value),
                KEY_MIN_SQFT => spec.min_sqft = parse_bound(value),
                KEY_MAX_SQFT => spec.max_sqft = parse_bound(value),
                _ => {}
            }
        }
        spec
    }
}

/// Parse a number, returning `None` for blank, non-numeric or non-finite input.
pub fn parse_finite(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a range bound. Negative values are not meaningful for price or area.
pub fn parse_bound(raw: &str) -> Option<f64> {
    parse_finite(raw).filter(|v| *v >= 0.0)
}

/// Parse a requested row cap, flooring fractions. Negative input is dropped.
pub fn parse_limit(raw: &str) -> Option<u32> {
    let value = parse_finite(raw)?;
    if value < 0.0 {
        return None;
    }
    // Saturating cast; anything above u32::MAX is far past every ceiling.
    Some(value.floor() as u32)
}

/// Only an explicit `true` (or `1`) authenticates.
pub fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim();
    raw.eq_ignore_ascii_case("true") || raw == "1"
}

/// Keep a bound only when it is finite.
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
