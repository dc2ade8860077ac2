//! Per-user saved filters, persisted as one JSON object keyed by user id.

use crate::error::{ParcelError, Result};
use crate::filter::{FilterSpec, parse_finite};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Filter bounds a user saved. Unknown keys are kept as they were sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilters {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub min_sqft: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_sqft: Option<f64>,
    /// RFC 3339 time of the last save, in UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SavedFilters {
    /// Turn saved bounds into a query filter. Negative or non-finite bounds are dropped.
    pub fn to_filter_spec(&self, authenticated: bool) -> FilterSpec {
        let bound = |v: Option<f64>| v.filter(|v| v.is_finite() && *v >= 0.0);
        FilterSpec {
            authenticated,
            min_price: bound(self.min_price),
            max_price: bound(self.max_price),
            min_sqft: bound(self.min_sqft),
            max_sqft: bound(self.max_sqft),
            limit: None,
        }
    }
}

// Accept numbers and numeric strings; anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(s) => parse_finite(&s),
        _ => None,
    })
}

/// JSON file holding every user's [`SavedFilters`].
#[derive(Clone, Debug)]
pub struct SavedFilterStore {
    path: PathBuf,
}

impl SavedFilterStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Filters saved for `user_id`, or the empty set when there are none.
    ///
    /// Example:
    /// ```no_run
    /// use parcel_query::{SavedFilterStore, SavedFilters};
    ///
    /// let store = SavedFilterStore::new("data/saved_filters.json");
    /// store.save("user-1", &SavedFilters { min_price: Some(100000.0), ..Default::default() })?;
    /// let spec = store.load("user-1")?.to_filter_spec(false);
    /// assert_eq!(spec.min_price, Some(100000.0));
    /// # Ok::<(), parcel_query::ParcelError>(())
    /// ```
    pub fn load(&self, user_id: &str) -> Result<SavedFilters> {
        let user_id = normalize_user_id(user_id)?;
        let mut all = self.read_all()?;
        Ok(all.remove(user_id).unwrap_or_default())
    }

    /// Replace the filters saved for `user_id`, stamping `updatedAt`.
    pub fn save(&self, user_id: &str, filters: &SavedFilters) -> Result<()> {
        let user_id = normalize_user_id(user_id)?;
        let mut all = self.read_all()?;
        let mut filters = filters.clone();
        filters.updated_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        all.insert(user_id.to_string(), filters);
        self.write_all(&all)
    }

    fn read_all(&self) -> Result<BTreeMap<String, SavedFilters>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    // Write to a sibling temp file, then rename over the target.
    fn write_all(&self, all: &BTreeMap<String, SavedFilters>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, all)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|err| ParcelError::Io(err.error))?;
        Ok(())
    }
}

fn normalize_user_id(user_id: &str) -> Result<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ParcelError::MissingUserId);
    }
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::{SavedFilterStore, SavedFilters};
    use crate::error::ParcelError;

    #[test]
    fn missing_file_loads_empty_filters() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SavedFilterStore::new(dir.path().join("saved_filters.json"));
        assert_eq!(store.load("alice")?, SavedFilters::default());
        Ok(())
    }

    #[test]
    fn save_creates_directories_and_round_trips() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("data").join("saved_filters.json");
        let store = SavedFilterStore::new(&path);

        let alice = SavedFilters {
            min_price: Some(100000.0),
            max_sqft: Some(2500.0),
            ..Default::default()
        };
        store.save("alice", &alice)?;
        assert!(path.exists());

        let loaded = store.load("  alice ")?;
        assert!(loaded.updated_at.is_some());
        assert_eq!(
            SavedFilters {
                updated_at: None,
                ..loaded
            },
            alice
        );
        Ok(())
    }

    #[test]
    fn save_keeps_other_users() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SavedFilterStore::new(dir.path().join("saved_filters.json"));

        let alice = SavedFilters {
            min_price: Some(1.0),
            ..Default::default()
        };
        let bob = SavedFilters {
            max_price: Some(2.0),
            ..Default::default()
        };
        store.save("alice", &alice)?;
        store.save("bob", &bob)?;
        store.save(
            "alice",
            &SavedFilters {
                min_sqft: Some(3.0),
                ..Default::default()
            },
        )?;

        assert_eq!(store.load("bob")?.max_price, bob.max_price);
        assert_eq!(store.load("alice")?.min_price, None);
        assert_eq!(store.load("alice")?.min_sqft, Some(3.0));
        Ok(())
    }

    #[test]
    fn save_stamps_updated_at() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("saved_filters.json");
        let store = SavedFilterStore::new(&path);

        let stale = SavedFilters {
            updated_at: Some("2000-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        };
        store.save("alice", &stale)?;

        let stamp = store.load("alice")?.updated_at.unwrap_or_default();
        assert_ne!(stamp, "2000-01-01T00:00:00.000Z");
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
        assert!(stamp.ends_with('Z'));
        assert!(std::fs::read_to_string(&path)?.contains("\"updatedAt\""));
        Ok(())
    }

    #[test]
    fn blank_user_id_is_rejected() {
        let store = SavedFilterStore::new("unused.json");
        assert!(matches!(store.load("   "), Err(ParcelError::MissingUserId)));
        assert!(matches!(
            store.save("", &SavedFilters::default()),
            Err(ParcelError::MissingUserId)
        ));
    }

    #[test]
    fn empty_file_is_an_empty_store() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("saved_filters.json");
        std::fs::write(&path, "")?;
        let store = SavedFilterStore::new(&path);
        assert_eq!(store.load("alice")?, SavedFilters::default());
        Ok(())
    }

    #[test]
    fn reads_lenient_values_and_keeps_extra_keys() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("saved_filters.json");
        std::fs::write(
            &path,
            r#"{"alice": {
                "minPrice": "150000",
                "maxPrice": "lots",
                "minSqft": 900,
                "sortBy": "price"
            }}"#,
        )?;
        let store = SavedFilterStore::new(&path);

        let filters = store.load("alice")?;
        assert_eq!(filters.min_price, Some(150000.0));
        assert_eq!(filters.max_price, None);
        assert_eq!(filters.min_sqft, Some(900.0));
        assert_eq!(
            filters.extra.get("sortBy"),
            Some(&serde_json::Value::from("price"))
        );

        store.save("alice", &filters)?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.contains("\"sortBy\": \"price\""));
        assert!(!text.contains("maxPrice"));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_an_error() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("saved_filters.json");
        std::fs::write(&path, "{not json")?;
        let store = SavedFilterStore::new(&path);
        assert!(matches!(store.load("alice"), Err(ParcelError::Json(_))));
        Ok(())
    }

    #[test]
    fn converts_to_filter_spec() {
        let filters = SavedFilters {
            min_price: Some(100.9),
            max_price: Some(-5.0),
            min_sqft: Some(f64::NAN),
            max_sqft: Some(2000.0),
            ..Default::default()
        };
        let spec = filters.to_filter_spec(true);
        assert!(spec.authenticated);
        assert_eq!(spec.min_price, Some(100.9));
        assert_eq!(spec.max_price, None);
        assert_eq!(spec.min_sqft, None);
        assert_eq!(spec.max_sqft, Some(2000.0));
        assert_eq!(spec.limit, None);
    }
}
