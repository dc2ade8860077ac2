use crate::error::{ParcelError, Result};
use std::path::PathBuf;

pub(crate) const DEFAULT_PARCEL_TABLE: &str = "dallas_parcels";
pub(crate) const DEFAULT_SAVED_FILTERS_PATH: &str = "data/saved_filters.json";

/// Runtime configuration read from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Path of the SQLite database holding the parcel table.
    pub database_path: PathBuf,
    /// Name of the parcel table.
    pub parcel_table: String,
    /// JSON file backing [`crate::SavedFilterStore`].
    pub saved_filters_path: PathBuf,
}

impl Config {
    /// Load configuration from process environment variables.
    ///
    /// - `DATABASE_URL` (required): database path, optionally prefixed with `sqlite://`.
    /// - `PARCEL_TABLE` (default `dallas_parcels`).
    /// - `SAVED_FILTERS_PATH` (default `data/saved_filters.json`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            non_empty("DATABASE_URL").ok_or(ParcelError::MissingConfig("DATABASE_URL"))?;
        let database_url = database_url.trim();
        let database_path = database_url
            .strip_prefix("sqlite://")
            .unwrap_or(database_url);

        Ok(Self {
            database_path: PathBuf::from(database_path),
            parcel_table: non_empty("PARCEL_TABLE")
                .unwrap_or_else(|| DEFAULT_PARCEL_TABLE.to_string()),
            saved_filters_path: non_empty("SAVED_FILTERS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVED_FILTERS_PATH)),
        })
    }
}
