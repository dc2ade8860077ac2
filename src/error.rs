use std::error::Error;
use std::fmt;

/// Crate error type for parcel queries and geometry decoding.
#[derive(Debug)]
pub enum ParcelError {
    /// Wraps errors returned by `rusqlite`.
    Sql(rusqlite::Error),
    /// Wraps errors returned by the `wkb` crate.
    Wkb(wkb::error::WkbError),
    /// Geometry text was not a valid hexadecimal string.
    Hex(hex::FromHexError),
    /// Wraps JSON (de)serialization errors.
    Json(serde_json::Error),
    /// Wraps errors returned by the `csv` writer.
    Csv(csv::Error),
    /// Wraps filesystem errors.
    Io(std::io::Error),
    /// A geometry type outside of the OGC simple-features set was found.
    UnsupportedGeometryType(String),
    /// Invalid GeoPackage geometry flags byte.
    InvalidGpkgGeometryFlags(u8),
    /// Geometry blob is too short for the header it declares.
    InvalidGeometryLength {
        len: usize,
        minimum: usize,
    },
    /// Geometry collections nest deeper than the decoder accepts.
    GeometryTooDeep {
        limit: usize,
    },
    /// The geometry column held a value that is neither a blob nor text.
    UnexpectedGeometryValue(&'static str),
    /// The WKB decoder aborted on a malformed buffer.
    DecodePanicked,
    /// A required environment variable is not set.
    MissingConfig(&'static str),
    /// A saved-filter operation was called without a user id.
    MissingUserId,
}

impl fmt::Display for ParcelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::Wkb(err) => write!(f, "{err}"),
            Self::Hex(err) => write!(f, "invalid hex geometry: {err}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::Csv(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::UnsupportedGeometryType(ty) => write!(f, "unsupported geometry type: {ty}"),
            Self::InvalidGpkgGeometryFlags(flags) => {
                write!(f, "invalid gpkg geometry flags: {flags:#04x}")
            }
            Self::InvalidGeometryLength { len, minimum } => {
                write!(
                    f,
                    "invalid geometry length: got {len} bytes, expected at least {minimum}"
                )
            }
            Self::GeometryTooDeep { limit } => {
                write!(f, "geometry nests deeper than {limit} levels")
            }
            Self::UnexpectedGeometryValue(actual) => {
                write!(f, "expected blob or hex text geometry, got {actual}")
            }
            Self::DecodePanicked => write!(f, "geometry decoder aborted on malformed input"),
            Self::MissingConfig(key) => write!(f, "{key} is missing"),
            Self::MissingUserId => write!(f, "userId is required"),
        }
    }
}

impl Error for ParcelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            Self::Wkb(err) => Some(err),
            Self::Hex(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for ParcelError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<wkb::error::WkbError> for ParcelError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::Wkb(err)
    }
}

impl From<hex::FromHexError> for ParcelError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Hex(err)
    }
}

impl From<serde_json::Error> for ParcelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<csv::Error> for ParcelError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<std::io::Error> for ParcelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, ParcelError>;
