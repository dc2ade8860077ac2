use crate::error::{ParcelError, Result};
use rusqlite::types::{Value, ValueRef};
use std::borrow::Cow;

const GPKG_MAGIC: &[u8; 2] = b"GP";
const GPKG_HEADER_LEN: usize = 8;

/// Geometry value as it arrives from the store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawGeometry<'a> {
    /// Binary buffer, used as is.
    Bytes(&'a [u8]),
    /// Hexadecimal digits, optionally prefixed with `\x` or `0x`.
    Hex(&'a str),
}

impl<'a> RawGeometry<'a> {
    /// Interpret a column value. `NULL` means the row has no geometry.
    pub fn from_value(value: &'a Value) -> Result<Option<Self>> {
        Self::from_value_ref(ValueRef::from(value))
    }

    pub fn from_value_ref(value: ValueRef<'a>) -> Result<Option<Self>> {
        match value {
            ValueRef::Null => Ok(None),
            ValueRef::Blob(bytes) => Ok(Some(Self::Bytes(bytes))),
            ValueRef::Text(text) => {
                let text = std::str::from_utf8(text)
                    .map_err(|_| ParcelError::UnexpectedGeometryValue("non-utf8 text"))?;
                Ok(Some(Self::Hex(text)))
            }
            ValueRef::Integer(_) => Err(ParcelError::UnexpectedGeometryValue("integer")),
            ValueRef::Real(_) => Err(ParcelError::UnexpectedGeometryValue("real")),
        }
    }

    /// Normalize to a byte buffer.
    pub fn to_bytes(&self) -> Result<Cow<'a, [u8]>> {
        match self {
            Self::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::Hex(text) => Ok(Cow::Owned(decode_hex(text)?)),
        }
    }
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let digits = text
        .strip_prefix("\\x")
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    Ok(hex::decode(digits)?)
}

/// Strip a GeoPackage binary header if present, leaving the WKB that follows.
///
/// EWKB SRIDs are left in place; the `wkb` reader understands them at every level.
pub(crate) fn wkb_payload(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.starts_with(GPKG_MAGIC) {
        return gpkg_geometry_to_wkb(bytes);
    }
    Ok(bytes)
}

// cf. https://www.geopackage.org/spec140/index.html#gpb_format
fn gpkg_geometry_to_wkb(b: &[u8]) -> Result<&[u8]> {
    if b.len() < GPKG_HEADER_LEN {
        return Err(ParcelError::InvalidGeometryLength {
            len: b.len(),
            minimum: GPKG_HEADER_LEN,
        });
    }
    let flags = b[3];
    let envelope_size: usize = match flags & 0b00001110 {
        0b00000000 => 0,  // no envelope
        0b00000010 => 32, // [minx, maxx, miny, maxy]
        0b00000100 => 48, // [minx, maxx, miny, maxy, minz, maxz]
        0b00000110 => 48, // [minx, maxx, miny, maxy, minm, maxm]
        0b00001000 => 64, // [minx, maxx, miny, maxy, minz, maxz, minm, maxm]
        _ => return Err(ParcelError::InvalidGpkgGeometryFlags(flags)),
    };
    let offset = GPKG_HEADER_LEN + envelope_size;
    if b.len() < offset {
        return Err(ParcelError::InvalidGeometryLength {
            len: b.len(),
            minimum: offset,
        });
    }

    Ok(&b[offset..])
}
