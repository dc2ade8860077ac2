//! Structural check of a WKB buffer before it reaches the `wkb` reader.
//!
//! The reader sizes its vectors from the counts declared in the buffer and recurses
//! once per nested collection. Both are bounded here: every declared count must fit
//! in the bytes that remain, and collections may nest at most [`MAX_DEPTH`] levels.

use crate::error::{ParcelError, Result};

/// Deepest nesting of multi-geometries and collections that is decoded.
pub(crate) const MAX_DEPTH: usize = 32;

const HEADER_LEN: usize = 5;
const COUNT_LEN: usize = 4;
const SRID_LEN: usize = 4;

const EWKB_FLAG_Z: u32 = 0x8000_0000;
const EWKB_FLAG_M: u32 = 0x4000_0000;
const EWKB_FLAG_SRID: u32 = 0x2000_0000;

/// Walk every header, count and coordinate run in `buf`.
pub(crate) fn check_wkb_layout(buf: &[u8]) -> Result<()> {
    let mut cursor = Cursor { buf, pos: 0 };
    cursor.geometry(0)
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

#[derive(Clone, Copy)]
struct Header {
    little_endian: bool,
    kind: u32,
    dims: usize,
}

impl Cursor<'_> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn require(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(ParcelError::InvalidGeometryLength {
                len: self.buf.len(),
                minimum: self.pos.saturating_add(needed),
            });
        }
        Ok(())
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.require(len)?;
        self.pos += len;
        Ok(())
    }

    fn read_u32(&mut self, little_endian: bool) -> Result<u32> {
        self.require(4)?;
        let word = [
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ];
        self.pos += 4;
        Ok(if little_endian {
            u32::from_le_bytes(word)
        } else {
            u32::from_be_bytes(word)
        })
    }

    fn header(&mut self) -> Result<Header> {
        self.require(HEADER_LEN)?;
        let little_endian = match self.buf[self.pos] {
            0 => false,
            1 => true,
            other => {
                return Err(ParcelError::UnsupportedGeometryType(format!(
                    "byte order {other:#04x}"
                )));
            }
        };
        self.pos += 1;

        let word = self.read_u32(little_endian)?;
        let flags = word & (EWKB_FLAG_Z | EWKB_FLAG_M | EWKB_FLAG_SRID);
        let code = word & !flags;
        let (kind, iso_dims) = (code % 1000, code / 1000);
        let (has_z, has_m) = match iso_dims {
            0 => (flags & EWKB_FLAG_Z != 0, flags & EWKB_FLAG_M != 0),
            1 => (true, false),
            2 => (false, true),
            3 => (true, true),
            _ => return Err(ParcelError::UnsupportedGeometryType(format!("wkb type {word}"))),
        };
        if flags & EWKB_FLAG_SRID != 0 {
            self.skip(SRID_LEN)?;
        }

        Ok(Header {
            little_endian,
            kind,
            dims: 2 + usize::from(has_z) + usize::from(has_m),
        })
    }

    // Read a count and check that `count` items of at least `min_item_len` bytes fit.
    fn count(&mut self, header: Header, min_item_len: usize) -> Result<usize> {
        let count = self.read_u32(header.little_endian)? as usize;
        self.require(count.saturating_mul(min_item_len))?;
        Ok(count)
    }

    fn coords(&mut self, header: Header) -> Result<()> {
        let coord_len = header.dims * 8;
        let count = self.count(header, coord_len)?;
        self.skip(count * coord_len)
    }

    fn geometry(&mut self, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(ParcelError::GeometryTooDeep { limit: MAX_DEPTH });
        }
        let header = self.header()?;
        match header.kind {
            1 => self.skip(header.dims * 8),
            2 => self.coords(header),
            3 => {
                let rings = self.count(header, COUNT_LEN)?;
                for _ in 0..rings {
                    self.coords(header)?;
                }
                Ok(())
            }
            4..=7 => {
                let parts = self.count(header, HEADER_LEN)?;
                for _ in 0..parts {
                    self.geometry(depth + 1)?;
                }
                Ok(())
            }
            other => Err(ParcelError::UnsupportedGeometryType(format!("wkb type {other}"))),
        }
    }
}
