//! CorelDRAW documents, versions 6 to X3 (`CDR6`..`CDRD`).
//!
//! The file is a RIFF tree. Property chunks (`fild`, `outl`, `font`) are
//! keyed by id and referenced from the `loda` chunk of each object. Lengths
//! are 1e-4 mm, the origin is the page center with y up.

mod import;
mod loda;
mod props;

pub use import::CdrImporter;

use crate::formats::reader::RecordReader;
use riff_parser::{Chunk, FourCC, RIFF};

/// Points per CDR unit.
pub(crate) const UNIT_TO_PT: f64 = 72.0 / 25.4 / 10_000.0;

/// Argument types of a `loda` chunk.
pub(crate) mod arg {
    pub const OUTL: u32 = 10;
    pub const FILD: u32 = 20;
    pub const COORDS: u32 = 30;
    pub const STLT: u32 = 200;
    pub const NAME: u32 = 1000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Version(u8);

impl Version {
    pub const V6: Self = Self(6);
    pub const V7: Self = Self(7);
    pub const V13: Self = Self(13);

    /// `CDR6`..`CDR9`, then `CDRA`..`CDRD` for 10 to 13.
    pub fn from_form(form: FourCC) -> Option<Self> {
        match form {
            [b'C', b'D', b'R', v @ b'6'..=b'9'] => Some(Self(v - b'0')),
            [b'C', b'D', b'R', v @ b'A'..=b'D'] => Some(Self(v - b'A' + 10)),
            _ => None,
        }
    }

    /// Strings are UTF-16 from version 10 on.
    pub fn is_unicode(self) -> bool {
        self.0 >= 10
    }
}

/// Cursor over a data chunk payload, errors name the chunk and its offset.
pub(crate) fn chunk_reader(chunk: &Chunk) -> RecordReader<'_> {
    RecordReader::new(&chunk.data, chunk.offset + 8, u32::from_be_bytes(chunk.id))
}

/// Size value in points.
pub(crate) fn size_value(r: &mut RecordReader) -> crate::Result<f64> {
    Ok(f64::from(r.le_i32()?) * UNIT_TO_PT)
}

/// String stored to the end of a chunk, NUL padded.
pub(crate) fn chunk_string(bytes: &[u8], version: Version) -> String {
    if version.is_unicode() {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .take_while(|c| *c != 0)
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| char::from(*b))
            .collect()
    }
}

/// RIFF stream of any CorelDRAW form, the version is checked on import.
pub fn check(data: &[u8]) -> bool {
    data.len() >= 12 && data[..4] == RIFF && &data[8..11] == b"CDR"
}
