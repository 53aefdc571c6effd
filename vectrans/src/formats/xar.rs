//! Xara XAR documents.
//!
//! After an 8 byte signature the file is a flat sequence of records, each a
//! little-endian `{u32 tag, u32 size}` header and `size` payload bytes.
//! `DOWN` and `UP` records open and close the child list of the record
//! before them. Records between `STARTCOMPRESSION` and `ENDCOMPRESSION`
//! are stored as one raw deflate stream. Lengths are millipoints, the
//! origin is the lower-left page corner with y up.

mod import;
mod parser;

pub use import::XarImporter;

pub(crate) const SIGNATURE: &[u8; 8] = b"XARA\xa3\xa3\r\n";

/// Millipoints per point.
pub(crate) const MILLIPOINTS: f64 = 1000.0;

pub(crate) mod tag {
    pub const UP: u32 = 0;
    pub const DOWN: u32 = 1;
    pub const FILE_HEADER: u32 = 2;
    pub const END_OF_FILE: u32 = 3;

    pub const START_COMPRESSION: u32 = 30;
    pub const END_COMPRESSION: u32 = 31;

    pub const DOCUMENT: u32 = 40;
    pub const CHAPTER: u32 = 41;
    pub const SPREAD: u32 = 42;
    pub const LAYER: u32 = 43;
    pub const SPREAD_INFORMATION: u32 = 45;
    pub const LAYER_DETAILS: u32 = 48;

    pub const DEFINE_RGB_COLOUR: u32 = 50;
    pub const DEFINE_COMPLEX_COLOUR: u32 = 51;

    pub const PATH: u32 = 100;
    pub const PATH_FILLED_STROKED: u32 = 103;
    pub const GROUP: u32 = 104;
    pub const PATH_RELATIVE: u32 = 113;
    pub const PATH_RELATIVE_FILLED: u32 = 114;
    pub const PATH_RELATIVE_STROKED: u32 = 115;
    pub const PATH_RELATIVE_FILLED_STROKED: u32 = 116;

    pub const FLAT_FILL: u32 = 150;
    pub const LINE_COLOUR: u32 = 151;
    pub const LINE_WIDTH: u32 = 152;
    pub const START_CAP: u32 = 174;
    pub const JOIN_STYLE: u32 = 176;
    pub const MITRE_LIMIT: u32 = 177;
    pub const WINDING_RULE: u32 = 178;

    pub const FLAT_FILL_NONE: u32 = 190;
    pub const FLAT_FILL_BLACK: u32 = 191;
    pub const FLAT_FILL_WHITE: u32 = 192;
    pub const LINE_COLOUR_NONE: u32 = 193;
    pub const LINE_COLOUR_BLACK: u32 = 194;
    pub const LINE_COLOUR_WHITE: u32 = 195;
}

pub fn check(data: &[u8]) -> bool {
    data.starts_with(SIGNATURE)
}
