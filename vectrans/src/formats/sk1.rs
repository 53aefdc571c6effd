//! Sketch and sK1 documents.
//!
//! Plain text: a `##Sketch` or `##sK1` header line, then one call per line
//! such as `r(100, 0, 0, 50, 10, 20)`. Arguments are numbers, quoted
//! strings, names and parenthesized or bracketed sequences, optionally
//! as `key=value`. Style calls (`fp`, `lw`, ...) set up the style taken by
//! the next object, `G()`/`G_()` bracket groups. Lengths are points, the
//! origin is the lower-left page corner with y up.

mod import;
mod parser;

pub use import::Sk1Importer;

use phf::phf_map;

const MM: f64 = 72.0 / 25.4;
const INCH: f64 = 72.0;

/// Named page sizes in points, portrait.
static PAGE_FORMATS: phf::Map<&'static str, (f64, f64)> = phf_map! {
    "A0" => (841.0 * MM, 1189.0 * MM),
    "A1" => (594.0 * MM, 841.0 * MM),
    "A2" => (420.0 * MM, 594.0 * MM),
    "A3" => (297.0 * MM, 420.0 * MM),
    "A4" => (210.0 * MM, 297.0 * MM),
    "A5" => (148.0 * MM, 210.0 * MM),
    "A6" => (105.0 * MM, 148.0 * MM),
    "B4" => (250.0 * MM, 353.0 * MM),
    "B5" => (176.0 * MM, 250.0 * MM),
    "Letter" => (8.5 * INCH, 11.0 * INCH),
    "Legal" => (8.5 * INCH, 14.0 * INCH),
    "Ledger" => (11.0 * INCH, 17.0 * INCH),
    "Executive" => (7.5 * INCH, 10.0 * INCH),
};

pub fn check(data: &[u8]) -> bool {
    data.starts_with(b"##Sketch") || data.starts_with(b"##sK1")
}
