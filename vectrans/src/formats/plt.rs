//! HPGL plotter files, the subset used by cutting plotters.
//!
//! A file is a sequence of `;` terminated two letter commands. `IN` starts
//! the job, `PU`/`PD` move with the pen up or down. One plotter unit is
//! 1/40 mm, the origin is the lower-left page corner.

mod export;
mod import;
mod parser;

pub use export::{PltExporter, PltOptions};
pub use import::PltImporter;

/// Plotter units per millimeter.
pub const UNITS_PER_MM: f64 = 40.0;

/// Size of one plotter unit in points.
pub const PT_PER_UNIT: f64 = 72.0 / 25.4 / UNITS_PER_MM;

/// Bytes sniffed by [`check`].
const CHECK_WINDOW: usize = 512;

/// Plain text starting with a command and containing `IN;` near the top.
pub fn check(data: &[u8]) -> bool {
    let head = &data[..data.len().min(CHECK_WINDOW)];
    if !head.is_ascii() {
        return false;
    }
    let first = head.iter().find(|b| !b.is_ascii_whitespace());
    first.is_some_and(u8::is_ascii_alphabetic) && head.windows(3).any(|w| w == b"IN;")
}
