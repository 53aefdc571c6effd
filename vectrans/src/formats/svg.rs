//! SVG 1.1 static drawings.
//!
//! Import builds an element tree with quick-xml and walks it with inherited
//! style and transform state. Export writes one `g` per layer of the first
//! page, with coordinates in points.

mod colors;
mod export;
mod import;
mod path_data;
mod style;
mod transform;
mod xml;

pub use export::{SvgExporter, SvgOptions};
pub use import::SvgImporter;

/// Bytes sniffed by [`check`].
const CHECK_WINDOW: usize = 4096;

/// XML text with an `svg` root element near the top.
pub fn check(data: &[u8]) -> bool {
    let head = &data[..data.len().min(CHECK_WINDOW)];
    let head = String::from_utf8_lossy(head);
    let trimmed = head.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with('<') && head.contains("<svg")
}

#[cfg(test)]
mod tests;
