//! Translate vector graphics documents between external file formats and
//! one canonical scene-graph model.
//!
//! Import turns a byte stream into a [`model::Document`], export walks a
//! document and writes a format back out. See [`formats`] for the
//! supported formats.

pub mod color;
pub mod diag;
mod error;
pub mod formats;
pub mod geom;
pub mod model;

pub use error::{ConvertError, Result};
pub use formats::{detect, export, import, Format};
