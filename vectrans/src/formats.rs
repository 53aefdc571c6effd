//! Format detection and import/export dispatch.
//!
//! | Format | Import | Export |
//! |--------|--------|--------|
//! | CGM    | yes    | yes    |
//! | WMF    | yes    | no     |
//! | CDR    | yes    | no     |
//! | XAR    | yes    | no     |
//! | sK1    | yes    | no     |
//! | SVG    | yes    | yes    |
//! | PLT    | yes    | yes    |

use crate::{
    diag::Session,
    error::{ConvertError, Result},
    model::{
        style::{Stroke, DEFAULT_MITER_LIMIT, DEFAULT_STROKE_WIDTH},
        DocOrigin, Document, NodeId, PageFormat,
    },
};
use educe::Educe;

pub mod cgm;
pub mod cdr;
pub mod plt;
pub mod sk1;
pub mod svg;
pub mod wmf;
pub mod xar;

mod reader;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    Cgm,
    Wmf,
    Cdr,
    Xar,
    Sk1,
    Svg,
    Plt,
}

impl Format {
    pub fn can_export(self) -> bool {
        matches!(self, Self::Cgm | Self::Svg | Self::Plt)
    }
}

/// Sniff the format from the stream signature.
pub fn detect(data: &[u8]) -> Option<Format> {
    if cgm::check(data) {
        Some(Format::Cgm)
    } else if wmf::check(data) {
        Some(Format::Wmf)
    } else if cdr::check(data) {
        Some(Format::Cdr)
    } else if xar::check(data) {
        Some(Format::Xar)
    } else if sk1::check(data) {
        Some(Format::Sk1)
    } else if svg::check(data) {
        Some(Format::Svg)
    } else if plt::check(data) {
        Some(Format::Plt)
    } else {
        None
    }
}

/// Settings shared by importers, immutable during a run.
#[derive(Debug, Clone, PartialEq, Educe)]
#[educe(Default)]
pub struct ImportDefaults {
    /// Page format when the source does not give one.
    pub page_format: PageFormat,
    #[educe(Default(expression = DEFAULT_STROKE_WIDTH))]
    pub stroke_width: f64,
    #[educe(Default(expression = DEFAULT_MITER_LIMIT))]
    pub miter_limit: f64,
}

impl ImportDefaults {
    /// Default stroke of imported outlines.
    pub fn stroke(&self) -> Stroke {
        Stroke {
            width: self.stroke_width,
            miter_limit: self.miter_limit,
            ..Default::default()
        }
    }
}

/// New document with one page holding one layer, returns page and layer.
fn new_document(format: PageFormat, origin: DocOrigin) -> Result<(Document, NodeId, NodeId)> {
    let mut doc = Document::new();
    doc.origin = origin;
    doc.page_format = format;
    let page = doc.add_page(None);
    let layer = doc.add_layer(page, "Layer 1")?;
    Ok((doc, page, layer))
}

pub trait Importer {
    fn import(&self, data: &[u8], session: &mut Session) -> Result<Document>;
}

pub trait Exporter {
    fn export(&self, doc: &Document, session: &mut Session) -> Result<Vec<u8>>;
}

/// Import with default options.
pub fn import(format: Format, data: &[u8], session: &mut Session) -> Result<Document> {
    let defaults = ImportDefaults::default();
    match format {
        Format::Cgm => cgm::CgmImporter::new(defaults).import(data, session),
        Format::Wmf => wmf::WmfImporter::new(defaults).import(data, session),
        Format::Cdr => cdr::CdrImporter::new(defaults).import(data, session),
        Format::Xar => xar::XarImporter::new(defaults).import(data, session),
        Format::Sk1 => sk1::Sk1Importer::new(defaults).import(data, session),
        Format::Svg => svg::SvgImporter::new(defaults).import(data, session),
        Format::Plt => plt::PltImporter::new(defaults).import(data, session),
    }
}

/// Export with default options.
pub fn export(format: Format, doc: &Document, session: &mut Session) -> Result<Vec<u8>> {
    match format {
        Format::Cgm => cgm::CgmExporter::default().export(doc, session),
        Format::Svg => svg::SvgExporter::default().export(doc, session),
        Format::Plt => plt::PltExporter::default().export(doc, session),
        Format::Wmf | Format::Cdr | Format::Xar | Format::Sk1 => {
            Err(ConvertError::unsupported(format!("{format} export")))
        }
    }
}
