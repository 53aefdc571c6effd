//! Binary encoded Computer Graphics Metafiles.
//!
//! Every element starts with a big-endian 16 bit header: class in bits
//! 15..12, id in bits 11..5 and the parameter length in bits 4..0. Ids
//! below are the header with the length bits masked out.

mod export;
mod import;
mod parser;
mod state;

pub use export::{CgmExporter, CgmOptions};
pub use import::CgmImporter;

pub(crate) mod id {
    pub const NOOP: u16 = 0x0000;
    pub const BEGIN_METAFILE: u16 = 0x0020;
    pub const END_METAFILE: u16 = 0x0040;
    pub const BEGIN_PICTURE: u16 = 0x0060;
    pub const BEGIN_PICTURE_BODY: u16 = 0x0080;
    pub const END_PICTURE: u16 = 0x00a0;
    pub const BEGIN_FIGURE: u16 = 0x0100;
    pub const END_FIGURE: u16 = 0x0120;

    pub const METAFILE_VERSION: u16 = 0x1020;
    pub const METAFILE_DESCRIPTION: u16 = 0x1040;
    pub const VDC_TYPE: u16 = 0x1060;
    pub const INTEGER_PRECISION: u16 = 0x1080;
    pub const REAL_PRECISION: u16 = 0x10a0;
    pub const INDEX_PRECISION: u16 = 0x10c0;
    pub const COLOUR_PRECISION: u16 = 0x10e0;
    pub const COLOUR_INDEX_PRECISION: u16 = 0x1100;
    pub const MAXIMUM_COLOUR_INDEX: u16 = 0x1120;
    pub const COLOUR_VALUE_EXTENT: u16 = 0x1140;
    pub const METAFILE_ELEMENT_LIST: u16 = 0x1160;
    pub const METAFILE_DEFAULTS_REPLACEMENT: u16 = 0x1180;
    pub const FONT_LIST: u16 = 0x11a0;

    pub const SCALING_MODE: u16 = 0x2020;
    pub const COLOUR_SELECTION_MODE: u16 = 0x2040;
    pub const LINE_WIDTH_MODE: u16 = 0x2060;
    pub const MARKER_SIZE_MODE: u16 = 0x2080;
    pub const EDGE_WIDTH_MODE: u16 = 0x20a0;
    pub const VDC_EXTENT: u16 = 0x20c0;
    pub const BACKGROUND_COLOUR: u16 = 0x20e0;

    pub const VDC_INTEGER_PRECISION: u16 = 0x3020;
    pub const VDC_REAL_PRECISION: u16 = 0x3040;

    pub const POLYLINE: u16 = 0x4020;
    pub const DISJOINT_POLYLINE: u16 = 0x4040;
    pub const POLYMARKER: u16 = 0x4060;
    pub const TEXT: u16 = 0x4080;
    pub const RESTRICTED_TEXT: u16 = 0x40a0;
    pub const APPEND_TEXT: u16 = 0x40c0;
    pub const POLYGON: u16 = 0x40e0;
    pub const POLYGON_SET: u16 = 0x4100;
    pub const CELL_ARRAY: u16 = 0x4120;
    pub const GDP: u16 = 0x4140;
    pub const RECTANGLE: u16 = 0x4160;
    pub const CIRCLE: u16 = 0x4180;
    pub const ARC_3_POINT: u16 = 0x41a0;
    pub const ARC_3_POINT_CLOSE: u16 = 0x41c0;
    pub const ARC_CENTRE: u16 = 0x41e0;
    pub const ARC_CENTRE_CLOSE: u16 = 0x4200;
    pub const ELLIPSE: u16 = 0x4220;
    pub const ELLIPTICAL_ARC: u16 = 0x4240;
    pub const ELLIPTICAL_ARC_CLOSE: u16 = 0x4260;

    pub const LINE_TYPE: u16 = 0x5040;
    pub const LINE_WIDTH: u16 = 0x5060;
    pub const LINE_COLOUR: u16 = 0x5080;
    pub const TEXT_FONT_INDEX: u16 = 0x5140;
    pub const TEXT_COLOUR: u16 = 0x51c0;
    pub const CHARACTER_HEIGHT: u16 = 0x51e0;
    pub const TEXT_ALIGNMENT: u16 = 0x5240;
    pub const INTERIOR_STYLE: u16 = 0x52c0;
    pub const FILL_COLOUR: u16 = 0x52e0;
    pub const HATCH_INDEX: u16 = 0x5300;
    pub const EDGE_TYPE: u16 = 0x5360;
    pub const EDGE_WIDTH: u16 = 0x5380;
    pub const EDGE_COLOUR: u16 = 0x53a0;
    pub const EDGE_VISIBILITY: u16 = 0x53c0;
    pub const COLOUR_TABLE: u16 = 0x5440;

    pub const ESCAPE: u16 = 0x6020;
    pub const APPLICATION_DATA: u16 = 0x7040;
}

/// Element names for logging.
static NAMES: phf::Map<u16, &'static str> = phf::phf_map! {
    0x0000u16 => "NO-OP",
    0x0020u16 => "BEGIN METAFILE",
    0x0040u16 => "END METAFILE",
    0x0060u16 => "BEGIN PICTURE",
    0x0080u16 => "BEGIN PICTURE BODY",
    0x00a0u16 => "END PICTURE",
    0x0100u16 => "BEGIN FIGURE",
    0x0120u16 => "END FIGURE",
    0x1020u16 => "METAFILE VERSION",
    0x1040u16 => "METAFILE DESCRIPTION",
    0x1060u16 => "VDC TYPE",
    0x1080u16 => "INTEGER PRECISION",
    0x10a0u16 => "REAL PRECISION",
    0x10c0u16 => "INDEX PRECISION",
    0x10e0u16 => "COLOUR PRECISION",
    0x1100u16 => "COLOUR INDEX PRECISION",
    0x1120u16 => "MAXIMUM COLOUR INDEX",
    0x1140u16 => "COLOUR VALUE EXTENT",
    0x1160u16 => "METAFILE ELEMENT LIST",
    0x1180u16 => "METAFILE DEFAULTS REPLACEMENT",
    0x11a0u16 => "FONT LIST",
    0x11c0u16 => "CHARACTER SET LIST",
    0x11e0u16 => "CHARACTER CODING ANNOUNCER",
    0x2020u16 => "SCALING MODE",
    0x2040u16 => "COLOUR SELECTION MODE",
    0x2060u16 => "LINE WIDTH SPECIFICATION MODE",
    0x2080u16 => "MARKER SIZE SPECIFICATION MODE",
    0x20a0u16 => "EDGE WIDTH SPECIFICATION MODE",
    0x20c0u16 => "VDC EXTENT",
    0x20e0u16 => "BACKGROUND COLOUR",
    0x3020u16 => "VDC INTEGER PRECISION",
    0x3040u16 => "VDC REAL PRECISION",
    0x3060u16 => "AUXILIARY COLOUR",
    0x3080u16 => "TRANSPARENCY",
    0x30a0u16 => "CLIP RECTANGLE",
    0x30c0u16 => "CLIP INDICATOR",
    0x4020u16 => "POLYLINE",
    0x4040u16 => "DISJOINT POLYLINE",
    0x4060u16 => "POLYMARKER",
    0x4080u16 => "TEXT",
    0x40a0u16 => "RESTRICTED TEXT",
    0x40c0u16 => "APPEND TEXT",
    0x40e0u16 => "POLYGON",
    0x4100u16 => "POLYGON SET",
    0x4120u16 => "CELL ARRAY",
    0x4140u16 => "GENERALIZED DRAWING PRIMITIVE",
    0x4160u16 => "RECTANGLE",
    0x4180u16 => "CIRCLE",
    0x41a0u16 => "CIRCULAR ARC 3 POINT",
    0x41c0u16 => "CIRCULAR ARC 3 POINT CLOSE",
    0x41e0u16 => "CIRCULAR ARC CENTRE",
    0x4200u16 => "CIRCULAR ARC CENTRE CLOSE",
    0x4220u16 => "ELLIPSE",
    0x4240u16 => "ELLIPTICAL ARC",
    0x4260u16 => "ELLIPTICAL ARC CLOSE",
    0x5040u16 => "LINE TYPE",
    0x5060u16 => "LINE WIDTH",
    0x5080u16 => "LINE COLOUR",
    0x50c0u16 => "MARKER TYPE",
    0x5100u16 => "MARKER COLOUR",
    0x5140u16 => "TEXT FONT INDEX",
    0x5160u16 => "TEXT PRECISION",
    0x5180u16 => "CHARACTER EXPANSION FACTOR",
    0x51a0u16 => "CHARACTER SPACING",
    0x51c0u16 => "TEXT COLOUR",
    0x51e0u16 => "CHARACTER HEIGHT",
    0x5200u16 => "CHARACTER ORIENTATION",
    0x5220u16 => "TEXT PATH",
    0x5240u16 => "TEXT ALIGNMENT",
    0x52c0u16 => "INTERIOR STYLE",
    0x52e0u16 => "FILL COLOUR",
    0x5300u16 => "HATCH INDEX",
    0x5320u16 => "PATTERN INDEX",
    0x5360u16 => "EDGE TYPE",
    0x5380u16 => "EDGE WIDTH",
    0x53a0u16 => "EDGE COLOUR",
    0x53c0u16 => "EDGE VISIBILITY",
    0x5440u16 => "COLOUR TABLE",
    0x5460u16 => "ASPECT SOURCE FLAGS",
    0x6020u16 => "ESCAPE",
    0x7020u16 => "MESSAGE",
    0x7040u16 => "APPLICATION DATA",
};

/// Element name, or the hex id for unknown elements.
pub(crate) fn element_name(id: u16) -> String {
    NAMES
        .get(&id)
        .map_or_else(|| format!("element {id:#06x}"), |n| (*n).to_owned())
}

/// Stream starts with a BEGIN METAFILE header.
pub fn check(data: &[u8]) -> bool {
    match data {
        [a, b, ..] => u16::from_be_bytes([*a, *b]) & 0xffe0 == id::BEGIN_METAFILE,
        _ => false,
    }
}

#[cfg(test)]
mod tests;
