//! Windows Metafiles, with or without the placeable header.
//!
//! A record is `{u32 size in words, u16 function, params}`, all little
//! endian. Coordinates are 16 bit logical units mapped to the device by
//! the window and viewport of the current device context.

mod gdi;
mod import;
mod parser;

pub use import::WmfImporter;

/// Key of the 22 byte placeable header.
pub(crate) const PLACEABLE_KEY: u32 = 0x9ac6_cdd7;

pub(crate) mod function {
    pub const EOF: u16 = 0x0000;
    pub const SAVE_DC: u16 = 0x001e;
    pub const REALIZE_PALETTE: u16 = 0x0035;
    pub const CREATE_PALETTE: u16 = 0x00f7;
    pub const SET_BK_MODE: u16 = 0x0102;
    pub const SET_MAP_MODE: u16 = 0x0103;
    pub const SET_ROP2: u16 = 0x0104;
    pub const SET_POLY_FILL_MODE: u16 = 0x0106;
    pub const SET_STRETCH_BLT_MODE: u16 = 0x0107;
    pub const RESTORE_DC: u16 = 0x0127;
    pub const SELECT_CLIP_REGION: u16 = 0x012c;
    pub const SELECT_OBJECT: u16 = 0x012d;
    pub const SET_TEXT_ALIGN: u16 = 0x012e;
    pub const DIB_CREATE_PATTERN_BRUSH: u16 = 0x0142;
    pub const DELETE_OBJECT: u16 = 0x01f0;
    pub const CREATE_PATTERN_BRUSH: u16 = 0x01f9;
    pub const SET_BK_COLOR: u16 = 0x0201;
    pub const SET_TEXT_COLOR: u16 = 0x0209;
    pub const SET_WINDOW_ORG: u16 = 0x020b;
    pub const SET_WINDOW_EXT: u16 = 0x020c;
    pub const SET_VIEWPORT_ORG: u16 = 0x020d;
    pub const SET_VIEWPORT_EXT: u16 = 0x020e;
    pub const OFFSET_WINDOW_ORG: u16 = 0x020f;
    pub const OFFSET_VIEWPORT_ORG: u16 = 0x0211;
    pub const LINE_TO: u16 = 0x0213;
    pub const MOVE_TO: u16 = 0x0214;
    pub const SELECT_PALETTE: u16 = 0x0234;
    pub const CREATE_PEN_INDIRECT: u16 = 0x02fa;
    pub const CREATE_FONT_INDIRECT: u16 = 0x02fb;
    pub const CREATE_BRUSH_INDIRECT: u16 = 0x02fc;
    pub const POLYGON: u16 = 0x0324;
    pub const POLYLINE: u16 = 0x0325;
    pub const INTERSECT_CLIP_RECT: u16 = 0x0416;
    pub const ELLIPSE: u16 = 0x0418;
    pub const RECTANGLE: u16 = 0x041b;
    pub const TEXT_OUT: u16 = 0x0521;
    pub const POLY_POLYGON: u16 = 0x0538;
    pub const ROUND_RECT: u16 = 0x061c;
    pub const ESCAPE: u16 = 0x0626;
    pub const CREATE_REGION: u16 = 0x06ff;
    pub const ARC: u16 = 0x0817;
    pub const PIE: u16 = 0x081a;
    pub const CHORD: u16 = 0x0830;
    pub const EXT_TEXT_OUT: u16 = 0x0a32;
    pub const DIB_STRETCH_BLT: u16 = 0x0b41;
    pub const STRETCH_DIB: u16 = 0x0f43;
}

static NAMES: phf::Map<u16, &'static str> = phf::phf_map! {
    0x0000u16 => "EOF",
    0x001eu16 => "SaveDC",
    0x0035u16 => "RealizePalette",
    0x0037u16 => "SetPalEntries",
    0x00f7u16 => "CreatePalette",
    0x0102u16 => "SetBkMode",
    0x0103u16 => "SetMapMode",
    0x0104u16 => "SetROP2",
    0x0105u16 => "SetRelabs",
    0x0106u16 => "SetPolyFillMode",
    0x0107u16 => "SetStretchBltMode",
    0x0108u16 => "SetTextCharExtra",
    0x0127u16 => "RestoreDC",
    0x012cu16 => "SelectClipRegion",
    0x012du16 => "SelectObject",
    0x012eu16 => "SetTextAlign",
    0x0142u16 => "DibCreatePatternBrush",
    0x0149u16 => "SetLayout",
    0x01f0u16 => "DeleteObject",
    0x01f9u16 => "CreatePatternBrush",
    0x0201u16 => "SetBkColor",
    0x0209u16 => "SetTextColor",
    0x020au16 => "SetTextJustification",
    0x020bu16 => "SetWindowOrg",
    0x020cu16 => "SetWindowExt",
    0x020du16 => "SetViewportOrg",
    0x020eu16 => "SetViewportExt",
    0x020fu16 => "OffsetWindowOrg",
    0x0211u16 => "OffsetViewportOrg",
    0x0213u16 => "LineTo",
    0x0214u16 => "MoveTo",
    0x0220u16 => "OffsetClipRgn",
    0x0231u16 => "SetMapperFlags",
    0x0234u16 => "SelectPalette",
    0x02fau16 => "CreatePenIndirect",
    0x02fbu16 => "CreateFontIndirect",
    0x02fcu16 => "CreateBrushIndirect",
    0x0324u16 => "Polygon",
    0x0325u16 => "Polyline",
    0x0410u16 => "ScaleWindowExt",
    0x0412u16 => "ScaleViewportExt",
    0x0415u16 => "ExcludeClipRect",
    0x0416u16 => "IntersectClipRect",
    0x0418u16 => "Ellipse",
    0x0419u16 => "FloodFill",
    0x041bu16 => "Rectangle",
    0x041fu16 => "SetPixel",
    0x0521u16 => "TextOut",
    0x0538u16 => "PolyPolygon",
    0x0548u16 => "ExtFloodFill",
    0x061cu16 => "RoundRect",
    0x061du16 => "PatBlt",
    0x0626u16 => "Escape",
    0x06ffu16 => "CreateRegion",
    0x0817u16 => "Arc",
    0x081au16 => "Pie",
    0x0830u16 => "Chord",
    0x0922u16 => "BitBlt",
    0x0940u16 => "DibBitBlt",
    0x0a32u16 => "ExtTextOut",
    0x0b23u16 => "StretchBlt",
    0x0b41u16 => "DibStretchBlt",
    0x0d33u16 => "SetDibToDev",
    0x0f43u16 => "StretchDIBits",
};

pub(crate) fn function_name(function: u16) -> String {
    NAMES
        .get(&function)
        .map_or_else(|| format!("function {function:#06x}"), |n| (*n).to_owned())
}

/// Placeable key, or a standard header of a memory or disk metafile.
pub fn check(data: &[u8]) -> bool {
    match data {
        [a, b, c, d, ..] if u32::from_le_bytes([*a, *b, *c, *d]) == PLACEABLE_KEY => true,
        [1 | 2, 0, 9, 0, 0, 1 | 3, ..] => true,
        _ => false,
    }
}
