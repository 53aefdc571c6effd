//! GDI objects and the handle table.

use crate::{
    color::Color,
    error::Result,
    formats::reader::RecordReader,
    model::style::{Cap, FillRule, Join},
};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum PenStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
    Null,
    InsideFrame,
}

impl PenStyle {
    /// Dash lengths in pen widths.
    pub fn dash(self) -> Vec<f64> {
        match self {
            Self::Dash => vec![4.0, 2.0],
            Self::Dot => vec![1.0, 1.0],
            Self::DashDot => vec![4.0, 2.0, 1.0, 2.0],
            Self::DashDotDot => vec![4.0, 2.0, 1.0, 2.0, 1.0, 2.0],
            Self::Solid | Self::Null | Self::InsideFrame => vec![],
        }
    }
}

/// Lookup tables over the `PS_*` bits, unknown values fall back to the
/// GDI defaults.
fn pen_style(style: u16) -> PenStyle {
    match style & 0x000f {
        0 => PenStyle::Solid,
        1 => PenStyle::Dash,
        2 => PenStyle::Dot,
        3 => PenStyle::DashDot,
        4 => PenStyle::DashDotDot,
        5 => PenStyle::Null,
        6 => PenStyle::InsideFrame,
        other => {
            debug!("wmf pen style {other} drawn solid");
            PenStyle::Solid
        }
    }
}

fn pen_cap(style: u16) -> Cap {
    match (style & 0x0f00) >> 8 {
        1 => Cap::Square,
        2 => Cap::Butt,
        _ => Cap::Round,
    }
}

fn pen_join(style: u16) -> Join {
    match (style & 0xf000) >> 12 {
        1 => Join::Bevel,
        2 => Join::Miter,
        _ => Join::Round,
    }
}

/// `ALTERNATE` 1, `WINDING` 2.
pub fn fill_rule(mode: u16) -> FillRule {
    match mode {
        2 => FillRule::NonZero,
        _ => FillRule::EvenOdd,
    }
}

/// `COLORREF`: red, green, blue, reserved.
pub fn colorref(r: &mut RecordReader) -> Result<Color> {
    let (red, green, blue) = (r.u8()?, r.u8()?, r.u8()?);
    r.skip(1)?;
    Ok(Color::rgb8(red, green, blue))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub style: PenStyle,
    /// Logical units, 0 is the thinnest line the device draws.
    pub width: f64,
    pub color: Color,
    pub cap: Cap,
    pub join: Join,
}

impl Default for Pen {
    /// Stock black pen.
    fn default() -> Self {
        Self {
            style: PenStyle::Solid,
            width: 0.0,
            color: Color::rgb8(0, 0, 0),
            cap: Cap::Round,
            join: Join::Round,
        }
    }
}

impl Pen {
    pub fn read(r: &mut RecordReader) -> Result<Self> {
        let style = r.le_u16()?;
        let width = r.le_i16()?;
        let _height = r.le_i16()?;
        let color = colorref(r)?;
        Ok(Self {
            style: pen_style(style),
            width: f64::from(width).abs(),
            color,
            cap: pen_cap(style),
            join: pen_join(style),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Brush {
    /// Stock white brush.
    #[default]
    White,
    Solid(Color),
    Null,
    Hatched { color: Color, hatch: u16 },
    /// Device independent bitmap tile.
    Pattern(Vec<u8>),
}

impl Brush {
    pub fn read(r: &mut RecordReader) -> Result<Self> {
        let style = r.le_u16()?;
        let color = colorref(r)?;
        let hatch = r.le_u16()?;
        Ok(match style {
            0 => Self::Solid(color),
            1 => Self::Null,
            2 => Self::Hatched { color, hatch },
            other => {
                // pattern brushes made here carry no bitmap
                debug!("wmf brush style {other} filled solid");
                Self::Solid(color)
            }
        })
    }

    /// DibCreatePatternBrush: style, colour usage, then the DIB.
    pub fn read_dib_pattern(r: &mut RecordReader) -> Result<Self> {
        let _style = r.le_u16()?;
        let _usage = r.le_u16()?;
        let dib = r.bytes(r.remaining())?;
        Ok(Self::Pattern(dib.to_vec()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Logical units, negative means character height without leading.
    pub height: f64,
    /// Tenths of a degree, counter-clockwise.
    pub escapement: f64,
    pub bold: bool,
    pub italic: bool,
    pub face: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            height: 12.0,
            escapement: 0.0,
            bold: false,
            italic: false,
            face: "Sans".to_owned(),
        }
    }
}

/// `FW_BOLD`.
const BOLD_WEIGHT: i16 = 700;

impl Font {
    pub fn read(r: &mut RecordReader) -> Result<Self> {
        let height = r.le_i16()?;
        let _width = r.le_i16()?;
        let escapement = r.le_i16()?;
        let _orientation = r.le_i16()?;
        let weight = r.le_i16()?;
        let italic = r.u8()? != 0;
        // underline, strike out, charset, precisions, quality, pitch
        r.skip(7)?;
        let face = r.bytes(r.remaining().min(32))?;
        let face: String = face
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| char::from(*b))
            .collect();
        Ok(Self {
            height: f64::from(height),
            escapement: f64::from(escapement),
            bold: weight >= BOLD_WEIGHT,
            italic,
            face: if face.is_empty() {
                Self::default().face
            } else {
                face
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GdiObject {
    Pen(Pen),
    Brush(Brush),
    Font(Font),
    Palette,
    Region,
}

/// Object handles, a new object takes the lowest free slot.
#[derive(Debug, Default)]
pub struct ObjectTable {
    slots: Vec<Option<GdiObject>>,
}

impl ObjectTable {
    pub fn add(&mut self, object: GdiObject) -> usize {
        match self.slots.iter().position(Option::is_none) {
            Some(i) => {
                self.slots[i] = Some(object);
                i
            }
            None => {
                self.slots.push(Some(object));
                self.slots.len() - 1
            }
        }
    }

    pub fn get(&self, handle: usize) -> Option<&GdiObject> {
        self.slots.get(handle).and_then(Option::as_ref)
    }

    /// Free the slot, returns false if it was empty.
    pub fn delete(&mut self, handle: usize) -> bool {
        self.slots
            .get_mut(handle)
            .and_then(Option::take)
            .is_some()
    }
}

#[cfg(test)]
mod tests;
