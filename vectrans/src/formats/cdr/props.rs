//! Fill, outline and font properties referenced by id from objects.

use super::{chunk_reader, chunk_string, size_value, Version};
use crate::{
    color::{hls_to_rgb, hsv_to_rgb, yiq_to_rgb, Color},
    error::Result,
    formats::reader::RecordReader,
    model::style::{Cap, Join, Stroke},
};
use ahash::HashMap;
use log::debug;
use riff_parser::Chunk;

/// Colour model codes of CorelDRAW.
mod model {
    pub const CMYK: u8 = 2;
    pub const CMYK255: u8 = 3;
    pub const CMY: u8 = 4;
    pub const BGR: u8 = 5;
    pub const HSB: u8 = 6;
    pub const HLS: u8 = 7;
    pub const GRAY: u8 = 9;
    pub const YIQ: u8 = 11;
    pub const LAB: u8 = 12;
    pub const CMYK255_2: u8 = 17;
    pub const LAB_2: u8 = 18;
    pub const REGISTRATION: u8 = 20;
}

/// Decode four colour bytes, unknown models give black.
pub fn color(model: u8, b: [u8; 4]) -> Color {
    let unit = |v: u8| f64::from(v) / 255.0;
    let hue = || f64::from(u16::from_le_bytes([b[0], b[1]])) / 360.0;
    match model {
        model::CMYK => {
            let pct = |v: u8| f64::from(v) / 100.0;
            Color::cmyk(pct(b[0]), pct(b[1]), pct(b[2]), pct(b[3]))
        }
        model::CMYK255 | model::CMYK255_2 => {
            Color::cmyk(unit(b[0]), unit(b[1]), unit(b[2]), unit(b[3]))
        }
        model::CMY => Color::cmyk(unit(b[0]), unit(b[1]), unit(b[2]), 0.0),
        model::BGR => Color::rgb8(b[2], b[1], b[0]),
        model::HSB => {
            let [r, g, bl] = hsv_to_rgb(hue(), unit(b[2]), unit(b[3]));
            Color::rgb(r, g, bl)
        }
        model::HLS => {
            let [r, g, bl] = hls_to_rgb(hue(), unit(b[2]), unit(b[3]));
            Color::rgb(r, g, bl)
        }
        model::GRAY => Color::gray(unit(b[0])),
        model::YIQ => {
            let [r, g, bl] = yiq_to_rgb(
                unit(b[0]),
                2.0 * unit(b[1]) - 1.0,
                2.0 * unit(b[2]) - 1.0,
            );
            Color::rgb(r, g, bl)
        }
        model::LAB | model::LAB_2 => Color::lab(unit(b[0]), unit(b[1]), unit(b[2])),
        model::REGISTRATION => {
            Color::spot("Registration color", [0.0; 3], [1.0; 4])
        }
        other => {
            debug!("cdr colour model {other} drawn black");
            Color::black()
        }
    }
}

fn color_at(r: &RecordReader, model_at: usize, value_at: usize) -> Result<Color> {
    let model = r.at(model_at)?.u8()?;
    let bytes = r.at(value_at)?.bytes(4)?;
    Ok(color(model, [bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillProp {
    None,
    Solid(Color),
    /// Gradients, patterns and textures, by CDR fill type.
    Unsupported(u8),
}

fn fill(chunk: &Chunk, version: Version) -> Result<(u32, FillProp)> {
    let mut r = chunk_reader(chunk);
    let id = r.le_u32()?;
    let v13 = version >= Version::V13;
    let kind = r.at(if v13 { 12 } else { 4 })?.u8()?;
    let prop = match kind {
        0 => FillProp::None,
        1 => {
            let (model_at, value_at) = if v13 { (27, 35) } else { (8, 16) };
            FillProp::Solid(color_at(&r, model_at, value_at)?)
        }
        other => FillProp::Unsupported(other),
    };
    Ok((id, prop))
}

/// `None` for the "no outline" specification.
fn outline(chunk: &Chunk, version: Version) -> Result<(u32, Option<Stroke>)> {
    const NONE: u8 = 0x01;
    const SCALABLE: u8 = 0x02;
    const DASHED: u8 = 0x04;

    let mut r = chunk_reader(chunk);
    let id = r.le_u32()?;
    let (spec_at, caps_at, join_at, width_at, model_at, dash_at) =
        if version >= Version::V13 {
            (24, 26, 28, 30, 88, 116)
        } else {
            (4, 6, 8, 12, 76, 104)
        };
    let spec = r.at(spec_at)?.u8()?;
    if spec & NONE != 0 {
        return Ok((id, None));
    }
    let cap = match r.at(caps_at)?.u8()? {
        1 => Cap::Round,
        2 => Cap::Square,
        _ => Cap::Butt,
    };
    let join = match r.at(join_at)?.u8()? {
        1 => Join::Round,
        2 => Join::Bevel,
        _ => Join::Miter,
    };
    let width = size_value(&mut r.at(width_at)?)?;
    let dash = if spec & DASHED != 0 {
        let mut d = r.at(dash_at)?;
        let n = d.le_u16()?;
        (0..n)
            .map(|_| d.le_u16().map(f64::from))
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![]
    };
    let color = color_at(&r, model_at, model_at + 8)?;
    Ok((
        id,
        Some(Stroke {
            width,
            color,
            dash,
            cap,
            join,
            scalable: spec & SCALABLE != 0,
            ..Default::default()
        }),
    ))
}

fn font(chunk: &Chunk, version: Version) -> Result<(u16, String)> {
    let mut r = chunk_reader(chunk);
    let id = r.le_u16()?;
    let mut name = r.at(18)?;
    let bytes = name.bytes(name.remaining().min(34))?;
    Ok((id, chunk_string(bytes, version)))
}

/// Property tables of one document.
#[derive(Debug, Default)]
pub struct Properties {
    pub fills: HashMap<u32, FillProp>,
    /// `None` marks an outline that draws nothing.
    pub outlines: HashMap<u32, Option<Stroke>>,
    pub fonts: HashMap<u16, String>,
}

impl Properties {
    /// Collect every property chunk below `chunks`, a broken chunk is
    /// passed to `on_error` and skipped.
    pub fn collect(
        chunks: &[Chunk],
        version: Version,
        on_error: &mut dyn FnMut(crate::ConvertError),
    ) -> Self {
        let mut r = Self::default();
        r.visit(chunks, version, on_error);
        debug!(
            "cdr properties: {} fills, {} outlines, {} fonts",
            r.fills.len(),
            r.outlines.len(),
            r.fonts.len()
        );
        r
    }

    fn visit(
        &mut self,
        chunks: &[Chunk],
        version: Version,
        on_error: &mut dyn FnMut(crate::ConvertError),
    ) {
        for c in chunks {
            if c.is_list() {
                self.visit(&c.children, version, on_error);
                continue;
            }
            let r = match &c.id {
                b"fild" | b"fill" => fill(c, version).map(|(id, p)| {
                    self.fills.insert(id, p);
                }),
                b"outl" => outline(c, version).map(|(id, s)| {
                    self.outlines.insert(id, s);
                }),
                b"font" => font(c, version).map(|(id, name)| {
                    self.fonts.insert(id, name);
                }),
                _ => Ok(()),
            };
            if let Err(e) = r {
                on_error(e);
            }
        }
    }
}

#[cfg(test)]
mod tests;
