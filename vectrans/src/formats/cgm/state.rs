//! Decode state: precisions and attributes set by earlier elements.

use crate::{
    color::Color,
    error::{ConvertError, Result},
    formats::reader::RecordReader,
    geom::{Point, Vector},
};

/// Encoding of real values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum RealPrecision {
    /// 16 bit whole part, 16 bit fraction.
    #[default]
    Fixed32,
    /// 32 bit whole part, 32 bit fraction.
    Fixed64,
    Float32,
    Float64,
}

impl RealPrecision {
    /// From the REAL PRECISION parameters: form (0 floating, 1 fixed),
    /// exponent or whole part bits, fraction bits.
    pub fn from_params(form: i16, a: i64, b: i64) -> Result<Self> {
        match (form, a, b) {
            (0, 9, 23) => Ok(Self::Float32),
            (0, 12, 52) => Ok(Self::Float64),
            (1, 16, 16) => Ok(Self::Fixed32),
            (1, 32, 32) => Ok(Self::Fixed64),
            _ => Err(ConvertError::unsupported(format!(
                "cgm real precision ({form}, {a}, {b})"
            ))),
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::Fixed32 | Self::Float32 => 4,
            Self::Fixed64 | Self::Float64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VdcType {
    #[default]
    Integer,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColourMode {
    #[default]
    Indexed,
    Direct,
}

/// How line, edge and marker sizes are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum WidthMode {
    /// VDC units.
    Absolute,
    /// Multiple of the nominal width.
    #[default]
    Scaled,
    /// Fraction of the VDC extent.
    Fractional,
    Millimetres,
}

impl From<i16> for WidthMode {
    fn from(v: i16) -> Self {
        match v {
            0 => Self::Absolute,
            2 => Self::Fractional,
            3 => Self::Millimetres,
            _ => Self::Scaled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScalingMode {
    #[default]
    Abstract,
    /// Millimetres per VDC unit.
    Metric(f64),
}

/// Interior style of filled primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum InteriorStyle {
    #[default]
    Hollow,
    Solid,
    Pattern,
    Hatch,
    Empty,
    GeometricPattern,
    Interpolated,
}

impl From<i16> for InteriorStyle {
    fn from(v: i16) -> Self {
        match v {
            1 => Self::Solid,
            2 => Self::Pattern,
            3 => Self::Hatch,
            4 => Self::Empty,
            5 => Self::GeometricPattern,
            6 => Self::Interpolated,
            _ => Self::Hollow,
        }
    }
}

/// Line or edge bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAttrs {
    /// Line type index, 1 is solid.
    pub kind: i64,
    /// `None` until set, the picture default applies.
    pub width: Option<f64>,
    pub colour: Color,
}

impl Default for LineAttrs {
    fn default() -> Self {
        Self {
            kind: 1,
            width: None,
            colour: Color::rgb(0.0, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextAttrs {
    /// 1 based index into the font list.
    pub font_index: i64,
    /// VDC units, `None` until set.
    pub height: Option<f64>,
    pub colour: Color,
    /// Horizontal alignment: 0 normal, 1 left, 2 centre, 3 right.
    pub horizontal: i16,
}

impl Default for TextAttrs {
    fn default() -> Self {
        Self {
            font_index: 1,
            height: None,
            colour: Color::rgb(0.0, 0.0, 0.0),
            horizontal: 0,
        }
    }
}

/// Default table: background white, foreground black, then the primaries.
fn default_colour_table() -> Vec<Color> {
    let mut r = vec![
        Color::rgb(1.0, 1.0, 1.0),
        Color::rgb(0.0, 0.0, 0.0),
        Color::rgb(1.0, 0.0, 0.0),
        Color::rgb(0.0, 1.0, 0.0),
        Color::rgb(0.0, 0.0, 1.0),
        Color::rgb(1.0, 1.0, 0.0),
        Color::rgb(1.0, 0.0, 1.0),
        Color::rgb(0.0, 1.0, 1.0),
    ];
    r.resize(64, Color::rgb(0.0, 0.0, 0.0));
    r
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeState {
    pub int_bytes: usize,
    pub index_bytes: usize,
    pub real: RealPrecision,
    pub colour_bytes: usize,
    pub colour_index_bytes: usize,
    pub vdc_type: VdcType,
    pub vdc_int_bytes: usize,
    pub vdc_real: RealPrecision,
    pub colour_mode: ColourMode,
    pub colour_min: [f64; 3],
    pub colour_max: [f64; 3],
    pub colour_table: Vec<Color>,
    /// `None` until set, the default depends on the VDC type.
    pub vdc_extent: Option<(Point, Point)>,
    pub scaling: ScalingMode,
    pub background: Option<Color>,
    pub line_width_mode: WidthMode,
    pub edge_width_mode: WidthMode,
    pub line: LineAttrs,
    pub edge: LineAttrs,
    pub edge_visible: bool,
    pub interior: InteriorStyle,
    pub fill_colour: Color,
    pub hatch_index: i64,
    pub text: TextAttrs,
}

impl Default for DecodeState {
    fn default() -> Self {
        Self {
            int_bytes: 2,
            index_bytes: 2,
            real: RealPrecision::Fixed32,
            colour_bytes: 1,
            colour_index_bytes: 1,
            vdc_type: VdcType::Integer,
            vdc_int_bytes: 2,
            vdc_real: RealPrecision::Fixed32,
            colour_mode: ColourMode::Indexed,
            colour_min: [0.0; 3],
            colour_max: [255.0; 3],
            colour_table: default_colour_table(),
            vdc_extent: None,
            scaling: ScalingMode::Abstract,
            background: None,
            line_width_mode: WidthMode::Scaled,
            edge_width_mode: WidthMode::Scaled,
            line: LineAttrs::default(),
            edge: LineAttrs::default(),
            edge_visible: false,
            interior: InteriorStyle::Hollow,
            fill_colour: Color::rgb(0.0, 0.0, 0.0),
            hatch_index: 1,
            text: TextAttrs::default(),
        }
    }
}

/// Byte count of an integer precision given in bits.
pub fn precision_bytes(bits: i64, what: &str) -> Result<usize> {
    match bits {
        8 => Ok(1),
        16 => Ok(2),
        24 => Ok(3),
        32 => Ok(4),
        _ => Err(ConvertError::unsupported(format!(
            "cgm {bits} bit {what} precision"
        ))),
    }
}

fn signed(r: &mut RecordReader, bytes: usize) -> Result<i64> {
    Ok(match bytes {
        1 => i64::from(r.be_i8()?),
        2 => i64::from(r.be_i16()?),
        3 => i64::from(r.be_i24()?),
        _ => i64::from(r.be_i32()?),
    })
}

fn unsigned(r: &mut RecordReader, bytes: usize) -> Result<u32> {
    Ok(match bytes {
        1 => u32::from(r.be_u8()?),
        2 => u32::from(r.be_u16()?),
        3 => r.be_u24()?,
        _ => r.be_u32()?,
    })
}

fn real(r: &mut RecordReader, precision: RealPrecision) -> Result<f64> {
    Ok(match precision {
        RealPrecision::Fixed32 => f64::from(r.be_i16()?) + f64::from(r.be_u16()?) / 65536.0,
        RealPrecision::Fixed64 => f64::from(r.be_i32()?) + f64::from(r.be_u32()?) / 4_294_967_296.0,
        RealPrecision::Float32 => f64::from(r.be_f32()?),
        RealPrecision::Float64 => r.be_f64()?,
    })
}

impl DecodeState {
    /// VDC extent, defaulted by the VDC type.
    pub fn extent(&self) -> (Point, Point) {
        self.vdc_extent.unwrap_or(match self.vdc_type {
            VdcType::Integer => (Point::new(0.0, 0.0), Point::new(32767.0, 32767.0)),
            VdcType::Real => (Point::new(0.0, 0.0), Point::new(1.0, 1.0)),
        })
    }

    pub fn vdc_size(&self) -> usize {
        match self.vdc_type {
            VdcType::Integer => self.vdc_int_bytes,
            VdcType::Real => self.vdc_real.size(),
        }
    }

    pub fn int(&self, r: &mut RecordReader) -> Result<i64> {
        signed(r, self.int_bytes)
    }

    pub fn index(&self, r: &mut RecordReader) -> Result<i64> {
        signed(r, self.index_bytes)
    }

    pub fn enumeration(&self, r: &mut RecordReader) -> Result<i16> {
        r.be_i16()
    }

    pub fn real(&self, r: &mut RecordReader) -> Result<f64> {
        real(r, self.real)
    }

    /// Real in a given precision, SCALING MODE always uses floating point
    /// unless the real precision is floating.
    pub fn real_with(&self, r: &mut RecordReader, precision: RealPrecision) -> Result<f64> {
        real(r, precision)
    }

    pub fn vdc(&self, r: &mut RecordReader) -> Result<f64> {
        match self.vdc_type {
            #[allow(clippy::cast_precision_loss)]
            VdcType::Integer => signed(r, self.vdc_int_bytes).map(|v| v as f64),
            VdcType::Real => real(r, self.vdc_real),
        }
    }

    pub fn point(&self, r: &mut RecordReader) -> Result<Point> {
        Ok(Point::new(self.vdc(r)?, self.vdc(r)?))
    }

    pub fn vector(&self, r: &mut RecordReader) -> Result<Vector> {
        Ok(Vector::new(self.vdc(r)?, self.vdc(r)?))
    }

    /// Points until the parameters run out.
    pub fn points(&self, r: &mut RecordReader) -> Result<Vec<Point>> {
        let size = 2 * self.vdc_size();
        let mut points = Vec::with_capacity(r.remaining() / size);
        while r.remaining() >= size {
            points.push(self.point(r)?);
        }
        Ok(points)
    }

    /// Raw direct colour component in the colour precision.
    pub fn colour_component(&self, r: &mut RecordReader) -> Result<f64> {
        unsigned(r, self.colour_bytes).map(f64::from)
    }

    /// Direct colour scaled by the colour value extent.
    pub fn direct_colour(&self, r: &mut RecordReader) -> Result<Color> {
        let mut c = [0.0; 3];
        for (i, v) in c.iter_mut().enumerate() {
            let raw = self.colour_component(r)?;
            let range = self.colour_max[i] - self.colour_min[i];
            *v = if range > 0.0 {
                (raw - self.colour_min[i]) / range
            } else {
                0.0
            };
        }
        Ok(Color::rgb(c[0], c[1], c[2]))
    }

    pub fn colour_index(&self, r: &mut RecordReader) -> Result<usize> {
        let i = unsigned(r, self.colour_index_bytes)?;
        Ok(usize::try_from(i).unwrap_or(usize::MAX))
    }

    /// Colour in the current selection mode. Indexes outside the table are
    /// black.
    pub fn colour(&self, r: &mut RecordReader) -> Result<Color> {
        match self.colour_mode {
            ColourMode::Direct => self.direct_colour(r),
            ColourMode::Indexed => {
                let i = self.colour_index(r)?;
                Ok(self
                    .colour_table
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| Color::rgb(0.0, 0.0, 0.0)))
            }
        }
    }

    /// Length prefixed string, 255 announces a 16 bit length. Bytes are
    /// read as Latin-1.
    pub fn string(&self, r: &mut RecordReader) -> Result<String> {
        if r.is_empty() {
            return Ok(String::new());
        }
        let mut len = usize::from(r.be_u8()?);
        if len == 255 {
            len = usize::from(r.be_u16()? & 0x7fff);
        }
        let bytes = r.bytes(len)?;
        Ok(bytes.iter().map(|b| char::from(*b)).collect())
    }
}

#[cfg(test)]
mod tests;
