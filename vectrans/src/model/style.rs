//! Fill, stroke and text style of canonical primitives.

use crate::{
    color::Color,
    geom::{Point, Trafo},
};
use educe::Educe;

/// One point is 1/72 inch, 0.1 mm is the default hairline.
pub const DEFAULT_STROKE_WIDTH: f64 = 0.1 * 72.0 / 25.4;
pub const DEFAULT_MITER_LIMIT: f64 = 10.433;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub text: Option<TextStyle>,
    /// Extra properties carried along but not interpreted, such as opacity
    /// of a whole group.
    pub extra: Vec<(String, String)>,
}

impl Style {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(Fill::solid(color)),
            ..Default::default()
        }
    }

    pub fn stroked(stroke: Stroke) -> Self {
        Self {
            stroke: Some(stroke),
            ..Default::default()
        }
    }

    pub fn with_fill(mut self, fill: Option<Fill>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_stroke(mut self, stroke: Option<Stroke>) -> Self {
        self.stroke = stroke;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub rule: FillRule,
    pub paint: FillPaint,
}

impl Fill {
    pub fn solid(color: Color) -> Self {
        Self {
            rule: FillRule::default(),
            paint: FillPaint::Solid(color),
        }
    }

    pub fn with_rule(mut self, rule: FillRule) -> Self {
        self.rule = rule;
        self
    }

    /// Solid color, or the first stop of a gradient.
    pub fn main_color(&self) -> Option<&Color> {
        match &self.paint {
            FillPaint::Solid(c) => Some(c),
            FillPaint::Gradient(g) => g.stops.first().map(|(_, c)| c),
            FillPaint::Pattern(Pattern::Hatch { color, .. }) => Some(color),
            FillPaint::Pattern(Pattern::Image { .. }) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillPaint {
    Solid(Color),
    Gradient(Gradient),
    Pattern(Pattern),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum GradientKind {
    Linear,
    Radial,
}

/// Gradient vector in the local coordinates of the filled shape.
/// For radial gradients `start` is the center and `end` a point on the
/// outer circle.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub start: Point,
    pub end: Point,
    /// Offsets in `[0, 1]`, ascending.
    pub stops: Vec<(f64, Color)>,
    pub trafo: Trafo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Line hatch, `index` is the source format hatch style.
    Hatch {
        index: i32,
        color: Color,
        background: Option<Color>,
    },
    /// Tiled image, raw bytes as found in the source.
    Image { data: Vec<u8>, format: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum StrokePlacement {
    Inside,
    #[default]
    Center,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum Cap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum Join {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, PartialEq, Educe)]
#[educe(Default)]
pub struct Stroke {
    pub placement: StrokePlacement,
    #[educe(Default(expression = DEFAULT_STROKE_WIDTH))]
    pub width: f64,
    #[educe(Default(expression = Color::black()))]
    pub color: Color,
    /// Dash and gap lengths in units of the stroke width, empty for solid.
    pub dash: Vec<f64>,
    pub cap: Cap,
    pub join: Join,
    #[educe(Default(expression = DEFAULT_MITER_LIMIT))]
    pub miter_limit: f64,
    /// Painted below the fill.
    pub behind: bool,
    /// Width scales with the object transform.
    pub scalable: bool,
    /// Start and end marker names.
    pub markers: [Option<String>; 2],
}

impl Stroke {
    pub fn solid(width: f64, color: Color) -> Self {
        Self {
            width,
            color,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Educe)]
#[educe(Default)]
pub struct TextStyle {
    #[educe(Default = "Sans")]
    pub font_family: String,
    #[educe(Default = 12.0)]
    pub font_size: f64,
    pub align: TextAlign,
    pub bold: bool,
    pub italic: bool,
    #[educe(Default(expression = Color::black()))]
    pub color: Color,
}
