//! Canonical primitives. Geometry is kept in local coordinates, the
//! primitive transform places it on the page.

use super::style::Style;
use crate::geom::{
    apply_trafo_to_bbox, apply_trafo_to_paths, arc_to_bezier, paths_bbox, polygon_paths,
    rounded_rect_to_bezier, ArcType, Bbox, Path, Point, Size, Trafo, Vector,
};

/// Width of a glyph relative to the font size, for text bboxes.
const AVERAGE_GLYPH_WIDTH: f64 = 0.5;

/// Rectangle with relative corner rounding.
///
/// Corners are lower-left, upper-left, upper-right, lower-right. Each value
/// is the corner radius divided by `min(width, height)`, in `[0, 0.5]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub origin: Point,
    pub size: Size,
    /// Radius over the shorter side, `0.5` rounds that side into a half
    /// circle. Formats that scale radii by the half side (`2r / min`) are
    /// converted at their boundary.
    pub corners: [f64; 4],
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
            corners: [0.0; 4],
        }
    }

    /// Set corners from absolute radii.
    pub fn with_radii(mut self, radii: [f64; 4]) -> Self {
        let min = self.min_side();
        self.corners = if min > 0.0 {
            radii.map(|r| (r / min).clamp(0.0, 0.5))
        } else {
            [0.0; 4]
        };
        self
    }

    fn min_side(&self) -> f64 {
        self.size.width.abs().min(self.size.height.abs())
    }

    /// Absolute corner radii.
    pub fn radii(&self) -> [f64; 4] {
        let min = self.min_side();
        self.corners.map(|c| c * min)
    }

    pub fn to_path(&self) -> Path {
        rounded_rect_to_bezier(self.origin, self.size.width, self.size.height, self.radii())
    }
}

/// Ellipse, arc, chord or pie slice on the unit box: center `(0.5, 0.5)`,
/// radius 0.5, angles counter-clockwise in radians. Equal angles mean a
/// full ellipse.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Circle {
    pub angle1: f64,
    pub angle2: f64,
    pub arc_type: ArcType,
}

impl Circle {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn arc(angle1: f64, angle2: f64, arc_type: ArcType) -> Self {
        Self {
            angle1,
            angle2,
            arc_type,
        }
    }

    pub fn is_full(&self) -> bool {
        self.angle1 == self.angle2
    }

    pub fn to_path(&self) -> Option<Path> {
        arc_to_bezier(
            Point::new(0.5, 0.5),
            Vector::new(0.5, 0.5),
            self.angle1,
            self.angle2,
            self.arc_type,
        )
    }
}

/// Transform placing the unit-box circle onto an axis-aligned ellipse.
pub fn ellipse_trafo(center: Point, rx: f64, ry: f64) -> Trafo {
    Trafo::new(2.0 * rx, 0.0, 0.0, 2.0 * ry, center.x - rx, center.y - ry)
}

/// Regular polygon or star on the unit box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    pub corners: u32,
    pub angle1: f64,
    pub angle2: f64,
    pub coef1: f64,
    pub coef2: f64,
}

impl Polygon {
    pub fn regular(corners: u32) -> Self {
        Self {
            corners: corners.max(3),
            angle1: 0.0,
            angle2: 0.0,
            coef1: 1.0,
            coef2: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Curve {
    pub paths: Vec<Path>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub anchor: Point,
    pub text: String,
    /// Box width for wrapped text, `None` for a single line.
    pub width: Option<f64>,
}

/// Raster image placed onto the unit box by the primitive transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    pub data: Vec<u8>,
    /// Source encoding, such as `dib` or `png`.
    pub format: String,
    pub size: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, strum::Display)]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    Polygon(Polygon),
    Curve(Curve),
    Text(Text),
    Pixmap(Pixmap),
}

impl Shape {
    /// Outline in local coordinates. Text has no outline.
    pub fn to_paths(&self) -> Vec<Path> {
        match self {
            Self::Rectangle(r) => vec![r.to_path()],
            Self::Circle(c) => c.to_path().into_iter().collect(),
            Self::Polygon(p) => vec![polygon_paths(p.corners, p.angle1, p.angle2, p.coef1, p.coef2)],
            Self::Curve(c) => c.paths.clone(),
            Self::Text(_) => vec![],
            Self::Pixmap(_) => vec![Rectangle::new(0.0, 0.0, 1.0, 1.0).to_path()],
        }
    }
}

/// Leaf node payload: shape, placement and style.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub trafo: Trafo,
    pub style: Style,
}

impl Primitive {
    pub fn new(shape: Shape, trafo: Trafo, style: Style) -> Self {
        Self { shape, trafo, style }
    }

    pub fn curve(paths: Vec<Path>, trafo: Trafo, style: Style) -> Self {
        Self::new(Shape::Curve(Curve { paths }), trafo, style)
    }

    /// Outline in page coordinates.
    pub fn to_paths(&self) -> Vec<Path> {
        apply_trafo_to_paths(&self.shape.to_paths(), &self.trafo)
    }

    /// Same geometry as a generic curve, transform and style unchanged.
    pub fn to_curve(&self) -> Self {
        Self::new(
            Shape::Curve(Curve {
                paths: self.shape.to_paths(),
            }),
            self.trafo,
            self.style.clone(),
        )
    }

    /// Bounding box in page coordinates, from path points, see [`paths_bbox`].
    /// Text is estimated from its length and font size.
    pub fn bbox(&self) -> Option<Bbox> {
        match &self.shape {
            Shape::Text(t) => {
                let size = self.style.text.as_ref().map_or(12.0, |s| s.font_size);
                #[allow(clippy::cast_precision_loss)]
                let width = t
                    .width
                    .unwrap_or(t.text.chars().count() as f64 * size * AVERAGE_GLYPH_WIDTH);
                let local = Bbox::new(t.anchor, Point::new(t.anchor.x + width, t.anchor.y + size));
                Some(apply_trafo_to_bbox(&local, &self.trafo))
            }
            _ => paths_bbox(&self.to_paths()),
        }
    }
}
