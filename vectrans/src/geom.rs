//! Geometry kernel: affine transforms, paths and bounding boxes.
//!
//! Transforms use the row-vector convention of `euclid`:
//! `x' = m11 * x + m21 * y + m31`, `y' = m12 * x + m22 * y + m32`,
//! `m31`/`m32` being the `dx`/`dy` translation.
//! All coordinates of the canonical model are points (1/72 inch).

use euclid::default::{Box2D, Point2D, Size2D, Transform2D, Vector2D};
use thiserror::Error;

mod arc;
mod path;
pub mod recognize;
pub mod stroke;

pub use arc::*;
pub use path::*;

pub type Trafo = Transform2D<f64>;
pub type Point = Point2D<f64>;
pub type Vector = Vector2D<f64>;
pub type Size = Size2D<f64>;
pub type Bbox = Box2D<f64>;

/// Determinant below this is treated as a non-invertible linear part.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Returned by [`invert_trafo`] when the linear part has no inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("transform is not invertible")]
pub struct SingularTransform;

/// Compose two transforms, `a` is applied first, then `b`.
pub fn multiply_trafo(a: &Trafo, b: &Trafo) -> Trafo {
    a.then(b)
}

/// Return the transform `t'` such that `multiply_trafo(t, t')` is identity.
pub fn invert_trafo(t: &Trafo) -> Result<Trafo, SingularTransform> {
    if t.determinant().abs() < SINGULAR_EPSILON {
        return Err(SingularTransform);
    }
    t.inverse().ok_or(SingularTransform)
}

pub fn apply_trafo_to_point(p: Point, t: &Trafo) -> Point {
    t.transform_point(p)
}

/// Transform the four corners of `bbox`, returns the box enclosing them.
pub fn apply_trafo_to_bbox(bbox: &Bbox, t: &Trafo) -> Bbox {
    let corners = [
        bbox.min,
        Point::new(bbox.min.x, bbox.max.y),
        bbox.max,
        Point::new(bbox.max.x, bbox.min.y),
    ];
    Bbox::from_points(corners.iter().map(|p| t.transform_point(*p)))
}

/// Union of an optional accumulated box and a new one.
pub fn sum_bbox(acc: Option<Bbox>, b: Bbox) -> Bbox {
    match acc {
        Some(a) => a.union(&b),
        None => b,
    }
}

pub fn bbox_from_rect(x: f64, y: f64, w: f64, h: f64) -> Bbox {
    Bbox::from_points([Point::new(x, y), Point::new(x + w, y + h)])
}

/// Rotate `p` around `center` counter-clockwise by `angle` radians.
pub fn rotate_point(center: Point, p: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    let v = p - center;
    Point::new(
        center.x + v.x * cos - v.y * sin,
        center.y + v.x * sin + v.y * cos,
    )
}

/// Uniform scale factor of the transform, geometric mean of the axis scales.
pub fn trafo_scale(t: &Trafo) -> f64 {
    t.determinant().abs().sqrt()
}

/// True if the transform maps axis-aligned rectangles to axis-aligned rectangles.
pub fn is_axis_aligned(t: &Trafo) -> bool {
    const EPS: f64 = 1e-9;
    (t.m12.abs() < EPS && t.m21.abs() < EPS) || (t.m11.abs() < EPS && t.m22.abs() < EPS)
}
