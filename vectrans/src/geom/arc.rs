use super::{rotate_point, Path, Point, Vector};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Control point distance for a quarter circle of radius 1.
pub const KAPPA: f64 = 0.552_284_749_830_793_4;

const ANGLE_EPSILON: f64 = 1e-9;

/// How a partial ellipse is closed for filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum ArcType {
    /// Open arc, no closing segment.
    Arc,
    /// Straight line from the end back to the start.
    #[default]
    Chord,
    /// Two radii through the center.
    PieSlice,
}

/// Normalize an angle into `[0, 2π)`.
pub fn normalize_angle(a: f64) -> f64 {
    let r = a.rem_euclid(TAU);
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Counter-clockwise sweep from `start` to `end`, in `(0, 2π]`.
/// Equal angles mean a full turn.
pub fn arc_sweep(start: f64, end: f64) -> f64 {
    let s = normalize_angle(end - start);
    if s < ANGLE_EPSILON {
        TAU
    } else {
        s
    }
}

/// Approximate the elliptical arc from `start` to `end` (radians,
/// counter-clockwise) with cubic beziers of at most 90° each.
///
/// Each segment uses the control length `4/3·tan(θ/4)`; for 90° segments
/// the radial error is below 0.03% of the radius. Equal start and end
/// angles produce the full ellipse, which is always closed.
/// Returns `None` for a zero radius.
pub fn arc_to_bezier(
    center: Point,
    radii: Vector,
    start: f64,
    end: f64,
    arc_type: ArcType,
) -> Option<Path> {
    if radii.x.abs() < f64::EPSILON || radii.y.abs() < f64::EPSILON {
        return None;
    }
    let sweep = arc_sweep(start, end);
    let full = (sweep - TAU).abs() < ANGLE_EPSILON;
    #[allow(clippy::cast_possible_truncation)]
    let n = (sweep / FRAC_PI_2 - ANGLE_EPSILON).ceil().max(1.0) as usize;
    let step = sweep / n as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let at = |a: f64| Point::new(center.x + radii.x * a.cos(), center.y + radii.y * a.sin());
    let tangent = |a: f64| Vector::new(-radii.x * a.sin(), radii.y * a.cos());

    let mut path = Path::new(at(start));
    for i in 0..n {
        let a0 = start + step * i as f64;
        let a1 = a0 + step;
        let end_point = if full && i == n - 1 { path.start } else { at(a1) };
        path.curve_to(at(a0) + tangent(a0) * k, at(a1) - tangent(a1) * k, end_point);
    }

    if full {
        path.closed = true;
    } else {
        match arc_type {
            ArcType::Arc => {}
            ArcType::Chord => path.close(),
            ArcType::PieSlice => {
                path.line_to(center);
                path.close();
            }
        }
    }
    Some(path)
}

/// Rectangle path with each corner replaced by a quarter circle of its own radius.
///
/// Corner order: lower-left, upper-left, upper-right, lower-right. Radii are
/// clamped to half of the shorter side; zero radii give sharp corners.
pub fn rounded_rect_to_bezier(origin: Point, width: f64, height: f64, radii: [f64; 4]) -> Path {
    let (x0, w) = if width < 0.0 {
        (origin.x + width, -width)
    } else {
        (origin.x, width)
    };
    let (y0, h) = if height < 0.0 {
        (origin.y + height, -height)
    } else {
        (origin.y, height)
    };
    let max_r = w.min(h) / 2.0;
    let [r0, r1, r2, r3] = radii.map(|r| r.clamp(0.0, max_r));
    let (x1, y1) = (x0 + w, y0 + h);

    fn line_to(path: &mut Path, p: Point) {
        if path.end_point() != p {
            path.line_to(p);
        }
    }

    let mut path = Path::new(Point::new(x0, y0 + r0));

    line_to(&mut path, Point::new(x0, y1 - r1));
    if r1 > 0.0 {
        path.curve_to(
            Point::new(x0, y1 - r1 + r1 * KAPPA),
            Point::new(x0 + r1 - r1 * KAPPA, y1),
            Point::new(x0 + r1, y1),
        );
    }
    line_to(&mut path, Point::new(x1 - r2, y1));
    if r2 > 0.0 {
        path.curve_to(
            Point::new(x1 - r2 + r2 * KAPPA, y1),
            Point::new(x1, y1 - r2 + r2 * KAPPA),
            Point::new(x1, y1 - r2),
        );
    }
    line_to(&mut path, Point::new(x1, y0 + r3));
    if r3 > 0.0 {
        path.curve_to(
            Point::new(x1, y0 + r3 - r3 * KAPPA),
            Point::new(x1 - r3 + r3 * KAPPA, y0),
            Point::new(x1 - r3, y0),
        );
    }
    line_to(&mut path, Point::new(x0 + r0, y0));
    if r0 > 0.0 {
        path.curve_to(
            Point::new(x0 + r0 - r0 * KAPPA, y0),
            Point::new(x0, y0 + r0 - r0 * KAPPA),
            Point::new(x0, y0 + r0),
        );
    }
    path.close();
    path
}

/// Regular polygon or star inscribed in the unit box.
///
/// `coef1` scales the corner radius, `coef2` the radius of the midpoints
/// between corners; `angle1`/`angle2` rotate corners and midpoints.
pub fn polygon_paths(corners: u32, angle1: f64, angle2: f64, coef1: f64, coef2: f64) -> Path {
    let corners = corners.max(3);
    let center = Point::new(0.5, 0.5);
    let corner_angle = TAU / f64::from(corners);
    let corner_start = Point::new(0.5, 0.5 + 0.5 * coef1);
    let mid_start = Point::new(0.5, 0.5 + 0.5 * coef2 * (corner_angle / 2.0).cos());

    let mut points = Vec::with_capacity(corners as usize * 2);
    for i in 0..corners {
        let base = f64::from(i) * corner_angle;
        points.push(rotate_point(center, corner_start, base + angle1));
        points.push(rotate_point(center, mid_start, base + corner_angle / 2.0 + angle2));
    }
    let mut path = Path::new(points[0]);
    for p in &points[1..] {
        path.line_to(*p);
    }
    path.close();
    path
}

/// Center of the circle through three points, `None` if they are collinear.
pub fn circle_center_by_3points(p1: Point, p2: Point, p3: Point) -> Option<Point> {
    let d = 2.0 * (p1.x * (p2.y - p3.y) + p2.x * (p3.y - p1.y) + p3.x * (p1.y - p2.y));
    if d.abs() < 1e-12 {
        return None;
    }
    let s1 = p1.x * p1.x + p1.y * p1.y;
    let s2 = p2.x * p2.x + p2.y * p2.y;
    let s3 = p3.x * p3.x + p3.y * p3.y;
    Some(Point::new(
        (s1 * (p2.y - p3.y) + s2 * (p3.y - p1.y) + s3 * (p1.y - p2.y)) / d,
        (s1 * (p3.x - p2.x) + s2 * (p1.x - p3.x) + s3 * (p2.x - p1.x)) / d,
    ))
}

/// Angle of `p` seen from `center`, in `[0, 2π)`.
pub fn point_angle(p: Point, center: Point) -> f64 {
    normalize_angle((p.y - center.y).atan2(p.x - center.x))
}

/// Arc through three points, converted into center, radius and the
/// counter-clockwise start/end angles.
pub fn arc_by_3points(p1: Point, p2: Point, p3: Point) -> Option<(Point, f64, f64, f64)> {
    let center = circle_center_by_3points(p1, p2, p3)?;
    let r = (p1 - center).length();
    let a1 = point_angle(p1, center);
    let a3 = point_angle(p3, center);
    let ccw = (p2 - p1).cross(p3 - p2) > 0.0;
    Some(if ccw {
        (center, r, a1, a3)
    } else {
        (center, r, a3, a1)
    })
}

#[cfg(test)]
mod tests;
