//! Stroke outlining: turn a stroked path into a fillable outline.
//!
//! Curves are flattened at a width relative tolerance, then every polyline is
//! offset by half the stroke width on both sides. Closed paths give two
//! contours (one per side, opposite orientation), open paths and dash runs
//! give one contour with caps. Outlines are meant for the nonzero fill rule.

use super::{flatten_path, Path, Point, Vector};
use crate::model::style::{Cap, Join, Stroke};
use std::f64::consts::{FRAC_PI_2, PI};

/// Flattening tolerance as a fraction of the stroke half width.
const FLATTEN_RATIO: f64 = 0.01;
const MIN_TOLERANCE: f64 = 1e-3;
const POINT_EPSILON: f64 = 1e-9;

pub fn stroke_to_curve(paths: &[Path], stroke: &Stroke) -> Vec<Path> {
    let radius = stroke.width / 2.0;
    if !(radius > 0.0) {
        return vec![];
    }
    let outliner = Outliner {
        radius,
        cap: stroke.cap,
        join: stroke.join,
        miter_limit: stroke.miter_limit.max(1.0),
    };
    let tolerance = (radius * FLATTEN_RATIO).max(MIN_TOLERANCE);
    let pattern = dash_pattern(&stroke.dash, stroke.width);

    let mut r = vec![];
    for path in paths {
        let (points, closed) = polyline(path, tolerance);
        if points.len() < 2 {
            continue;
        }
        if let Some(pattern) = &pattern {
            let mut points = points;
            if closed {
                points.push(points[0]);
            }
            for run in dash_runs(&points, pattern) {
                r.push(outliner.open(&run));
            }
        } else if closed && points.len() > 2 {
            r.push(outliner.closed_side(&points));
            let reversed: Vec<Point> = points.iter().rev().copied().collect();
            r.push(outliner.closed_side(&reversed));
        } else {
            r.push(outliner.open(&points));
        }
    }
    r
}

/// Flatten and drop repeated points. A closed result does not repeat its
/// first point at the end.
fn polyline(path: &Path, tolerance: f64) -> (Vec<Point>, bool) {
    let flat = flatten_path(path, tolerance);
    let mut points: Vec<Point> = Vec::with_capacity(flat.segments.len() + 1);
    for p in std::iter::once(flat.start).chain(flat.segments.iter().map(|s| s.end())) {
        if points
            .last()
            .map_or(true, |last| (p - *last).length() > POINT_EPSILON)
        {
            points.push(p);
        }
    }
    if path.closed && points.len() > 1 {
        let first = points[0];
        if points
            .last()
            .is_some_and(|last| (*last - first).length() <= POINT_EPSILON)
        {
            points.pop();
        }
    }
    (points, path.closed)
}

/// Dash lengths scaled by stroke width, doubled if odd. `None` when solid.
fn dash_pattern(dash: &[f64], width: f64) -> Option<Vec<f64>> {
    if dash.is_empty() || dash.iter().any(|d| *d < 0.0) || dash.iter().sum::<f64>() <= 0.0 {
        return None;
    }
    let mut r: Vec<f64> = dash.iter().map(|d| d * width).collect();
    if r.len() % 2 == 1 {
        r.extend_from_within(..);
    }
    Some(r)
}

/// Split a polyline into the runs covered by the "on" entries of `pattern`.
fn dash_runs(points: &[Point], pattern: &[f64]) -> Vec<Vec<Point>> {
    let mut runs = vec![];
    let mut idx = 0;
    let mut left = pattern[0];
    let mut current = vec![points[0]];
    for w in points.windows(2) {
        let (mut a, b) = (w[0], w[1]);
        let mut seg_len = (b - a).length();
        while seg_len > left {
            let p = a + (b - a) * (left / seg_len);
            if idx % 2 == 0 {
                current.push(p);
                runs.push(std::mem::take(&mut current));
            } else {
                current = vec![p];
            }
            seg_len -= left;
            a = p;
            idx = (idx + 1) % pattern.len();
            left = pattern[idx];
        }
        left -= seg_len;
        if idx % 2 == 0 {
            current.push(b);
        }
    }
    if idx % 2 == 0 {
        runs.push(current);
    }
    runs.retain(|run| run.windows(2).any(|w| (w[1] - w[0]).length() > POINT_EPSILON));
    runs
}

fn left_normal(d: Vector) -> Vector {
    Vector::new(-d.y, d.x)
}

fn direction(a: Point, b: Point) -> Vector {
    (b - a).normalize()
}

struct Outliner {
    radius: f64,
    cap: Cap,
    join: Join,
    miter_limit: f64,
}

impl Outliner {
    /// Outline of an open polyline: left side, end cap, right side, start cap.
    fn open(&self, points: &[Point]) -> Path {
        let reversed: Vec<Point> = points.iter().rev().copied().collect();
        let first_dir = direction(points[0], points[1]);
        let mut path = Path::new(points[0] + left_normal(first_dir) * self.radius);
        self.side(points, &mut path);
        self.cap(&mut path, points[points.len() - 1], direction(reversed[1], reversed[0]));
        self.side(&reversed, &mut path);
        self.cap(&mut path, points[0], -first_dir);
        path.close();
        path
    }

    /// Offset the left side of an open polyline, path is at its first offset point.
    fn side(&self, points: &[Point], path: &mut Path) {
        let r = self.radius;
        let dirs: Vec<Vector> = points.windows(2).map(|w| direction(w[0], w[1])).collect();
        path.line_to(points[1] + left_normal(dirs[0]) * r);
        for i in 1..dirs.len() {
            self.join(path, points[i], dirs[i - 1], dirs[i]);
            path.line_to(points[i + 1] + left_normal(dirs[i]) * r);
        }
    }

    /// One closed contour following the left side of a closed polyline.
    fn closed_side(&self, points: &[Point]) -> Path {
        let r = self.radius;
        let n = points.len();
        let dirs: Vec<Vector> = (0..n)
            .map(|i| direction(points[i], points[(i + 1) % n]))
            .collect();
        let mut path = Path::new(points[0] + left_normal(dirs[0]) * r);
        for i in 0..n {
            let next = (i + 1) % n;
            path.line_to(points[next] + left_normal(dirs[i]) * r);
            self.join(&mut path, points[next], dirs[i], dirs[next]);
        }
        path.close();
        path
    }

    /// Connect the left offsets of two segments meeting at `v`.
    fn join(&self, path: &mut Path, v: Point, d_in: Vector, d_out: Vector) {
        let r = self.radius;
        let n_in = left_normal(d_in);
        let n_out = left_normal(d_out);
        let target = v + n_out * r;
        let cross = d_in.cross(d_out);
        let dot = d_in.dot(d_out);

        if cross.abs() <= POINT_EPSILON && dot > 0.0 {
            path.line_to(target);
            return;
        }
        if cross > POINT_EPSILON {
            // inner side of a left turn
            path.line_to(v);
            path.line_to(target);
            return;
        }

        match self.join {
            Join::Bevel => path.line_to(target),
            Join::Round => {
                let turn = cross.atan2(dot);
                let turn = if turn > 0.0 { turn - 2.0 * PI } else { turn };
                let a0 = n_in.y.atan2(n_in.x);
                append_arc(path, v, r, a0, turn.max(-PI));
                path.line_to(target);
            }
            Join::Miter => {
                let bisector = n_in + n_out;
                let cos_half = if bisector.length() > POINT_EPSILON {
                    bisector.normalize().dot(n_in)
                } else {
                    0.0
                };
                if cos_half > POINT_EPSILON && 1.0 / cos_half <= self.miter_limit {
                    path.line_to(v + bisector.normalize() * (r / cos_half));
                }
                path.line_to(target);
            }
        }
    }

    /// Cap at `v` for a path arriving in direction `d`, from the left offset
    /// to the right offset.
    fn cap(&self, path: &mut Path, v: Point, d: Vector) {
        let r = self.radius;
        let n = left_normal(d);
        let target = v - n * r;
        match self.cap {
            Cap::Butt => path.line_to(target),
            Cap::Square => {
                path.line_to(v + n * r + d * r);
                path.line_to(target + d * r);
                path.line_to(target);
            }
            Cap::Round => {
                append_arc(path, v, r, n.y.atan2(n.x), -PI);
                path.line_to(target);
            }
        }
    }
}

/// Append a circular arc, path must be at its start point.
/// `sweep` is signed, negative goes clockwise.
fn append_arc(path: &mut Path, center: Point, r: f64, start: f64, sweep: f64) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / n as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();
    let at = |a: f64| Point::new(center.x + r * a.cos(), center.y + r * a.sin());
    let tangent = |a: f64| Vector::new(-r * a.sin(), r * a.cos());
    for i in 0..n {
        let a0 = start + step * i as f64;
        let a1 = a0 + step;
        path.curve_to(at(a0) + tangent(a0) * k, at(a1) - tangent(a1) * k, at(a1));
    }
}

#[cfg(test)]
mod tests;
