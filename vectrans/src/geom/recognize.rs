//! Recognize native primitives in generic curves, so exporters can write
//! a rectangle or an ellipse element instead of a path.

use super::{arc_to_bezier, ArcType, Bbox, Path, Point, Segment, Trafo, Vector};

/// Relative tolerance when comparing against the synthesized form.
const TOLERANCE: f64 = 1e-6;

/// Axis-aligned rectangle drawn by one closed path of line segments.
pub fn as_rectangle(paths: &[Path]) -> Option<Bbox> {
    let [path] = paths else {
        return None;
    };
    if !path.closed || path.segments.iter().any(|s| matches!(s, Segment::Curve { .. })) {
        return None;
    }
    let mut corners: Vec<Point> = std::iter::once(path.start)
        .chain(path.segments.iter().map(Segment::end))
        .collect();
    corners.dedup();
    if corners.len() > 1 && corners.last() == corners.first() {
        corners.pop();
    }
    let [a, b, c, d] = corners[..] else {
        return None;
    };
    let bbox = Bbox::from_points([a, b, c, d]);
    if bbox.is_empty() {
        return None;
    }
    let on_corner = |p: Point| {
        (p.x == bbox.min.x || p.x == bbox.max.x) && (p.y == bbox.min.y || p.y == bbox.max.y)
    };
    let edges_aligned = [(a, b), (b, c), (c, d), (d, a)]
        .iter()
        .all(|(p, q)| (p.x == q.x) != (p.y == q.y));
    (edges_aligned && [a, b, c, d].into_iter().all(on_corner)).then_some(bbox)
}

/// Ellipse drawn by one closed path of four cubic segments.
///
/// Returns the transform placing the unit-box circle (center `(0.5, 0.5)`,
/// radius 0.5) onto the ellipse, the path must match the bezier form
/// synthesized for that transform.
pub fn as_ellipse(paths: &[Path]) -> Option<Trafo> {
    let [path] = paths else {
        return None;
    };
    if !path.closed || path.segments.len() != 4 {
        return None;
    }
    let mut nodes = [Point::zero(); 4];
    nodes[0] = path.start;
    for (i, s) in path.segments.iter().enumerate() {
        let Segment::Curve { end, .. } = *s else {
            return None;
        };
        if i < 3 {
            nodes[i + 1] = end;
        } else if end != path.start {
            return None;
        }
    }

    let center = nodes[0].lerp(nodes[2], 0.5);
    let u = nodes[0] - center;
    let v = nodes[1] - center;
    let size = u.length().max(v.length());
    if size == 0.0 || (nodes[1].lerp(nodes[3], 0.5) - center).length() > size * TOLERANCE {
        return None;
    }

    let trafo = Trafo::new(
        2.0 * u.x,
        2.0 * u.y,
        2.0 * v.x,
        2.0 * v.y,
        center.x - u.x - v.x,
        center.y - u.y - v.y,
    );
    let expected = arc_to_bezier(Point::new(0.5, 0.5), Vector::new(0.5, 0.5), 0.0, 0.0, ArcType::Chord)?
        .transformed(&trafo);
    let same = expected
        .points()
        .zip(path.points())
        .all(|(e, p)| (e - p).length() <= size * TOLERANCE);
    same.then_some(trafo)
}
