use super::{Bbox, Point, Trafo};

/// Node kind of a bezier segment end point, editor hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum NodeKind {
    #[default]
    Cusp,
    Smooth,
    Symmetrical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Point),
    Curve {
        c1: Point,
        c2: Point,
        end: Point,
        node: NodeKind,
    },
}

impl Segment {
    pub fn curve(c1: Point, c2: Point, end: Point) -> Self {
        Self::Curve {
            c1,
            c2,
            end,
            node: NodeKind::Cusp,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Self::Line(p) => *p,
            Self::Curve { end, .. } => *end,
        }
    }

    fn transformed(&self, t: &Trafo) -> Self {
        match *self {
            Self::Line(p) => Self::Line(t.transform_point(p)),
            Self::Curve { c1, c2, end, node } => Self::Curve {
                c1: t.transform_point(c1),
                c2: t.transform_point(c2),
                end: t.transform_point(end),
                node,
            },
        }
    }
}

/// A sub-path: start point, segments and closed flag.
///
/// A closed path implicitly returns to `start`; `close()` appends the
/// closing line if the last point is elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub start: Point,
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl Path {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            segments: vec![],
            closed: false,
        }
    }

    /// Build a polyline path, returns `None` if `points` is empty.
    pub fn from_points(points: &[Point], closed: bool) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut r = Self::new(*first);
        for p in rest {
            r.line_to(*p);
        }
        if closed {
            r.close();
        }
        Some(r)
    }

    pub fn line_to(&mut self, p: Point) {
        self.segments.push(Segment::Line(p));
    }

    pub fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.segments.push(Segment::curve(c1, c2, end));
    }

    pub fn close(&mut self) {
        if self.end_point() != self.start {
            self.line_to(self.start);
        }
        self.closed = true;
    }

    pub fn end_point(&self) -> Point {
        self.segments.last().map_or(self.start, Segment::end)
    }

    /// Start point, segment end points and bezier control points.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        std::iter::once(self.start).chain(self.segments.iter().flat_map(|s| {
            let (a, b, c) = match *s {
                Segment::Line(p) => (None, None, p),
                Segment::Curve { c1, c2, end, .. } => (Some(c1), Some(c2), end),
            };
            a.into_iter().chain(b).chain(std::iter::once(c))
        }))
    }

    /// Path without extent: no segments, or every point equals start.
    pub fn is_degenerate(&self) -> bool {
        self.points().all(|p| p == self.start)
    }

    pub fn transformed(&self, t: &Trafo) -> Self {
        Self {
            start: t.transform_point(self.start),
            segments: self.segments.iter().map(|s| s.transformed(t)).collect(),
            closed: self.closed,
        }
    }

    /// Same geometry traversed backwards.
    pub fn reversed(&self) -> Self {
        let mut r = Self::new(self.end_point());
        let mut prev = self.start;
        let ends: Vec<Point> = std::iter::once(self.start)
            .chain(self.segments.iter().map(Segment::end))
            .collect();
        let mut reversed = Vec::with_capacity(self.segments.len());
        for (i, s) in self.segments.iter().enumerate() {
            reversed.push(match *s {
                Segment::Line(_) => Segment::Line(prev),
                Segment::Curve { c1, c2, node, .. } => Segment::Curve {
                    c1: c2,
                    c2: c1,
                    end: prev,
                    node,
                },
            });
            prev = ends[i + 1];
        }
        reversed.reverse();
        r.segments = reversed;
        r.closed = self.closed;
        r
    }
}

pub fn apply_trafo_to_path(path: &Path, t: &Trafo) -> Path {
    path.transformed(t)
}

pub fn apply_trafo_to_paths(paths: &[Path], t: &Trafo) -> Vec<Path> {
    paths.iter().map(|p| p.transformed(t)).collect()
}

/// Bounding box of paths, computed from every end point and bezier control point.
///
/// Control points of a cubic lie on or outside the curve's convex hull boundary,
/// so the result is a conservative superset of the exact curve bbox.
/// It is exact for polylines and for curves whose extrema are segment end points.
pub fn paths_bbox(paths: &[Path]) -> Option<Bbox> {
    let mut points = paths.iter().flat_map(Path::points).peekable();
    points.peek()?;
    Some(Bbox::from_points(points))
}

const MAX_FLATTEN_DEPTH: u32 = 16;

/// Replace every cubic with line segments, keeping each within `tolerance`
/// of the curve, by recursive midpoint subdivision.
pub fn flatten_path(path: &Path, tolerance: f64) -> Path {
    let tolerance = tolerance.max(1e-6);
    let mut r = Path::new(path.start);
    let mut current = path.start;
    for s in &path.segments {
        match *s {
            Segment::Line(p) => r.line_to(p),
            Segment::Curve { c1, c2, end, .. } => {
                flatten_cubic(current, c1, c2, end, tolerance, 0, &mut r)
            }
        }
        current = s.end();
    }
    r.closed = path.closed;
    r
}

pub fn flatten_paths(paths: &[Path], tolerance: f64) -> Vec<Path> {
    paths.iter().map(|p| flatten_path(p, tolerance)).collect()
}

fn flatten_cubic(p0: Point, c1: Point, c2: Point, p3: Point, tol: f64, depth: u32, out: &mut Path) {
    if depth >= MAX_FLATTEN_DEPTH
        || (distance_to_line(c1, p0, p3) <= tol && distance_to_line(c2, p0, p3) <= tol)
    {
        out.line_to(p3);
        return;
    }
    let (left, right) = split_cubic([p0, c1, c2, p3], 0.5);
    flatten_cubic(left[0], left[1], left[2], left[3], tol, depth + 1, out);
    flatten_cubic(right[0], right[1], right[2], right[3], tol, depth + 1, out);
}

/// De Casteljau split of a cubic at `t`.
pub fn split_cubic(c: [Point; 4], t: f64) -> ([Point; 4], [Point; 4]) {
    let p01 = c[0].lerp(c[1], t);
    let p12 = c[1].lerp(c[2], t);
    let p23 = c[2].lerp(c[3], t);
    let p012 = p01.lerp(p12, t);
    let p123 = p12.lerp(p23, t);
    let mid = p012.lerp(p123, t);
    ([c[0], p01, p012, mid], [mid, p123, p23, c[3]])
}

pub fn cubic_point(c: [Point; 4], t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let d = 3.0 * mt * t * t;
    let e = t * t * t;
    Point::new(
        a * c[0].x + b * c[1].x + d * c[2].x + e * c[3].x,
        a * c[0].y + b * c[1].y + d * c[2].y + e * c[3].y,
    )
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_line(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.square_length();
    if len2 == 0.0 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

#[cfg(test)]
mod tests;
