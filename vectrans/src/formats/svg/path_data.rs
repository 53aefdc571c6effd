//! Path data (`d` attribute) and point list grammar.
//!
//! Quadratic segments are elevated to cubics, elliptical arcs are converted
//! to center form and approximated by [`arc_to_bezier`]. Parsing stops at
//! the first error and keeps what was read so far.

use crate::geom::{arc_to_bezier, ArcType, Path, Point, Segment, Trafo, Vector};
use euclid::Angle;
use nom::{
    branch::alt,
    character::complete::{char, multispace0, one_of},
    combinator::{opt, value},
    number::complete::double,
    sequence::{pair, preceded, tuple},
    IResult,
};
use std::f64::consts::TAU;

type ParseResult<'a, O> = IResult<&'a str, O>;

fn separator(input: &str) -> ParseResult<()> {
    value((), tuple((multispace0, opt(char(',')), multispace0)))(input)
}

pub fn number(input: &str) -> ParseResult<f64> {
    preceded(separator, double)(input)
}

fn flag(input: &str) -> ParseResult<bool> {
    preceded(separator, alt((value(false, char('0')), value(true, char('1')))))(input)
}

fn coord(input: &str) -> ParseResult<Point> {
    let (input, (x, y)) = pair(number, number)(input)?;
    Ok((input, Point::new(x, y)))
}

/// Numbers separated by whitespace or commas, as in `points` or
/// `stroke-dasharray`.
pub fn number_list(s: &str) -> Vec<f64> {
    let mut r = vec![];
    let mut rest = s;
    while let Ok((tail, v)) = number(rest) {
        r.push(v);
        rest = tail;
    }
    r
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Args {
    None,
    One(f64),
    Point(Point),
    Two(Point, Point),
    Three(Point, Point, Point),
    Arc {
        radii: Vector,
        rotation: f64,
        large: bool,
        sweep: bool,
        end: Point,
    },
}

fn arc_args(input: &str) -> ParseResult<Args> {
    let (input, (rx, ry, rotation, large, sweep, end)) =
        tuple((number, number, number, flag, flag, coord))(input)?;
    Ok((
        input,
        Args::Arc {
            radii: Vector::new(rx, ry),
            rotation,
            large,
            sweep,
            end,
        },
    ))
}

fn args(cmd: char) -> impl Fn(&str) -> ParseResult<Args> {
    move |input| match cmd.to_ascii_uppercase() {
        'M' | 'L' | 'T' => coord(input).map(|(i, p)| (i, Args::Point(p))),
        'H' | 'V' => number(input).map(|(i, v)| (i, Args::One(v))),
        'S' | 'Q' => pair(coord, coord)(input).map(|(i, (a, b))| (i, Args::Two(a, b))),
        'C' => tuple((coord, coord, coord))(input).map(|(i, (a, b, c))| (i, Args::Three(a, b, c))),
        'A' => arc_args(input),
        _ => Ok((input, Args::None)),
    }
}

fn command(input: &str) -> ParseResult<char> {
    preceded(separator, one_of("MmLlHhVvCcSsQqTtAaZz"))(input)
}

#[derive(Debug, Default)]
struct Builder {
    paths: Vec<Path>,
    current: Option<Path>,
    pos: Point,
    subpath_start: Point,
    /// Second control point of the previous cubic, for `S`.
    last_cubic: Option<Point>,
    /// Control point of the previous quadratic, for `T`.
    last_quad: Option<Point>,
}

impl Builder {
    fn finish(&mut self) {
        if let Some(path) = self.current.take() {
            if !path.segments.is_empty() {
                self.paths.push(path);
            }
        }
    }

    fn path(&mut self) -> &mut Path {
        let start = self.pos;
        self.current.get_or_insert_with(|| Path::new(start))
    }

    fn move_to(&mut self, p: Point) {
        self.finish();
        self.current = Some(Path::new(p));
        self.pos = p;
        self.subpath_start = p;
    }

    fn line_to(&mut self, p: Point) {
        self.path().line_to(p);
        self.pos = p;
    }

    fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.path().curve_to(c1, c2, p);
        self.pos = p;
        self.last_cubic = Some(c2);
    }

    fn quad_to(&mut self, q: Point, p: Point) {
        let p0 = self.pos;
        self.curve_to(p0 + (q - p0) * (2.0 / 3.0), p + (q - p) * (2.0 / 3.0), p);
        self.last_cubic = None;
        self.last_quad = Some(q);
    }

    fn close(&mut self) {
        if let Some(mut path) = self.current.take() {
            if !path.segments.is_empty() {
                path.close();
                self.paths.push(path);
            }
        }
        self.pos = self.subpath_start;
    }

    fn arc_to(&mut self, radii: Vector, rotation: f64, large: bool, sweep: bool, end: Point) {
        let start = self.pos;
        if start == end {
            return;
        }
        let Some((center, radii, theta, delta)) =
            endpoint_to_center(start, end, radii, rotation.to_radians(), large, sweep)
        else {
            self.line_to(end);
            return;
        };
        let (a0, a1) = if delta > 0.0 {
            (theta, theta + delta)
        } else {
            (theta + delta, theta)
        };
        let Some(arc) = arc_to_bezier(Point::origin(), radii, a0, a1, ArcType::Arc) else {
            self.line_to(end);
            return;
        };
        let placed = Trafo::rotation(Angle::radians(rotation.to_radians()))
            .then_translate(center.to_vector());
        let mut arc = arc.transformed(&placed);
        if delta < 0.0 {
            arc = arc.reversed();
        }
        let path = self.path();
        path.segments.extend(arc.segments);
        if let Some(Segment::Curve { end: last, .. }) = path.segments.last_mut() {
            *last = end;
        }
        self.pos = end;
    }

    fn exec(&mut self, cmd: char, args: Args) {
        let relative = cmd.is_ascii_lowercase();
        let base = if relative {
            self.pos.to_vector()
        } else {
            Vector::zero()
        };
        let abs = |p: Point| p + base;
        let (last_cubic, last_quad) = (self.last_cubic.take(), self.last_quad.take());
        match (cmd.to_ascii_uppercase(), args) {
            ('M', Args::Point(p)) => self.move_to(abs(p)),
            ('L', Args::Point(p)) => self.line_to(abs(p)),
            ('H', Args::One(x)) => {
                let x = if relative { self.pos.x + x } else { x };
                self.line_to(Point::new(x, self.pos.y));
            }
            ('V', Args::One(y)) => {
                let y = if relative { self.pos.y + y } else { y };
                self.line_to(Point::new(self.pos.x, y));
            }
            ('C', Args::Three(c1, c2, p)) => self.curve_to(abs(c1), abs(c2), abs(p)),
            ('S', Args::Two(c2, p)) => {
                let c1 = last_cubic.map_or(self.pos, |c| self.pos + (self.pos - c));
                self.curve_to(c1, abs(c2), abs(p));
            }
            ('Q', Args::Two(q, p)) => self.quad_to(abs(q), abs(p)),
            ('T', Args::Point(p)) => {
                let q = last_quad.map_or(self.pos, |q| self.pos + (self.pos - q));
                self.quad_to(q, abs(p));
            }
            (
                'A',
                Args::Arc {
                    radii,
                    rotation,
                    large,
                    sweep,
                    end,
                },
            ) => self.arc_to(radii, rotation, large, sweep, abs(end)),
            ('Z', _) => self.close(),
            _ => {}
        }
    }
}

/// Endpoint to center arc conversion. Returns center, radii after
/// out-of-range correction, start angle and signed sweep, or `None` when a
/// radius is zero.
fn endpoint_to_center(
    p1: Point,
    p2: Point,
    radii: Vector,
    phi: f64,
    large: bool,
    sweep: bool,
) -> Option<(Point, Vector, f64, f64)> {
    let (mut rx, mut ry) = (radii.x.abs(), radii.y.abs());
    if rx == 0.0 || ry == 0.0 {
        return None;
    }
    let (sin, cos) = phi.sin_cos();
    let dx = (p1.x - p2.x) / 2.0;
    let dy = (p1.y - p2.y) / 2.0;
    let x1 = cos * dx + sin * dy;
    let y1 = -sin * dx + cos * dy;

    let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }
    let num = (rx * rx * ry * ry - rx * rx * y1 * y1 - ry * ry * x1 * x1).max(0.0);
    let den = rx * rx * y1 * y1 + ry * ry * x1 * x1;
    let mut k = (num / den).sqrt();
    if large == sweep {
        k = -k;
    }
    let cx1 = k * rx * y1 / ry;
    let cy1 = -k * ry * x1 / rx;
    let center = Point::new(
        cos * cx1 - sin * cy1 + (p1.x + p2.x) / 2.0,
        sin * cx1 + cos * cy1 + (p1.y + p2.y) / 2.0,
    );

    let angle = |ux: f64, uy: f64| uy.atan2(ux);
    let theta = angle((x1 - cx1) / rx, (y1 - cy1) / ry);
    let theta2 = angle((-x1 - cx1) / rx, (-y1 - cy1) / ry);
    let mut delta = (theta2 - theta).rem_euclid(TAU);
    if !sweep && delta > 0.0 {
        delta -= TAU;
    }
    Some((center, Vector::new(rx, ry), theta, delta))
}

/// Parse path data into sub-paths, in user units.
pub fn parse_path_data(d: &str) -> Vec<Path> {
    let mut b = Builder::default();
    let mut rest = d;
    while let Ok((tail, mut cmd)) = command(rest) {
        rest = tail;
        loop {
            match args(cmd)(rest) {
                Ok((tail, a)) => {
                    rest = tail;
                    b.exec(cmd, a);
                }
                Err(_) => break,
            }
            if cmd.eq_ignore_ascii_case(&'z') {
                break;
            }
            // coordinates following a move are implicit lines
            cmd = match cmd {
                'M' => 'L',
                'm' => 'l',
                c => c,
            };
            if command(rest).is_ok() || rest.trim().is_empty() {
                break;
            }
        }
    }
    b.finish();
    b.paths
}

/// Points of `polyline` and `polygon` elements, an odd trailing number is
/// ignored.
pub fn parse_points(s: &str) -> Vec<Point> {
    number_list(s)
        .chunks_exact(2)
        .map(|c| Point::new(c[0], c[1]))
        .collect()
}
