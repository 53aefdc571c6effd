use super::*;
use crate::geom::Point;
use assert_approx_eq::assert_approx_eq;
use test_case::test_case;

fn apply(s: &str, x: f64, y: f64) -> Point {
    parse_transform(s).transform_point(Point::new(x, y))
}

#[test_case("translate(10)", (1.0, 1.0), (11.0, 1.0))]
#[test_case("translate(10, 20)", (1.0, 1.0), (11.0, 21.0))]
#[test_case("scale(2)", (1.0, 3.0), (2.0, 6.0))]
#[test_case("scale(2 3)", (1.0, 1.0), (2.0, 3.0))]
#[test_case("rotate(90)", (1.0, 0.0), (0.0, 1.0))]
#[test_case("rotate(180 5 5)", (0.0, 0.0), (10.0, 10.0))]
#[test_case("skewX(45)", (0.0, 1.0), (1.0, 1.0))]
#[test_case("skewY(45)", (1.0, 0.0), (1.0, 1.0))]
#[test_case("matrix(1 0 0 1 5 6)", (0.0, 0.0), (5.0, 6.0))]
#[test_case("translate(10,0) scale(2)", (1.0, 1.0), (12.0, 2.0) ; "rightmost first")]
#[test_case("scale(2),translate(10,0)", (1.0, 1.0), (22.0, 2.0) ; "comma separated")]
#[test_case("bogus(1) translate(1 1)", (0.0, 0.0), (1.0, 1.0) ; "unknown skipped")]
#[test_case("", (3.0, 4.0), (3.0, 4.0) ; "empty")]
fn transforms(s: &str, p: (f64, f64), expected: (f64, f64)) {
    let r = apply(s, p.0, p.1);
    assert_approx_eq!(expected.0, r.x, 1e-9);
    assert_approx_eq!(expected.1, r.y, 1e-9);
}
