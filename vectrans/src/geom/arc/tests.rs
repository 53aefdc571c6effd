use super::*;
use crate::geom::{cubic_point, paths_bbox, Segment};
use assert_approx_eq::assert_approx_eq;
use proptest::prelude::*;
use std::f64::consts::PI;
use test_case::test_case;

/// Largest relative radial deviation of the bezier segments from the circle.
fn max_radial_error(path: &Path, center: Point, r: f64) -> f64 {
    let mut current = path.start;
    let mut max = 0.0f64;
    for s in &path.segments {
        if let Segment::Curve { c1, c2, end, .. } = *s {
            for i in 0..=32 {
                let p = cubic_point([current, c1, c2, end], f64::from(i) / 32.0);
                max = max.max(((p - center).length() - r).abs() / r);
            }
        }
        current = s.end();
    }
    max
}

#[test]
fn half_circle_chord() {
    let center = Point::new(0.0, 0.0);
    let path = arc_to_bezier(center, Vector::new(1.0, 1.0), 0.0, PI, ArcType::Chord).unwrap();
    assert!(path.closed);
    assert_eq!(Point::new(1.0, 0.0), path.start);
    // two quarter segments and the chord
    assert_eq!(3, path.segments.len());
    assert!(matches!(path.segments[2], Segment::Line(_)));
    assert!(max_radial_error(&path, center, 1.0) < 0.01);
}

#[test_case(ArcType::Arc => (false, 1))]
#[test_case(ArcType::Chord => (true, 2))]
#[test_case(ArcType::PieSlice => (true, 3))]
fn arc_closing(arc_type: ArcType) -> (bool, usize) {
    let path = arc_to_bezier(Point::new(0.0, 0.0), Vector::new(2.0, 1.0), 0.0, PI / 2.0, arc_type).unwrap();
    (path.closed, path.segments.len())
}

#[test]
fn full_ellipse() {
    let path = arc_to_bezier(Point::new(1.0, 1.0), Vector::new(2.0, 1.0), 0.5, 0.5, ArcType::PieSlice).unwrap();
    assert!(path.closed);
    assert_eq!(4, path.segments.len());
    assert_eq!(path.start, path.end_point());
    let b = paths_bbox(&[path]).unwrap();
    assert!(b.min.x <= -1.0 + 1e-9 && b.max.x >= 3.0 - 1e-9);
}

#[test]
fn zero_radius() {
    assert!(arc_to_bezier(Point::new(0.0, 0.0), Vector::new(0.0, 1.0), 0.0, 1.0, ArcType::Arc).is_none());
}

#[test_case(0.0, PI => PI)]
#[test_case(PI, 0.0 => PI)]
#[test_case(1.0, 1.0 => TAU)]
#[test_case(-PI / 2.0, PI / 2.0 => PI)]
fn sweep(start: f64, end: f64) -> f64 {
    arc_sweep(start, end)
}

#[test]
fn sharp_rounded_rect_bbox_is_exact() {
    let path = rounded_rect_to_bezier(Point::new(10.0, 20.0), 100.0, 50.0, [0.0; 4]);
    assert!(path.closed);
    assert!(path.segments.iter().all(|s| matches!(s, Segment::Line(_))));
    let b = paths_bbox(&[path]).unwrap();
    assert_eq!(Point::new(10.0, 20.0), b.min);
    assert_eq!(Point::new(110.0, 70.0), b.max);
}

#[test]
fn rounded_rect_corners() {
    let path = rounded_rect_to_bezier(Point::new(0.0, 0.0), 100.0, 50.0, [10.0, 0.0, 10.0, 0.0]);
    let curves = path
        .segments
        .iter()
        .filter(|s| matches!(s, Segment::Curve { .. }))
        .count();
    assert_eq!(2, curves);
    assert_eq!(Point::new(0.0, 10.0), path.start);
}

#[test]
fn rounded_rect_negative_size() {
    let path = rounded_rect_to_bezier(Point::new(10.0, 10.0), -10.0, -5.0, [0.0; 4]);
    let b = paths_bbox(&[path]).unwrap();
    assert_eq!(Point::new(0.0, 5.0), b.min);
    assert_eq!(Point::new(10.0, 10.0), b.max);
}

#[test]
fn polygon_in_unit_box() {
    let path = polygon_paths(4, 0.0, 0.0, 1.0, 1.0);
    assert!(path.closed);
    let b = paths_bbox(&[path]).unwrap();
    assert!(b.min.x >= -1e-9 && b.max.x <= 1.0 + 1e-9);
    assert_approx_eq!(1.0, b.max.y);
}

#[test]
fn center_by_3points() {
    let c = circle_center_by_3points(Point::new(1.0, 0.0), Point::new(0.0, 1.0), Point::new(-1.0, 0.0)).unwrap();
    assert_approx_eq!(0.0, c.x);
    assert_approx_eq!(0.0, c.y);
    assert!(circle_center_by_3points(Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)).is_none());
}

#[test_case(Point::new(1.0, 0.0), 0.0)]
#[test_case(Point::new(0.0, 1.0), PI / 2.0)]
#[test_case(Point::new(0.0, -1.0), 1.5 * PI)]
#[test_case(Point::new(1.0, -1e-12), TAU - 1e-12)]
fn angle_of_point(p: Point, exp: f64) {
    assert_approx_eq!(exp, point_angle(p, Point::new(0.0, 0.0)));
}

#[test]
fn three_point_arc_orientation() {
    let (_, r, start, end) =
        arc_by_3points(Point::new(1.0, 0.0), Point::new(0.0, 1.0), Point::new(-1.0, 0.0)).unwrap();
    assert_approx_eq!(1.0, r);
    assert_approx_eq!(0.0, start);
    assert_approx_eq!(PI, end);

    // clockwise through the bottom: counter-clockwise from the end point
    let (_, _, start, end) =
        arc_by_3points(Point::new(1.0, 0.0), Point::new(0.0, -1.0), Point::new(-1.0, 0.0)).unwrap();
    assert_approx_eq!(PI, start);
    assert_approx_eq!(0.0, end);
}

proptest! {
    #[test]
    fn arc_fidelity(start in 0.0f64..TAU, end in 0.0f64..TAU, r in 0.01f64..1000.0) {
        let center = Point::new(3.0, -2.0);
        let path = arc_to_bezier(center, Vector::new(r, r), start, end, ArcType::Chord).unwrap();
        prop_assert!(max_radial_error(&path, center, r) < 0.01);
    }
}
