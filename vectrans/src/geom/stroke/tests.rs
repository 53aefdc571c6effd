use super::*;
use crate::geom::{paths_bbox, Segment};
use assert_approx_eq::assert_approx_eq;
use test_case::test_case;

fn stroke(width: f64, cap: Cap, join: Join) -> Stroke {
    Stroke {
        width,
        cap,
        join,
        ..Default::default()
    }
}

fn triangle() -> Path {
    Path::from_points(
        &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 10.0)],
        true,
    )
    .unwrap()
}

fn horizontal_line() -> Path {
    Path::from_points(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0)], false).unwrap()
}

#[test_log::test]
fn closed_triangle_round() {
    let input = triangle();
    let outline = stroke_to_curve(&[input.clone()], &stroke(2.0, Cap::Round, Join::Round));
    assert!(outline.len() >= 2);
    assert!(outline.iter().all(|p| p.closed));

    let b = paths_bbox(&outline).unwrap();
    let expanded = paths_bbox(&[input]).unwrap().inflate(1.0, 1.0);
    assert!(b.min.x < 0.0 && b.min.y < 0.0 && b.max.x > 10.0 && b.max.y > 10.0);
    assert!(b.contains_box(&expanded.inflate(-1e-3, -1e-3)));
    assert!(expanded.inflate(0.1, 0.1).contains_box(&b));
}

#[test]
fn open_line_butt() {
    let outline = stroke_to_curve(&[horizontal_line()], &stroke(2.0, Cap::Butt, Join::Miter));
    assert_eq!(1, outline.len());
    let b = paths_bbox(&outline).unwrap();
    assert_eq!(Point::new(0.0, -1.0), b.min);
    assert_eq!(Point::new(10.0, 1.0), b.max);
}

#[test_case(Cap::Butt => (0.0, 10.0))]
#[test_case(Cap::Square => (-1.0, 11.0))]
#[test_case(Cap::Round => (-1.0, 11.0))]
fn caps_extend_line(cap: Cap) -> (f64, f64) {
    let outline = stroke_to_curve(&[horizontal_line()], &stroke(2.0, cap, Join::Miter));
    let b = paths_bbox(&outline).unwrap();
    ((b.min.x * 1e6).round() / 1e6, (b.max.x * 1e6).round() / 1e6)
}

fn corner() -> Path {
    Path::from_points(
        &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
        false,
    )
    .unwrap()
}

#[test]
fn miter_join_reaches_corner() {
    let outline = stroke_to_curve(&[corner()], &stroke(2.0, Cap::Butt, Join::Miter));
    let b = paths_bbox(&outline).unwrap();
    assert_approx_eq!(11.0, b.max.x);
    assert_approx_eq!(-1.0, b.min.y);
    assert!(outline[0]
        .points()
        .any(|p| (p - Point::new(11.0, -1.0)).length() < 1e-9));
}

#[test]
fn miter_limit_falls_back_to_bevel() {
    let mut s = stroke(2.0, Cap::Butt, Join::Miter);
    // 90° corner needs a ratio of sqrt(2)
    s.miter_limit = 1.2;
    let outline = stroke_to_curve(&[corner()], &s);
    assert!(!outline[0]
        .points()
        .any(|p| (p - Point::new(11.0, -1.0)).length() < 1e-9));
}

#[test]
fn bevel_and_round_joins() {
    let bevel = stroke_to_curve(&[corner()], &stroke(2.0, Cap::Butt, Join::Bevel));
    assert!(bevel[0].segments.iter().all(|s| matches!(s, Segment::Line(_))));
    let round = stroke_to_curve(&[corner()], &stroke(2.0, Cap::Butt, Join::Round));
    assert!(round[0].segments.iter().any(|s| matches!(s, Segment::Curve { .. })));
}

#[test]
fn dash_runs_are_disjoint_contours() {
    let mut s = stroke(1.0, Cap::Butt, Join::Miter);
    s.dash = vec![2.0, 2.0];
    let outline = stroke_to_curve(&[horizontal_line()], &s);
    // on 0..2, 4..6, 8..10
    assert_eq!(3, outline.len());
    let b = paths_bbox(&outline[1..2]).unwrap();
    assert_approx_eq!(4.0, b.min.x);
    assert_approx_eq!(6.0, b.max.x);
}

#[test]
fn odd_dash_pattern_is_repeated() {
    assert_eq!(Some(vec![2.0, 4.0, 6.0, 2.0, 4.0, 6.0]), dash_pattern(&[1.0, 2.0, 3.0], 2.0));
    assert_eq!(None, dash_pattern(&[0.0, 0.0], 1.0));
    assert_eq!(None, dash_pattern(&[], 1.0));
}

#[test]
fn curves_are_flattened() {
    let mut p = Path::new(Point::new(0.0, 0.0));
    p.curve_to(Point::new(0.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 0.0));
    let outline = stroke_to_curve(&[p], &stroke(1.0, Cap::Butt, Join::Bevel));
    assert_eq!(1, outline.len());
    assert!(outline[0].segments.len() > 8);
}

#[test]
fn degenerate_input() {
    assert!(stroke_to_curve(&[horizontal_line()], &stroke(0.0, Cap::Round, Join::Round)).is_empty());
    let dot = Path::from_points(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0)], false).unwrap();
    assert!(stroke_to_curve(&[dot], &stroke(1.0, Cap::Round, Join::Round)).is_empty());
    assert!(stroke_to_curve(&[], &stroke(1.0, Cap::Round, Join::Round)).is_empty());
}
