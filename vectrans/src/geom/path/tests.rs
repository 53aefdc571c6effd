use super::*;
use assert_approx_eq::assert_approx_eq;

fn quarter_circle() -> Path {
    let mut p = Path::new(Point::new(1.0, 0.0));
    let k = crate::geom::KAPPA;
    p.curve_to(Point::new(1.0, k), Point::new(k, 1.0), Point::new(0.0, 1.0));
    p
}

#[test]
fn from_points_and_close() {
    assert!(Path::from_points(&[], false).is_none());
    let p = Path::from_points(
        &[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)],
        true,
    )
    .unwrap();
    assert!(p.closed);
    assert_eq!(3, p.segments.len());
    assert_eq!(p.start, p.end_point());

    // already at start, close adds nothing
    let mut p = p;
    p.close();
    assert_eq!(3, p.segments.len());
}

#[test]
fn degenerate() {
    assert!(Path::new(Point::new(1.0, 1.0)).is_degenerate());
    let p = Path::from_points(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0)], false).unwrap();
    assert!(p.is_degenerate());
    assert!(!quarter_circle().is_degenerate());
}

#[test]
fn bbox_includes_control_points() {
    let b = paths_bbox(&[quarter_circle()]).unwrap();
    assert_eq!(Point::new(0.0, 0.0), b.min);
    assert_eq!(Point::new(1.0, 1.0), b.max);
    assert!(paths_bbox(&[]).is_none());
}

#[test]
fn reversed_path() {
    let mut p = Path::new(Point::new(0.0, 0.0));
    p.line_to(Point::new(1.0, 0.0));
    p.curve_to(Point::new(2.0, 0.0), Point::new(2.0, 1.0), Point::new(2.0, 2.0));
    let r = p.reversed();
    assert_eq!(Point::new(2.0, 2.0), r.start);
    assert_eq!(
        vec![
            Segment::curve(Point::new(2.0, 1.0), Point::new(2.0, 0.0), Point::new(1.0, 0.0)),
            Segment::Line(Point::new(0.0, 0.0)),
        ],
        r.segments
    );
    assert_eq!(p, r.reversed());
}

#[test]
fn flatten_keeps_within_tolerance() {
    let flat = flatten_path(&quarter_circle(), 0.001);
    assert!(flat.segments.len() > 4);
    assert!(flat.segments.iter().all(|s| matches!(s, Segment::Line(_))));
    for s in &flat.segments {
        assert_approx_eq!(1.0, s.end().to_vector().length(), 0.002);
    }
    assert_eq!(Point::new(0.0, 1.0), flat.end_point());
}

#[test]
fn flatten_line_unchanged() {
    let p = Path::from_points(&[Point::new(0.0, 0.0), Point::new(5.0, 5.0)], false).unwrap();
    assert_eq!(p, flatten_paths(&[p.clone()], 0.5)[0]);
}

#[test]
fn transform_path() {
    let t = Trafo::translation(1.0, 2.0);
    let p = apply_trafo_to_path(&quarter_circle(), &t);
    assert_eq!(Point::new(2.0, 2.0), p.start);
    assert_eq!(Point::new(1.0, 3.0), p.end_point());
    assert_eq!(1, apply_trafo_to_paths(&[p], &t).len());
}

#[test]
fn split_and_evaluate_cubic() {
    let c = [
        Point::new(0.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(1.0, 1.0),
        Point::new(1.0, 0.0),
    ];
    let (left, right) = split_cubic(c, 0.5);
    assert_eq!(left[3], right[0]);
    let mid = cubic_point(c, 0.5);
    assert_approx_eq!(mid.x, left[3].x);
    assert_approx_eq!(0.75, mid.y);
}

#[test]
fn distance_to_segment() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(2.0, 0.0);
    assert_approx_eq!(1.0, distance_to_line(Point::new(1.0, 1.0), a, b));
    assert_approx_eq!(1.0, distance_to_line(Point::new(3.0, 0.0), a, b));
    assert_approx_eq!(5.0, distance_to_line(Point::new(3.0, 4.0), a, a));
}
