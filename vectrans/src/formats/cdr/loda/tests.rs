use super::*;
use crate::formats::cdr::tests::{i32s, loda, trfd};
use assert_approx_eq::assert_approx_eq;
use riff_parser::File;

/// Parse a single data chunk through a RIFF wrapper to get its offsets.
fn open(chunk: Vec<u8>) -> Chunk {
    let data = crate::formats::cdr::tests::riff(b"CDRC", &[chunk]);
    File::open(&data).unwrap().chunks.remove(0)
}

#[test]
fn argument_table() {
    let c = open(loda(
        3,
        &[(arg::FILD, i32s(&[5])), (arg::COORDS, i32s(&[0])), (arg::OUTL, i32s(&[6]))],
    ));
    let l = Loda::parse(&c).unwrap();
    assert_eq!(Some(ObjectType::Curve), l.kind());
    assert_eq!(
        vec![(arg::FILD, 44), (arg::COORDS, 48), (arg::OUTL, 52)],
        l.args
    );
    assert_eq!(Some(5), l.property_id(arg::FILD).unwrap());
    assert_eq!(Some(6), l.property_id(arg::OUTL).unwrap());
    assert_eq!(None, l.property_id(arg::STLT).unwrap());
    assert!(l.paths().unwrap().is_empty());
}

#[test]
fn unknown_object_type() {
    let c = open(loda(0x26, &[]));
    assert_eq!(None, Loda::parse(&c).unwrap().kind());
}

#[test]
fn short_header() {
    let c = open(crate::formats::cdr::tests::chunk(b"loda", &[0; 12]));
    let err = Loda::parse(&c).unwrap_err();
    assert_eq!(
        crate::ConvertError::RecordDecode {
            offset: 12 + 8 + 12,
            record_id: u32::from_be_bytes(*b"loda"),
            expected: 4,
            available: 0,
        },
        err
    );
}

#[test]
fn version_7_rectangle_has_one_radius() {
    let c = open(loda(1, &[(arg::COORDS, i32s(&[10_000, 20_000, 1_000]))]));
    let (w, h, radii) = Loda::parse(&c).unwrap().rectangle(Version::V7).unwrap();
    assert_approx_eq!(10_000.0 * UNIT_TO_PT, w, 1e-12);
    assert_approx_eq!(20_000.0 * UNIT_TO_PT, h, 1e-12);
    assert_eq!([1_000.0 * UNIT_TO_PT; 4], radii);
}

#[test]
fn full_ellipse() {
    let c = open(loda(2, &[(arg::COORDS, i32s(&[10_000, 10_000, 0, 0, 0]))]));
    let (_, _, start, end, pie) = Loda::parse(&c).unwrap().ellipse().unwrap();
    assert_eq!((0.0, 0.0, false), (start, end, pie));
}

#[test]
fn curve_nodes() {
    let p = |x: f64, y: f64| Point::new(x, y);
    let points = [
        p(0.0, 0.0),
        p(1.0, 0.0),
        p(1.0, 1.0),
        p(2.0, 1.0),
        p(2.0, 2.0),
        p(5.0, 5.0),
        p(6.0, 5.0),
    ];
    // move, line, control, control, smooth curve + close, move, line
    let flags = [0x00, 0x40, 0xc0, 0xc0, 0x98, 0x00, 0x40];
    let paths = build_paths(&points, &flags);
    assert_eq!(2, paths.len());
    assert!(paths[0].closed);
    assert_eq!(
        Segment::Curve {
            c1: p(1.0, 1.0),
            c2: p(2.0, 1.0),
            end: p(2.0, 2.0),
            node: crate::geom::NodeKind::Smooth,
        },
        paths[0].segments[1]
    );
    // closing line back to the start
    assert_eq!(3, paths[0].segments.len());
    assert!(!paths[1].closed);
    assert_eq!(p(5.0, 5.0), paths[1].start);
    assert_eq!(1, paths[1].segments.len());
}

#[test]
fn curve_without_controls_is_a_line() {
    let points = [Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
    let paths = build_paths(&points, &[0x00, 0x80]);
    assert_eq!(Segment::Line(Point::new(3.0, 4.0)), paths[0].segments[0]);
}

#[test]
fn points_before_move_are_ignored() {
    let points = [Point::new(9.0, 9.0), Point::new(0.0, 0.0)];
    let paths = build_paths(&points, &[0x40, 0x00]);
    assert_eq!(1, paths.len());
    assert!(paths[0].segments.is_empty());
}

#[test]
fn trfd_matrix() {
    let c = open(trfd([2.0, 0.5, 10_000.0, 0.0, 3.0, -20_000.0]));
    let t = trafo(&c, Version(12)).unwrap();
    let mm = 72.0 / 25.4;
    let p = t.transform_point(Point::new(1.0, 2.0));
    assert_approx_eq!(2.0 + 1.0 + mm, p.x, 1e-9);
    assert_approx_eq!(6.0 - 2.0 * mm, p.y, 1e-9);
}

#[test]
fn trfd_too_short() {
    let c = open(crate::formats::cdr::tests::chunk(b"trfd", &[0; 40]));
    assert!(matches!(
        trafo(&c, Version(12)),
        Err(crate::ConvertError::RecordDecode { .. })
    ));
}
