use super::*;
use hex_literal::hex;
use test_case::test_case;

fn reader(data: &[u8]) -> RecordReader<'_> {
    RecordReader::new(data, 0, 0)
}

#[test]
fn object_table_takes_lowest_free_slot() {
    let mut table = ObjectTable::default();
    assert_eq!(0, table.add(GdiObject::Palette));
    assert_eq!(1, table.add(GdiObject::Region));
    assert_eq!(2, table.add(GdiObject::Brush(Brush::Null)));
    assert!(table.delete(1));
    assert!(!table.delete(1));
    assert!(!table.delete(9));
    assert_eq!(None, table.get(1));
    assert_eq!(1, table.add(GdiObject::Pen(Pen::default())));
    assert_eq!(Some(&GdiObject::Pen(Pen::default())), table.get(1));
    assert_eq!(3, table.add(GdiObject::Font(Font::default())));
}

#[test_case(0x0000 => (PenStyle::Solid, Cap::Round, Join::Round) ; "defaults")]
#[test_case(0x0001 => (PenStyle::Dash, Cap::Round, Join::Round) ; "dash")]
#[test_case(0x2105 => (PenStyle::Null, Cap::Square, Join::Miter) ; "null square miter")]
#[test_case(0x1206 => (PenStyle::InsideFrame, Cap::Butt, Join::Bevel) ; "inside frame butt bevel")]
#[test_case(0x0009 => (PenStyle::Solid, Cap::Round, Join::Round) ; "unknown style")]
fn pen_style_bits(style: u16) -> (PenStyle, Cap, Join) {
    (pen_style(style), pen_cap(style), pen_join(style))
}

#[test]
fn read_pen() {
    let data = hex!("01 00 f6 ff 00 00 11 22 33 00");
    let pen = Pen::read(&mut reader(&data)).unwrap();
    assert_eq!(
        Pen {
            style: PenStyle::Dash,
            width: 10.0,
            color: Color::rgb8(0x11, 0x22, 0x33),
            cap: Cap::Round,
            join: Join::Round,
        },
        pen
    );
}

#[test_case(&hex!("00 00 ff 00 00 00 00 00") => Brush::Solid(Color::rgb8(255, 0, 0)) ; "solid")]
#[test_case(&hex!("01 00 ff 00 00 00 00 00") => Brush::Null ; "null")]
#[test_case(&hex!("02 00 00 00 ff 00 03 00") => Brush::Hatched { color: Color::rgb8(0, 0, 255), hatch: 3 } ; "hatched")]
#[test_case(&hex!("03 00 00 ff 00 00 00 00") => Brush::Solid(Color::rgb8(0, 255, 0)) ; "pattern without bitmap")]
fn read_brush(data: &[u8]) -> Brush {
    Brush::read(&mut reader(data)).unwrap()
}

#[test]
fn read_dib_pattern_brush() {
    let data = hex!("05 00 00 00 28 00 00 00");
    assert_eq!(
        Brush::Pattern(hex!("28 00 00 00").to_vec()),
        Brush::read_dib_pattern(&mut reader(&data)).unwrap()
    );
}

#[test]
fn read_font() {
    let mut data = hex!("e8 ff 00 00 84 03 00 00 bc 02 01 00 00 00 00 00 00 00").to_vec();
    data.extend_from_slice(b"Arial\0\0\0");
    let font = Font::read(&mut reader(&data)).unwrap();
    assert_eq!(
        Font {
            height: -24.0,
            escapement: 900.0,
            bold: true,
            italic: true,
            face: "Arial".to_owned(),
        },
        font
    );
}

#[test]
fn font_without_face_keeps_default() {
    let data = hex!("0c 00 00 00 00 00 00 00 90 01 00 00 00 00 00 00 00 00");
    let font = Font::read(&mut reader(&data)).unwrap();
    assert_eq!("Sans", font.face);
    assert!(!font.bold);
}

#[test]
fn truncated_pen() {
    let data = hex!("00 00 01 00");
    assert!(matches!(
        Pen::read(&mut reader(&data)),
        Err(crate::ConvertError::RecordDecode { .. })
    ));
}

#[test]
fn dash_in_pen_widths() {
    assert!(PenStyle::Solid.dash().is_empty());
    assert_eq!(vec![1.0, 1.0], PenStyle::Dot.dash());
    assert_eq!(6, PenStyle::DashDotDot.dash().len());
}
