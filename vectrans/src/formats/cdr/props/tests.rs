use super::*;
use crate::formats::cdr::tests::{chunk, fild, list, outl, riff};
use crate::color::ColorValue;
use assert_approx_eq::assert_approx_eq;
use riff_parser::File;
use test_case::test_case;

fn open(children: &[Vec<u8>]) -> Vec<Chunk> {
    File::open(&riff(b"CDRC", children)).unwrap().chunks
}

#[test_case(model::CMYK, [0, 50, 100, 20] => Color::cmyk(0.0, 0.5, 1.0, 0.2) ; "cmyk percent")]
#[test_case(model::CMYK255, [0, 0, 255, 255] => Color::cmyk(0.0, 0.0, 1.0, 1.0) ; "cmyk255")]
#[test_case(model::CMYK255_2, [255, 0, 0, 0] => Color::cmyk(1.0, 0.0, 0.0, 0.0) ; "cmyk255 again")]
#[test_case(model::CMY, [255, 255, 0, 9] => Color::cmyk(1.0, 1.0, 0.0, 0.0) ; "cmy")]
#[test_case(model::BGR, [255, 0, 0, 0] => Color::rgb8(0, 0, 255) ; "bgr")]
#[test_case(model::HLS, [0, 0, 0, 0] => Color::rgb(0.0, 0.0, 0.0) ; "hls black")]
#[test_case(model::GRAY, [255, 0, 0, 0] => Color::gray(1.0) ; "gray")]
#[test_case(model::LAB, [255, 0, 255, 0] => Color::lab(1.0, 0.0, 1.0) ; "lab")]
#[test_case(model::REGISTRATION, [0; 4] => Color::spot("Registration color", [0.0; 3], [1.0; 4]) ; "registration")]
#[test_case(1, [1, 2, 3, 4] => Color::black() ; "spot falls back")]
#[test_case(99, [0; 4] => Color::black() ; "unknown")]
fn color_models(model: u8, bytes: [u8; 4]) -> Color {
    color(model, bytes)
}

#[test_case(model::HSB, [120, 0, 255, 255], [0.0, 1.0, 0.0] ; "hsb green")]
#[test_case(model::YIQ, [255, 128, 128, 0], [1.0, 1.0, 1.0] ; "yiq white")]
fn converted_to_rgb(model: u8, bytes: [u8; 4], expected: [f64; 3]) {
    let ColorValue::Rgb(rgb) = color(model, bytes).value else {
        panic!("expect rgb");
    };
    for (e, v) in expected.into_iter().zip(rgb) {
        assert_approx_eq!(e, v, 0.02);
    }
}

#[test]
fn collect_from_nested_lists() {
    let mut font = vec![0; 18];
    font[..2].copy_from_slice(&3u16.to_le_bytes());
    font.extend("Arial".encode_utf16().flat_map(u16::to_le_bytes));
    font.extend_from_slice(&[0, 0]);
    let chunks = open(&[list(
        b"doc ",
        &[
            list(b"filc", &[fild(1, model::BGR, [0, 255, 0, 0])]),
            list(b"otlc", &[outl(2, 0x01, 100, [0, 0, 0], &[])]),
            chunk(b"font", &font),
        ],
    )]);
    let mut errors = vec![];
    let props = Properties::collect(&chunks, Version(12), &mut |e| errors.push(e));
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        Some(&FillProp::Solid(Color::rgb8(0, 255, 0))),
        props.fills.get(&1)
    );
    // "no outline" bit
    assert_eq!(Some(&None), props.outlines.get(&2));
    assert_eq!(Some("Arial"), props.fonts.get(&3).map(String::as_str));
}

#[test]
fn outline_fields() {
    let chunks = open(&[outl(4, 0x06, 7056, [255, 0, 0], &[3, 1])]);
    let (id, stroke) = outline(&chunks[0], Version(9)).unwrap();
    assert_eq!(4, id);
    let stroke = stroke.unwrap();
    assert_eq!(Cap::Round, stroke.cap);
    assert_eq!(Join::Bevel, stroke.join);
    assert!(stroke.scalable);
    assert_eq!(vec![3.0, 1.0], stroke.dash);
    assert_eq!(Color::rgb8(255, 0, 0), stroke.color);
    assert!((stroke.width - 72.0 / 25.4 * 0.7056).abs() < 1e-9);
}

#[test]
fn solid_dash_ignored_without_flag() {
    let chunks = open(&[outl(4, 0x00, 100, [0, 0, 0], &[3, 1])]);
    let stroke = outline(&chunks[0], Version(9)).unwrap().1.unwrap();
    assert!(stroke.dash.is_empty());
}

#[test]
fn fill_types() {
    let mut gradient = vec![0; 20];
    gradient[..4].copy_from_slice(&5u32.to_le_bytes());
    gradient[4] = 2;
    let mut none = vec![0; 8];
    none[..4].copy_from_slice(&6u32.to_le_bytes());
    let chunks = open(&[chunk(b"fill", &gradient), chunk(b"fild", &none)]);
    let mut errors = vec![];
    let props = Properties::collect(&chunks, Version(9), &mut |e| errors.push(e));
    assert!(errors.is_empty());
    assert_eq!(Some(&FillProp::Unsupported(2)), props.fills.get(&5));
    assert_eq!(Some(&FillProp::None), props.fills.get(&6));
}

#[test]
fn broken_property_is_reported() {
    let mut short = vec![0; 6];
    short[4] = 1;
    let chunks = open(&[chunk(b"fild", &short), fild(8, model::GRAY, [0; 4])]);
    let mut errors = vec![];
    let props = Properties::collect(&chunks, Version(9), &mut |e| errors.push(e));
    assert_eq!(1, errors.len());
    assert!(matches!(errors[0], crate::ConvertError::RecordDecode { .. }));
    assert_eq!(1, props.fills.len());
}

#[test]
fn x3_fill_layout() {
    let mut payload = vec![0; 39];
    payload[..4].copy_from_slice(&1u32.to_le_bytes());
    payload[12] = 1;
    payload[27] = model::CMYK;
    payload[35..39].copy_from_slice(&[0, 0, 0, 100]);
    let chunks = open(&[chunk(b"fild", &payload)]);
    let (_, prop) = fill(&chunks[0], Version::V13).unwrap();
    assert_eq!(FillProp::Solid(Color::cmyk(0.0, 0.0, 0.0, 1.0)), prop);
}
