use super::*;
use assert_approx_eq::assert_approx_eq;
use hex_literal::hex;
use test_case::test_case;

fn reader(data: &[u8]) -> RecordReader<'_> {
    RecordReader::new(data, 0, 0)
}

#[test_case(0, 9, 23 => Some(RealPrecision::Float32))]
#[test_case(0, 12, 52 => Some(RealPrecision::Float64))]
#[test_case(1, 16, 16 => Some(RealPrecision::Fixed32))]
#[test_case(1, 32, 32 => Some(RealPrecision::Fixed64))]
#[test_case(1, 8, 8 => None)]
fn real_precision(form: i16, a: i64, b: i64) -> Option<RealPrecision> {
    RealPrecision::from_params(form, a, b).ok()
}

#[test_case(RealPrecision::Fixed32, &hex!("ff fe 80 00"), -1.5)]
#[test_case(RealPrecision::Fixed64, &hex!("00 00 00 02 40 00 00 00"), 2.25)]
#[test_case(RealPrecision::Float32, &hex!("3f c0 00 00"), 1.5)]
#[test_case(RealPrecision::Float64, &hex!("40 09 00 00 00 00 00 00"), 3.125)]
fn read_real(precision: RealPrecision, data: &[u8], expected: f64) {
    let state = DecodeState {
        real: precision,
        ..Default::default()
    };
    assert_approx_eq!(expected, state.real(&mut reader(data)).unwrap(), 1e-12);
}

#[test]
fn vdc_follows_vdc_type() {
    let mut state = DecodeState::default();
    assert_eq!(2, state.vdc_size());
    assert_eq!(
        Point::new(-2.0, 300.0),
        state.point(&mut reader(&hex!("ff fe 01 2c"))).unwrap()
    );

    state.vdc_type = VdcType::Real;
    assert_eq!(4, state.vdc_size());
    assert_approx_eq!(0.5, state.vdc(&mut reader(&hex!("00 00 80 00"))).unwrap());

    state.vdc_type = VdcType::Integer;
    state.vdc_int_bytes = 4;
    assert_approx_eq!(
        70000.0,
        state.vdc(&mut reader(&hex!("00 01 11 70"))).unwrap()
    );
}

#[test]
fn default_extent() {
    let mut state = DecodeState::default();
    assert_eq!(Point::new(32767.0, 32767.0), state.extent().1);
    state.vdc_type = VdcType::Real;
    assert_eq!(Point::new(1.0, 1.0), state.extent().1);
    state.vdc_extent = Some((Point::new(-5.0, -5.0), Point::new(5.0, 5.0)));
    assert_eq!(Point::new(-5.0, -5.0), state.extent().0);
}

#[test]
fn points_until_exhausted() {
    let state = DecodeState::default();
    let points = state
        .points(&mut reader(&hex!("00 01 00 02 00 03 00 04 00")))
        .unwrap();
    assert_eq!(vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)], points);
}

#[test]
fn colour_by_selection_mode() {
    let mut state = DecodeState::default();
    assert_eq!(
        Color::rgb(0.0, 1.0, 0.0),
        state.colour(&mut reader(&[3])).unwrap()
    );
    // outside the table
    assert_eq!(
        Color::rgb(0.0, 0.0, 0.0),
        state.colour(&mut reader(&[200])).unwrap()
    );

    state.colour_mode = ColourMode::Direct;
    state.colour_max = [100.0; 3];
    assert_eq!(
        Color::rgb(0.5, 1.0, 0.0),
        state.colour(&mut reader(&[50, 100, 0])).unwrap()
    );
}

#[test]
fn strings() {
    let state = DecodeState::default();
    assert_eq!(
        "caf\u{e9}",
        state.string(&mut reader(&hex!("04 63 61 66 e9"))).unwrap()
    );
    let mut long = vec![255, 0x01, 0x00];
    long.extend(std::iter::repeat(b'x').take(256));
    assert_eq!(256, state.string(&mut reader(&long)).unwrap().len());
    assert_eq!("", state.string(&mut reader(&[])).unwrap());
    assert!(matches!(
        state.string(&mut reader(&hex!("05 61"))),
        Err(ConvertError::RecordDecode {
            expected: 5,
            available: 1,
            ..
        })
    ));
}

#[test_case(8 => Some(1))]
#[test_case(24 => Some(3))]
#[test_case(12 => None)]
fn precision(bits: i64) -> Option<usize> {
    precision_bytes(bits, "integer").ok()
}

#[test]
fn width_and_interior_modes() {
    assert_eq!(WidthMode::Absolute, WidthMode::from(0));
    assert_eq!(WidthMode::Scaled, WidthMode::from(7));
    assert_eq!(InteriorStyle::Hatch, InteriorStyle::from(3));
    assert_eq!(InteriorStyle::Hollow, InteriorStyle::from(-1));
}
