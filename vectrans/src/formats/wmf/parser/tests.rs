use super::*;
use crate::formats::wmf::tests::{metafile, placeable as with_placeable, record, words};
use hex_literal::hex;

#[test]
fn plain_header_and_records() {
    let data = metafile(&[
        record(function::SAVE_DC, &[]),
        record(function::MOVE_TO, &words(&[1, 2])),
    ]);
    let m = parse(&data).unwrap();
    assert_eq!(None, m.placeable);
    assert_eq!(1, m.header.kind);
    assert_eq!(0x300, m.header.version);
    assert_eq!(u32::try_from(data.len() / 2).unwrap(), m.header.size);
    assert_eq!(2, m.records.len());
    assert_eq!(18, m.records[0].offset);
    assert_eq!(function::MOVE_TO, m.records[1].function);
    assert_eq!(&words(&[1, 2])[..], m.records[1].params);
    assert_eq!("MoveTo", m.records[1].name());
}

#[test]
fn placeable_checksum() {
    let data = with_placeable([-10, -20, 100, 200], 1440, &[]);
    let p = parse(&data).unwrap().placeable.unwrap();
    assert_eq!((-10, -20, 100, 200), (p.left, p.top, p.right, p.bottom));
    assert_eq!(1440, p.inch);
    assert!(p.checksum_ok);

    let mut bad = data.clone();
    bad[20] ^= 1;
    let p = parse(&bad).unwrap().placeable.unwrap();
    assert!(!p.checksum_ok);
}

#[test]
fn reader_offset_points_past_record_header() {
    let data = metafile(&[record(function::RECTANGLE, &words(&[1]))]);
    let m = parse(&data).unwrap();
    let mut r = m.records[0].reader();
    assert_eq!(1, r.le_i16().unwrap());
    let err = r.le_i16().unwrap_err();
    assert_eq!(
        ConvertError::RecordDecode {
            offset: 18 + 6 + 2,
            record_id: u32::from(function::RECTANGLE),
            expected: 2,
            available: 0,
        },
        err
    );
}

#[test]
fn records_stop_at_eof() {
    let mut data = metafile(&[record(function::SAVE_DC, &[])]);
    data.extend(record(function::SAVE_DC, &[]));
    assert_eq!(1, parse(&data).unwrap().records.len());
}

#[test_log::test]
fn missing_eof_is_accepted() {
    let mut data = metafile(&[record(function::SAVE_DC, &[])]);
    data.truncate(data.len() - 6);
    assert_eq!(1, parse(&data).unwrap().records.len());
}

#[test]
fn record_size_below_header() {
    let mut data = metafile(&[]);
    let eof = data.len() - 6;
    data.splice(eof..eof, hex!("02 00 00 00 1e 00"));
    assert!(matches!(
        parse(&data),
        Err(ConvertError::StructuralParse { record_id: 0x1e, .. })
    ));
}

#[test]
fn record_longer_than_file() {
    let mut data = metafile(&[]);
    data.truncate(data.len() - 6);
    data.extend(hex!("10 00 00 00 1b 04 00 00"));
    assert!(matches!(
        parse(&data),
        Err(ConvertError::RecordDecode { .. })
    ));
}

#[test]
fn header_size_must_be_nine_words() {
    let data = hex!("01 00 08 00 00 03 00 00 00 00 00 00 00 00 00 00 00 00");
    assert_eq!(
        Err(ConvertError::structural(
            0,
            0,
            "not a metafile header, type 1, size 8"
        )),
        parse(&data)
    );
}
