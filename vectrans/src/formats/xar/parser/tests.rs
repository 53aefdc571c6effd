use super::*;
use flate2::{write::DeflateEncoder, Compression};
use std::io::Write;
use test_case::test_case;

pub(crate) fn record(tag: u32, payload: &[u8]) -> Vec<u8> {
    let mut r = tag.to_le_bytes().to_vec();
    r.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    r.extend_from_slice(payload);
    r
}

pub(crate) fn file(records: &[Vec<u8>]) -> Vec<u8> {
    let mut r = SIGNATURE.to_vec();
    r.extend(records.iter().flatten());
    r.extend(record(tag::END_OF_FILE, &[]));
    r
}

/// `STARTCOMPRESSION`, the deflated `records` and `ENDCOMPRESSION` header,
/// then the `ENDCOMPRESSION` payload of `crc` and size.
pub(crate) fn compressed(records: &[Vec<u8>], crc: Option<u32>) -> Vec<u8> {
    let mut plain: Vec<u8> = records.concat();
    plain.extend_from_slice(&tag::END_COMPRESSION.to_le_bytes());
    plain.extend_from_slice(&8u32.to_le_bytes());
    let mut sum = Crc::new();
    sum.update(&plain);

    let mut e = DeflateEncoder::new(vec![], Compression::default());
    e.write_all(&plain).unwrap();
    let mut r = record(tag::START_COMPRESSION, &[0, 0, 0, 0]);
    r.extend(e.finish().unwrap());
    r.extend_from_slice(&crc.unwrap_or_else(|| sum.sum()).to_le_bytes());
    r.extend_from_slice(&(plain.len() as u32).to_le_bytes());
    r
}

fn tags(records: &[Record]) -> Vec<u32> {
    records.iter().map(|r| r.tag).collect()
}

#[test]
fn stream_order_and_sequence() {
    let data = file(&[
        record(tag::FILE_HEADER, b"CXN"),
        record(tag::DEFINE_RGB_COLOUR, &[255, 0, 0]),
    ]);
    let records = read_records(&data).unwrap();
    assert_eq!(
        vec![tag::FILE_HEADER, tag::DEFINE_RGB_COLOUR, tag::END_OF_FILE],
        tags(&records)
    );
    assert_eq!(vec![1, 2, 3], records.iter().map(|r| r.seq).collect::<Vec<_>>());
    assert_eq!(16, records[0].offset);
    assert_eq!(b"CXN".to_vec(), records[0].data);
}

#[test]
fn records_after_end_of_file_are_ignored() {
    let mut data = file(&[]);
    data.extend(record(tag::LAYER, &[]));
    assert_eq!(vec![tag::END_OF_FILE], tags(&read_records(&data).unwrap()));
}

#[test]
fn down_and_up_nest_records() {
    let data = file(&[
        record(tag::LAYER, &[]),
        record(tag::DOWN, &[]),
        record(tag::GROUP, &[]),
        record(tag::DOWN, &[]),
        record(tag::PATH_RELATIVE, &[]),
        record(tag::UP, &[]),
        record(tag::LINE_WIDTH, &[0; 4]),
        record(tag::UP, &[]),
    ]);
    let tree = build_tree(read_records(&data).unwrap()).unwrap();
    assert_eq!(vec![tag::LAYER, tag::END_OF_FILE], tags(&tree));
    let layer = &tree[0];
    assert_eq!(vec![tag::GROUP, tag::LINE_WIDTH], tags(&layer.children));
    assert_eq!(vec![tag::PATH_RELATIVE], tags(&layer.children[0].children));
    // DOWN and UP take sequence numbers
    assert_eq!(5, layer.children[0].children[0].seq);
}

#[test]
fn open_levels_close_at_end() {
    let data = file(&[
        record(tag::LAYER, &[]),
        record(tag::DOWN, &[]),
        record(tag::GROUP, &[]),
    ]);
    let tree = build_tree(read_records(&data).unwrap()).unwrap();
    assert_eq!(vec![tag::LAYER], tags(&tree));
    assert_eq!(vec![tag::GROUP, tag::END_OF_FILE], tags(&tree[0].children));
}

#[test_case(&[tag::DOWN] ; "down first")]
#[test_case(&[tag::LAYER, tag::UP] ; "up without down")]
fn bad_nesting(list: &[u32]) {
    let records: Vec<_> = list.iter().map(|t| record(*t, &[])).collect();
    let r = build_tree(read_records(&file(&records)).unwrap());
    assert!(matches!(r, Err(ConvertError::StructuralParse { .. })), "{r:?}");
}

#[test]
fn nesting_limit() {
    let nested = |depth: usize| {
        let mut records = vec![];
        for _ in 0..depth {
            records.push(record(tag::GROUP, &[]));
            records.push(record(tag::DOWN, &[]));
        }
        file(&records)
    };
    let tree = build_tree(read_records(&nested(MAX_DEPTH)).unwrap()).unwrap();
    assert_eq!(vec![tag::GROUP], tags(&tree));

    let err = build_tree(read_records(&nested(MAX_DEPTH + 1)).unwrap()).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("nested deeper"), "{err}");
}

#[test]
fn missing_signature() {
    let r = read_records(b"XARB\xa3\xa3\r\n");
    assert!(matches!(r, Err(ConvertError::StructuralParse { offset: 0, .. })));
}

#[test]
fn truncated_header() {
    let mut data = SIGNATURE.to_vec();
    data.extend_from_slice(&[2, 0, 0]);
    assert_eq!(
        ConvertError::RecordDecode {
            offset: 8,
            record_id: 0,
            expected: 4,
            available: 3
        },
        read_records(&data).unwrap_err()
    );
}

#[test]
fn truncated_payload_names_tag() {
    let mut data = SIGNATURE.to_vec();
    data.extend(record(tag::LINE_WIDTH, &[1, 2, 3, 4]));
    data.truncate(data.len() - 1);
    assert_eq!(
        ConvertError::RecordDecode {
            offset: 16,
            record_id: tag::LINE_WIDTH,
            expected: 4,
            available: 3
        },
        read_records(&data).unwrap_err()
    );
}

#[test_log::test]
fn compressed_section_is_inflated() {
    let data = file(&[
        record(tag::FILE_HEADER, &[]),
        compressed(
            &[
                record(tag::DEFINE_RGB_COLOUR, &[0, 0, 255]),
                record(tag::LAYER, &[]),
            ],
            None,
        ),
        record(tag::GROUP, &[]),
    ]);
    let records = read_records(&data).unwrap();
    assert_eq!(
        vec![
            tag::FILE_HEADER,
            tag::START_COMPRESSION,
            tag::DEFINE_RGB_COLOUR,
            tag::LAYER,
            tag::END_COMPRESSION,
            tag::GROUP,
            tag::END_OF_FILE
        ],
        tags(&records)
    );
    assert_eq!(vec![0, 0, 255], records[2].data);
    assert_eq!(4, records[3].seq);
    assert_eq!(8, records[4].data.len());
}

#[test]
fn compressed_section_checksum_mismatch() {
    let data = file(&[compressed(&[record(tag::LAYER, &[])], Some(0xdead_beef))]);
    let err = read_records(&data).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::StructuralParse {
            record_id: tag::END_COMPRESSION,
            ..
        }
    ));
}

#[test]
fn unknown_compression_type() {
    let data = file(&[record(tag::START_COMPRESSION, &[0, 0, 0, 1])]);
    assert_eq!(
        ConvertError::unsupported("xar compression type 1"),
        read_records(&data).unwrap_err()
    );
}

#[test]
fn compressed_section_without_end() {
    let mut e = DeflateEncoder::new(vec![], Compression::default());
    e.write_all(&record(tag::LAYER, &[])).unwrap();
    let mut section = record(tag::START_COMPRESSION, &[0, 0, 0, 0]);
    section.extend(e.finish().unwrap());
    let err = read_records(&file(&[section])).unwrap_err();
    assert!(err.to_string().contains("without ENDCOMPRESSION"), "{err}");
}
