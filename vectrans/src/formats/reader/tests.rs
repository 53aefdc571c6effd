use super::*;
use test_case::test_case;

#[test]
fn read_big_and_little_endian() {
    let data = [0x01, 0x02, 0xff, 0xfe, 0x03, 0x00, 0x00, 0x00];
    let mut r = RecordReader::new(&data, 100, 7);
    assert_eq!(0x0102, r.be_u16().unwrap());
    assert_eq!(-2, r.be_i16().unwrap());
    assert_eq!(3, r.le_u32().unwrap());
    assert!(r.is_empty());
}

#[test_case(1, 0 ; "u16 on one byte")]
#[test_case(3, 2 ; "u32 on three bytes")]
fn short_payload(len: usize, skip: usize) {
    let data = vec![0u8; len];
    let mut r = RecordReader::new(&data, 10, 0x20);
    r.skip(skip.min(len)).unwrap();
    let e = if len == 1 { r.be_u16().map(|_| ()) } else { r.be_u32().map(|_| ()) };
    assert_eq!(
        Err(ConvertError::RecordDecode {
            offset: 10 + skip.min(len),
            record_id: 0x20,
            expected: if len == 1 { 2 } else { 4 },
            available: len - skip.min(len),
        }),
        e
    );
}

#[test]
fn seek_and_align() {
    let data = [1, 2, 3, 4];
    let r = RecordReader::new(&data, 0, 0);
    let mut r2 = r.at(3).unwrap();
    assert_eq!(4, r2.u8().unwrap());
    assert!(r.at(5).is_err());

    let mut r3 = r.at(1).unwrap();
    r3.align2();
    assert_eq!(2, r3.position());
}

#[test]
fn signed_24() {
    let data = [0xff, 0xff, 0xfe];
    assert_eq!(-2, RecordReader::new(&data, 0, 0).be_i24().unwrap());
}
