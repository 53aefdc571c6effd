//! Headers and the flat record list.

use super::{function, function_name, PLACEABLE_KEY};
use crate::{
    error::{ConvertError, Result},
    formats::reader::RecordReader,
};
use log::debug;

/// Bytes of size and function ahead of the parameters.
const RECORD_HEADER: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeable {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
    /// Logical units per inch.
    pub inch: u16,
    /// XOR of the first ten words matches the stored checksum.
    pub checksum_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// 1 memory, 2 disk.
    pub kind: u16,
    pub version: u16,
    /// Whole file in words.
    pub size: u32,
    pub objects: u16,
    pub max_record: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    pub offset: usize,
    pub function: u16,
    pub params: &'a [u8],
}

impl<'a> Record<'a> {
    pub fn name(&self) -> String {
        function_name(self.function)
    }

    pub fn reader(&self) -> RecordReader<'a> {
        RecordReader::new(
            self.params,
            self.offset + RECORD_HEADER,
            u32::from(self.function),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metafile<'a> {
    pub placeable: Option<Placeable>,
    pub header: Header,
    /// Every record in stream order, unknown functions included, without
    /// the closing EOF record.
    pub records: Vec<Record<'a>>,
}

fn placeable(r: &mut RecordReader) -> Result<Placeable> {
    let start = r.position();
    let mut words = r.at(start)?;
    let mut sum = 0u16;
    for _ in 0..10 {
        sum ^= words.le_u16()?;
    }

    let _key = r.le_u32()?;
    let _handle = r.le_u16()?;
    let (left, top, right, bottom) = (r.le_i16()?, r.le_i16()?, r.le_i16()?, r.le_i16()?);
    let inch = r.le_u16()?;
    let _reserved = r.le_u32()?;
    let checksum = r.le_u16()?;
    Ok(Placeable {
        left,
        top,
        right,
        bottom,
        inch,
        checksum_ok: checksum == sum,
    })
}

fn header(r: &mut RecordReader) -> Result<Header> {
    let offset = r.position();
    let kind = r.le_u16()?;
    let header_words = r.le_u16()?;
    if !matches!(kind, 1 | 2) || header_words != 9 {
        return Err(ConvertError::structural(
            offset,
            0,
            format!("not a metafile header, type {kind}, size {header_words}"),
        ));
    }
    let version = r.le_u16()?;
    let size = r.le_u32()?;
    let objects = r.le_u16()?;
    let max_record = r.le_u32()?;
    let _params = r.le_u16()?;
    Ok(Header {
        kind,
        version,
        size,
        objects,
        max_record,
    })
}

pub fn parse(data: &[u8]) -> Result<Metafile<'_>> {
    let mut r = RecordReader::new(data, 0, 0);
    let placeable = match data {
        [a, b, c, d, ..] if u32::from_le_bytes([*a, *b, *c, *d]) == PLACEABLE_KEY => {
            let p = placeable(&mut r)?;
            if !p.checksum_ok {
                debug!("wmf placeable header checksum mismatch");
            }
            Some(p)
        }
        _ => None,
    };
    let header = header(&mut r)?;

    let mut records = vec![];
    let mut terminated = false;
    while !r.is_empty() {
        let offset = r.position();
        let size = r.le_u32()?;
        let function = r.le_u16()?;
        if function == function::EOF {
            terminated = true;
            break;
        }
        let len = usize::try_from(size)
            .ok()
            .and_then(|words| words.checked_mul(2))
            .and_then(|bytes| bytes.checked_sub(RECORD_HEADER))
            .ok_or_else(|| {
                ConvertError::structural(
                    offset,
                    u32::from(function),
                    format!("{} record of {size} words", function_name(function)),
                )
            })?;
        let params = RecordReader::new(data, 0, u32::from(function))
            .at(r.position())?
            .bytes(len)?;
        r.skip(len)?;
        records.push(Record {
            offset,
            function,
            params,
        });
    }
    if !terminated {
        debug!("wmf without EOF record");
    }
    Ok(Metafile {
        placeable,
        header,
        records,
    })
}

#[cfg(test)]
mod tests;
