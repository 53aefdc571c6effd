//! Record stream of a XAR file and the tree built from it.

use super::{tag, SIGNATURE};
use crate::{
    error::{ConvertError, Result},
    formats::reader::RecordReader,
};
use flate2::{bufread::DeflateDecoder, Crc};
use log::debug;
use std::io::Read;

/// Deepest `DOWN` nesting accepted by [`build_tree`].
pub const MAX_DEPTH: usize = 128;

/// Largest compressed section inflated.
const MAX_INFLATED: u64 = 1 << 28;

const HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub tag: u32,
    /// Position in the stream counted from 1, `DOWN` and `UP` included.
    /// Colour references point at it.
    pub seq: u32,
    /// Offset of the payload. Records of a compressed section count from
    /// the section start in inflated bytes.
    pub offset: usize,
    pub data: Vec<u8>,
    pub children: Vec<Record>,
}

impl Record {
    pub fn reader(&self) -> RecordReader<'_> {
        RecordReader::new(&self.data, self.offset, self.tag)
    }
}

fn header(r: &mut RecordReader) -> Result<(u32, usize)> {
    let tag = r.le_u32()?;
    let size = r.le_u32()?;
    let size = usize::try_from(size).map_err(|_| r.decode_error(HEADER_SIZE))?;
    Ok((tag, size))
}

/// Payload of `size` bytes, a short stream names the record's tag.
fn payload<'a>(r: &mut RecordReader<'a>, tag: u32, size: usize) -> Result<&'a [u8]> {
    r.bytes(size).map_err(|e| match e {
        ConvertError::RecordDecode {
            offset,
            expected,
            available,
            ..
        } => ConvertError::RecordDecode {
            offset,
            record_id: tag,
            expected,
            available,
        },
        e => e,
    })
}

/// Inflate the raw deflate stream at the start of `data`. Returns the
/// inflated bytes and the number of compressed bytes consumed.
fn inflate(data: &[u8], offset: usize) -> Result<(Vec<u8>, usize)> {
    let error = |msg: String| ConvertError::structural(offset, tag::START_COMPRESSION, msg);
    let mut decoder = DeflateDecoder::new(data);
    let mut r = vec![];
    (&mut decoder)
        .take(MAX_INFLATED + 1)
        .read_to_end(&mut r)
        .map_err(|e| error(format!("xar inflate: {e}")))?;
    if r.len() as u64 > MAX_INFLATED {
        return Err(error(format!(
            "xar compressed section inflates past {MAX_INFLATED} bytes"
        )));
    }
    let rest = decoder.into_inner();
    Ok((r, data.len() - rest.len()))
}

/// Check the `ENDCOMPRESSION` payload against the inflated bytes it covers.
fn verify_section(end: &[u8], covered: &[u8], offset: usize) -> Result<()> {
    let mut r = RecordReader::new(end, offset, tag::END_COMPRESSION);
    let crc = r.le_u32()?;
    let size = r.le_u32()?;
    if usize::try_from(size).ok() != Some(covered.len()) {
        return Err(ConvertError::structural(
            offset,
            tag::END_COMPRESSION,
            format!("xar compressed section holds {} bytes, {size} declared", covered.len()),
        ));
    }
    let mut sum = Crc::new();
    sum.update(covered);
    if sum.sum() != crc {
        return Err(ConvertError::structural(
            offset,
            tag::END_COMPRESSION,
            "xar compressed section checksum mismatch",
        ));
    }
    Ok(())
}

/// Records in stream order up to `ENDOFFILE`, compressed sections
/// inflated. Compression other than deflate fails the whole import.
pub fn read_records(data: &[u8]) -> Result<Vec<Record>> {
    if !data.starts_with(SIGNATURE) {
        return Err(ConvertError::structural(0, 0, "missing XAR signature"));
    }
    let mut records = vec![];
    let mut seq = 0;
    let mut raw = RecordReader::new(data, 0, 0).at(SIGNATURE.len())?;
    while !raw.is_empty() {
        let (tag, size) = header(&mut raw)?;
        let offset = raw.position();
        let body = payload(&mut raw, tag, size)?;
        seq += 1;
        records.push(Record {
            tag,
            seq,
            offset,
            data: body.to_vec(),
            children: vec![],
        });
        match tag {
            tag::END_OF_FILE => break,
            tag::START_COMPRESSION => {
                let mut r = RecordReader::new(body, offset, tag);
                r.skip(3)?;
                let kind = r.u8()?;
                if kind != 0 {
                    return Err(ConvertError::unsupported(format!(
                        "xar compression type {kind}"
                    )));
                }
                let section = raw.position();
                let (inflated, used) = inflate(&data[section..], section)?;
                let mut inner = RecordReader::new(&inflated, section, 0);
                loop {
                    if inner.is_empty() {
                        return Err(ConvertError::structural(
                            section,
                            tag::START_COMPRESSION,
                            "xar compressed section without ENDCOMPRESSION",
                        ));
                    }
                    let (tag, size) = header(&mut inner)?;
                    seq += 1;
                    if tag == tag::END_COMPRESSION {
                        // the payload follows the deflate stream
                        raw = raw.at(section + used)?;
                        let offset = raw.position();
                        let end = payload(&mut raw, tag, size)?;
                        verify_section(end, &inflated[..inner.position()], offset)?;
                        if !inner.is_empty() {
                            debug!("{} bytes after xar ENDCOMPRESSION", inner.remaining());
                        }
                        records.push(Record {
                            tag,
                            seq,
                            offset,
                            data: end.to_vec(),
                            children: vec![],
                        });
                        break;
                    }
                    let offset = section + inner.position();
                    let body = payload(&mut inner, tag, size)?;
                    records.push(Record {
                        tag,
                        seq,
                        offset,
                        data: body.to_vec(),
                        children: vec![],
                    });
                }
            }
            _ => {}
        }
    }
    Ok(records)
}

fn close_level(stack: &mut Vec<Vec<Record>>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(children) = stack.pop() {
        if let Some(parent) = stack.last_mut().and_then(|l| l.last_mut()) {
            parent.children = children;
        }
    }
}

/// Nest records by their `DOWN` and `UP` markers, which are dropped.
/// Levels still open at the end of the stream are closed.
pub fn build_tree(records: Vec<Record>) -> Result<Vec<Record>> {
    let mut stack: Vec<Vec<Record>> = vec![vec![]];
    for rec in records {
        match rec.tag {
            tag::DOWN => {
                if stack.len() > MAX_DEPTH {
                    return Err(ConvertError::structural(
                        rec.offset,
                        rec.tag,
                        format!("xar records nested deeper than {MAX_DEPTH} levels"),
                    ));
                }
                if stack.last().map_or(true, Vec::is_empty) {
                    return Err(ConvertError::structural(
                        rec.offset,
                        rec.tag,
                        "xar DOWN without a record before it",
                    ));
                }
                stack.push(vec![]);
            }
            tag::UP => {
                if stack.len() < 2 {
                    return Err(ConvertError::structural(
                        rec.offset,
                        rec.tag,
                        "xar UP without a matching DOWN",
                    ));
                }
                close_level(&mut stack);
            }
            _ => {
                if let Some(level) = stack.last_mut() {
                    level.push(rec);
                }
            }
        }
    }
    while stack.len() > 1 {
        close_level(&mut stack);
    }
    Ok(stack.pop().unwrap_or_default())
}

#[cfg(test)]
pub(super) mod tests;
