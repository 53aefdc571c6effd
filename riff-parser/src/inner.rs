use crate::{Chunk, FourCC, CMPR, LIST, RIFF};
use flate2::read::ZlibDecoder;
use log::debug;
use nom::{
    bytes::complete::take,
    combinator::map,
    multi::many0,
    number::complete::le_u32,
    sequence::tuple,
    IResult,
};
use std::io::Read;
use thiserror::Error as ThisError;

pub type ParseResult<'a, O> = IResult<&'a [u8], O>;

const HEADER_SIZE: usize = 8;
/// Size, inflated size, table size, inflated table size, tag, version words.
const CMPR_HEADER_SIZE: usize = 24;
const CMPR_TAG: &[u8; 4] = b"CPng";
/// Deepest list nesting accepted.
pub const MAX_DEPTH: usize = 128;

/// Error may returned in this crate.
#[derive(PartialEq, Eq, Debug, Clone, ThisError)]
pub enum Error {
    #[error("Not a RIFF stream")]
    NotRiff,

    #[error("Truncated chunk at offset {offset}: expected {expected} bytes, {available} available")]
    Truncated {
        offset: usize,
        expected: usize,
        available: usize,
    },

    #[error("Unsupported compression {0}")]
    UnsupportedCompression(String),

    #[error("Block size index {0} out of range")]
    BadBlockIndex(u32),

    #[error("Inflate failed: {0}")]
    Inflate(String),

    #[error("Lists nested deeper than {} levels at offset {0}", MAX_DEPTH)]
    TooDeep(usize),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl<E: std::fmt::Debug> From<nom::Err<E>> for Error {
    fn from(e: nom::Err<E>) -> Self {
        Self::ParseError(format!("{:?}", e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn four_cc(buf: &[u8]) -> ParseResult<FourCC> {
    map(take(4usize), |b: &[u8]| [b[0], b[1], b[2], b[3]])(buf)
}

fn parse_header(buf: &[u8]) -> ParseResult<(FourCC, u32)> {
    tuple((four_cc, le_u32))(buf)
}

struct CmprHeader {
    compressed: u32,
    inflated: u32,
    table_inflated: u32,
    tag: FourCC,
}

fn parse_cmpr_header(buf: &[u8]) -> ParseResult<CmprHeader> {
    map(
        tuple((le_u32, le_u32, le_u32, le_u32, four_cc)),
        |(compressed, inflated, _, table_inflated, tag)| CmprHeader {
            compressed,
            inflated,
            table_inflated,
            tag,
        },
    )(buf)
}

fn parse_block_sizes(buf: &[u8]) -> ParseResult<Vec<u32>> {
    many0(le_u32)(buf)
}

fn ensure(buf: &[u8], expected: usize, offset: usize) -> Result<()> {
    if buf.len() < expected {
        return Err(Error::Truncated {
            offset,
            expected,
            available: buf.len(),
        });
    }
    Ok(())
}

pub(crate) fn parse_file(data: &[u8]) -> Result<(FourCC, Vec<Chunk>)> {
    ensure(data, HEADER_SIZE + 4, 0)?;
    let (buf, (id, size)) = parse_header(data)?;
    if id != RIFF {
        return Err(Error::NotRiff);
    }
    let size = size as usize;
    ensure(buf, size, 0)?;
    let (body, form_type) = four_cc(&buf[..size])?;
    debug!("RIFF form {:?}", String::from_utf8_lossy(&form_type));
    let chunks = ChunkParser { block_sizes: None }.parse_chunks(body, HEADER_SIZE + 4, 0)?;
    Ok((form_type, chunks))
}

struct ChunkParser<'s> {
    /// Set inside compressed lists, size fields index this table.
    block_sizes: Option<&'s [u32]>,
}

impl<'s> ChunkParser<'s> {
    fn chunk_size(&self, raw: u32) -> Result<usize> {
        match self.block_sizes {
            None => Ok(raw as usize),
            Some(sizes) => sizes
                .get(raw as usize)
                .map(|s| *s as usize)
                .ok_or(Error::BadBlockIndex(raw)),
        }
    }

    /// Parse consecutive chunks filling `buf`, `base` is the offset of `buf`,
    /// `depth` the number of enclosing lists.
    fn parse_chunks(&self, buf: &[u8], base: usize, depth: usize) -> Result<Vec<Chunk>> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(base));
        }
        let mut r = vec![];
        let mut pos = 0;
        while pos < buf.len() {
            let offset = base + pos;
            let rest = &buf[pos..];
            ensure(rest, HEADER_SIZE, offset)?;
            let (body, (id, raw_size)) = parse_header(rest)?;
            let size = self.chunk_size(raw_size)?;
            ensure(body, size, offset)?;
            let payload = &body[..size];

            let chunk = if id == LIST || id == RIFF {
                ensure(payload, 4, offset)?;
                let (children_buf, list_type) = four_cc(payload)?;
                let children_base = offset + HEADER_SIZE + 4;
                let children = if list_type == CMPR && self.block_sizes.is_none() {
                    parse_cmpr(children_buf, children_base, depth + 1)?
                } else {
                    self.parse_chunks(children_buf, children_base, depth + 1)?
                };
                Chunk {
                    id,
                    list_type: Some(list_type),
                    offset,
                    data: vec![],
                    children,
                }
            } else {
                Chunk {
                    id,
                    list_type: None,
                    offset,
                    data: payload.to_vec(),
                    children: vec![],
                }
            };
            r.push(chunk);
            pos = (pos + HEADER_SIZE + size + (size & 1)).min(buf.len());
        }
        Ok(r)
    }
}

/// Inflate a zlib stream, failing when it yields more than `limit` bytes.
fn inflate(data: &[u8], limit: u32) -> Result<Vec<u8>> {
    let mut r = vec![];
    ZlibDecoder::new(data)
        .take(u64::from(limit) + 1)
        .read_to_end(&mut r)
        .map_err(|e| Error::Inflate(e.to_string()))?;
    if r.len() > limit as usize {
        return Err(Error::Inflate(format!("more than the declared {limit} bytes")));
    }
    Ok(r)
}

/// Inflate a `cmpr` list payload and parse the chunks inside.
fn parse_cmpr(buf: &[u8], offset: usize, depth: usize) -> Result<Vec<Chunk>> {
    ensure(buf, CMPR_HEADER_SIZE, offset)?;
    let (_, header) = parse_cmpr_header(buf)?;
    if &header.tag != CMPR_TAG {
        return Err(Error::UnsupportedCompression(
            String::from_utf8_lossy(&header.tag).into_owned(),
        ));
    }
    let compressed_size = header.compressed as usize;
    let data = &buf[CMPR_HEADER_SIZE..];
    ensure(data, compressed_size, offset)?;
    let stream = inflate(&data[..compressed_size], header.inflated)?;
    let sizes_data = inflate(&data[compressed_size..], header.table_inflated)?;
    let (_, block_sizes) = parse_block_sizes(&sizes_data)?;
    debug!(
        "cmpr list: {} bytes inflated, {} block sizes",
        stream.len(),
        block_sizes.len()
    );
    ChunkParser {
        block_sizes: Some(&block_sizes),
    }
    .parse_chunks(&stream, 0, depth)
}
