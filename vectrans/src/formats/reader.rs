//! Bounds-checked cursor over one record payload.

use crate::error::{ConvertError, Result};
use nom::{
    number::complete::{
        be_f32, be_f64, be_i16, be_i24, be_i32, be_i8, be_u16, be_u24, be_u32, be_u8, le_f64,
        le_i16, le_i32, le_u16, le_u32,
    },
    IResult,
};

/// Reads never go past the payload; a short payload fails with
/// [`ConvertError::RecordDecode`] naming the absolute offset.
#[derive(Debug, Clone)]
pub(crate) struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Stream offset of `buf[0]`.
    offset: usize,
    record_id: u32,
}

macro_rules! read_methods {
    ($($name:ident: $t:ty = $parser:ident, $n:literal;)*) => {
        $(
            pub fn $name(&mut self) -> Result<$t> {
                self.parse($n, $parser)
            }
        )*
    };
}

impl<'a> RecordReader<'a> {
    pub fn new(buf: &'a [u8], offset: usize, record_id: u32) -> Self {
        Self {
            buf,
            pos: 0,
            offset,
            record_id,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn record_id(&self) -> u32 {
        self.record_id
    }

    pub fn decode_error(&self, expected: usize) -> ConvertError {
        ConvertError::RecordDecode {
            offset: self.offset + self.pos,
            record_id: self.record_id,
            expected,
            available: self.remaining(),
        }
    }

    /// Reader positioned at `pos` of the same payload.
    pub fn at(&self, pos: usize) -> Result<Self> {
        if pos > self.buf.len() {
            return Err(ConvertError::RecordDecode {
                offset: self.offset,
                record_id: self.record_id,
                expected: pos,
                available: self.buf.len(),
            });
        }
        Ok(Self {
            pos,
            ..self.clone()
        })
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(self.decode_error(n));
        }
        let r = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(r)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.bytes(n).map(|_| ())
    }

    /// Skip to the next even position.
    pub fn align2(&mut self) {
        if self.pos % 2 == 1 && self.pos < self.buf.len() {
            self.pos += 1;
        }
    }

    fn parse<O>(&mut self, n: usize, parser: impl FnOnce(&'a [u8]) -> IResult<&'a [u8], O>) -> Result<O> {
        let bytes = self.bytes(n)?;
        parser(bytes)
            .map(|(_, v)| v)
            .map_err(|_| self.decode_error(n))
    }

    read_methods! {
        be_u8: u8 = be_u8, 1;
        be_i8: i8 = be_i8, 1;
        be_u16: u16 = be_u16, 2;
        be_i16: i16 = be_i16, 2;
        be_u24: u32 = be_u24, 3;
        be_i24: i32 = be_i24, 3;
        be_u32: u32 = be_u32, 4;
        be_i32: i32 = be_i32, 4;
        be_f32: f32 = be_f32, 4;
        be_f64: f64 = be_f64, 8;
        le_u16: u16 = le_u16, 2;
        le_i16: i16 = le_i16, 2;
        le_u32: u32 = le_u32, 4;
        le_i32: i32 = le_i32, 4;
        le_f64: f64 = le_f64, 8;
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.be_u8()
    }
}

#[cfg(test)]
mod tests;
