//! Element framing and the BEGIN/END container tree.

use super::{element_name, id};
use crate::{
    error::{ConvertError, Result},
    formats::reader::RecordReader,
};
use log::debug;
use std::borrow::Cow;

/// Short form length value announcing a long form length word.
const LONG_FORM: u16 = 31;
/// Continuation flag of a long form length word.
const PARTITION_FLAG: u16 = 0x8000;

#[derive(Debug, Clone, PartialEq)]
pub struct Element<'a> {
    /// Header with the length bits masked out, see [`super::id`].
    pub id: u16,
    /// Stream offset of the header.
    pub offset: usize,
    /// Parameters with partitions joined and padding removed.
    pub params: Cow<'a, [u8]>,
    pub children: Vec<Element<'a>>,
}

impl<'a> Element<'a> {
    pub fn class(&self) -> u16 {
        self.id >> 12
    }

    pub fn name(&self) -> String {
        element_name(self.id)
    }

    pub fn reader(&self) -> RecordReader<'_> {
        RecordReader::new(&self.params, self.offset, u32::from(self.id))
    }
}

/// Read the element starting at `pos`, returns it and the position of the
/// next element.
pub fn read_element(data: &[u8], pos: usize) -> Result<(Element<'_>, usize)> {
    let mut r = RecordReader::new(data, 0, 0).at(pos)?;
    let header = r.be_u16()?;
    let id = header & 0xffe0;
    let mut len = header & 0x001f;
    let mut r = RecordReader::new(data, 0, u32::from(id)).at(r.position())?;

    let params = if len == LONG_FORM {
        let mut joined: Option<Vec<u8>> = None;
        let mut first: &[u8] = &[];
        loop {
            let word = r.be_u16()?;
            len = word & !PARTITION_FLAG;
            let part = r.bytes(usize::from(len))?;
            if len % 2 == 1 {
                r.align2();
            }
            match &mut joined {
                Some(v) => v.extend_from_slice(part),
                None if word & PARTITION_FLAG != 0 => {
                    let mut v = first.to_vec();
                    v.extend_from_slice(part);
                    joined = Some(v);
                }
                None => first = part,
            }
            if word & PARTITION_FLAG == 0 {
                break;
            }
        }
        joined.map_or(Cow::Borrowed(first), Cow::Owned)
    } else {
        let part = r.bytes(usize::from(len))?;
        if len % 2 == 1 {
            r.align2();
        }
        Cow::Borrowed(part)
    };

    let element = Element {
        id,
        offset: pos,
        params,
        children: vec![],
    };
    Ok((element, r.position()))
}

/// Every element of `data` in stream order, used for the elements embedded
/// in METAFILE DEFAULTS REPLACEMENT.
pub fn read_elements(data: &[u8]) -> Result<Vec<Element<'_>>> {
    let mut r = vec![];
    let mut pos = 0;
    while pos + 1 < data.len() {
        let (el, next) = read_element(data, pos)?;
        r.push(el);
        pos = next;
    }
    Ok(r)
}

fn closes(open: u16, close: u16) -> bool {
    matches!(
        (open, close),
        (id::BEGIN_PICTURE, id::END_PICTURE) | (id::BEGIN_FIGURE, id::END_FIGURE)
    )
}

/// Parse the whole metafile. The returned root is the BEGIN METAFILE
/// element, pictures and figures nest their elements as children.
pub fn parse(data: &[u8]) -> Result<Element<'_>> {
    let (root, mut pos) = read_element(data, 0)?;
    if root.id != id::BEGIN_METAFILE {
        return Err(ConvertError::structural(
            0,
            u32::from(root.id),
            format!("stream starts with {}, not BEGIN METAFILE", root.name()),
        ));
    }

    let mut stack = vec![root];
    while pos < data.len() {
        let (el, next) = read_element(data, pos)?;
        pos = next;
        match el.id {
            id::BEGIN_PICTURE | id::BEGIN_FIGURE => stack.push(el),
            id::END_PICTURE | id::END_FIGURE => {
                let mut container = match stack.pop() {
                    Some(c) if !stack.is_empty() && closes(c.id, el.id) => c,
                    _ => {
                        return Err(ConvertError::structural(
                            el.offset,
                            u32::from(el.id),
                            format!("unbalanced {}", el.name()),
                        ))
                    }
                };
                container.children.push(el);
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(container);
                }
            }
            id::END_METAFILE => {
                if stack.len() > 1 {
                    return Err(ConvertError::structural(
                        el.offset,
                        u32::from(el.id),
                        "END METAFILE inside a picture",
                    ));
                }
                stack[0].children.push(el);
                if pos < data.len() {
                    debug!("{} trailing bytes after END METAFILE", data.len() - pos);
                }
                break;
            }
            _ => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(el);
                }
            }
        }
    }

    // a missing END PICTURE or END METAFILE closes what is still open
    while let Some(container) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => {
                debug!("unterminated {} at {}", container.name(), container.offset);
                parent.children.push(container);
            }
            None => return Ok(container),
        }
    }
    Err(ConvertError::structural(0, 0, "empty metafile"))
}
