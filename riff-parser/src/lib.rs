//! Decode RIFF chunk trees.
//!
//! The entry type is `File`, use `File::open()` to parse a RIFF stream.
//! Every chunk owns its payload, `LIST` chunks own their children.
//!
//! CorelDRAW stores most of a document inside a `cmpr` list: a zlib stream
//! of chunks whose size fields are indices into a block-size table. These
//! lists are inflated and parsed in place, so callers see the plain tree.

mod inner;

pub use inner::{Error, Result, MAX_DEPTH};

pub type FourCC = [u8; 4];

pub const RIFF: FourCC = *b"RIFF";
pub const LIST: FourCC = *b"LIST";
pub const CMPR: FourCC = *b"cmpr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: FourCC,
    /// List type of `LIST`/`RIFF` chunks.
    pub list_type: Option<FourCC>,
    /// Offset of the chunk header in the stream it was read from; chunks of a
    /// compressed list count from the start of the inflated stream.
    pub offset: usize,
    /// Payload of data chunks, empty for lists.
    pub data: Vec<u8>,
    pub children: Vec<Chunk>,
}

impl Chunk {
    pub fn is_list(&self) -> bool {
        self.list_type.is_some()
    }

    /// List type for lists, chunk id otherwise.
    pub fn name(&self) -> FourCC {
        self.list_type.unwrap_or(self.id)
    }

    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name()).into_owned()
    }

    /// First direct child with `name`.
    pub fn find(&self, name: &FourCC) -> Option<&Chunk> {
        self.children.iter().find(|c| &c.name() == name)
    }

    /// Direct children with `name`.
    pub fn find_all<'a>(&'a self, name: &'a FourCC) -> impl Iterator<Item = &'a Chunk> + 'a {
        self.children.iter().filter(move |c| &c.name() == name)
    }

    /// First chunk with `name` below this one, depth first.
    pub fn find_deep(&self, name: &FourCC) -> Option<&Chunk> {
        self.children
            .iter()
            .find_map(|c| if &c.name() == name { Some(c) } else { c.find_deep(name) })
    }
}

/// A parsed RIFF stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub form_type: FourCC,
    pub chunks: Vec<Chunk>,
}

impl File {
    pub fn open(data: &[u8]) -> Result<Self> {
        let (form_type, chunks) = inner::parse_file(data)?;
        Ok(Self { form_type, chunks })
    }

    pub fn form_type_str(&self) -> String {
        String::from_utf8_lossy(&self.form_type).into_owned()
    }

    /// First top-level chunk with `name`.
    pub fn find(&self, name: &FourCC) -> Option<&Chunk> {
        self.chunks.iter().find(|c| &c.name() == name)
    }
}
