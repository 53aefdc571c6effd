use crate::{geom::SingularTransform, model::ModelError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// Stream does not match the format grammar, aborts the translation.
    #[error("structural parse error at offset {offset}, record {record_id:#x}: {message}")]
    StructuralParse {
        offset: usize,
        record_id: u32,
        message: String,
    },

    /// Payload of one record is shorter than its decode state requires.
    #[error("record {record_id:#x} at offset {offset}: expected {expected} bytes, {available} available")]
    RecordDecode {
        offset: usize,
        record_id: u32,
        expected: usize,
        available: usize,
    },

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error(transparent)]
    SingularTransform(#[from] SingularTransform),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ConvertError {
    pub fn structural(offset: usize, record_id: u32, message: impl Into<String>) -> Self {
        Self::StructuralParse {
            offset,
            record_id,
            message: message.into(),
        }
    }

    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature(feature.into())
    }

    /// True for errors that abort the whole translation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StructuralParse { .. } | Self::Model(_))
    }
}

impl From<riff_parser::Error> for ConvertError {
    fn from(e: riff_parser::Error) -> Self {
        match e {
            riff_parser::Error::Truncated {
                offset,
                expected,
                available,
            } => Self::RecordDecode {
                offset,
                record_id: 0,
                expected,
                available,
            },
            riff_parser::Error::UnsupportedCompression(tag) => {
                Self::UnsupportedFeature(format!("RIFF compression {tag}"))
            }
            riff_parser::Error::TooDeep(offset) => Self::structural(offset, 0, e.to_string()),
            e => Self::structural(0, 0, e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
