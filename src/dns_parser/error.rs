use std::io;

use thiserror::Error;

use super::Section;

/// Error parsing or serializing a DNS packet
#[derive(Debug, Error)]
pub enum Error {
    #[error("packet is smaller than header size")]
    TruncatedHeader,
    #[error("packet is truncated in {section} section at entry {index}")]
    TruncatedMessage { section: Section, index: usize },
    #[error("packet has incomplete data")]
    UnexpectedEOF,
    #[error("name pointer at offset {at} refers to offset {target}")]
    InvalidPointer { at: usize, target: usize },
    #[error("name pointers form a loop")]
    PointerLoop,
    #[error("{0:?} is not a valid address")]
    InvalidAddress(String),
    #[error("wrong (too short or too long) size of RDATA")]
    WrongRdataLength,
    #[error("label in domain name has unknown label format")]
    UnknownLabelFormat,
    #[error("invalid characters encountered while reading label")]
    LabelIsNotUtf8,
    #[error("label {0:?} must be between 1 and 63 bytes long")]
    InvalidLabel(String),
    #[error("RDATA of {0} bytes does not fit into a record")]
    RdataTooLong(usize),
    #[error("too many entries in {0} section")]
    TooManyRecords(Section),
    #[error("{0} bytes left after the last record")]
    TrailingBytes(usize),
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Attaches a location to a short read, other errors pass through
    pub(crate) fn at(self, section: Section, index: usize) -> Error {
        match self {
            Error::UnexpectedEOF => Error::TruncatedMessage { section, index },
            other => other,
        }
    }
}
