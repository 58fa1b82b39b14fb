//! Errors occurring while decoding from a source.

use alloc::boxed::Box;
use core::fmt;

use thiserror::Error;

use crate::sans::{
    data::UnsupportedBaseType,
    header::{DocumentHeaderError, HeaderChecksumMismatch},
};

/// The cause of a decoding failure.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Incorrect or incomplete file header.
    #[error("Incorrect file header: {0}")]
    MalformedHeader(#[from] DocumentHeaderError),
    /// Calculated and found header CRC values do not match.
    #[error("Calculated ({calculated:#06X}) and found ({found:#06X}) header CRC values do not match.")]
    HeaderChecksumMismatch { found: u16, calculated: u16 },
    /// The source ended inside a definition record.
    #[error("Definition record for local message type {local_message} is truncated.")]
    TruncatedDefinition { local_message: u8 },
    /// The source ended inside a data record, or before the declared number
    /// of record bytes (`local_message` is then unknown).
    #[error("Data record{} is truncated.", LocalMessage(.local_message))]
    TruncatedDataMessage { local_message: Option<u8> },
    /// A data record preceded any definition of its local message type.
    #[error("Found data for local message type {0} before its definition.")]
    UndefinedLocalMessageType(u8),
    /// A field declared an unknown base type.
    #[error("Unsupported base type ({0:#04X}).")]
    UnsupportedBaseType(u8),
    /// The source ended inside the file CRC.
    #[error("Unexpectedly reached the end of the source.")]
    UnexpectedEndOfStream,
    /// Calculated and found file CRC values do not match.
    #[error("Calculated ({calculated:#06X}) and found ({found:#06X}) file CRC values do not match.")]
    FileChecksumMismatch { found: u16, calculated: u16 },
    /// A record extended past the number of record bytes in the header.
    #[error("Records overran the declared data size ({consumed} of {declared} bytes).")]
    DataSizeExceeded { declared: u32, consumed: u64 },
    /// Decoding was stopped between records.
    #[error("Decoding was cancelled.")]
    Cancelled,
    /// The decoder already failed.
    #[error("Decoder halted after an earlier error.")]
    Halted,
    /// An error from the supplied source.
    #[error("Source failed: {0}")]
    Source(#[source] Box<dyn core::error::Error + Send + Sync>),
}

struct LocalMessage<'a>(&'a Option<u8>);

impl fmt::Display for LocalMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(local) => write!(f, " for local message type {local}"),
            None => Ok(()),
        }
    }
}

impl From<HeaderChecksumMismatch> for ErrorKind {
    fn from(err: HeaderChecksumMismatch) -> Self {
        let HeaderChecksumMismatch { found, calculated } = err;
        Self::HeaderChecksumMismatch { found, calculated }
    }
}

impl From<UnsupportedBaseType> for ErrorKind {
    fn from(err: UnsupportedBaseType) -> Self {
        Self::UnsupportedBaseType(err.0)
    }
}

/// Errors occurring while decoding from a source, with the position of the
/// failure.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    /// Offset in the document of the header, record or CRC being decoded.
    pub offset: u64,
    /// Index of the record being decoded, if any.
    pub record: Option<usize>,
}

impl Error {
    pub fn new(kind: ErrorKind, offset: u64, record: Option<usize>) -> Self {
        Self {
            kind,
            offset,
            record,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record {
            Some(record) => write!(f, "{} (record {record} at byte {})", self.kind, self.offset),
            None => write!(f, "{} (at byte {})", self.kind, self.offset),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.kind)
    }
}
