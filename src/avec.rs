//! Convenience interfaces for common decoding patterns.
//!
//! A [`Decoder`] drives the finite-state machine of [`crate::sans`] from a
//! [`Source`] of bytes, keeping the table of active definitions and
//! collecting data messages into a [`Content`]. The functions in this module
//! decode whole documents from slices and readers:
//!
//! ```
//! let content = fitfile::avec::decode_slice(&data)?;
//!
//! for message in content.messages_of(20) {
//!     let heart_rate = message.value(3);
//! }
//! ```
//!
//! To inspect a document record by record, or to stop early, create a
//! [`Decoder`] and call [`Decoder::step`] or [`Decoder::run`].

use alloc::boxed::Box;

use thiserror::Error;

use crate::content::Content;

pub mod decoder;
pub mod error;
#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

pub use decoder::{Decoder, State};
pub use error::{Error, ErrorKind};
#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

/// An error reading from a [`Source`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source was exhausted after supplying `read` bytes of the request.
    #[error("Source exhausted after {read} bytes of the request.")]
    EndOfStream { read: usize },
    /// The source failed for another reason.
    #[error("Source failed: {0}")]
    Failed(#[source] Box<dyn core::error::Error + Send + Sync>),
}

/// A sequential, forward-only source of bytes.
pub trait Source {
    /// Fill a buffer entirely with the next bytes of the source.
    ///
    /// Returns [`SourceError::EndOfStream`] if the source is exhausted first.
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<(), SourceError>;
}

impl<S: Source + ?Sized> Source for &mut S {
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        (**self).fill_exact(buf)
    }
}

/// Runtime options for a [`Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub(crate) verify_header_checksum: bool,
    pub(crate) verify_file_checksum: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptions {
    /// Options verifying both the header and the file checksums.
    pub const fn new() -> Self {
        Self {
            verify_header_checksum: true,
            verify_file_checksum: true,
        }
    }

    /// Compare a non-zero header CRC with the one calculated (default `true`).
    pub const fn verify_header_checksum(mut self, verify: bool) -> Self {
        self.verify_header_checksum = verify;
        self
    }

    /// Read the CRC following the records, if the source has one, and compare
    /// it with the one calculated (default `true`). A document ending with its
    /// records is accepted either way. When disabled, decoding ends after the
    /// last record and the CRC is left unread.
    pub const fn verify_file_checksum(mut self, verify: bool) -> Self {
        self.verify_file_checksum = verify;
        self
    }
}

/// Decode a document from a source.
pub fn decode<S: Source>(source: S) -> Result<Content, Error> {
    Decoder::new(source).decode()
}
