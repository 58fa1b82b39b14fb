//! States processing document and record headers.

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

use crate::content::Header;

use super::{check::compute, data::DataRecord, definition::DefinitionRecord};

/// An error advancing over a document header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentHeaderError {
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker.")]
    NotFitData,
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
    /// The document ended inside its header.
    #[error("Document ended after {read} of {expected} header bytes.")]
    Truncated { read: usize, expected: usize },
}

/// Calculated and found header CRC values do not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Calculated ({calculated:#06X}) and found ({found:#06X}) header CRC values do not match.")]
pub struct HeaderChecksumMismatch {
    pub found: u16,
    pub calculated: u16,
}

/// State token to decode a document header.
#[derive(Debug)]
pub struct DocumentHeader;

impl DocumentHeader {
    /// Transition to another state by decoding a document header.
    ///
    /// Returns the header, and a successor state token.
    pub fn advance(
        r: [u8; 12],
    ) -> Result<(Header, Either<ExtendedDocumentHeader, RecordHeader>), DocumentHeaderError> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct FileHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: [u8; 2],
            data_size: [u8; 4],
            data_type: [u8; 4],
        }

        let FileHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(r);

        if &data_type != b".FIT" {
            Err(DocumentHeaderError::NotFitData)?;
        }

        let successor = match header_size {
            12 => Right(RecordHeader(())),
            14.. => Left(ExtendedDocumentHeader {
                calculated: compute(&r),
                padding: header_size - 14,
            }),
            _ => Err(DocumentHeaderError::UnknownHeaderLength(header_size))?,
        };

        let header = Header {
            size: header_size,
            protocol_version,
            profile_version: u16::from_le_bytes(profile_version),
            data_size: u32::from_le_bytes(data_size),
            data_type,
        };

        Ok((header, successor))
    }
}

/// State token to decode additional bytes of an extended document header.
#[derive(Debug)]
pub struct ExtendedDocumentHeader {
    calculated: u16,
    padding: u8,
}

impl ExtendedDocumentHeader {
    /// Number of unrecognised header bytes following the header CRC, which
    /// must be skipped before the first record.
    pub fn padding(&self) -> u8 {
        self.padding
    }

    /// Transition to another state by decoding the header CRC.
    ///
    /// A stored value of zero marks a CRC that was never computed, and is
    /// always accepted.
    ///
    /// Returns the stored CRC value, and the successor state token.
    pub fn advance(self, r: [u8; 2]) -> Result<(u16, RecordHeader), HeaderChecksumMismatch> {
        let calculated = self.calculated;
        let (found, successor) = self.advance_unchecked(r);

        if found != 0 && found != calculated {
            Err(HeaderChecksumMismatch { found, calculated })?;
        }

        Ok((found, successor))
    }

    /// Transition to another state by decoding the header CRC, without
    /// comparing it to the calculated value.
    pub fn advance_unchecked(self, r: [u8; 2]) -> (u16, RecordHeader) {
        (u16::from_le_bytes(r), RecordHeader(()))
    }
}

/// Classification of a record header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A definition record, optionally followed by developer field
    /// descriptors.
    Definition { local_message: u8, developer: bool },
    /// A data record with a normal header.
    Data { local_message: u8 },
    /// A data record with a compressed timestamp header.
    CompressedData { local_message: u8, time_offset: u8 },
}

impl RecordKind {
    pub fn local_message(&self) -> u8 {
        match *self {
            Self::Definition { local_message, .. }
            | Self::Data { local_message }
            | Self::CompressedData { local_message, .. } => local_message,
        }
    }

    pub fn is_definition(&self) -> bool {
        matches!(self, Self::Definition { .. })
    }
}

/// Classify a record header byte.
///
/// Bit 7 set marks a normal header. Clear, it marks a compressed timestamp
/// header, which is always a data record.
pub fn classify(r: u8) -> RecordKind {
    bitfield! {
        struct AnyHeader(u8) {
            [7] is_normal,
        }
    }

    if AnyHeader(r).is_normal() {
        bitfield! {
            struct NormalHeader(u8) {
                [0..4] local_message: u8,
                [5] is_developer,
                [6] is_definition,
            }
        }

        let header = NormalHeader(r);
        let local_message = header.local_message();

        if header.is_definition() {
            RecordKind::Definition {
                local_message,
                developer: header.is_developer(),
            }
        } else {
            RecordKind::Data { local_message }
        }
    } else {
        bitfield! {
            struct CompressedHeader(u8) {
                [0..5] time_offset: u8,
                [5..7] local_message: u8,
            }
        }

        let header = CompressedHeader(r);

        RecordKind::CompressedData {
            local_message: header.local_message(),
            time_offset: header.time_offset(),
        }
    }
}

/// State token to decode a record header.
#[derive(Debug)]
pub struct RecordHeader(pub(super) ());

impl RecordHeader {
    /// Transition to another state by decoding a record header.
    ///
    /// Returns the local message number, and a successor state token.
    pub fn advance(self, r: [u8; 1]) -> (u8, Either<DefinitionRecord, DataRecord>) {
        let kind = classify(r[0]);
        let local_message = kind.local_message();

        let successor = match kind {
            RecordKind::Definition { developer, .. } => Left(DefinitionRecord {
                local_message,
                developer,
            }),
            RecordKind::Data { .. } => Right(DataRecord {
                local_message,
                time_offset: None,
            }),
            RecordKind::CompressedData { time_offset, .. } => Right(DataRecord {
                local_message,
                time_offset: Some(time_offset),
            }),
        };

        (local_message, successor)
    }
}
