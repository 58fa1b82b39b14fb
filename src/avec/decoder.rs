//! Decoder driving the finite-state machine from a byte source.

use alloc::{vec, vec::Vec};
use core::mem;

use either::Either::{Left, Right};

use crate::{
    content::{Content, DataMessage, Header},
    sans::{
        check::compute_crc,
        data::DataRecord,
        definition::{DefinitionRecord, DefinitionTable},
        header::{DocumentHeader, DocumentHeaderError, ExtendedDocumentHeader, RecordHeader},
    },
};

use super::{DecodeOptions, Error, ErrorKind, Source, SourceError};

/// The stage a [`Decoder`] has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingHeader,
    AwaitingHeaderChecksum,
    DecodingRecords,
    Done,
    /// An error was returned, and no further progress can be made.
    Failed,
}

#[derive(Debug)]
enum Stage {
    Header,
    HeaderChecksum(ExtendedDocumentHeader),
    Records(RecordHeader),
    Done,
    Failed,
}

/// What is being read, used to describe a source running dry.
#[derive(Debug, Clone, Copy)]
enum Reading {
    Header,
    RecordHeader,
    Definition(u8),
    Data(u8),
    FileChecksum,
}

impl Reading {
    fn fault(self, err: SourceError, expected: usize) -> ErrorKind {
        let read = match err {
            SourceError::EndOfStream { read } => read,
            SourceError::Failed(err) => return ErrorKind::Source(err),
        };

        match self {
            Self::Header => DocumentHeaderError::Truncated { read, expected }.into(),
            // Records are missing before the declared data size.
            Self::RecordHeader => ErrorKind::TruncatedDataMessage {
                local_message: None,
            },
            Self::FileChecksum => ErrorKind::UnexpectedEndOfStream,
            Self::Definition(local_message) => ErrorKind::TruncatedDefinition { local_message },
            Self::Data(local) => ErrorKind::TruncatedDataMessage {
                local_message: Some(local),
            },
        }
    }
}

/// Source wrapper counting bytes read and accumulating the file CRC.
#[derive(Debug)]
struct Cursor<S> {
    source: S,
    offset: u64,
    crc: u16,
}

impl<S: Source> Cursor<S> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        self.source.fill_exact(buf)?;
        self.offset += buf.len() as u64;
        self.crc = compute_crc(self.crc, buf);
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], SourceError> {
        let mut buf = [0; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn take_vec(&mut self, n: usize) -> Result<Vec<u8>, SourceError> {
        let mut buf = vec![0; n];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}

/// Decode a document from a source, one header or record at a time.
///
/// Each decoder owns the table of definitions for its document, so
/// independent documents can be decoded concurrently by separate decoders.
#[derive(Debug)]
pub struct Decoder<S> {
    cursor: Cursor<S>,
    options: DecodeOptions,
    stage: Stage,
    definitions: DefinitionTable,

    header: Option<Header>,
    header_checksum: Option<u16>,
    messages: Vec<DataMessage>,
    file_checksum: Option<u16>,

    records_start: u64,
    records: usize,
    // Position of the unit being decoded, reported with errors.
    mark: u64,
    current: Option<usize>,
}

impl<S: Source> Decoder<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, DecodeOptions::default())
    }

    pub fn with_options(source: S, options: DecodeOptions) -> Self {
        Self {
            cursor: Cursor {
                source,
                offset: 0,
                crc: 0,
            },
            options,
            stage: Stage::Header,
            definitions: DefinitionTable::new(),
            header: None,
            header_checksum: None,
            messages: Vec::new(),
            file_checksum: None,
            records_start: 0,
            records: 0,
            mark: 0,
            current: None,
        }
    }

    pub fn state(&self) -> State {
        match self.stage {
            Stage::Header => State::AwaitingHeader,
            Stage::HeaderChecksum(_) => State::AwaitingHeaderChecksum,
            Stage::Records(_) => State::DecodingRecords,
            Stage::Done => State::Done,
            Stage::Failed => State::Failed,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn header_checksum(&self) -> Option<u16> {
        self.header_checksum
    }

    /// Data messages decoded so far.
    pub fn messages(&self) -> &[DataMessage] {
        &self.messages
    }

    /// Definitions currently active.
    pub fn definitions(&self) -> &DefinitionTable {
        &self.definitions
    }

    /// Number of bytes read from the source.
    pub fn offset(&self) -> u64 {
        self.cursor.offset
    }

    /// Number of records (of either kind) decoded so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Perform a single transition: decode the header, the header CRC, or one
    /// record. The file CRC, if present, is read along with the last record.
    ///
    /// Returns the stage reached. After an error, the decoder is
    /// [`State::Failed`] and every further call returns
    /// [`ErrorKind::Halted`].
    pub fn step(&mut self) -> Result<State, Error> {
        self.mark = self.cursor.offset;

        self.stage = match mem::replace(&mut self.stage, Stage::Failed) {
            Stage::Header => self.decode_header()?,
            Stage::HeaderChecksum(state) => self.decode_header_checksum(state)?,
            Stage::Records(state) => self.decode_record(state)?,
            Stage::Done => Stage::Done,
            Stage::Failed => Err(self.error(ErrorKind::Halted))?,
        };

        Ok(self.state())
    }

    /// Step until done, asking `proceed` before each record whether to
    /// continue.
    ///
    /// Returns [`ErrorKind::Cancelled`] if `proceed` returns `false`. Messages
    /// decoded up to that point remain available, and decoding may be resumed
    /// by calling this method again.
    pub fn run(&mut self, mut proceed: impl FnMut(&Self) -> bool) -> Result<(), Error> {
        loop {
            match self.state() {
                State::Done => return Ok(()),
                State::DecodingRecords if !proceed(self) => {
                    let (offset, record) = (self.cursor.offset, Some(self.records));
                    Err(Error::new(ErrorKind::Cancelled, offset, record))?;
                }
                _ => {
                    self.step()?;
                }
            }
        }
    }

    /// Decode the remainder of the document.
    pub fn decode(mut self) -> Result<Content, Error> {
        self.run(|_| true)?;

        let halted = self.error(ErrorKind::Halted);
        self.into_content().ok_or(halted)
    }

    /// Take the decoded content, if decoding is done.
    pub fn into_content(self) -> Option<Content> {
        let Stage::Done = self.stage else {
            return None;
        };

        Some(Content {
            header: self.header?,
            header_checksum: self.header_checksum,
            messages: self.messages,
            file_checksum: self.file_checksum,
        })
    }

    /// Recover the source, positioned after the last byte read.
    pub fn into_source(self) -> S {
        self.cursor.source
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.mark, self.current)
    }

    fn take<const N: usize>(&mut self, reading: Reading) -> Result<[u8; N], Error> {
        self.cursor
            .take()
            .map_err(|err| self.error(reading.fault(err, N)))
    }

    fn take_vec(&mut self, n: usize, reading: Reading) -> Result<Vec<u8>, Error> {
        self.cursor
            .take_vec(n)
            .map_err(|err| self.error(reading.fault(err, n)))
    }

    fn decode_header(&mut self) -> Result<Stage, Error> {
        let r = self.take(Reading::Header)?;
        let (header, successor) = DocumentHeader::advance(r).map_err(|e| self.error(e.into()))?;

        tracing::debug!(
            size = header.size,
            protocol_version = header.protocol_version,
            profile_version = header.profile_version,
            data_size = header.data_size,
            "Decoded document header."
        );

        self.header = Some(header);

        match successor {
            Left(state) => Ok(Stage::HeaderChecksum(state)),
            Right(state) => self.begin_records(state),
        }
    }

    fn decode_header_checksum(&mut self, state: ExtendedDocumentHeader) -> Result<Stage, Error> {
        let padding = state.padding();
        let r = self.take(Reading::Header)?;

        let (found, successor) = if self.options.verify_header_checksum {
            state.advance(r).map_err(|e| self.error(e.into()))?
        } else {
            state.advance_unchecked(r)
        };

        self.header_checksum = Some(found);

        // Header bytes added by later protocol versions.
        self.take_vec(usize::from(padding), Reading::Header)?;

        self.begin_records(successor)
    }

    fn begin_records(&mut self, state: RecordHeader) -> Result<Stage, Error> {
        self.records_start = self.cursor.offset;
        self.next_record(state)
    }

    /// Continue with another record, or finish once the declared number of
    /// record bytes have been read.
    fn next_record(&mut self, state: RecordHeader) -> Result<Stage, Error> {
        let declared = self.header.map_or(0, |h| h.data_size);
        let consumed = self.cursor.offset - self.records_start;

        if consumed < u64::from(declared) {
            return Ok(Stage::Records(state));
        }

        if consumed > u64::from(declared) {
            Err(self.error(ErrorKind::DataSizeExceeded { declared, consumed }))?;
        }

        self.finish()?;
        Ok(Stage::Done)
    }

    fn decode_record(&mut self, state: RecordHeader) -> Result<Stage, Error> {
        self.current = Some(self.records);

        let (local, successor) = state.advance(self.take(Reading::RecordHeader)?);

        let state = match successor {
            Left(state) => self.decode_definition(local, state)?,
            Right(state) => self.decode_data(local, state)?,
        };

        self.records += 1;
        self.current = None;

        self.next_record(state)
    }

    fn decode_definition(
        &mut self,
        local: u8,
        state: DefinitionRecord,
    ) -> Result<RecordHeader, Error> {
        let reading = Reading::Definition(local);

        let state = state.advance(self.take(reading)?);
        let r = self.take_vec(state.descriptor_bytes(), reading)?;

        let (definition, successor) = match state.advance(&r) {
            Left(done) => done,
            Right(state) => {
                let state = state.advance(self.take(reading)?);
                let r = self.take_vec(state.descriptor_bytes(), reading)?;
                state.advance(&r)
            }
        };

        tracing::trace!(
            record = self.records,
            local_message = local,
            global_message = definition.global_message,
            fields = definition.fields.len(),
            "Decoded definition record."
        );

        if let Some(previous) = self.definitions.install(local, definition) {
            tracing::debug!(
                local_message = local,
                previous = previous.global_message,
                "Replaced definition of local message type."
            );
        }

        Ok(successor)
    }

    fn decode_data(&mut self, local: u8, state: DataRecord) -> Result<RecordHeader, Error> {
        let Some(definition) = self.definitions.get(local) else {
            return Err(self.error(ErrorKind::UndefinedLocalMessageType(local)));
        };

        let size = definition.data_size();
        let r = self
            .cursor
            .take_vec(size)
            .map_err(|err| self.error(Reading::Data(local).fault(err, size)))?;

        let (message, successor) = state
            .advance(definition, &r)
            .map_err(|e| self.error(e.into()))?;

        tracing::trace!(
            record = self.records,
            local_message = local,
            global_message = message.global_message,
            fields = message.fields.len(),
            "Decoded data record."
        );

        self.messages.push(message);

        Ok(successor)
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.mark = self.cursor.offset;

        if self.options.verify_file_checksum {
            let calculated = self.cursor.crc;
            let mut r = [0; 2];

            match self.cursor.fill(&mut r) {
                Ok(()) => {
                    let found = u16::from_le_bytes(r);
                    self.file_checksum = Some(found);

                    if found != calculated {
                        Err(self.error(ErrorKind::FileChecksumMismatch { found, calculated }))?;
                    }
                }
                Err(SourceError::EndOfStream { read: 0 }) => {
                    tracing::debug!("Document ends without a file CRC.");
                }
                Err(err) => Err(self.error(Reading::FileChecksum.fault(err, r.len())))?,
            }
        }

        tracing::debug!(
            records = self.records,
            messages = self.messages.len(),
            "Finished decoding document."
        );

        Ok(())
    }
}
