//! Internal finite-state machine for implementing decoders.
//!
//! This module is intended for applications that need fine control over how
//! bytes reach the decoder. See [`crate::avec`] for a decoder driven by a byte
//! source, which covers common decoding patterns.
//!
//! # Architecture
//!
//! States are represented by non-copy tokens. Once enough bytes are ready,
//! transition to another state by calling the token's `advance` method. This
//! will return a successor state token, along with any extracted data.
//!
//! Only the initial state, re-exported for convenience as [`Decoder`], can be
//! constructed.
//!
//! Definition records produce a [`definition::Definition`], which must be
//! stored by the application (see [`definition::DefinitionTable`]) and
//! supplied when advancing over later data records of the same local message
//! type. Some areas of the decoding process are not represented in the
//! finite-state machine and must be carefully written:
//!
//! - Reading the number of bytes each state expects, in order.
//!
//! - Ending decoding once the number of record bytes declared by the document
//! header have been read.
//!
//! - Applying the cyclic redundancy check over the whole document. Helper
//! functions are provided in the [`check`] module.

pub mod check;
pub mod data;
pub mod definition;
pub mod header;

/// Entrypoint to the finite-state machine.
pub type Decoder = header::DocumentHeader;
