#![no_std]

//! A streaming decoder for Garmin's Flexible and Interoperable Data Transfer
//! protocol.
//!
//! Documents are decoded in a single forward pass, holding only the active
//! definitions and the messages decoded so far. Every data message is
//! surfaced with its raw field values, leaving the interpretation of global
//! message and field numbers to the application.
//!
//! Most users should begin with the functions and the [`Decoder`] of the
//! [`avec`] module. If these prove insufficient, consider implementing a
//! decoder as described in the [`sans`] module.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader-based decoding (default).

extern crate alloc;

pub mod avec;
pub mod content;
pub mod sans;

pub use avec::{DecodeOptions, Decoder, Error, ErrorKind, State};
pub use content::{Content, DataField, DataMessage, DeveloperField, Header, Scalar, Value};
