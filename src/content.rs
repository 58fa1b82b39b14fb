//! Decoded document contents.
//!
//! A [`Content`] owns everything extracted from one document: the file
//! header, the optional header and file checksums, and the data messages in
//! the order they appeared. Field values are kept as raw typed primitives;
//! mapping global message and field numbers to named concepts (and applying
//! scales, offsets or units) is left to the application.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use crate::sans::data::BaseType;

/// The fixed twelve-byte document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Declared header length, including the header checksum if present.
    pub size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes following the header.
    pub data_size: u32,
    /// File type marker, always `.FIT`.
    pub data_type: [u8; 4],
}

impl Header {
    pub fn protocol_major(&self) -> u8 {
        self.protocol_version >> 4
    }

    pub fn protocol_minor(&self) -> u8 {
        self.protocol_version & 0x0F
    }

    pub fn profile_major(&self) -> u16 {
        self.profile_version / 100
    }

    pub fn profile_minor(&self) -> u16 {
        self.profile_version % 100
    }
}

/// A single decoded element of a base type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// Widen an integer element to `i128`, or `None` for floating point.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Self::U8(x) => Some(x.into()),
            Self::I8(x) => Some(x.into()),
            Self::U16(x) => Some(x.into()),
            Self::I16(x) => Some(x.into()),
            Self::U32(x) => Some(x.into()),
            Self::I32(x) => Some(x.into()),
            Self::U64(x) => Some(x.into()),
            Self::I64(x) => Some(x.into()),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    pub fn as_float(&self) -> f64 {
        match *self {
            Self::U8(x) => x.into(),
            Self::I8(x) => x.into(),
            Self::U16(x) => x.into(),
            Self::I16(x) => x.into(),
            Self::U32(x) => x.into(),
            Self::I32(x) => x.into(),
            Self::U64(x) => x as f64,
            Self::I64(x) => x as f64,
            Self::F32(x) => x.into(),
            Self::F64(x) => x,
        }
    }
}

/// The value of a field holding at least one valid element.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A field sized for exactly one element.
    Scalar(Scalar),
    /// A field sized for several elements. Elements holding the 'invalid'
    /// marker value are `None`.
    Array(Vec<Option<Scalar>>),
    /// A `string` field, cut at the first null byte.
    String(String),
    /// A `byte` field, or a field whose size is not a multiple of its base
    /// type's width.
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A field of a data message.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    pub base_type: BaseType,
    /// `None` if the field held its base type's 'invalid' marker value.
    pub value: Option<Value>,
    /// Unit label. Never set by the decoder.
    pub units: Option<String>,
}

/// A field described by developer data, kept undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperField {
    pub number: u8,
    pub developer_data_index: u8,
    pub bytes: Vec<u8>,
}

/// A decoded data record.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    pub local_message: u8,
    pub global_message: u16,
    /// Time offset from a compressed timestamp header.
    pub time_offset: Option<u8>,
    pub fields: BTreeMap<u8, DataField>,
    pub developer_fields: Vec<DeveloperField>,
}

impl DataMessage {
    pub fn field(&self, number: u8) -> Option<&DataField> {
        self.fields.get(&number)
    }

    /// The value of a field, if present and valid.
    pub fn value(&self, number: u8) -> Option<&Value> {
        self.fields.get(&number)?.value.as_ref()
    }
}

/// Everything decoded from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub header: Header,
    pub header_checksum: Option<u16>,
    pub messages: Vec<DataMessage>,
    /// Trailing file checksum, if it was read.
    pub file_checksum: Option<u16>,
}

impl Content {
    /// Iterate over messages with a global message number.
    pub fn messages_of(&self, global_message: u16) -> impl Iterator<Item = &DataMessage> {
        self.messages
            .iter()
            .filter(move |m| m.global_message == global_message)
    }
}
