//! Base types, and states processing data records.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use thiserror::Error;

use crate::content::{DataField, DataMessage, DeveloperField, Scalar, Value};

use super::{
    definition::{ByteOrder, Definition, FieldLayout},
    header::RecordHeader,
};

/// A field declared a base type this decoder does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unsupported base type ({0:#04X}).")]
pub struct UnsupportedBaseType(pub u8);

/// Bits of a base type code identifying the base type.
const BASE_TYPE_NUMBER: u8 = 0x1F;

/// A base type, with its canonical code as the discriminant.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Enum = 0x00,
    SInt8 = 0x01,
    UInt8 = 0x02,
    SInt16 = 0x83,
    UInt16 = 0x84,
    SInt32 = 0x85,
    UInt32 = 0x86,
    String = 0x07,
    Float32 = 0x88,
    Float64 = 0x89,
    UInt8z = 0x0A,
    UInt16z = 0x8B,
    UInt32z = 0x8C,
    Byte = 0x0D,
    SInt64 = 0x8E,
    UInt64 = 0x8F,
    UInt64z = 0x90,
}

impl BaseType {
    /// Identify the base type of a base type code.
    pub fn from_code(code: u8) -> Result<Self, UnsupportedBaseType> {
        Ok(match code & BASE_TYPE_NUMBER {
            0x00 => Self::Enum,
            0x01 => Self::SInt8,
            0x02 => Self::UInt8,
            0x03 => Self::SInt16,
            0x04 => Self::UInt16,
            0x05 => Self::SInt32,
            0x06 => Self::UInt32,
            0x07 => Self::String,
            0x08 => Self::Float32,
            0x09 => Self::Float64,
            0x0A => Self::UInt8z,
            0x0B => Self::UInt16z,
            0x0C => Self::UInt32z,
            0x0D => Self::Byte,
            0x0E => Self::SInt64,
            0x0F => Self::UInt64,
            0x10 => Self::UInt64z,
            _ => Err(UnsupportedBaseType(code))?,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Size of one element of this base type, in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::Enum | Self::SInt8 | Self::UInt8 | Self::String | Self::UInt8z | Self::Byte => 1,
            Self::SInt16 | Self::UInt16 | Self::UInt16z => 2,
            Self::SInt32 | Self::UInt32 | Self::Float32 | Self::UInt32z => 4,
            Self::Float64 | Self::SInt64 | Self::UInt64 | Self::UInt64z => 8,
        }
    }
}

pub trait FieldInner {
    /// The data storing this base type.
    type From;
    /// The primitive corresponding to this base type.
    type Into;

    /// Convert data of this base type to the corresponding primitive, if valid.
    fn from(r: Self::From, order: ByteOrder) -> Option<Self::Into>;
}

macro_rules! field_inner {
    (float $t:ident, $into:ident, $raw:ident, $(#[$attr:meta])*) => {
        $(#[$attr])*
        #[derive(Debug)]
        pub struct $t;

        impl FieldInner for $t {
            type From = [u8; size_of::<$raw>()];
            type Into = $into;

            fn from(r: Self::From, order: ByteOrder) -> Option<Self::Into> {
                let x = match order {
                    ByteOrder::Little => $raw::from_le_bytes(r),
                    ByteOrder::Big => $raw::from_be_bytes(r),
                };

                // Invalid floats are marked by a bit pattern, not a value.
                if x != $raw::MAX {
                    Some($into::from_bits(x))
                } else {
                    None
                }
            }
        }
    };
    ($t:ident, $into:ident, $invalid:expr, $(#[$attr:meta])*) => {
        $(#[$attr])*
        #[derive(Debug)]
        pub struct $t;

        impl FieldInner for $t {
            type From = [u8; size_of::<$into>()];
            type Into = $into;

            fn from(r: Self::From, order: ByteOrder) -> Option<Self::Into> {
                let x = match order {
                    ByteOrder::Little => $into::from_le_bytes(r),
                    ByteOrder::Big => $into::from_be_bytes(r),
                };

                if x != $invalid {
                    Some(x)
                } else {
                    None
                }
            }
        }
    };
}

field_inner!(U8, u8, u8::MAX, /** `uint8`, `enum`, `byte` */);
field_inner!(U8Z, u8, u8::MIN, /** `uint8z` */);
field_inner!(U16, u16, u16::MAX, /** `uint16` */);
field_inner!(U16Z, u16, u16::MIN, /** `uint16z` */);
field_inner!(U32, u32, u32::MAX, /** `uint32` */);
field_inner!(U32Z, u32, u32::MIN, /** `uint32z` */);
field_inner!(U64, u64, u64::MAX, /** `uint64` */);
field_inner!(U64Z, u64, u64::MIN, /** `uint64z` */);

field_inner!(I8, i8, i8::MAX, /** `sint8` */);
field_inner!(I16, i16, i16::MAX, /** `sint16` */);
field_inner!(I32, i32, i32::MAX, /** `sint32` */);
field_inner!(I64, i64, i64::MAX, /** `sint64` */);

field_inner!(float F32, f32, u32, /** `float32` */);
field_inner!(float F64, f64, u64, /** `float64` */);

/// Decode one element of a base type from a slice of exactly its width.
fn element<T: FieldInner<From = [u8; N]>, const N: usize>(
    _: T,
    r: &[u8],
    order: ByteOrder,
) -> Option<T::Into> {
    let mut raw = [0; N];
    raw.copy_from_slice(r);
    T::from(raw, order)
}

fn scalar(base_type: BaseType, r: &[u8], order: ByteOrder) -> Option<Scalar> {
    match base_type {
        BaseType::Enum | BaseType::UInt8 | BaseType::Byte => element(U8, r, order).map(Scalar::U8),
        BaseType::UInt8z | BaseType::String => element(U8Z, r, order).map(Scalar::U8),
        BaseType::UInt16 => element(U16, r, order).map(Scalar::U16),
        BaseType::UInt16z => element(U16Z, r, order).map(Scalar::U16),
        BaseType::UInt32 => element(U32, r, order).map(Scalar::U32),
        BaseType::UInt32z => element(U32Z, r, order).map(Scalar::U32),
        BaseType::UInt64 => element(U64, r, order).map(Scalar::U64),
        BaseType::UInt64z => element(U64Z, r, order).map(Scalar::U64),

        BaseType::SInt8 => element(I8, r, order).map(Scalar::I8),
        BaseType::SInt16 => element(I16, r, order).map(Scalar::I16),
        BaseType::SInt32 => element(I32, r, order).map(Scalar::I32),
        BaseType::SInt64 => element(I64, r, order).map(Scalar::I64),

        BaseType::Float32 => element(F32, r, order).map(Scalar::F32),
        BaseType::Float64 => element(F64, r, order).map(Scalar::F64),
    }
}

fn string(r: &[u8]) -> Option<Value> {
    let end = r.iter().position(|&b| b == 0).unwrap_or(r.len());
    let s = &r[..end];

    (!s.is_empty()).then(|| Value::String(String::from_utf8_lossy(s).into_owned()))
}

fn bytes(r: &[u8]) -> Option<Value> {
    (!r.iter().all(|&b| b == u8::MAX)).then(|| Value::Bytes(r.to_vec()))
}

/// Decode the bytes of a field as declared by its layout.
///
/// A field sized for several elements, or flagged as an array, decodes to
/// [`Value::Array`]. The value
/// is `None` if the field (or every element of it) held the 'invalid' marker
/// value.
pub fn decode_field(
    layout: &FieldLayout,
    r: &[u8],
    order: ByteOrder,
) -> Result<DataField, UnsupportedBaseType> {
    let base_type = layout.base_type()?;
    let width = base_type.width();

    let value = match base_type {
        BaseType::String => string(r),
        BaseType::Byte => bytes(r),
        _ if r.is_empty() || r.len() % width != 0 => {
            tracing::warn!(
                field = layout.number,
                size = layout.size,
                base_type = layout.base_type,
                "Field size is not a multiple of its base type width, keeping raw bytes."
            );
            bytes(r)
        }
        _ if r.len() == width && !layout.is_array() => {
            scalar(base_type, r, order).map(Value::Scalar)
        }
        _ => {
            let elements: Vec<_> = r
                .chunks_exact(width)
                .map(|c| scalar(base_type, c, order))
                .collect();

            elements
                .iter()
                .any(Option::is_some)
                .then_some(Value::Array(elements))
        }
    };

    Ok(DataField {
        base_type,
        value,
        units: None,
    })
}

/// State token to decode a data message.
#[derive(Debug)]
pub struct DataRecord {
    pub(super) local_message: u8,
    pub(super) time_offset: Option<u8>,
}

impl DataRecord {
    pub fn local_message(&self) -> u8 {
        self.local_message
    }

    /// The time offset carried by a compressed timestamp header.
    pub fn time_offset(&self) -> Option<u8> {
        self.time_offset
    }

    /// Transition to another state by decoding a data message laid out by a
    /// definition.
    ///
    /// Returns the decoded message, and a successor state token.
    ///
    /// # Panics
    ///
    /// Panics if `r` is shorter than [`Definition::data_size`].
    pub fn advance(
        self,
        definition: &Definition,
        r: &[u8],
    ) -> Result<(DataMessage, RecordHeader), UnsupportedBaseType> {
        debug_assert_eq!(r.len(), definition.data_size());

        let order = definition.byte_order;
        let mut rest = r;

        let mut fields = BTreeMap::new();
        for layout in &definition.fields {
            let (bytes, tail) = rest.split_at(usize::from(layout.size));
            fields.insert(layout.number, decode_field(layout, bytes, order)?);
            rest = tail;
        }

        let mut developer_fields = Vec::with_capacity(definition.developer_fields.len());
        for layout in &definition.developer_fields {
            let (bytes, tail) = rest.split_at(usize::from(layout.size));
            developer_fields.push(DeveloperField {
                number: layout.number,
                developer_data_index: layout.developer_data_index,
                bytes: bytes.to_vec(),
            });
            rest = tail;
        }

        let message = DataMessage {
            local_message: self.local_message,
            global_message: definition.global_message,
            time_offset: self.time_offset,
            fields,
            developer_fields,
        };

        Ok((message, RecordHeader(())))
    }
}
