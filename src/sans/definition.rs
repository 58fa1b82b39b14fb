//! States processing definition records, and the table of definitions active
//! while decoding a document.

use alloc::vec::Vec;

use either::Either::{self, Left, Right};
use zerocopy::FromBytes;

use super::{
    data::{BaseType, UnsupportedBaseType},
    header::RecordHeader,
};

/// Byte order of the multi-byte fields of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Interpret the architecture byte of a definition message: zero is
    /// big-endian, anything else little-endian.
    pub fn from_architecture(architecture: u8) -> Self {
        if architecture == 0 {
            Self::Big
        } else {
            Self::Little
        }
    }
}

/// Flag marking a base type code as an array of its base type.
const ARRAY_FLAG: u8 = 0x20;

/// A field declared by a definition message.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromBytes)]
pub struct FieldLayout {
    pub number: u8,
    /// Size of the field in bytes.
    pub size: u8,
    /// Raw base type code.
    pub base_type: u8,
}

impl FieldLayout {
    pub fn from_bytes(r: [u8; 3]) -> Self {
        zerocopy::transmute!(r)
    }

    pub fn base_type(&self) -> Result<BaseType, UnsupportedBaseType> {
        BaseType::from_code(self.base_type)
    }

    /// Whether the field holds more than one element of its base type.
    pub fn is_array(&self) -> bool {
        self.base_type & ARRAY_FLAG != 0
            || self
                .base_type()
                .is_ok_and(|t| usize::from(self.size) > t.width())
    }
}

/// A developer field declared by a definition message.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromBytes)]
pub struct DeveloperFieldLayout {
    pub number: u8,
    pub size: u8,
    pub developer_data_index: u8,
}

impl DeveloperFieldLayout {
    pub fn from_bytes(r: [u8; 3]) -> Self {
        zerocopy::transmute!(r)
    }
}

/// The layout of data records of one local message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub global_message: u16,
    pub byte_order: ByteOrder,
    pub fields: Vec<FieldLayout>,
    pub developer_fields: Vec<DeveloperFieldLayout>,
}

impl Definition {
    /// Number of bytes in a data record following this definition.
    pub fn data_size(&self) -> usize {
        let fields: usize = self.fields.iter().map(|f| usize::from(f.size)).sum();
        let developer: usize = self
            .developer_fields
            .iter()
            .map(|f| usize::from(f.size))
            .sum();

        fields + developer
    }
}

/// State token to decode the fixed part of a definition message.
#[derive(Debug)]
pub struct DefinitionRecord {
    pub(super) local_message: u8,
    pub(super) developer: bool,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct DefinitionMessage {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    fields: u8,
}

impl DefinitionRecord {
    pub fn local_message(&self) -> u8 {
        self.local_message
    }

    /// Whether developer field descriptors follow the field descriptors.
    pub fn has_developer_fields(&self) -> bool {
        self.developer
    }

    /// Transition to another state by decoding the fixed part of a definition
    /// message.
    ///
    /// Returns a successor state token.
    pub fn advance(self, r: [u8; 5]) -> DefinitionFields {
        let DefinitionMessage {
            architecture,
            global_message,
            fields,
            ..
        } = zerocopy::transmute!(r);

        let byte_order = ByteOrder::from_architecture(architecture);
        let global_message = match byte_order {
            ByteOrder::Little => u16::from_le_bytes(global_message),
            ByteOrder::Big => u16::from_be_bytes(global_message),
        };

        DefinitionFields {
            developer: self.developer,
            global_message,
            byte_order,
            count: fields,
        }
    }
}

/// State token to decode the field descriptors of a definition message.
#[derive(Debug)]
pub struct DefinitionFields {
    developer: bool,
    global_message: u16,
    byte_order: ByteOrder,
    count: u8,
}

impl DefinitionFields {
    pub fn global_message(&self) -> u16 {
        self.global_message
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Number of descriptor bytes expected by [`Self::advance`].
    pub fn descriptor_bytes(&self) -> usize {
        3 * usize::from(self.count)
    }

    /// Transition to another state by decoding the field descriptors.
    ///
    /// Expects exactly [`Self::descriptor_bytes`] bytes. Returns the completed
    /// definition and a successor state token, or a successor state token
    /// alone when developer field descriptors follow.
    pub fn advance(self, r: &[u8]) -> Either<(Definition, RecordHeader), DeveloperFieldCount> {
        debug_assert_eq!(r.len(), self.descriptor_bytes());

        let fields = r
            .chunks_exact(3)
            .map(|c| FieldLayout::from_bytes([c[0], c[1], c[2]]))
            .collect();

        let definition = Definition {
            global_message: self.global_message,
            byte_order: self.byte_order,
            fields,
            developer_fields: Vec::new(),
        };

        if self.developer {
            Right(DeveloperFieldCount { definition })
        } else {
            Left((definition, RecordHeader(())))
        }
    }
}

/// State token to decode the number of developer field descriptors.
#[derive(Debug)]
pub struct DeveloperFieldCount {
    definition: Definition,
}

impl DeveloperFieldCount {
    pub fn advance(self, r: [u8; 1]) -> DeveloperFields {
        DeveloperFields {
            definition: self.definition,
            count: r[0],
        }
    }
}

/// State token to decode developer field descriptors.
#[derive(Debug)]
pub struct DeveloperFields {
    definition: Definition,
    count: u8,
}

impl DeveloperFields {
    /// Number of descriptor bytes expected by [`Self::advance`].
    pub fn descriptor_bytes(&self) -> usize {
        3 * usize::from(self.count)
    }

    /// Transition to another state by decoding the developer field
    /// descriptors.
    ///
    /// Returns the completed definition, and a successor state token.
    pub fn advance(self, r: &[u8]) -> (Definition, RecordHeader) {
        debug_assert_eq!(r.len(), self.descriptor_bytes());

        let mut definition = self.definition;
        definition.developer_fields = r
            .chunks_exact(3)
            .map(|c| DeveloperFieldLayout::from_bytes([c[0], c[1], c[2]]))
            .collect();

        (definition, RecordHeader(()))
    }
}

/// Definitions indexed by local message type.
///
/// Each document gets its own table. Installing a definition replaces any
/// earlier one for the same local message type; layouts are never merged.
#[derive(Debug, Clone, Default)]
pub struct DefinitionTable {
    slots: [Option<Definition>; 16],
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a definition, returning the one it replaced.
    ///
    /// Only the low four bits of `local_message` are used.
    pub fn install(&mut self, local_message: u8, definition: Definition) -> Option<Definition> {
        debug_assert!(local_message < 16);
        self.slots[usize::from(local_message & 0x0F)].replace(definition)
    }

    pub fn get(&self, local_message: u8) -> Option<&Definition> {
        self.slots.get(usize::from(local_message))?.as_ref()
    }

    /// Iterate over installed definitions with their local message types.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Definition)> {
        (0u8..).zip(&self.slots).filter_map(|(i, d)| Some((i, d.as_ref()?)))
    }

}
