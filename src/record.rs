//! Record headers, definition messages and the local message table.
//!
//! A definition message binds one of 16 local message type slots to a schema (global
//! message number + ordered field list). Data messages name a slot and are decoded with
//! whatever schema is bound to it at that point in the stream.

use crate::catalog::{self, BaseType};
use crate::codec::{bounded, read_u8, Endianness, FitError};
use log::{debug, warn};
use std::borrow::Cow;

pub const LOCAL_MESSAGE_TYPES: usize = 16;

const COMPRESSED_HEADER_BIT: u8 = 0x80;
const DEFINITION_BIT: u8 = 0x40;
const MESSAGE_TYPE_SPECIFIC_BIT: u8 = 0x20;
const RESERVED_BIT: u8 = 0x10;

/// Decoded record header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordHeader {
    Normal {
        definition: bool,
        /// On definition messages: developer data flag.
        message_type_specific: bool,
        reserved: bool,
        local_message_type: u8,
    },
    /// Data message with a 5-bit time offset; only slots 0-3 are addressable.
    CompressedTimestamp { local_message_type: u8, time_offset: u8 },
}

impl RecordHeader {
    pub fn parse(b: u8) -> Self {
        if b & COMPRESSED_HEADER_BIT != 0 {
            RecordHeader::CompressedTimestamp {
                local_message_type: (b >> 5) & 0x03,
                time_offset: b & 0x1F,
            }
        } else {
            RecordHeader::Normal {
                definition: b & DEFINITION_BIT != 0,
                message_type_specific: b & MESSAGE_TYPE_SPECIFIC_BIT != 0,
                reserved: b & RESERVED_BIT != 0,
                local_message_type: b & 0x0F,
            }
        }
    }

    pub fn local_message_type(&self) -> u8 {
        match *self {
            RecordHeader::Normal { local_message_type, .. } => local_message_type,
            RecordHeader::CompressedTimestamp { local_message_type, .. } => local_message_type,
        }
    }

    pub fn is_definition(&self) -> bool {
        matches!(self, RecordHeader::Normal { definition: true, .. })
    }

    pub fn has_developer_data(&self) -> bool {
        matches!(
            self,
            RecordHeader::Normal { definition: true, message_type_specific: true, .. }
        )
    }

    pub fn time_offset(&self) -> Option<u8> {
        match *self {
            RecordHeader::CompressedTimestamp { time_offset, .. } => Some(time_offset),
            RecordHeader::Normal { .. } => None,
        }
    }

    pub fn to_byte(&self) -> u8 {
        match *self {
            RecordHeader::Normal { definition, message_type_specific, reserved, local_message_type } => {
                let mut b = local_message_type & 0x0F;
                if definition {
                    b |= DEFINITION_BIT;
                }
                if message_type_specific {
                    b |= MESSAGE_TYPE_SPECIFIC_BIT;
                }
                if reserved {
                    b |= RESERVED_BIT;
                }
                b
            }
            RecordHeader::CompressedTimestamp { local_message_type, time_offset } => {
                COMPRESSED_HEADER_BIT | ((local_message_type & 0x03) << 5) | (time_offset & 0x1F)
            }
        }
    }
}

/// Base type byte of a field definition: endian ability (bit 7), reserved (bits 6-5), number (bits 4-0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseTypeByte(pub u8);

impl BaseTypeByte {
    pub fn endian_ability(self) -> bool {
        self.0 & 0x80 != 0
    }

    pub fn reserved(self) -> u8 {
        (self.0 >> 5) & 0x03
    }

    pub fn number(self) -> u8 {
        self.0 & 0x1F
    }

    /// Catalog entry, `None` for numbers the catalog does not define.
    pub fn base_type(self) -> Option<BaseType> {
        BaseType::from_number(self.number())
    }
}

impl From<BaseType> for BaseTypeByte {
    fn from(bt: BaseType) -> Self {
        BaseTypeByte(bt.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub field_number: u8,
    pub byte_size: u8,
    pub base_type: BaseTypeByte,
}

impl FieldDefinition {
    pub fn new(field_number: u8, byte_size: u8, base_type: BaseType) -> Self {
        FieldDefinition { field_number, byte_size, base_type: base_type.into() }
    }

    /// Number of base-type elements in the field, or `None` when the size is not a whole
    /// multiple of the element width (or the base type is unknown).
    pub fn element_count(&self) -> Option<usize> {
        let bt = self.base_type.base_type()?;
        let size = self.byte_size as usize;
        if size == 0 || size % bt.size() != 0 {
            return None;
        }
        Some(size / bt.size())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub field_number: u8,
    pub byte_size: u8,
    pub developer_data_index: u8,
}

/// Schema bound to a local message type slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionMessage {
    pub local_message_type: u8,
    pub architecture: Endianness,
    pub global_message_number: u16,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

impl DefinitionMessage {
    /// Parses a definition body starting at `*pos` (just after the record header byte).
    ///
    /// Reads never cross `limit`. On success `*pos` points past the definition.
    pub fn parse(data: &[u8], pos: &mut usize, limit: usize, header: RecordHeader) -> Result<Self, FitError> {
        let start = *pos;
        let fixed = bounded(data, start, 5, limit)?;
        let (reserved, arch) = (fixed[0], fixed[1]);
        if reserved != 0 {
            warn!("reserved byte set in definition at offset {}: {:#04x}", start, reserved);
        }
        let architecture = Endianness::from_architecture(arch).ok_or_else(|| FitError::MalformedDefinition {
            offset: start,
            reason: format!("architecture byte {} (expected 0 or 1)", arch),
        })?;
        let global_message_number = architecture.read_u16(&fixed[2..4]);
        let field_count = fixed[4] as usize;
        *pos += 5;

        let raw = bounded(data, *pos, field_count * 3, limit)?;
        let fields: Vec<FieldDefinition> = raw
            .chunks_exact(3)
            .map(|t| FieldDefinition { field_number: t[0], byte_size: t[1], base_type: BaseTypeByte(t[2]) })
            .collect();
        *pos += field_count * 3;
        for f in &fields {
            if f.base_type.reserved() != 0 {
                warn!("reserved bits set in base type {:#04x} (field {})", f.base_type.0, f.field_number);
            }
        }

        let mut developer_fields = Vec::new();
        if header.has_developer_data() {
            let count = read_u8(data, pos, limit)? as usize;
            let raw = bounded(data, *pos, count * 3, limit)?;
            developer_fields = raw
                .chunks_exact(3)
                .map(|t| DeveloperFieldDefinition { field_number: t[0], byte_size: t[1], developer_data_index: t[2] })
                .collect();
            *pos += count * 3;
        }

        let def = DefinitionMessage {
            local_message_type: header.local_message_type(),
            architecture,
            global_message_number,
            fields,
            developer_fields,
        };
        debug!(
            "definition @{}: local {} -> {} ({}), {} fields, {} developer fields, {:?}",
            start.saturating_sub(1),
            def.local_message_type,
            def.global_message_number,
            def.message_name(),
            def.fields.len(),
            def.developer_fields.len(),
            def.architecture
        );
        Ok(def)
    }

    pub fn message_name(&self) -> Cow<'static, str> {
        catalog::message_name(self.global_message_number)
    }

    /// Bytes of one data message body using this schema.
    pub fn data_size(&self) -> usize {
        let regular: usize = self.fields.iter().map(|f| f.byte_size as usize).sum();
        let developer: usize = self.developer_fields.iter().map(|f| f.byte_size as usize).sum();
        regular + developer
    }

    /// Appends the record header byte and definition body to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let header = RecordHeader::Normal {
            definition: true,
            message_type_specific: !self.developer_fields.is_empty(),
            reserved: false,
            local_message_type: self.local_message_type,
        };
        out.push(header.to_byte());
        out.push(0);
        out.push(self.architecture.architecture());
        let mut num = [0u8; 2];
        self.architecture.write_u16(&mut num, self.global_message_number);
        out.extend_from_slice(&num);
        out.push(self.fields.len() as u8);
        for f in &self.fields {
            out.extend_from_slice(&[f.field_number, f.byte_size, f.base_type.0]);
        }
        if !self.developer_fields.is_empty() {
            out.push(self.developer_fields.len() as u8);
            for d in &self.developer_fields {
                out.extend_from_slice(&[d.field_number, d.byte_size, d.developer_data_index]);
            }
        }
    }
}

/// Slot table for one decode pass: each local message type maps to its latest definition.
#[derive(Debug, Clone, Default)]
pub struct LocalMessageTable {
    slots: [Option<DefinitionMessage>; LOCAL_MESSAGE_TYPES],
}

impl LocalMessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `def` to its slot, replacing (not merging with) the previous definition, which is returned.
    pub fn bind(&mut self, def: DefinitionMessage) -> Option<DefinitionMessage> {
        let slot = (def.local_message_type & 0x0F) as usize;
        self.slots[slot].replace(def)
    }

    pub fn get(&self, local_message_type: u8) -> Option<&DefinitionMessage> {
        self.slots.get(local_message_type as usize).and_then(Option::as_ref)
    }

    /// Definition for a data message at `offset`; an empty slot is a fatal decode error.
    pub fn resolve(&self, local_message_type: u8, offset: usize) -> Result<&DefinitionMessage, FitError> {
        self.get(local_message_type)
            .ok_or(FitError::UndefinedLocalMessageType { local_message_type, offset })
    }

    pub fn bound_slots(&self) -> impl Iterator<Item = &DefinitionMessage> {
        self.slots.iter().flatten()
    }
}
