//! Walk over the record stream of a FIT file.
//!
//! The walker advances a byte position from the end of the file header to
//! `header_size + data_size`, never touching the trailing CRC. Definition messages rebind
//! slots in the walker's [`LocalMessageTable`]; data messages are decoded against the slot's
//! current definition and handed to a [`RecordVisitor`].
//!
//! ## Design
//!
//! - **Read-only:** The walker holds `&[u8]`. Edits are staged by the visitor and applied
//!   once the whole stream decoded (see [`patch`](crate::patch)), so a structural error
//!   half-way through leaves the buffer as it was.
//! - **Scan state is a value:** The slot table lives in the walker for one pass and is handed
//!   back by [`RecordWalker::walk`]. Nothing is global, so files can be walked concurrently.
//! - **Bounds-checked:** Every record, definition and field read is checked against the end
//!   of the record stream and fails with [`FitError::Truncated`] instead of panicking.
//!
//! ## Example
//!
//! ```ignore
//! use fitpatch::walk::{RecordVisitor, RecordWalker, DataMessage};
//!
//! struct Count(usize);
//! impl RecordVisitor for Count {
//!     fn data(&mut self, _m: &DataMessage) -> Result<(), fitpatch::FitError> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//! let mut count = Count(0);
//! RecordWalker::new(&bytes)?.walk(&mut count)?;
//! ```

use crate::catalog::{self, BaseType};
use crate::codec::{bounded, decode_field, read_u8, Endianness, FitError};
use crate::header::FileHeader;
use crate::record::{DefinitionMessage, LocalMessageTable, RecordHeader};
use crate::value::Value;
use log::{debug, trace, warn};
use std::borrow::Cow;

/// One field of a data message, with its location in the file buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub field_number: u8,
    pub name: Cow<'static, str>,
    /// Catalog entry for the field's base type; `None` for unknown base type numbers.
    pub base_type: Option<BaseType>,
    pub endianness: Endianness,
    /// Absolute offset of the field's first byte in the file buffer.
    pub offset: usize,
    pub byte_size: usize,
    /// Elements in the field; `None` when the size is not a whole number of elements.
    pub element_count: Option<usize>,
    /// First element for numeric types, whole span for strings/bytes, raw bytes otherwise.
    pub value: Value,
}

impl DecodedField {
    pub fn is_array(&self) -> bool {
        matches!(self.element_count, Some(n) if n > 1)
            && !self.base_type.map(BaseType::is_opaque).unwrap_or(false)
    }

    /// Whether the decoded value equals the base type's invalid sentinel.
    pub fn is_invalid(&self) -> bool {
        match (self.base_type, &self.value) {
            (Some(BaseType::Byte), Value::Bytes(b)) => b.iter().all(|&x| x == 0xFF),
            (Some(BaseType::String), Value::String(s)) => s.is_empty(),
            (Some(bt), v) => v.raw_bits() == Some(bt.invalid_value()),
            (None, _) => false,
        }
    }

    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.byte_size
    }
}

/// Developer field carried after the regular fields of a data message.
#[derive(Debug, Clone, PartialEq)]
pub struct DeveloperField {
    pub field_number: u8,
    pub developer_data_index: u8,
    pub offset: usize,
    pub bytes: Vec<u8>,
}

/// A data message resolved against the definition bound to its slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    /// Offset of the record header byte.
    pub offset: usize,
    pub header: RecordHeader,
    pub local_message_type: u8,
    pub global_message_number: u16,
    pub message_name: Cow<'static, str>,
    /// One entry per field definition, in schema order.
    pub fields: Vec<DecodedField>,
    pub developer_fields: Vec<DeveloperField>,
}

impl DataMessage {
    /// First field with the given resolved name.
    pub fn field(&self, name: &str) -> Option<&DecodedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Record length including the header byte.
    pub fn len(&self) -> usize {
        let regular: usize = self.fields.iter().map(|f| f.byte_size).sum();
        let developer: usize = self.developer_fields.iter().map(|f| f.bytes.len()).sum();
        1 + regular + developer
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.developer_fields.is_empty()
    }
}

/// Callbacks invoked by [`RecordWalker`] in stream order.
pub trait RecordVisitor {
    /// Called after a definition message is parsed and before it is bound to its slot.
    fn definition(&mut self, _offset: usize, _definition: &DefinitionMessage) -> Result<(), FitError> {
        Ok(())
    }

    fn data(&mut self, message: &DataMessage) -> Result<(), FitError>;
}

/// Walker over the record stream of one file.
pub struct RecordWalker<'a> {
    data: &'a [u8],
    header: FileHeader,
    pos: usize,
    table: LocalMessageTable,
}

impl<'a> RecordWalker<'a> {
    /// Parses the file header and positions the walker at the first record.
    pub fn new(data: &'a [u8]) -> Result<Self, FitError> {
        let header = FileHeader::parse_file(data)?;
        Ok(Self::with_header(data, header, LocalMessageTable::new()))
    }

    /// Starts a walk with an already parsed header and a given slot table.
    pub fn with_header(data: &'a [u8], header: FileHeader, table: LocalMessageTable) -> Self {
        RecordWalker { data, pos: header.records_start(), header, table }
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_finished(&self) -> bool {
        self.pos >= self.header.records_end()
    }

    pub fn table(&self) -> &LocalMessageTable {
        &self.table
    }

    /// Decodes one record and reports it to `visitor`. The position only advances on success.
    pub fn step<V: RecordVisitor + ?Sized>(&mut self, visitor: &mut V) -> Result<(), FitError> {
        let limit = self.header.records_end();
        let offset = self.pos;
        let mut pos = self.pos;
        let header = RecordHeader::parse(read_u8(self.data, &mut pos, limit)?);
        if let RecordHeader::Normal { reserved: true, .. } = header {
            warn!("reserved bit set in record header at offset {}", offset);
        }
        if header.is_definition() {
            let def = DefinitionMessage::parse(self.data, &mut pos, limit, header)?;
            visitor.definition(offset, &def)?;
            self.table.bind(def);
        } else {
            let def = self.table.resolve(header.local_message_type(), offset)?;
            let message = decode_data_message(self.data, &mut pos, limit, offset, header, def)?;
            visitor.data(&message)?;
        }
        self.pos = pos;
        Ok(())
    }

    /// Walks every remaining record; returns the final slot table.
    pub fn walk<V: RecordVisitor + ?Sized>(mut self, visitor: &mut V) -> Result<LocalMessageTable, FitError> {
        while !self.is_finished() {
            self.step(visitor)?;
        }
        Ok(self.table)
    }
}

fn decode_data_message(
    data: &[u8],
    pos: &mut usize,
    limit: usize,
    offset: usize,
    header: RecordHeader,
    def: &DefinitionMessage,
) -> Result<DataMessage, FitError> {
    let global = def.global_message_number;
    let message_name = def.message_name();
    if catalog::lookup_message(global).is_none() {
        debug!("data message @{}: {}", offset, message_name);
    }

    let mut fields = Vec::with_capacity(def.fields.len());
    for fd in &def.fields {
        let size = fd.byte_size as usize;
        let span = bounded(data, *pos, size, limit)?;
        let base_type = fd.base_type.base_type();
        let element_count = fd.element_count();
        let value = match (base_type, element_count) {
            (Some(bt), Some(_)) => decode_field(span, bt, def.architecture)?,
            (Some(bt), None) => {
                debug!(
                    "field {} of {} at offset {}: {} bytes is not a whole number of {}",
                    fd.field_number, message_name, *pos, size, bt
                );
                Value::Bytes(span.to_vec())
            }
            (None, _) => {
                warn!(
                    "unknown base type {:#04x} for field {} of {} at offset {}",
                    fd.base_type.0, fd.field_number, message_name, *pos
                );
                Value::Bytes(span.to_vec())
            }
        };
        let field = DecodedField {
            field_number: fd.field_number,
            name: catalog::field_name(global, fd.field_number),
            base_type,
            endianness: def.architecture,
            offset: *pos,
            byte_size: size,
            element_count,
            value,
        };
        trace!("  {} @{} = {}", field.name, field.offset, field.value);
        fields.push(field);
        *pos += size;
    }

    let mut developer_fields = Vec::with_capacity(def.developer_fields.len());
    for dd in &def.developer_fields {
        let size = dd.byte_size as usize;
        let span = bounded(data, *pos, size, limit)?;
        developer_fields.push(DeveloperField {
            field_number: dd.field_number,
            developer_data_index: dd.developer_data_index,
            offset: *pos,
            bytes: span.to_vec(),
        });
        *pos += size;
    }

    Ok(DataMessage {
        offset,
        header,
        local_message_type: header.local_message_type(),
        global_message_number: global,
        message_name,
        fields,
        developer_fields,
    })
}

/// Walks all records of `data` with `visitor`. Returns the header and the final slot table.
pub fn walk_records<V: RecordVisitor + ?Sized>(
    data: &[u8],
    visitor: &mut V,
) -> Result<(FileHeader, LocalMessageTable), FitError> {
    let walker = RecordWalker::new(data)?;
    let header = *walker.header();
    let table = walker.walk(visitor)?;
    Ok((header, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FitFileBuilder;
    use crate::record::FieldDefinition;

    #[derive(Default)]
    struct Collect {
        definitions: Vec<usize>,
        messages: Vec<DataMessage>,
    }

    impl RecordVisitor for Collect {
        fn definition(&mut self, offset: usize, _definition: &DefinitionMessage) -> Result<(), FitError> {
            self.definitions.push(offset);
            Ok(())
        }

        fn data(&mut self, message: &DataMessage) -> Result<(), FitError> {
            self.messages.push(message.clone());
            Ok(())
        }
    }

    #[test]
    fn steps_through_definitions_and_data() {
        let mut b = FitFileBuilder::with_header_size(12);
        b.define_fields(0, 12, &[FieldDefinition::new(0, 1, BaseType::Enum), FieldDefinition::new(1, 1, BaseType::Enum)])
            .data(0, &[2, 6]);
        let bytes = b.finish();

        let mut walker = RecordWalker::new(&bytes).expect("header");
        let mut c = Collect::default();
        assert_eq!(walker.position(), 12);
        walker.step(&mut c).expect("definition");
        assert_eq!(c.definitions, vec![12]);
        assert!(walker.table().get(0).is_some());
        walker.step(&mut c).expect("data");
        assert!(walker.is_finished());
        assert_eq!(walker.position(), bytes.len() - 2);

        let m = &c.messages[0];
        assert_eq!(m.message_name, "sport");
        assert_eq!(m.len(), 3);
        let sub = m.field("sub_sport").expect("sub_sport");
        assert_eq!(sub.value, Value::U8(6));
        assert_eq!(sub.offset, bytes.len() - 3);
        assert_eq!(sub.span(), bytes.len() - 3..bytes.len() - 2);
    }

    #[test]
    fn big_endian_definition_decodes_big_endian() {
        let mut b = FitFileBuilder::new();
        b.define(&DefinitionMessage {
            local_message_type: 1,
            architecture: Endianness::Big,
            global_message_number: 20,
            fields: vec![FieldDefinition::new(7, 2, BaseType::UInt16)],
            developer_fields: vec![],
        })
        .data(1, &[0x01, 0x2C]);
        let bytes = b.finish();
        let mut c = Collect::default();
        walk_records(&bytes, &mut c).expect("walk");
        let power = c.messages[0].field("power").expect("power");
        assert_eq!(power.value, Value::U16(300));
        assert_eq!(power.endianness, Endianness::Big);
        assert_eq!(c.messages[0].message_name, "record");
    }

    #[test]
    fn arrays_decode_first_element_and_odd_sizes_stay_raw() {
        let mut b = FitFileBuilder::new();
        b.define_fields(0, 20, &[FieldDefinition::new(3, 4, BaseType::UInt8), FieldDefinition::new(7, 3, BaseType::UInt16)])
            .data(0, &[90, 91, 92, 93, 1, 2, 3]);
        let bytes = b.finish();
        let mut c = Collect::default();
        walk_records(&bytes, &mut c).expect("walk");
        let hr = &c.messages[0].fields[0];
        assert_eq!(hr.value, Value::U8(90));
        assert_eq!(hr.element_count, Some(4));
        assert!(hr.is_array());
        let power = &c.messages[0].fields[1];
        assert_eq!(power.element_count, None);
        assert_eq!(power.value, Value::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn invalid_sentinels_are_flagged_not_filtered() {
        let mut b = FitFileBuilder::new();
        b.define_fields(0, 18, &[FieldDefinition::new(6, 1, BaseType::Enum)]).data(0, &[0xFF]);
        let bytes = b.finish();
        let mut c = Collect::default();
        walk_records(&bytes, &mut c).expect("walk");
        assert!(c.messages[0].fields[0].is_invalid());
        assert_eq!(c.messages[0].fields[0].value, Value::U8(0xFF));
    }

    #[test]
    fn developer_fields_are_skipped_by_size() {
        let mut b = FitFileBuilder::new();
        b.define(&DefinitionMessage {
            local_message_type: 0,
            architecture: Endianness::Little,
            global_message_number: 18,
            fields: vec![FieldDefinition::new(6, 1, BaseType::Enum)],
            developer_fields: vec![crate::record::DeveloperFieldDefinition {
                field_number: 4,
                byte_size: 3,
                developer_data_index: 1,
            }],
        })
        .data(0, &[6, 0xAA, 0xBB, 0xCC])
        .define_fields(1, 12, &[FieldDefinition::new(1, 1, BaseType::Enum)])
        .data(1, &[6]);
        let bytes = b.finish();
        let mut c = Collect::default();
        walk_records(&bytes, &mut c).expect("walk");
        assert_eq!(c.messages.len(), 2);
        let dev = &c.messages[0].developer_fields[0];
        assert_eq!(dev.bytes, vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(dev.developer_data_index, 1);
        assert_eq!(c.messages[1].field("sub_sport").map(|f| f.value.clone()), Some(Value::U8(6)));
    }

    #[test]
    fn data_before_definition_is_fatal() {
        let mut b = FitFileBuilder::new();
        b.data(3, &[1]);
        let bytes = b.finish();
        let mut c = Collect::default();
        assert!(matches!(
            walk_records(&bytes, &mut c),
            Err(FitError::UndefinedLocalMessageType { local_message_type: 3, offset: 14 })
        ));
    }

    #[test]
    fn records_may_not_run_into_the_file_crc() {
        let mut b = FitFileBuilder::with_header_size(12);
        b.define_fields(0, 12, &[FieldDefinition::new(1, 1, BaseType::UInt8)]).data(0, &[6]);
        let mut bytes = b.finish();
        // Shrink data_size by one so the data message's field would land on the CRC.
        bytes[4] -= 1;
        let mut c = Collect::default();
        assert!(matches!(walk_records(&bytes, &mut c), Err(FitError::Truncated { .. })));
    }
}
