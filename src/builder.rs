//! Write well-formed FIT files: header, records, file CRC.
//!
//! Used by the tests, benches and fuzz seeds to produce inputs, and handy for
//! generating small fixtures by hand.

use crate::codec::Endianness;
use crate::crc::Crc16;
use crate::header::{FileHeader, FIT_MAGIC, HEADER_SIZE_WITH_CRC};
use crate::record::{DefinitionMessage, FieldDefinition, RecordHeader};

pub const DEFAULT_PROTOCOL_VERSION: u8 = 0x10;
pub const DEFAULT_PROFILE_VERSION: u16 = 2132;

#[derive(Debug, Clone)]
pub struct FitFileBuilder {
    header_size: u8,
    records: Vec<u8>,
}

impl Default for FitFileBuilder {
    fn default() -> Self {
        Self::with_header_size(HEADER_SIZE_WITH_CRC)
    }
}

impl FitFileBuilder {
    /// 14-byte header with CRC.
    pub fn new() -> Self {
        Self::default()
    }

    /// `header_size` of 12 omits the header CRC; 14 or more includes it (extra bytes are zero).
    pub fn with_header_size(header_size: u8) -> Self {
        FitFileBuilder {
            header_size,
            records: Vec::new(),
        }
    }

    pub fn define(&mut self, definition: &DefinitionMessage) -> &mut Self {
        definition.encode(&mut self.records);
        self
    }

    /// Little-endian definition without developer fields.
    pub fn define_fields(&mut self, local_message_type: u8, global_message_number: u16, fields: &[FieldDefinition]) -> &mut Self {
        self.define(&DefinitionMessage {
            local_message_type,
            architecture: Endianness::Little,
            global_message_number,
            fields: fields.to_vec(),
            developer_fields: Vec::new(),
        })
    }

    /// Normal-header data message; `body` must match the slot's definition.
    pub fn data(&mut self, local_message_type: u8, body: &[u8]) -> &mut Self {
        let header = RecordHeader::Normal {
            definition: false,
            message_type_specific: false,
            reserved: false,
            local_message_type,
        };
        self.records.push(header.to_byte());
        self.records.extend_from_slice(body);
        self
    }

    /// Compressed-timestamp data message (slots 0-3 only).
    pub fn compressed_data(&mut self, local_message_type: u8, time_offset: u8, body: &[u8]) -> &mut Self {
        let header = RecordHeader::CompressedTimestamp { local_message_type, time_offset };
        self.records.push(header.to_byte());
        self.records.extend_from_slice(body);
        self
    }

    /// Appends bytes verbatim to the record stream.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.records.extend_from_slice(bytes);
        self
    }

    pub fn records_len(&self) -> usize {
        self.records.len()
    }

    pub fn header(&self) -> FileHeader {
        FileHeader {
            header_size: self.header_size,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            profile_version: DEFAULT_PROFILE_VERSION,
            data_size: self.records.len() as u32,
            data_type: FIT_MAGIC,
            header_checksum: None,
        }
    }

    /// Header + records + file CRC over the records.
    pub fn finish(&self) -> Vec<u8> {
        let mut out = self.header().to_bytes();
        out.extend_from_slice(&self.records);
        let mut crc = Crc16::new();
        crc.update(&self.records);
        out.extend_from_slice(&crc.value().to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BaseType;
    use crate::crc::crc16;

    #[test]
    fn scenario_file_bytes() {
        let mut b = FitFileBuilder::with_header_size(12);
        b.define_fields(0, 12, &[FieldDefinition::new(1, 1, BaseType::UInt8)]).data(0, &[6]);
        let bytes = b.finish();
        assert_eq!(
            bytes,
            vec![
                12, 0x10, 0x54, 0x08, 11, 0, 0, 0, b'.', b'F', b'I', b'T',
                0x40, 0x00, 0x00, 12, 0, 1, 1, 1, 2,
                0x00, 6,
                0x49, 0xBB,
            ]
        );
    }

    #[test]
    fn fourteen_byte_header_carries_crc() {
        let mut b = FitFileBuilder::new();
        b.raw(&[0; 11]);
        let bytes = b.finish();
        assert_eq!(bytes[0], 14);
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), crc16(&bytes[..12]));
        assert_eq!(crc16(&bytes[14..]), 0);
    }

    #[test]
    fn compressed_header_encodes_slot_and_offset() {
        let mut b = FitFileBuilder::new();
        b.compressed_data(2, 17, &[]);
        let bytes = b.finish();
        assert_eq!(bytes[14], 0x80 | (2 << 5) | 17);
        assert_eq!(b.records_len(), 1);
    }
}
