//! FIT file header (12 or 14+ bytes).
//!
//! ```text
//! Offset  Size  Field
//!   0       1   header_size (12, or >= 14 with header CRC)
//!   1       1   protocol_version
//!   2       2   profile_version (LE)
//!   4       4   data_size (LE): length of the record stream
//!   8       4   data_type: ".FIT"
//!  12       2   header CRC over bytes 0..12 (LE), 14-byte headers only; 0 = not computed
//! ```

use crate::codec::FitError;
use crate::crc::crc16;
use byteorder::{ByteOrder, LittleEndian};
use log::warn;

pub const HEADER_SIZE_NO_CRC: u8 = 12;
pub const HEADER_SIZE_WITH_CRC: u8 = 14;
/// Trailing file CRC.
pub const CRC_SIZE: usize = 2;
pub const FIT_MAGIC: [u8; 4] = *b".FIT";

/// Parsed file header. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    pub data_size: u32,
    pub data_type: [u8; 4],
    /// Present only for headers of 14 bytes or more.
    pub header_checksum: Option<u16>,
}

impl FileHeader {
    /// Parses the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, FitError> {
        let header_size = *data
            .first()
            .ok_or_else(|| FitError::MalformedHeader("empty input".to_string()))?;
        if header_size < HEADER_SIZE_NO_CRC || header_size == HEADER_SIZE_NO_CRC + 1 {
            return Err(FitError::MalformedHeader(format!(
                "unsupported header size {}",
                header_size
            )));
        }
        if data.len() < header_size as usize {
            return Err(FitError::MalformedHeader(format!(
                "header size {} but only {} bytes available",
                header_size,
                data.len()
            )));
        }
        let mut data_type = [0u8; 4];
        data_type.copy_from_slice(&data[8..12]);
        if data_type != FIT_MAGIC {
            warn!("unexpected data type {:?} (expected \".FIT\")", String::from_utf8_lossy(&data_type));
        }
        let header_checksum = if header_size >= HEADER_SIZE_WITH_CRC {
            Some(LittleEndian::read_u16(&data[12..14]))
        } else {
            None
        };
        Ok(FileHeader {
            header_size,
            protocol_version: data[1],
            profile_version: LittleEndian::read_u16(&data[2..4]),
            data_size: LittleEndian::read_u32(&data[4..8]),
            data_type,
            header_checksum,
        })
    }

    /// Parses the header and checks that `data` holds the whole record stream plus the file CRC.
    pub fn parse_file(data: &[u8]) -> Result<Self, FitError> {
        let header = Self::parse(data)?;
        let expected = header.file_size();
        if data.len() < expected {
            return Err(FitError::MalformedHeader(format!(
                "data size {} exceeds file length {} (need {} bytes)",
                header.data_size,
                data.len(),
                expected
            )));
        }
        if data.len() > expected {
            warn!("{} trailing bytes after the file CRC", data.len() - expected);
        }
        Ok(header)
    }

    /// Offset of the first record.
    pub fn records_start(&self) -> usize {
        self.header_size as usize
    }

    /// Offset one past the last record byte (start of the file CRC).
    pub fn records_end(&self) -> usize {
        self.records_start() + self.data_size as usize
    }

    /// Header + records + file CRC.
    pub fn file_size(&self) -> usize {
        self.records_end() + CRC_SIZE
    }

    /// Serialises the header. For 14+ byte headers the CRC over bytes 0..12 is (re)computed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.header_size.max(HEADER_SIZE_NO_CRC) as usize];
        out[0] = self.header_size;
        out[1] = self.protocol_version;
        LittleEndian::write_u16(&mut out[2..4], self.profile_version);
        LittleEndian::write_u32(&mut out[4..8], self.data_size);
        out[8..12].copy_from_slice(&self.data_type);
        if self.header_size >= HEADER_SIZE_WITH_CRC {
            let crc = crc16(&out[..12]);
            LittleEndian::write_u16(&mut out[12..14], crc);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header12(data_size: u32) -> Vec<u8> {
        let mut h = vec![12u8, 0x10, 0x54, 0x08];
        h.extend_from_slice(&data_size.to_le_bytes());
        h.extend_from_slice(b".FIT");
        h
    }

    #[test]
    fn parses_12_byte_header_without_crc() {
        let h = FileHeader::parse(&header12(11)).expect("parse");
        assert_eq!(h.header_size, 12);
        assert_eq!(h.protocol_version, 0x10);
        assert_eq!(h.profile_version, 2132);
        assert_eq!(h.data_size, 11);
        assert_eq!(h.data_type, FIT_MAGIC);
        assert_eq!(h.header_checksum, None);
        assert_eq!(h.records_end(), 23);
    }

    #[test]
    fn parses_14_byte_header_with_crc() {
        let mut bytes = header12(11);
        bytes[0] = 14;
        bytes.extend_from_slice(&0x6207u16.to_le_bytes());
        let h = FileHeader::parse(&bytes).expect("parse");
        assert_eq!(h.header_checksum, Some(0x6207));
        assert_eq!(h.to_bytes(), bytes);
    }

    #[test]
    fn rejects_short_or_unsupported_headers() {
        assert!(matches!(FileHeader::parse(&[]), Err(FitError::MalformedHeader(_))));
        assert!(matches!(FileHeader::parse(&header12(0)[..11]), Err(FitError::MalformedHeader(_))));
        let mut h = header12(0);
        h[0] = 11;
        assert!(FileHeader::parse(&h).is_err());
        h[0] = 13;
        h.push(0);
        assert!(FileHeader::parse(&h).is_err());
        h[0] = 14;
        assert!(FileHeader::parse(&h).is_err(), "14-byte header with 13 bytes available");
    }

    #[test]
    fn file_must_hold_records_and_crc() {
        let mut bytes = header12(4);
        bytes.extend_from_slice(&[0, 0, 0, 0, 0]);
        assert!(FileHeader::parse_file(&bytes).is_err());
        bytes.push(0);
        assert!(FileHeader::parse_file(&bytes).is_ok());
    }
}
