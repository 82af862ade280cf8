//! Header and body checksum verification.
//!
//! A mismatch is reported, never fatal: patching a file with a stale CRC still produces a
//! file with a correct one.

use crate::crc::crc16;
use crate::header::{FileHeader, CRC_SIZE, HEADER_SIZE_NO_CRC};
use byteorder::{ByteOrder, LittleEndian};
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    Valid(u16),
    Mismatch { stored: u16, computed: u16 },
    /// No checksum to compare: 12-byte header, stored header CRC of 0, or no room for a file CRC.
    Absent,
}

impl ChecksumStatus {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, ChecksumStatus::Mismatch { .. })
    }
}

impl std::fmt::Display for ChecksumStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumStatus::Valid(crc) => write!(f, "ok ({:#06x})", crc),
            ChecksumStatus::Mismatch { stored, computed } => {
                write!(f, "BAD (stored {:#06x}, computed {:#06x})", stored, computed)
            }
            ChecksumStatus::Absent => f.write_str("absent"),
        }
    }
}

/// Result of checking both checksums of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Integrity {
    pub header: ChecksumStatus,
    pub body: ChecksumStatus,
}

impl Integrity {
    pub fn is_valid(&self) -> bool {
        !self.header.is_mismatch() && !self.body.is_mismatch()
    }

    /// Reports both checksums: `info` when good, `warn` on mismatch.
    pub fn log(&self) {
        match self.header {
            ChecksumStatus::Valid(crc) => info!("header checksum OK ({:#06x})", crc),
            ChecksumStatus::Mismatch { stored, computed } => {
                warn!("header checksum mismatch: stored {:#06x}, computed {:#06x}", stored, computed)
            }
            ChecksumStatus::Absent => {}
        }
        match self.body {
            ChecksumStatus::Valid(crc) => info!("file checksum OK ({:#06x})", crc),
            ChecksumStatus::Mismatch { stored, computed } => {
                warn!("file checksum mismatch: stored {:#06x}, computed {:#06x}", stored, computed)
            }
            ChecksumStatus::Absent => warn!("file too short to carry a checksum"),
        }
    }
}

/// CRC over bytes 0..12 against the stored header CRC.
pub fn header_checksum_status(data: &[u8], header: &FileHeader) -> ChecksumStatus {
    let stored = match header.header_checksum {
        Some(0) | None => return ChecksumStatus::Absent,
        Some(stored) => stored,
    };
    let Some(bytes) = data.get(..HEADER_SIZE_NO_CRC as usize) else {
        return ChecksumStatus::Absent;
    };
    let computed = crc16(bytes);
    if computed == stored {
        ChecksumStatus::Valid(stored)
    } else {
        ChecksumStatus::Mismatch { stored, computed }
    }
}

/// CRC over the record stream `[header_size, records_end)` against the file CRC stored at
/// `records_end`. Bytes after the file CRC are not part of the check.
pub fn body_checksum_status(data: &[u8], header: &FileHeader) -> ChecksumStatus {
    let start = header.records_start();
    let crc_at = header.records_end();
    let (Some(records), Some(slot)) = (data.get(start..crc_at), data.get(crc_at..crc_at + CRC_SIZE)) else {
        return ChecksumStatus::Absent;
    };
    let stored = LittleEndian::read_u16(slot);
    let computed = crc16(records);
    if computed == stored {
        ChecksumStatus::Valid(stored)
    } else {
        ChecksumStatus::Mismatch { stored, computed }
    }
}

pub fn check_integrity(data: &[u8], header: &FileHeader) -> Integrity {
    Integrity {
        header: header_checksum_status(data, header),
        body: body_checksum_status(data, header),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FitFileBuilder;
    use crate::catalog::BaseType;
    use crate::record::FieldDefinition;

    fn sample(header_size: u8) -> Vec<u8> {
        let mut b = FitFileBuilder::with_header_size(header_size);
        b.define_fields(0, 12, &[FieldDefinition::new(1, 1, BaseType::UInt8)]).data(0, &[6]);
        b.finish()
    }

    #[test]
    fn fresh_file_is_valid() {
        let bytes = sample(14);
        let header = FileHeader::parse_file(&bytes).unwrap();
        let integrity = check_integrity(&bytes, &header);
        assert!(matches!(integrity.header, ChecksumStatus::Valid(_)));
        assert!(matches!(integrity.body, ChecksumStatus::Valid(_)));
        assert!(integrity.is_valid());
    }

    #[test]
    fn twelve_byte_header_has_no_header_crc() {
        let bytes = sample(12);
        let header = FileHeader::parse_file(&bytes).unwrap();
        assert_eq!(header_checksum_status(&bytes, &header), ChecksumStatus::Absent);
        // Scenario body: data message sub_sport = 6.
        assert_eq!(body_checksum_status(&bytes, &header), ChecksumStatus::Valid(0xBB49));
    }

    #[test]
    fn zero_header_crc_means_not_computed() {
        let mut bytes = sample(14);
        bytes[12] = 0;
        bytes[13] = 0;
        let header = FileHeader::parse_file(&bytes).unwrap();
        assert_eq!(header_checksum_status(&bytes, &header), ChecksumStatus::Absent);
    }

    #[test]
    fn trailing_bytes_are_outside_the_body_check() {
        let mut bytes = sample(12);
        bytes.extend_from_slice(&[1, 2, 3]);
        let header = FileHeader::parse_file(&bytes).unwrap();
        assert_eq!(body_checksum_status(&bytes, &header), ChecksumStatus::Valid(0xBB49));
    }

    #[test]
    fn corrupted_bytes_are_reported() {
        let mut bytes = sample(14);
        let n = bytes.len();
        bytes[n - 3] ^= 0x01;
        bytes[1] ^= 0x01;
        let header = FileHeader::parse_file(&bytes).unwrap();
        let integrity = check_integrity(&bytes, &header);
        assert!(integrity.header.is_mismatch());
        assert!(integrity.body.is_mismatch());
        assert!(!integrity.is_valid());
    }
}
