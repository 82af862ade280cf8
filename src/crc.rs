//! FIT CRC-16: nibble-wise, table-driven, initial value 0.
//!
//! The same routine serves three ranges of a file:
//!
//! | Use | Range | Expectation |
//! |-----|-------|-------------|
//! | Header check | `[0, 12)` | equals the stored header CRC (14-byte headers only) |
//! | Body check | `[header_size, len)` | 0, since the stored CRC is included |
//! | Rewrite | `[header_size, len - 2)` | value written to the last two bytes |

use crate::codec::FitError;

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401,
    0xA001, 0x6C00, 0x7800, 0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Folds one byte into the running CRC (low nibble first, then high nibble).
pub fn crc16_update(mut crc: u16, byte: u8) -> u16 {
    let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc ^= tmp ^ CRC_TABLE[(byte & 0xF) as usize];

    tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc ^= tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize];

    crc
}

/// CRC of a whole slice.
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0, |crc, &b| crc16_update(crc, b))
}

/// CRC of `buffer[start..end]`. Fails instead of panicking when the range is out of bounds.
pub fn checksum(buffer: &[u8], start: usize, end: usize) -> Result<u16, FitError> {
    if start > end || end > buffer.len() {
        return Err(FitError::Truncated {
            offset: start,
            needed: end.saturating_sub(start),
            available: buffer.len().saturating_sub(start),
        });
    }
    Ok(crc16(&buffer[start..end]))
}

/// Running CRC for data produced incrementally (see [`FitFileBuilder`](crate::builder::FitFileBuilder)).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc16 {
    value: u16,
}

impl Crc16 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.value = bytes.iter().fold(self.value, |crc, &b| crc16_update(crc, b));
    }

    pub fn value(&self) -> u16 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        // FIT's table yields the CRC-16/ARC polynomial; standard check string.
        assert_eq!(crc16(b"123456789"), 0xBB3D);
        assert_eq!(crc16(&[]), 0);
    }

    #[test]
    fn appending_crc_le_gives_zero() {
        let data = b"\x40\x00\x00\x0c\x00\x01\x01\x01\x02\x00\x06";
        let crc = crc16(data);
        let mut framed = data.to_vec();
        framed.extend_from_slice(&crc.to_le_bytes());
        assert_eq!(crc16(&framed), 0);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let data: Vec<u8> = (0u8..=200).collect();
        let mut running = Crc16::new();
        for chunk in data.chunks(7) {
            running.update(chunk);
        }
        assert_eq!(running.value(), crc16(&data));
    }

    #[test]
    fn range_is_bounds_checked() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(checksum(&data, 1, 3).unwrap(), crc16(&data[1..3]));
        assert!(checksum(&data, 2, 5).is_err());
        assert!(checksum(&data, 3, 2).is_err());
    }
}
