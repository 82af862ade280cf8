//! Scalar decode/encode for FIT base types, byte order, and the crate error type.
//!
//! Everything multi-byte goes through `byteorder` with the byte order chosen by the
//! definition message's architecture byte. Reads and writes are bounds-checked and report
//! [`FitError::Truncated`] rather than panicking.

use crate::catalog::BaseType;
use crate::value::Value;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order of multi-byte fields, selected per definition message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    Big,
    #[default]
    Little,
}

impl Endianness {
    /// Architecture byte of a definition message: 0 = little endian, 1 = big endian.
    pub fn from_architecture(arch: u8) -> Option<Self> {
        match arch {
            0 => Some(Endianness::Little),
            1 => Some(Endianness::Big),
            _ => None,
        }
    }

    pub fn architecture(self) -> u8 {
        match self {
            Endianness::Little => 0,
            Endianness::Big => 1,
        }
    }

    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            Endianness::Big => BigEndian::read_u16(bytes),
            Endianness::Little => LittleEndian::read_u16(bytes),
        }
    }

    pub fn write_u16(self, bytes: &mut [u8], v: u16) {
        match self {
            Endianness::Big => BigEndian::write_u16(bytes, v),
            Endianness::Little => LittleEndian::write_u16(bytes, v),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    #[error("Malformed definition at offset {offset}: {reason}")]
    MalformedDefinition { offset: usize, reason: String },
    #[error("Truncated at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("Data message at offset {offset} uses undefined local message type {local_message_type}")]
    UndefinedLocalMessageType { local_message_type: u8, offset: usize },
    #[error("Field {field} at offset {offset} holds {elements} elements; only single-element fields can be patched")]
    UnsupportedArrayPatch {
        field: String,
        offset: usize,
        elements: usize,
    },
    #[error("Value {value} does not fit base type {base_type}")]
    ValueOutOfRange { value: i64, base_type: BaseType },
    #[error("No {field} field with value {value} found")]
    NoMatchFound { field: String, value: i64 },
}

/// Returns `data[offset..offset + len]` if it lies entirely before `limit`.
pub(crate) fn bounded(data: &[u8], offset: usize, len: usize, limit: usize) -> Result<&[u8], FitError> {
    let limit = limit.min(data.len());
    match offset.checked_add(len) {
        Some(end) if end <= limit => Ok(&data[offset..end]),
        _ => Err(FitError::Truncated {
            offset,
            needed: len,
            available: limit.saturating_sub(offset),
        }),
    }
}

pub(crate) fn read_u8(data: &[u8], pos: &mut usize, limit: usize) -> Result<u8, FitError> {
    let v = bounded(data, *pos, 1, limit)?[0];
    *pos += 1;
    Ok(v)
}

/// Decodes one element of `base` from the front of `bytes` (which must hold at least one element).
pub fn decode_element(bytes: &[u8], base: BaseType, endianness: Endianness) -> Result<Value, FitError> {
    let size = base.size();
    if bytes.len() < size {
        return Err(FitError::Truncated { offset: 0, needed: size, available: bytes.len() });
    }
    Ok(match endianness {
        Endianness::Big => decode_with::<BigEndian>(bytes, base),
        Endianness::Little => decode_with::<LittleEndian>(bytes, base),
    })
}

fn decode_with<B: ByteOrder>(bytes: &[u8], base: BaseType) -> Value {
    match base {
        BaseType::Enum | BaseType::UInt8 | BaseType::UInt8z => Value::U8(bytes[0]),
        BaseType::SInt8 => Value::I8(bytes[0] as i8),
        BaseType::SInt16 => Value::I16(B::read_i16(bytes)),
        BaseType::UInt16 | BaseType::UInt16z => Value::U16(B::read_u16(bytes)),
        BaseType::SInt32 => Value::I32(B::read_i32(bytes)),
        BaseType::UInt32 | BaseType::UInt32z => Value::U32(B::read_u32(bytes)),
        BaseType::Float32 => Value::Float(B::read_f32(bytes)),
        BaseType::Float64 => Value::Double(B::read_f64(bytes)),
        BaseType::SInt64 => Value::I64(B::read_i64(bytes)),
        BaseType::UInt64 | BaseType::UInt64z => Value::U64(B::read_u64(bytes)),
        BaseType::String => decode_string(bytes),
        BaseType::Byte => Value::Bytes(bytes.to_vec()),
    }
}

/// Strings are NUL-terminated; bytes after the first NUL are padding.
fn decode_string(bytes: &[u8]) -> Value {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Value::String(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

/// Decodes a whole field span: strings and byte arrays as one value, numeric types as the first element.
pub fn decode_field(bytes: &[u8], base: BaseType, endianness: Endianness) -> Result<Value, FitError> {
    match base {
        BaseType::String => Ok(decode_string(bytes)),
        BaseType::Byte => Ok(Value::Bytes(bytes.to_vec())),
        _ => decode_element(bytes, base, endianness),
    }
}

/// Encodes `value` as one element of `base` into the front of `out`, in place.
///
/// Fails with [`FitError::ValueOutOfRange`] when `value` is not representable in `base`
/// (and always for `string`/`byte`, which have no integer encoding).
pub fn encode_element(out: &mut [u8], base: BaseType, endianness: Endianness, value: i64) -> Result<(), FitError> {
    let size = base.size();
    if out.len() < size {
        return Err(FitError::Truncated { offset: 0, needed: size, available: out.len() });
    }
    match endianness {
        Endianness::Big => encode_with::<BigEndian>(out, base, value),
        Endianness::Little => encode_with::<LittleEndian>(out, base, value),
    }
}

fn encode_with<B: ByteOrder>(out: &mut [u8], base: BaseType, value: i64) -> Result<(), FitError> {
    let out_of_range = || FitError::ValueOutOfRange { value, base_type: base };
    match base {
        BaseType::Enum | BaseType::UInt8 | BaseType::UInt8z => {
            out[0] = u8::try_from(value).map_err(|_| out_of_range())?;
        }
        BaseType::SInt8 => {
            out[0] = i8::try_from(value).map_err(|_| out_of_range())? as u8;
        }
        BaseType::SInt16 => B::write_i16(out, i16::try_from(value).map_err(|_| out_of_range())?),
        BaseType::UInt16 | BaseType::UInt16z => {
            B::write_u16(out, u16::try_from(value).map_err(|_| out_of_range())?)
        }
        BaseType::SInt32 => B::write_i32(out, i32::try_from(value).map_err(|_| out_of_range())?),
        BaseType::UInt32 | BaseType::UInt32z => {
            B::write_u32(out, u32::try_from(value).map_err(|_| out_of_range())?)
        }
        BaseType::SInt64 => B::write_i64(out, value),
        BaseType::UInt64 | BaseType::UInt64z => {
            B::write_u64(out, u64::try_from(value).map_err(|_| out_of_range())?)
        }
        BaseType::Float32 => B::write_f32(out, value as f32),
        BaseType::Float64 => B::write_f64(out, value as f64),
        BaseType::String | BaseType::Byte => return Err(out_of_range()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architecture_byte_selects_order() {
        assert_eq!(Endianness::from_architecture(0), Some(Endianness::Little));
        assert_eq!(Endianness::from_architecture(1), Some(Endianness::Big));
        assert_eq!(Endianness::from_architecture(2), None);
    }

    #[test]
    fn multi_byte_decode_honours_byte_order() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(decode_element(&bytes, BaseType::UInt16, Endianness::Little).unwrap(), Value::U16(0x0201));
        assert_eq!(decode_element(&bytes, BaseType::UInt16, Endianness::Big).unwrap(), Value::U16(0x0102));
        assert_eq!(decode_element(&bytes, BaseType::UInt32, Endianness::Big).unwrap(), Value::U32(0x0102_0304));
        assert_eq!(decode_element(&[0xFE], BaseType::SInt8, Endianness::Little).unwrap(), Value::I8(-2));
    }

    #[test]
    fn strings_stop_at_nul() {
        let v = decode_field(b"Echo Bike\0\0\0", BaseType::String, Endianness::Little).unwrap();
        assert_eq!(v.as_str(), Some("Echo Bike"));
    }

    #[test]
    fn encode_rejects_values_outside_the_type() {
        let mut buf = [0u8; 2];
        assert!(matches!(
            encode_element(&mut buf, BaseType::UInt8, Endianness::Little, 256),
            Err(FitError::ValueOutOfRange { value: 256, .. })
        ));
        assert!(encode_element(&mut buf, BaseType::UInt16, Endianness::Little, -1).is_err());
        assert!(encode_element(&mut buf, BaseType::String, Endianness::Little, 1).is_err());
        encode_element(&mut buf, BaseType::SInt16, Endianness::Big, -2).unwrap();
        assert_eq!(buf, [0xFF, 0xFE]);
    }

    #[test]
    fn bounded_reads_stop_at_limit() {
        let data = [0u8; 8];
        assert!(bounded(&data, 2, 4, 6).is_ok());
        assert!(matches!(
            bounded(&data, 4, 4, 6),
            Err(FitError::Truncated { offset: 4, needed: 4, available: 2 })
        ));
        assert!(bounded(&data, usize::MAX, 2, 8).is_err());
    }
}
