//! Decoded field values (first element of a field, or the whole span for strings/bytes).

/// A single decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Float(f32),
    Double(f64),
    /// NUL-terminated UTF-8 text, terminator and trailing padding stripped.
    String(String),
    /// Raw bytes: `byte` fields, developer fields and spans that could not be decoded.
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(x) => Some(*x as i64),
            Value::I16(x) => Some(*x as i64),
            Value::I32(x) => Some(*x as i64),
            Value::I64(x) => Some(*x),
            Value::U8(x) => Some(*x as i64),
            Value::U16(x) => Some(*x as i64),
            Value::U32(x) => Some(*x as i64),
            Value::U64(x) => i64::try_from(*x).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Exact comparison against an integer, as used when matching a patch target.
    ///
    /// Integers compare by value; floats compare numerically; strings and bytes never match.
    pub fn equals_integer(&self, other: i64) -> bool {
        match self {
            Value::Float(x) => *x as f64 == other as f64,
            Value::Double(x) => *x == other as f64,
            Value::String(_) | Value::Bytes(_) => false,
            _ => self.as_i64() == Some(other),
        }
    }

    /// Wire bit pattern of a numeric value, for comparison with a base type's invalid sentinel.
    pub fn raw_bits(&self) -> Option<u64> {
        match self {
            Value::U8(x) => Some(*x as u64),
            Value::U16(x) => Some(*x as u64),
            Value::U32(x) => Some(*x as u64),
            Value::U64(x) => Some(*x),
            Value::I8(x) => Some(*x as u8 as u64),
            Value::I16(x) => Some(*x as u16 as u64),
            Value::I32(x) => Some(*x as u32 as u64),
            Value::I64(x) => Some(*x as u64),
            Value::Float(x) => Some(x.to_bits() as u64),
            Value::Double(x) => Some(x.to_bits()),
            Value::String(_) | Value::Bytes(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::U8(x) => write!(f, "{}", x),
            Value::U16(x) => write!(f, "{}", x),
            Value::U32(x) => write!(f, "{}", x),
            Value::U64(x) => write!(f, "{}", x),
            Value::I8(x) => write!(f, "{}", x),
            Value::I16(x) => write!(f, "{}", x),
            Value::I32(x) => write!(f, "{}", x),
            Value::I64(x) => write!(f, "{}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Double(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => {
                let hex: Vec<String> = b.iter().map(|x| format!("{:02x}", x)).collect();
                write!(f, "hex({})", hex.join(" "))
            }
        }
    }
}
