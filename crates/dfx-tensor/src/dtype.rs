use std::fmt;

/// Element types a tensor slot can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    F16,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 32-bit integer.
    I32,
}

impl DType {
    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
            DType::F16 => 2,
            DType::U8 => 1,
            DType::I32 => 4,
        }
    }

    /// Converts an engine type flag to a `DType`.
    ///
    /// Type flags:
    /// - 0 => F32
    /// - 1 => F64
    /// - 2 => F16
    /// - 3 => U8
    /// - 4 => I32
    pub fn from_type_flag(flag: i32) -> Option<DType> {
        match flag {
            0 => Some(DType::F32),
            1 => Some(DType::F64),
            2 => Some(DType::F16),
            3 => Some(DType::U8),
            4 => Some(DType::I32),
            _ => None,
        }
    }

    /// Returns the engine type flag for this `DType`.
    pub fn to_type_flag(&self) -> i32 {
        match self {
            DType::F32 => 0,
            DType::F64 => 1,
            DType::F16 => 2,
            DType::U8 => 3,
            DType::I32 => 4,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "float32"),
            DType::F64 => write!(f, "float64"),
            DType::F16 => write!(f, "float16"),
            DType::U8 => write!(f, "uint8"),
            DType::I32 => write!(f, "int32"),
        }
    }
}
