/// Per-element type discriminator emitted in tagged mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeTag {
    U32 = 0,
    I32 = 1,
    U64 = 2,
    I64 = 3,
    F64 = 4,
    Char = 5,
    Str = 6,
    RemotePtr = 7,
    Blob = 8,
}

impl TypeTag {
    /// Human-readable tag name, as used in type-mismatch errors.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::U32 => "u32",
            TypeTag::I32 => "i32",
            TypeTag::U64 => "u64",
            TypeTag::I64 => "i64",
            TypeTag::F64 => "fp64",
            TypeTag::Char => "chr",
            TypeTag::Str => "str",
            TypeTag::RemotePtr => "remote_ptr",
            TypeTag::Blob => "blob",
        }
    }

    /// Decode a wire discriminator byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(TypeTag::U32),
            1 => Some(TypeTag::I32),
            2 => Some(TypeTag::U64),
            3 => Some(TypeTag::I64),
            4 => Some(TypeTag::F64),
            5 => Some(TypeTag::Char),
            6 => Some(TypeTag::Str),
            7 => Some(TypeTag::RemotePtr),
            8 => Some(TypeTag::Blob),
            _ => None,
        }
    }

    /// Name for an arbitrary wire byte, `"unknown"` when out of range.
    pub fn name_of(byte: u8) -> &'static str {
        Self::from_byte(byte).map_or("unknown", TypeTag::name)
    }
}
