use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Leading byte of every serialized value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    True = 0x00,
    False = 0x01,
    Symbol = 0x02,
    Int32 = 0x03,
    Double = 0x04,
    Complex = 0x05,
    Null = 0x06,
    Pair = 0x07,
    Vector = 0x08,
    UniformVector = 0x0a,
    UInt64 = 0x0b,
    Tuple = 0x0c,
    Int64 = 0x0d,
}
