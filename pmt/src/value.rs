use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Clone, Debug, PartialEq)]
pub enum Pmt {
    /// The empty list. Also the empty dictionary.
    Null,
    Bool(bool),
    Symbol(String),
    Integer(i64),
    UInt64(u64),
    Double(f64),
    Complex(f64, f64),
    Pair(Box<Pmt>, Box<Pmt>),
    Vector(Vec<Pmt>),
    Tuple(Vec<Pmt>),
    Uniform(UniformVector),
}

impl Pmt {
    pub fn symbol(value: impl Into<String>) -> Self {
        Self::Symbol(value.into())
    }

    pub fn cons(car: Pmt, cdr: Pmt) -> Self {
        Self::Pair(Box::new(car), Box::new(cdr))
    }

    /// Builds a dictionary (a list of key/value pairs) with symbol keys,
    /// keeping the given order.
    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Pmt)>,
    {
        let entries: Vec<(K, Pmt)> = entries.into_iter().collect();
        entries
            .into_iter()
            .rev()
            .fold(Pmt::Null, |rest, (key, value)| {
                Pmt::cons(Pmt::cons(Pmt::symbol(key), value), rest)
            })
    }

    /// The empty list or any pair. Elements are not inspected: lookups in a
    /// list that holds something other than pairs simply find nothing.
    pub fn is_dict(&self) -> bool {
        matches!(self, Self::Null | Self::Pair(_, _))
    }

    pub fn entries(&self) -> DictEntries<'_> {
        DictEntries { cursor: self }
    }

    /// Value stored under the symbol `key`. The first matching entry wins.
    pub fn dict_ref(&self, key: &str) -> Option<&Pmt> {
        self.entries()
            .find(|(entry_key, _)| entry_key.as_symbol() == Some(key))
            .map(|(_, value)| value)
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(value) => Some(value),
            _ => None,
        }
    }

    /// Only signed integers count. An unsigned 64-bit value is a distinct type.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

// The derived drop would recurse once per list element, so a long list could
// overflow the stack. The cdr chain is unlinked in a loop instead.
impl Drop for Pmt {
    fn drop(&mut self) {
        let Self::Pair(_, cdr) = self else {
            return;
        };

        let mut next = std::mem::replace(cdr.as_mut(), Self::Null);
        while let Self::Pair(_, cdr) = &mut next {
            let following = std::mem::replace(cdr.as_mut(), Self::Null);
            next = following;
        }
    }
}

/// Walks a dictionary list. Stops at the first element that is not a pair.
pub struct DictEntries<'a> {
    cursor: &'a Pmt,
}

impl<'a> Iterator for DictEntries<'a> {
    type Item = (&'a Pmt, &'a Pmt);

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor {
            Pmt::Pair(car, cdr) => match car.as_ref() {
                Pmt::Pair(key, value) => {
                    self.cursor = cdr.as_ref();
                    Some((key.as_ref(), value.as_ref()))
                },
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ItemType {
    U8 = 0x00,
    S8 = 0x01,
    U16 = 0x02,
    S16 = 0x03,
    U32 = 0x04,
    S32 = 0x05,
    U64 = 0x06,
    S64 = 0x07,
    F32 = 0x08,
    F64 = 0x09,
    C32 = 0x0a,
    C64 = 0x0b,
}

impl ItemType {
    pub fn size(&self) -> usize {
        match self {
            Self::U8 | Self::S8 => 1,
            Self::U16 | Self::S16 => 2,
            Self::U32 | Self::S32 | Self::F32 => 4,
            Self::U64 | Self::S64 | Self::F64 | Self::C32 => 8,
            Self::C64 => 16,
        }
    }
}

/// Homogeneous vector. Items are kept as their raw big-endian bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformVector {
    pub item_type: ItemType,
    pub data: Vec<u8>,
}

impl UniformVector {
    pub fn len(&self) -> usize {
        self.data.len() / self.item_type.size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
