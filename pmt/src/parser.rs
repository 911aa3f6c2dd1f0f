use crate::tag::Tag;
use crate::value::{ItemType, Pmt, UniformVector};
use nom::IResult;
use nom::Parser;
use nom::bytes::take;
use nom::error::ErrorKind;
use nom::number::{be_i32, be_i64, be_u8, be_u16, be_u32, be_u64};
use thiserror::Error;

const MAX_DEPTH: usize = 64;

/// Parses one serialized value. Bytes after the value are ignored.
pub fn deserialize(bytes: &[u8]) -> Result<Pmt, PmtError> {
    if bytes.is_empty() {
        return Err(PmtError::Empty);
    }

    match value(bytes, 0) {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Incomplete(_)) => Err(PmtError::Truncated),
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
            Err(PmtError::from_nom(err))
        },
    }
}

fn value(input: &[u8], depth: usize) -> IResult<&[u8], Pmt> {
    if depth > MAX_DEPTH {
        return Err(ParserError::DepthExceeded.to_nom(input));
    }

    let (rest, tag) = be_u8().parse(input)?;
    let tag = Tag::try_from(tag).map_err(|_| ParserError::UnknownTag.to_nom(input))?;

    match tag {
        Tag::True => Ok((rest, Pmt::Bool(true))),
        Tag::False => Ok((rest, Pmt::Bool(false))),
        Tag::Null => Ok((rest, Pmt::Null)),
        Tag::Symbol => symbol(rest),
        Tag::Int32 => {
            let (rest, value) = be_i32().parse(rest)?;
            Ok((rest, Pmt::Integer(i64::from(value))))
        },
        Tag::Int64 => {
            let (rest, value) = be_i64().parse(rest)?;
            Ok((rest, Pmt::Integer(value)))
        },
        Tag::UInt64 => {
            let (rest, value) = be_u64().parse(rest)?;
            Ok((rest, Pmt::UInt64(value)))
        },
        Tag::Double => {
            let (rest, bits) = be_u64().parse(rest)?;
            Ok((rest, Pmt::Double(f64::from_bits(bits))))
        },
        Tag::Complex => {
            let (rest, real) = be_u64().parse(rest)?;
            let (rest, imaginary) = be_u64().parse(rest)?;
            Ok((
                rest,
                Pmt::Complex(f64::from_bits(real), f64::from_bits(imaginary)),
            ))
        },
        Tag::Pair => list(rest, depth),
        Tag::Vector => {
            let (rest, items) = sequence(rest, depth)?;
            Ok((rest, Pmt::Vector(items)))
        },
        Tag::Tuple => {
            let (rest, items) = sequence(rest, depth)?;
            Ok((rest, Pmt::Tuple(items)))
        },
        Tag::UniformVector => uniform(rest),
    }
}

fn symbol(input: &[u8]) -> IResult<&[u8], Pmt> {
    let (rest, length) = be_u16().parse(input)?;
    let (rest, bytes): (&[u8], &[u8]) = take(length).parse(rest)?;

    Ok((rest, Pmt::Symbol(String::from_utf8_lossy(bytes).into_owned())))
}

// A pair chain is read in a loop: a dictionary with many entries is one level
// deep, not one level per entry.
fn list(input: &[u8], depth: usize) -> IResult<&[u8], Pmt> {
    let mut cars = Vec::new();
    let mut rest = input;

    let tail = loop {
        let (after_car, car) = value(rest, depth + 1)?;
        cars.push(car);

        let (after_tag, next_tag) = be_u8().parse(after_car)?;
        if next_tag == u8::from(Tag::Pair) {
            rest = after_tag;
            continue;
        }

        let (after_cdr, cdr) = value(after_car, depth + 1)?;
        rest = after_cdr;
        break cdr;
    };

    let list = cars
        .into_iter()
        .rev()
        .fold(tail, |cdr, car| Pmt::cons(car, cdr));

    Ok((rest, list))
}

fn sequence(input: &[u8], depth: usize) -> IResult<&[u8], Vec<Pmt>> {
    let (mut rest, count) = be_u32().parse(input)?;

    // Every item takes at least one byte.
    let mut items = Vec::with_capacity((count as usize).min(rest.len()));
    for _ in 0..count {
        let (after_item, item) = value(rest, depth + 1)?;
        items.push(item);
        rest = after_item;
    }

    Ok((rest, items))
}

fn uniform(input: &[u8]) -> IResult<&[u8], Pmt> {
    let (rest, item_type) = be_u8().parse(input)?;
    let item_type =
        ItemType::try_from(item_type).map_err(|_| ParserError::Malformed.to_nom(input))?;
    let (rest, padding) = be_u8().parse(rest)?;
    let (rest, count) = be_u32().parse(rest)?;
    let (rest, _): (&[u8], &[u8]) = take(padding).parse(rest)?;

    let length = (count as usize)
        .checked_mul(item_type.size())
        .ok_or_else(|| ParserError::Malformed.to_nom(input))?;
    let (rest, data): (&[u8], &[u8]) = take(length).parse(rest)?;

    Ok((
        rest,
        Pmt::Uniform(UniformVector {
            item_type,
            data: data.to_vec(),
        }),
    ))
}

enum ParserError {
    UnknownTag,
    DepthExceeded,
    Malformed,
}

impl ParserError {
    fn to_nom<T>(&self, input: T) -> nom::Err<nom::error::Error<T>> {
        match self {
            Self::UnknownTag => {
                nom::Err::Error(nom::error::Error::new(input, ErrorKind::Tag))
            },
            Self::DepthExceeded => {
                nom::Err::Failure(nom::error::Error::new(input, ErrorKind::TooLarge))
            },
            Self::Malformed => {
                nom::Err::Error(nom::error::Error::new(input, ErrorKind::Verify))
            },
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PmtError {
    #[error("Empty message.")]
    Empty,

    #[error("Message ends in the middle of a value.")]
    Truncated,

    #[error("Unknown type tag.")]
    UnknownTag(u8),

    #[error("Values are nested too deeply.")]
    DepthExceeded,

    #[error("Malformed value.")]
    Malformed,
}

impl PmtError {
    fn from_nom(err: nom::error::Error<&[u8]>) -> Self {
        match err.code {
            ErrorKind::Tag => Self::UnknownTag(err.input.first().copied().unwrap_or_default()),
            ErrorKind::TooLarge => Self::DepthExceeded,
            _ => Self::Malformed,
        }
    }

    pub fn additional_info(&self) -> Option<String> {
        match self {
            Self::UnknownTag(tag) => Some(format!("Tag: 0x{tag:02x}")),
            _ => None,
        }
    }
}
