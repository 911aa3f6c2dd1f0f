use crate::tag::Tag;
use crate::value::Pmt;

pub fn serialize(value: &Pmt) -> Vec<u8> {
    let mut output = Vec::new();
    write(value, &mut output);
    output
}

fn write(value: &Pmt, output: &mut Vec<u8>) {
    match value {
        Pmt::Null => output.push(Tag::Null.into()),
        Pmt::Bool(true) => output.push(Tag::True.into()),
        Pmt::Bool(false) => output.push(Tag::False.into()),
        Pmt::Symbol(value) => {
            // Length prefix is 16 bits wide.
            let bytes = value.as_bytes();
            let length = bytes.len().min(usize::from(u16::MAX));
            output.push(Tag::Symbol.into());
            output.extend_from_slice(&(length as u16).to_be_bytes());
            output.extend_from_slice(&bytes[..length]);
        },
        Pmt::Integer(value) => match i32::try_from(*value) {
            Ok(narrow) => {
                output.push(Tag::Int32.into());
                output.extend_from_slice(&narrow.to_be_bytes());
            },
            Err(_) => {
                output.push(Tag::Int64.into());
                output.extend_from_slice(&value.to_be_bytes());
            },
        },
        Pmt::UInt64(value) => {
            output.push(Tag::UInt64.into());
            output.extend_from_slice(&value.to_be_bytes());
        },
        Pmt::Double(value) => {
            output.push(Tag::Double.into());
            output.extend_from_slice(&value.to_bits().to_be_bytes());
        },
        Pmt::Complex(real, imaginary) => {
            output.push(Tag::Complex.into());
            output.extend_from_slice(&real.to_bits().to_be_bytes());
            output.extend_from_slice(&imaginary.to_bits().to_be_bytes());
        },
        Pmt::Pair(_, _) => {
            let mut cursor = value;
            while let Pmt::Pair(car, cdr) = cursor {
                output.push(Tag::Pair.into());
                write(car, output);
                cursor = cdr.as_ref();
            }
            write(cursor, output);
        },
        Pmt::Vector(items) => write_sequence(Tag::Vector, items, output),
        Pmt::Tuple(items) => write_sequence(Tag::Tuple, items, output),
        Pmt::Uniform(vector) => {
            let count = u32::try_from(vector.len()).unwrap_or(u32::MAX);
            let length = count as usize * vector.item_type.size();
            output.push(Tag::UniformVector.into());
            output.push(vector.item_type.into());
            // No alignment padding.
            output.push(0);
            output.extend_from_slice(&count.to_be_bytes());
            output.extend_from_slice(&vector.data[..length]);
        },
    }
}

fn write_sequence(tag: Tag, items: &[Pmt], output: &mut Vec<u8>) {
    let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
    output.push(tag.into());
    output.extend_from_slice(&count.to_be_bytes());
    for item in items.iter().take(count as usize) {
        write(item, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::deserialize;
    use crate::value::{ItemType, UniformVector};

    #[test]
    fn test_integer_width() {
        assert_eq!(hex::encode(serialize(&Pmt::Integer(-2))), "03fffffffe");
        assert_eq!(
            hex::encode(serialize(&Pmt::Integer(i64::from(i32::MAX) + 1))),
            "0d0000000080000000"
        );
    }

    #[test]
    fn test_dictionary_layout() {
        let dict = Pmt::dict([("l4_name", Pmt::symbol("TCP"))]);
        assert_eq!(
            hex::encode(serialize(&dict)),
            "07070200076c345f6e616d6502000354435006"
        );
    }

    #[test]
    fn test_nested_message_is_read_back() {
        let message = Pmt::dict([
            ("has_vlan", Pmt::Bool(true)),
            ("vlan_id", Pmt::Integer(100)),
            (
                "samples",
                Pmt::Uniform(UniformVector {
                    item_type: ItemType::F32,
                    data: vec![0x3f, 0x80, 0x00, 0x00],
                }),
            ),
            ("pair", Pmt::cons(Pmt::Integer(1), Pmt::Integer(2))),
            ("tuple", Pmt::Tuple(vec![Pmt::Complex(1.0, -1.0), Pmt::UInt64(9)])),
        ]);

        assert_eq!(deserialize(&serialize(&message)), Ok(message));
    }
}
