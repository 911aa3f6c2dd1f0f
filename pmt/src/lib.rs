// Library lints
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]

//! Codec for GNU Radio polymorphic types (PMT) in their serialized form.
//!
//! Message blocks upstream publish one serialized PMT per bus message. Only the
//! value model and the byte format live here; what the values mean is up to the
//! consumer.

pub use crate::parser::{PmtError, deserialize};
pub use crate::serializer::serialize;
pub use crate::value::{DictEntries, ItemType, Pmt, UniformVector};

pub mod parser;
pub mod serializer;
pub mod tag;
pub mod value;
