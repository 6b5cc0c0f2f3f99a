//! CQL type descriptors, wire primitives and value codecs.
//!
//! The crate is organised leaves-first:
//! - [cql_type] describes the shape of a CQL type,
//! - [value] holds dynamically typed CQL values,
//! - [frame] contains the length-prefixed wire primitives,
//! - [codec] maps between native Rust values, their wire form and their CQL literal form.

pub mod codec;
pub mod cql_type;
pub mod errors;
pub mod frame;
pub mod pretty;
pub mod utils;
pub mod value;

pub use codec::TypeCodec;
pub use cql_type::{CollectionType, ColumnType, NativeType, UserDefinedType};
pub use errors::{InvalidTypeError, InvalidTypeErrorKind};
pub use frame::ProtocolVersion;
pub use value::CqlValue;
