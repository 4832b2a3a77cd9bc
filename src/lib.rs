//! # posgraph
//!
//! A compact, positional binary codec for typed object graphs.
//!
//! - No field names, ids or per-value tags travel on the wire: writer and reader share the
//!   field order of each composite through its [`TypeDescriptor`]
//! - Every payload is wrapped in a 16-byte [`TypeTag`] envelope derived from the fully
//!   qualified type name, checked before a single payload byte is interpreted
//! - Fixed-width little-endian primitives, including a four-word 128-bit decimal layout
//! - Custom derive macro for ergonomic usage
//!
//! ## Layout rules
//!
//! Every type is classified into one [`ObjectType`]. Shapes that may be absent
//! (`Nullable`, `String`, `Class`, `Enumerable`) are preceded by exactly one presence byte
//! (`0x00` absent, `0x01` present). Always-present shapes (`Primitive`, `Enum`, `Struct`,
//! `DateTimeLike`) never are. Strings and collections carry an `i32` length/count.
//!
//! ## Attribute Macros
//!
//! - `#[posgraph(value)]`: Marks a composite as value-owned (`Struct`): it is never absent and
//!   carries no presence byte. Composites are reference-owned (`Class`) by default.
//! - `#[posgraph(type_name = "name")]`: Uses the given string as the identity written into the
//!   envelope instead of `std::any::type_name`. Useful to keep streams readable after moving a type.
//! - `#[posgraph(skip)]`: This field is not part of the layout. On decode it is set to `Default::default()`.
//! - `#[posgraph(rename = "name")]`: The field name recorded in the descriptor. Only diagnostics
//!   and [`inspect::dump`] see it.
//!
//! ## Feature Flags
//!
//! - `chrono` (default): Enables `chrono::DateTime<Utc>`, `DateTime<Local>` and `NaiveDateTime` as `DateTimeLike`.
//! - `smol_str`: Enables `smol_str::SmolStr` as a `String` shape.
//!
//! ## Example
//!
//! ```rust
//! use posgraph::{deserialize, serialize, Schema};
//!
//! #[derive(Schema, PartialEq, Debug)]
//! struct Sample {
//!     int: i32,
//!     text: String,
//!     values: Vec<i32>,
//! }
//!
//! let value = Sample { int: 11, text: "abc".to_string(), values: vec![1, 2, 3] };
//! let mut bytes = serialize(&value).unwrap();
//! let decoded: Sample = deserialize(&mut bytes).unwrap();
//! assert_eq!(value, decoded);
//! ```

extern crate self as posgraph;

pub mod classify;
mod core;
pub mod decoder;
pub mod encoder;
pub mod envelope;
mod features;
pub mod inspect;
pub mod io;
pub mod primitive;
pub mod registry;
pub mod schema;
pub mod value;

use bytes::{Bytes, BytesMut};

pub use classify::{classify, element_type, is_supported_element, ObjectType};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use envelope::{BinarySerializer, Limits, TypeTag};
pub use io::{IoSink, IoSource, Sink, Source};
pub use posgraph_derive::Schema;
pub use schema::{
    FieldDescriptor, Ownership, ScalarKind, Schema, SequenceShape, TypeDescriptor, TypeKind,
};
pub use value::{Record, Scalar, Value};

/// Errors that can occur during serialization or deserialization.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The envelope of the stream names a different type than the one requested.
    #[error("Type mismatch for {type_name}: expected tag {expected}, found {actual}")]
    TypeMismatch {
        type_name: &'static str,
        expected: TypeTag,
        actual: TypeTag,
    },
    /// A value or a declared type has a shape the format cannot carry.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// The stream does not follow the layout of the requested type.
    #[error(transparent)]
    Malformed(#[from] MalformedError),
    /// The graph nests deeper than the configured limit.
    #[error("Nesting depth exceeds the limit of {limit}")]
    DepthLimit { limit: usize },
    /// The caller passed an argument the operation cannot accept.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The underlying reader or writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Shape errors, raised eagerly instead of skipping bytes.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("Type {type_name} has no supported binary shape")]
    Unsupported { type_name: &'static str },
    #[error("Collection {type_name} has no recognizable element type")]
    MissingElementType { type_name: &'static str },
    #[error("Collection {type_name} has unsupported element type {element}")]
    UnsupportedElement {
        type_name: &'static str,
        element: &'static str,
    },
    #[error("Collection {type_name} item {index} is {found}, expected {element}")]
    Heterogeneous {
        type_name: &'static str,
        element: &'static str,
        index: usize,
        found: String,
    },
    #[error("Value {found} does not match declared type {expected}")]
    ValueMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("Absent value for {type_name}, which cannot be absent")]
    AbsentValue { type_name: &'static str },
    #[error("Length {len} of {type_name} does not fit the 32-bit length prefix")]
    LengthOverflow { type_name: &'static str, len: usize },
}

/// Stream errors raised while decoding.
#[derive(Debug, thiserror::Error)]
pub enum MalformedError {
    #[error("Insufficient data: needed {needed} more bytes")]
    InsufficientData { needed: usize },
    #[error("Invalid presence byte 0x{byte:02X} at offset {offset}")]
    InvalidPresence { byte: u8, offset: u64 },
    #[error("Negative length {len} at offset {offset}")]
    NegativeLength { len: i32, offset: u64 },
    #[error("Length {len} at offset {offset} exceeds the limit of {limit}")]
    LengthLimit { len: usize, limit: usize, offset: u64 },
    #[error("String at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: u64 },
    #[error("Invalid {kind:?} value: {reason}")]
    InvalidScalar { kind: ScalarKind, reason: String },
    #[error("Unknown discriminant {value} for enum {type_name}")]
    UnknownDiscriminant { type_name: &'static str, value: i128 },
    #[error("Array length mismatch for {type_name}: expected {expected}, got {actual}")]
    ArrayLength {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Timestamp of {ticks} ticks is out of range")]
    TimestampRange { ticks: i64 },
}

/// Convenience function to serialize a value with the default [`Limits`].
///
/// The returned buffer holds the 16-byte type tag followed by the payload.
///
/// # Errors
/// Fails with [`CodecError::InvalidArgument`] if `value` is absent (a `None` at the top level),
/// and with [`CodecError::Shape`] if any part of the graph cannot be encoded.
///
/// # Example
/// ```rust
/// use posgraph::{serialize, TypeTag};
///
/// let bytes = serialize(&42i32).unwrap();
/// assert_eq!(&bytes[..16], TypeTag::of::<i32>().as_bytes());
/// assert_eq!(&bytes[16..], &[42, 0, 0, 0]);
/// ```
pub fn serialize<T: Schema>(value: &T) -> Result<Bytes> {
    let mut writer = BytesMut::new();
    serialize_into(value, &mut writer)?;
    Ok(writer.freeze())
}

/// Serializes a value into any [`Sink`] with the default [`Limits`].
pub fn serialize_into<T: Schema, S: Sink + ?Sized>(value: &T, sink: &mut S) -> Result<()> {
    BinarySerializer::new().serialize_into(value, sink)
}

/// Convenience function to deserialize a value with the default [`Limits`].
///
/// # Errors
/// Fails with [`CodecError::TypeMismatch`] if the envelope names a different type, and with
/// [`CodecError::Malformed`] if the payload is truncated or does not follow the layout of `T`.
///
/// # Example
/// ```rust
/// use posgraph::{deserialize, serialize};
///
/// let mut bytes = serialize(&vec![1u16, 2, 3]).unwrap();
/// let decoded: Vec<u16> = deserialize(&mut bytes).unwrap();
/// assert_eq!(decoded, vec![1, 2, 3]);
/// ```
pub fn deserialize<T: Schema, S: Source + ?Sized>(source: &mut S) -> Result<T> {
    BinarySerializer::new().deserialize(source)
}
