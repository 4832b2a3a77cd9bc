//! The top-level envelope: a 16-byte type tag followed by the payload.

use std::fmt;

use bytes::{Bytes, BytesMut};
use md5::{Digest, Md5};

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::io::{Sink, Source};
use crate::schema::{Schema, TypeDescriptor};
use crate::value::Value;
use crate::{CodecError, Result};

/// Width of the envelope tag in bytes.
pub const TAG_WIDTH: usize = 16;

/// The envelope identity of a type: the MD5 digest of its UTF-8 type name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag([u8; TAG_WIDTH]);

impl TypeTag {
    pub fn for_name(name: &str) -> Self {
        let mut hasher = Md5::new();
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; TAG_WIDTH];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// The tag written in front of every serialized `T`.
    pub fn of<T: Schema>() -> Self {
        T::descriptor().tag()
    }

    pub const fn from_bytes(bytes: [u8; TAG_WIDTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_WIDTH] {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self)
    }
}

/// Decoding and encoding bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Deepest nesting of composites, nullables and collections accepted in either direction.
    pub max_depth: usize,
    /// Longest decoded string, in bytes.
    pub max_string_len: usize,
    /// Largest decoded collection count.
    pub max_sequence_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_string_len: i32::MAX as usize,
            max_sequence_len: i32::MAX as usize,
        }
    }
}

impl Limits {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_string_len(mut self, max_string_len: usize) -> Self {
        self.max_string_len = max_string_len;
        self
    }

    pub fn with_max_sequence_len(mut self, max_sequence_len: usize) -> Self {
        self.max_sequence_len = max_sequence_len;
        self
    }
}

/// Serializes object graphs into envelopes and back.
///
/// The serializer holds no per-call state. Sinks and sources are borrowed for the duration of
/// one call and never closed.
#[derive(Debug, Clone, Default)]
pub struct BinarySerializer {
    limits: Limits,
}

impl BinarySerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Serializes `value` into a new buffer.
    pub fn serialize<T: Schema>(&self, value: &T) -> Result<Bytes> {
        let mut writer = BytesMut::new();
        self.serialize_into(value, &mut writer)?;
        Ok(writer.freeze())
    }

    /// Writes the envelope of `value` into `sink`.
    ///
    /// # Errors
    /// Fails with [`CodecError::InvalidArgument`] if `value` is absent, and with
    /// [`CodecError::Shape`] if any part of the graph cannot be encoded.
    pub fn serialize_into<T: Schema, S: Sink + ?Sized>(&self, value: &T, sink: &mut S) -> Result<()> {
        self.serialize_value(&value.to_value(), T::descriptor(), sink)
    }

    /// Writes the envelope of a value graph declared as `declared`.
    pub fn serialize_value<S: Sink + ?Sized>(
        &self,
        value: &Value,
        declared: &TypeDescriptor,
        sink: &mut S,
    ) -> Result<()> {
        if value.is_null() {
            return Err(CodecError::InvalidArgument(format!(
                "cannot serialize an absent value of type {}",
                declared.name()
            )));
        }
        log::trace!("begin writing object of type {}", declared.name());
        sink.push_slice(declared.tag().as_bytes())?;
        Encoder::new(sink, self.limits).write_root(value, declared)?;
        log::trace!("end writing object of type {}", declared.name());
        Ok(())
    }

    /// Reads an envelope of `T` from `source`.
    ///
    /// # Errors
    /// Fails with [`CodecError::TypeMismatch`] before any payload byte is read if the envelope
    /// names another type, and with [`CodecError::Malformed`] if the payload does not follow
    /// the layout of `T`.
    pub fn deserialize<T: Schema, S: Source + ?Sized>(&self, source: &mut S) -> Result<T> {
        let value = self.deserialize_value(T::descriptor(), source)?;
        T::from_value(value)
    }

    /// Reads an envelope of `declared` from `source` as a value graph.
    pub fn deserialize_value<S: Source + ?Sized>(
        &self,
        declared: &TypeDescriptor,
        source: &mut S,
    ) -> Result<Value> {
        let mut tag = [0u8; TAG_WIDTH];
        source.pull_exact(&mut tag)?;
        let actual = TypeTag::from_bytes(tag);
        let expected = declared.tag();
        if actual != expected {
            log::debug!(
                "type tag mismatch for {}: expected {}, found {}",
                declared.name(),
                expected,
                actual
            );
            return Err(CodecError::TypeMismatch {
                type_name: declared.name(),
                expected,
                actual,
            });
        }

        log::trace!("begin reading object of type {}", declared.name());
        let mut decoder = Decoder::new(source, self.limits);
        let value = decoder.read_root(declared)?;
        log::trace!(
            "end reading object of type {} ({} payload bytes)",
            declared.name(),
            decoder.offset()
        );
        Ok(value)
    }
}
