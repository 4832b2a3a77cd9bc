//! Recursive, descriptor-driven payload decoder. Mirrors [`Encoder`](crate::Encoder) exactly.

use crate::classify::{classify, element_type, is_supported_element, ObjectType};
use crate::encoder::{ABSENT, PRESENT};
use crate::envelope::Limits;
use crate::io::Source;
use crate::primitive::{decode_scalar, LENGTH_WIDTH, MAX_SCALAR_WIDTH, TIMESTAMP_WIDTH};
use crate::schema::{ScalarKind, SequenceShape, TypeDescriptor, TypeKind};
use crate::value::{Record, Scalar, Value};
use crate::{CodecError, MalformedError, Result, ShapeError};

/// Items reserved up front for a decoded collection, whatever count the stream announces.
const MAX_PREALLOCATED_ITEMS: usize = 4096;

/// Reads payloads from a source.
pub struct Decoder<'a, S: Source + ?Sized> {
    source: &'a mut S,
    limits: Limits,
    scratch: [u8; MAX_SCALAR_WIDTH],
    depth: usize,
    offset: u64,
}

impl<'a, S: Source + ?Sized> Decoder<'a, S> {
    pub fn new(source: &'a mut S, limits: Limits) -> Self {
        Self {
            source,
            limits,
            scratch: [0u8; MAX_SCALAR_WIDTH],
            depth: 0,
            offset: 0,
        }
    }

    /// Bytes consumed so far by this decoder.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the root of a graph, the counterpart of [`Encoder::write_root`](crate::Encoder::write_root).
    pub fn read_root(&mut self, declared: &TypeDescriptor) -> Result<Value> {
        if classify(declared) == ObjectType::Class {
            if self.limits.max_depth == 0 {
                return Err(CodecError::DepthLimit { limit: 0 });
            }
            self.depth += 1;
            let result = self.read_composite(declared);
            self.depth -= 1;
            result
        } else {
            self.read_payload(declared)
        }
    }

    /// Reads one instance of `declared`.
    ///
    /// # Errors
    /// Returns `CodecError::Malformed` for truncated input, invalid presence bytes and
    /// out-of-range lengths, and `CodecError::Shape` when `declared` cannot be produced.
    pub fn read_payload(&mut self, declared: &TypeDescriptor) -> Result<Value> {
        if self.depth >= self.limits.max_depth {
            return Err(CodecError::DepthLimit {
                limit: self.limits.max_depth,
            });
        }
        self.depth += 1;
        let result = self.read_classified(declared);
        self.depth -= 1;
        result
    }

    fn read_classified(&mut self, declared: &TypeDescriptor) -> Result<Value> {
        match (classify(declared), declared.kind()) {
            (ObjectType::Primitive, TypeKind::Scalar(kind))
            | (ObjectType::Enum, TypeKind::Enum(kind)) => Ok(Value::Scalar(self.read_scalar(*kind)?)),
            (ObjectType::Nullable, TypeKind::Nullable(inner)) => {
                if self.read_presence()? {
                    self.read_payload(inner)
                } else {
                    Ok(Value::Null)
                }
            }
            (ObjectType::String, _) => {
                if self.read_presence()? {
                    self.read_string().map(Value::String)
                } else {
                    Ok(Value::Null)
                }
            }
            (ObjectType::DateTimeLike, _) => {
                let raw = self.read_raw(TIMESTAMP_WIDTH)?;
                let mut ticks = [0u8; TIMESTAMP_WIDTH];
                ticks.copy_from_slice(raw);
                Ok(Value::Timestamp(i64::from_le_bytes(ticks)))
            }
            (ObjectType::Class, _) => {
                if self.read_presence()? {
                    self.read_composite(declared)
                } else {
                    Ok(Value::Null)
                }
            }
            (ObjectType::Struct, _) => self.read_composite(declared),
            (ObjectType::Enumerable, _) => self.read_enumerable(declared),
            _ => {
                log::trace!("unable to read object of type {}: unsupported", declared.name());
                Err(ShapeError::Unsupported {
                    type_name: declared.name(),
                }
                .into())
            }
        }
    }

    fn read_composite(&mut self, declared: &TypeDescriptor) -> Result<Value> {
        log::trace!("reading composite object of type {}", declared.name());
        let fields = declared.fields();
        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let field_type = field.descriptor();
            log::trace!(
                "reading field {} with type {}",
                field.name(),
                field_type.name()
            );
            values.push(self.read_payload(field_type)?);
        }
        Ok(Value::Record(Record::new(declared.name(), values)))
    }

    fn read_enumerable(&mut self, declared: &TypeDescriptor) -> Result<Value> {
        let element = element_type(declared).ok_or(ShapeError::MissingElementType {
            type_name: declared.name(),
        })?;
        if !is_supported_element(element) {
            return Err(ShapeError::UnsupportedElement {
                type_name: declared.name(),
                element: element.name(),
            }
            .into());
        }
        if !self.read_presence()? {
            return Ok(Value::Null);
        }
        let count = self.read_length(self.limits.max_sequence_len, min_encoded_width(element))?;
        if let TypeKind::Sequence {
            shape: SequenceShape::Array { len: Some(expected) },
            ..
        } = declared.kind()
        {
            if *expected != count {
                return Err(MalformedError::ArrayLength {
                    type_name: declared.name(),
                    expected: *expected,
                    actual: count,
                }
                .into());
            }
        }

        if count == 0 {
            log::trace!("enumerable is empty");
            return Ok(Value::Sequence(Vec::new()));
        }
        log::trace!("begin reading enumerable of {} items", count);
        let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATED_ITEMS));
        for _ in 0..count {
            items.push(self.read_payload(element)?);
        }
        log::trace!("end reading enumerable");
        Ok(Value::Sequence(items))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_length(self.limits.max_string_len, 1)?;
        let start = self.offset;
        let mut bytes = vec![0u8; len];
        if len > 0 {
            self.source.pull_exact(&mut bytes)?;
            self.offset += len as u64;
        }
        String::from_utf8(bytes).map_err(|_| MalformedError::InvalidUtf8 { offset: start }.into())
    }

    /// Reads an `i32` length or count and validates it against `limit` and, when the source
    /// knows its size, against the bytes left (at `item_width` bytes per item).
    fn read_length(&mut self, limit: usize, item_width: usize) -> Result<usize> {
        let offset = self.offset;
        let mut prefix = [0u8; LENGTH_WIDTH];
        prefix.copy_from_slice(self.read_raw(LENGTH_WIDTH)?);
        let raw = i32::from_le_bytes(prefix);
        let len = usize::try_from(raw)
            .map_err(|_| MalformedError::NegativeLength { len: raw, offset })?;
        if len > limit {
            return Err(MalformedError::LengthLimit { len, limit, offset }.into());
        }
        if let Some(remaining) = self.source.remaining_hint() {
            let needed = len.saturating_mul(item_width);
            if needed > remaining {
                return Err(MalformedError::InsufficientData {
                    needed: needed - remaining,
                }
                .into());
            }
        }
        Ok(len)
    }

    fn read_scalar(&mut self, kind: ScalarKind) -> Result<Scalar> {
        let raw = self.read_raw(kind.width())?;
        decode_scalar(kind, raw)
    }

    /// Pulls `width` bytes (at most 16) into the scratch buffer.
    fn read_raw(&mut self, width: usize) -> Result<&[u8]> {
        self.source.pull_exact(&mut self.scratch[..width])?;
        self.offset += width as u64;
        Ok(&self.scratch[..width])
    }

    /// Reads a presence byte: `true` for present, `false` for absent.
    fn read_presence(&mut self) -> Result<bool> {
        let offset = self.offset;
        let byte = self.read_raw(1)?[0];
        match byte {
            PRESENT => Ok(true),
            ABSENT => Ok(false),
            other => Err(MalformedError::InvalidPresence {
                byte: other,
                offset,
            }
            .into()),
        }
    }
}

/// The fewest bytes one instance of `descriptor` can occupy on the wire.
///
/// Value-owned composites count as zero so that recursive descriptors never recurse here.
fn min_encoded_width(descriptor: &TypeDescriptor) -> usize {
    match descriptor.kind() {
        TypeKind::Scalar(kind) | TypeKind::Enum(kind) => kind.width(),
        TypeKind::Timestamp => TIMESTAMP_WIDTH,
        TypeKind::Nullable(_) | TypeKind::String | TypeKind::Sequence { .. } => 1,
        TypeKind::Composite { .. } if classify(descriptor).has_presence_flag() => 1,
        _ => 0,
    }
}
