//! Recursive, descriptor-driven payload encoder.

use crate::classify::{classify, element_type, is_supported_element, ObjectType};
use crate::envelope::Limits;
use crate::io::Sink;
use crate::primitive::{encode_scalar, MAX_SCALAR_WIDTH};
use crate::schema::{TypeDescriptor, TypeKind};
use crate::value::{Record, Scalar, Value};
use crate::{CodecError, Result, ShapeError};

pub(crate) const ABSENT: u8 = 0x00;
pub(crate) const PRESENT: u8 = 0x01;

/// Writes payloads into a sink.
///
/// The encoder keeps only a scratch buffer for primitives and the current nesting depth; a
/// primitive's bytes are flushed to the sink before control returns to the caller, so the
/// buffer is reused across recursive calls.
pub struct Encoder<'a, S: Sink + ?Sized> {
    sink: &'a mut S,
    limits: Limits,
    scratch: [u8; MAX_SCALAR_WIDTH],
    depth: usize,
}

impl<'a, S: Sink + ?Sized> Encoder<'a, S> {
    pub fn new(sink: &'a mut S, limits: Limits) -> Self {
        Self {
            sink,
            limits,
            scratch: [0u8; MAX_SCALAR_WIDTH],
            depth: 0,
        }
    }

    /// Writes the root of a graph.
    ///
    /// A root composite is never absent, so its fields follow the envelope directly without a
    /// presence byte. Every other root shape is written by [`write_payload`](Self::write_payload).
    pub fn write_root(&mut self, value: &Value, declared: &TypeDescriptor) -> Result<()> {
        match (classify(declared), value) {
            (ObjectType::Class, Value::Record(record)) => {
                if self.limits.max_depth == 0 {
                    return Err(CodecError::DepthLimit { limit: 0 });
                }
                self.depth += 1;
                let result = self.write_composite(record, declared);
                self.depth -= 1;
                result
            }
            _ => self.write_payload(value, declared),
        }
    }

    /// Writes `value` as an instance of `declared`.
    ///
    /// # Errors
    /// Returns `CodecError::Shape` when the declared type is unsupported, when a collection's
    /// element type is unsupported or its items are not all of that type, and when `value`
    /// does not have the declared shape.
    pub fn write_payload(&mut self, value: &Value, declared: &TypeDescriptor) -> Result<()> {
        if self.depth >= self.limits.max_depth {
            return Err(CodecError::DepthLimit {
                limit: self.limits.max_depth,
            });
        }
        self.depth += 1;
        let result = self.write_classified(value, declared);
        self.depth -= 1;
        result
    }

    fn write_classified(&mut self, value: &Value, declared: &TypeDescriptor) -> Result<()> {
        match (classify(declared), declared.kind()) {
            (ObjectType::Primitive, TypeKind::Scalar(kind))
            | (ObjectType::Enum, TypeKind::Enum(kind)) => match value {
                Value::Scalar(scalar) if scalar.kind() == *kind => self.write_scalar(scalar),
                other => Err(other.mismatch(declared)),
            },
            (ObjectType::Nullable, TypeKind::Nullable(inner)) => {
                if value.is_null() {
                    self.write_presence(false)
                } else {
                    self.write_presence(true)?;
                    self.write_payload(value, inner)
                }
            }
            (ObjectType::String, _) => match value {
                Value::Null => self.write_presence(false),
                Value::String(text) => self.write_string(text, declared),
                other => Err(other.mismatch(declared)),
            },
            (ObjectType::DateTimeLike, _) => match value {
                Value::Timestamp(ticks) => self.write_scalar(&Scalar::I64(*ticks)),
                other => Err(other.mismatch(declared)),
            },
            (ObjectType::Class, _) => match value {
                Value::Null => self.write_presence(false),
                Value::Record(record) => {
                    self.write_presence(true)?;
                    self.write_composite(record, declared)
                }
                other => Err(other.mismatch(declared)),
            },
            (ObjectType::Struct, _) => match value {
                Value::Record(record) => self.write_composite(record, declared),
                other => Err(other.mismatch(declared)),
            },
            (ObjectType::Enumerable, _) => self.write_enumerable(value, declared),
            _ => {
                log::trace!("unsupported value of type {}", declared.name());
                Err(ShapeError::Unsupported {
                    type_name: declared.name(),
                }
                .into())
            }
        }
    }

    fn write_composite(&mut self, record: &Record, declared: &TypeDescriptor) -> Result<()> {
        let fields = declared.fields();
        if record.type_name() != declared.name() || record.fields().len() != fields.len() {
            return Err(ShapeError::ValueMismatch {
                expected: declared.name(),
                found: record.type_name().to_string(),
            }
            .into());
        }
        log::trace!("writing composite object of type {}", declared.name());
        for (field, value) in fields.iter().zip(record.fields()) {
            let field_type = field.descriptor();
            log::trace!(
                "writing field {} with type {}",
                field.name(),
                field_type.name()
            );
            self.write_payload(value, field_type)?;
        }
        Ok(())
    }

    fn write_enumerable(&mut self, value: &Value, declared: &TypeDescriptor) -> Result<()> {
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
        let items = match value {
            Value::Null => return self.write_presence(false),
            Value::Sequence(items) => items,
            other => return Err(other.mismatch(declared)),
        };
        // Every item is checked before the first byte of the collection is written.
        if let Some((index, item)) = items
            .iter()
            .enumerate()
            .find(|(_, item)| !conforms(item, element))
        {
            return Err(ShapeError::Heterogeneous {
                type_name: declared.name(),
                element: element.name(),
                index,
                found: item.describe(),
            }
            .into());
        }
        let count = length_prefix(items.len(), declared)?;

        log::trace!("begin writing enumerable of {} items", items.len());
        self.write_presence(true)?;
        self.write_scalar(&Scalar::I32(count))?;
        for item in items {
            self.write_payload(item, element)?;
        }
        log::trace!("end writing enumerable");
        Ok(())
    }

    fn write_string(&mut self, text: &str, declared: &TypeDescriptor) -> Result<()> {
        let len = length_prefix(text.len(), declared)?;
        self.write_presence(true)?;
        self.write_scalar(&Scalar::I32(len))?;
        if len > 0 {
            self.sink.push_slice(text.as_bytes())?;
        }
        Ok(())
    }

    fn write_scalar(&mut self, scalar: &Scalar) -> Result<()> {
        let len = encode_scalar(scalar, &mut self.scratch);
        self.sink.push_slice(&self.scratch[..len])
    }

    fn write_presence(&mut self, present: bool) -> Result<()> {
        self.sink.push_byte(if present { PRESENT } else { ABSENT })
    }
}

fn length_prefix(len: usize, declared: &TypeDescriptor) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        ShapeError::LengthOverflow {
            type_name: declared.name(),
            len,
        }
        .into()
    })
}

/// Whether an item's runtime shape is exactly the declared element shape.
///
/// Absent items are allowed only for element shapes that carry a presence byte.
pub(crate) fn conforms(item: &Value, element: &TypeDescriptor) -> bool {
    match (item, element.kind()) {
        (Value::Null, _) => classify(element).has_presence_flag(),
        (_, TypeKind::Nullable(inner)) => conforms(item, inner),
        (Value::Scalar(scalar), TypeKind::Scalar(kind) | TypeKind::Enum(kind)) => {
            scalar.kind() == *kind
        }
        (Value::String(_), TypeKind::String) => true,
        (Value::Timestamp(_), TypeKind::Timestamp) => true,
        (Value::Record(record), TypeKind::Composite { .. }) => {
            record.type_name() == element.name()
        }
        (Value::Sequence(_), TypeKind::Sequence { .. }) => true,
        _ => false,
    }
}
