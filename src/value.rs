//! The value graph walked by the encoder and produced by the decoder.

use rust_decimal::Decimal;

use crate::schema::{ScalarKind, Schema, TypeDescriptor};
use crate::{Result, ShapeError};

/// A fixed-width scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    U8(u8),
    I8(i8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F32(f32),
    F64(f64),
    Char(char),
    Decimal(Decimal),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::U8(_) => ScalarKind::U8,
            Scalar::I8(_) => ScalarKind::I8,
            Scalar::I16(_) => ScalarKind::I16,
            Scalar::U16(_) => ScalarKind::U16,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::U64(_) => ScalarKind::U64,
            Scalar::I128(_) => ScalarKind::I128,
            Scalar::U128(_) => ScalarKind::U128,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
            Scalar::Char(_) => ScalarKind::Char,
            Scalar::Decimal(_) => ScalarKind::Decimal,
        }
    }

    /// The value as a wide integer, for integer kinds only.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Scalar::U8(v) => Some(v.into()),
            Scalar::I8(v) => Some(v.into()),
            Scalar::I16(v) => Some(v.into()),
            Scalar::U16(v) => Some(v.into()),
            Scalar::I32(v) => Some(v.into()),
            Scalar::U32(v) => Some(v.into()),
            Scalar::I64(v) => Some(v.into()),
            Scalar::U64(v) => Some(v.into()),
            Scalar::I128(v) => Some(v),
            _ => None,
        }
    }
}

/// A composite instance: its type name and field values in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: &'static str,
    fields: Vec<Value>,
}

impl Record {
    pub fn new(type_name: &'static str, fields: Vec<Value>) -> Self {
        Self { type_name, fields }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }

    /// Unwraps a record of type `T` with the field count its descriptor declares.
    ///
    /// This is the entry point of derived factories.
    pub fn expect<T: Schema>(value: Value) -> Result<Record> {
        let descriptor = T::descriptor();
        match value {
            Value::Record(record)
                if record.type_name == descriptor.name()
                    && record.fields.len() == descriptor.fields().len() =>
            {
                Ok(record)
            }
            Value::Null => Err(ShapeError::AbsentValue {
                type_name: descriptor.name(),
            }
            .into()),
            other => Err(ShapeError::ValueMismatch {
                expected: descriptor.name(),
                found: other.describe(),
            }
            .into()),
        }
    }
}

/// A node of the value graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// An absent value.
    #[default]
    Null,
    Scalar(Scalar),
    String(String),
    /// A point in time as 100 ns ticks since 0001-01-01T00:00:00Z.
    Timestamp(i64),
    Record(Record),
    Sequence(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short description of the runtime shape, for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Scalar(scalar) => format!("{:?}", scalar.kind()),
            Value::String(_) => "string".to_string(),
            Value::Timestamp(_) => "timestamp".to_string(),
            Value::Record(record) => record.type_name.to_string(),
            Value::Sequence(items) => format!("sequence of {}", items.len()),
        }
    }

    /// Maps a value-shape mismatch against `descriptor` to an error.
    pub fn mismatch(&self, descriptor: &TypeDescriptor) -> crate::CodecError {
        if self.is_null() {
            ShapeError::AbsentValue {
                type_name: descriptor.name(),
            }
            .into()
        } else {
            ShapeError::ValueMismatch {
                expected: descriptor.name(),
                found: self.describe(),
            }
            .into()
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// Takes the next field value of a record being rebuilt by a factory.
pub fn next_field(
    fields: &mut std::vec::IntoIter<Value>,
    type_name: &'static str,
) -> Result<Value> {
    fields
        .next()
        .ok_or_else(|| ShapeError::AbsentValue { type_name }.into())
}
