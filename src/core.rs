//! Built-in [`Schema`] implementations.
//!
//! - Fixed-width numbers, `bool`, `char` and `Decimal` are `Primitive`.
//! - `String` is a `String` shape.
//! - `Option<T>` reuses `T`'s presence byte when `T` has one and is `Nullable` otherwise.
//! - `Box<T>` and `Arc<T>` are transparent.
//! - `Vec<T>` is a list; `[T; N]` and `Box<[T]>` are arrays. Sets are enumerable but have no
//!   element order the layout could rely on, so encoding them fails.

use std::any::type_name;
use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::*;

// --- Scalars ---
macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Schema for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::scalar(type_name::<$ty>(), ScalarKind::$variant)
                }

                fn to_value(&self) -> Value {
                    Value::Scalar(Scalar::$variant(*self))
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Scalar(Scalar::$variant(v)) => Ok(v),
                        other => Err(other.mismatch(Self::descriptor())),
                    }
                }
            }
        )*
    };
}

impl_scalar!(
    bool => Bool,
    u8 => U8,
    i8 => I8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    i128 => I128,
    u128 => U128,
    f32 => F32,
    f64 => F64,
    char => Char,
    Decimal => Decimal,
);

// --- String ---
impl Schema for String {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::string(type_name::<String>())
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(text),
            other => Err(other.mismatch(Self::descriptor())),
        }
    }
}

// --- Option ---
/// `Option<String>`, `Option<Vec<T>>` and options of reference-owned composites share the
/// descriptor of their inner type: its presence byte already encodes `None`. Nested options
/// of such types therefore collapse, and `Some(None)` decodes as `None`.
impl<T: Schema> Schema for Option<T> {
    fn describe() -> TypeDescriptor {
        let inner = T::descriptor();
        if classify(inner).has_presence_flag() {
            inner.clone()
        } else {
            TypeDescriptor::nullable(type_name::<Self>(), inner)
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// --- Box, Arc ---
impl<T: Schema> Schema for Box<T> {
    fn describe() -> TypeDescriptor {
        T::descriptor().clone()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: Schema> Schema for Arc<T> {
    fn describe() -> TypeDescriptor {
        T::descriptor().clone()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Arc::new)
    }
}

// --- Vec<T> ---
impl<T: Schema> Schema for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(type_name::<Self>(), SequenceShape::List, Some(T::descriptor()))
    }

    fn to_value(&self) -> Value {
        sequence_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self> {
        collect_items::<Self, T, _>(value)
    }
}

// --- Array ---
impl<T: Schema, const N: usize> Schema for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(
            type_name::<Self>(),
            SequenceShape::Array { len: Some(N) },
            Some(T::descriptor()),
        )
    }

    fn to_value(&self) -> Value {
        sequence_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self> {
        let items: Vec<T> = collect_items::<Self, T, _>(value)?;
        items.try_into().map_err(|items: Vec<T>| {
            MalformedError::ArrayLength {
                type_name: type_name::<Self>(),
                expected: N,
                actual: items.len(),
            }
            .into()
        })
    }
}

impl<T: Schema> Schema for Box<[T]> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(
            type_name::<Self>(),
            SequenceShape::Array { len: None },
            Some(T::descriptor()),
        )
    }

    fn to_value(&self) -> Value {
        sequence_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self> {
        collect_items::<Self, T, Vec<T>>(value).map(Vec::into_boxed_slice)
    }
}

// --- HashSet, BTreeSet ---
impl<T: Schema + Eq + Hash> Schema for HashSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(
            type_name::<Self>(),
            SequenceShape::Unordered,
            Some(T::descriptor()),
        )
    }

    fn to_value(&self) -> Value {
        sequence_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self> {
        collect_items::<Self, T, _>(value)
    }
}

impl<T: Schema + Ord> Schema for BTreeSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(
            type_name::<Self>(),
            SequenceShape::Unordered,
            Some(T::descriptor()),
        )
    }

    fn to_value(&self) -> Value {
        sequence_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self> {
        collect_items::<Self, T, _>(value)
    }
}

// --- Value ---
/// The erased value graph itself. Its descriptor is `Any`, which has no binary shape: it can
/// only be encoded through [`BinarySerializer::serialize_value`] with a concrete descriptor.
impl Schema for Value {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::any(type_name::<Value>())
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

// --- Common helpers ---
fn sequence_value<'a, T: Schema + 'a>(items: impl Iterator<Item = &'a T>) -> Value {
    Value::Sequence(items.map(Schema::to_value).collect())
}

/// Rebuilds every item of a decoded sequence of `C`.
fn collect_items<C: Schema, T: Schema, B: FromIterator<T>>(value: Value) -> Result<B> {
    match value {
        Value::Sequence(items) => items.into_iter().map(T::from_value).collect(),
        other => Err(other.mismatch(C::descriptor())),
    }
}
