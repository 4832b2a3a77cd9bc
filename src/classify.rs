//! Classification of type descriptors into binary encoding strategies.

use crate::schema::{Ownership, SequenceShape, TypeDescriptor, TypeKind};

/// The closed set of encoding strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Primitive,
    Nullable,
    String,
    DateTimeLike,
    Enum,
    /// Reference-owned composite: preceded by a presence byte.
    Class,
    /// Value-owned composite: always present, no presence byte.
    Struct,
    Enumerable,
    Unsupported,
}

impl ObjectType {
    /// Whether this shape is preceded by exactly one presence byte.
    pub fn has_presence_flag(self) -> bool {
        matches!(
            self,
            ObjectType::Nullable | ObjectType::String | ObjectType::Class | ObjectType::Enumerable
        )
    }
}

/// Classifies a type. Total: shapes that are not recognized map to [`ObjectType::Unsupported`].
pub fn classify(descriptor: &TypeDescriptor) -> ObjectType {
    match descriptor.kind() {
        TypeKind::Nullable(_) => ObjectType::Nullable,
        TypeKind::Scalar(_) => ObjectType::Primitive,
        TypeKind::String => ObjectType::String,
        TypeKind::Timestamp => ObjectType::DateTimeLike,
        TypeKind::Enum(_) => ObjectType::Enum,
        TypeKind::Sequence { .. } => ObjectType::Enumerable,
        TypeKind::Composite {
            ownership: Ownership::Reference,
            ..
        } => ObjectType::Class,
        TypeKind::Composite {
            ownership: Ownership::Value,
            ..
        } => ObjectType::Struct,
        TypeKind::Interface | TypeKind::Any | TypeKind::Opaque => ObjectType::Unsupported,
    }
}

/// Extracts the item type of an array or list. Returns `None` for every other shape.
pub fn element_type(descriptor: &TypeDescriptor) -> Option<&'static TypeDescriptor> {
    match descriptor.kind() {
        TypeKind::Sequence {
            shape: SequenceShape::Array { .. } | SequenceShape::List,
            element,
        } => *element,
        _ => None,
    }
}

/// Whether a collection of this element type can be encoded.
///
/// Items carry no type tag, so every item must share one concrete shape: interface-only, fully
/// erased and unsupported element types are rejected. Nested collections and nullable wrappers
/// are checked all the way down, so a rejected collection is rejected before its first byte.
pub fn is_supported_element(element: &TypeDescriptor) -> bool {
    match element.kind() {
        TypeKind::Interface | TypeKind::Any | TypeKind::Opaque => false,
        TypeKind::Nullable(inner) => is_supported_element(inner),
        TypeKind::Sequence { .. } => element_type(element).is_some_and(is_supported_element),
        _ => true,
    }
}
