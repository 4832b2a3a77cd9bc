//! Type descriptors and the [`Schema`] trait.
//!
//! A [`TypeDescriptor`] is built once per distinct type, cached by the
//! [`registry`](crate::registry) and never mutated afterwards. Composite descriptors list their
//! fields in declaration order; that order is the positional contract shared by the encoder and
//! the decoder.

use std::fmt;
use std::sync::OnceLock;

use crate::envelope::TypeTag;
use crate::value::Value;
use crate::Result;

/// Fixed-width scalar kinds understood by the primitive codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    I128,
    U128,
    F32,
    F64,
    Char,
    Decimal,
}

/// Whether a composite is reference-owned (may be absent) or value-owned (always present).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Reference,
    Value,
}

/// The static shape of a sequence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceShape {
    /// A fixed-size array. `len` is known for `[T; N]` and unknown for `Box<[T]>`.
    Array { len: Option<usize> },
    /// An ordered, growable list.
    List,
    /// A collection without a stable element order, such as a set.
    Unordered,
}

/// Lazily resolved descriptor of a composite field.
pub type DescriptorFn = fn() -> &'static TypeDescriptor;

/// One field of a composite: its name and declared type.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    descriptor: DescriptorFn,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, descriptor: DescriptorFn) -> Self {
        Self { name, descriptor }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolves the declared type of the field.
    pub fn descriptor(&self) -> &'static TypeDescriptor {
        (self.descriptor)()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The field type is printed by name only: recursive composites would never terminate.
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("type", &self.descriptor().name())
            .finish()
    }
}

/// The kind of a type, from which its [`ObjectType`](crate::ObjectType) is derived.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Scalar(ScalarKind),
    /// A value-owned type wrapped in an option.
    Nullable(&'static TypeDescriptor),
    String,
    Timestamp,
    /// A fieldless enumeration stored as its underlying integer kind.
    Enum(ScalarKind),
    Composite {
        ownership: Ownership,
        fields: Vec<FieldDescriptor>,
    },
    Sequence {
        shape: SequenceShape,
        element: Option<&'static TypeDescriptor>,
    },
    /// Capability-only or abstract types (trait objects) with no concrete layout.
    Interface,
    /// The fully erased "any" type.
    Any,
    /// A type with no binary shape at all.
    Opaque,
}

/// Describes a type's shape: its identity name and its [`TypeKind`].
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: &'static str,
    kind: TypeKind,
    tag: OnceLock<TypeTag>,
}

impl TypeDescriptor {
    pub fn new(name: &'static str, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            tag: OnceLock::new(),
        }
    }

    pub fn scalar(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, TypeKind::Scalar(kind))
    }

    pub fn nullable(name: &'static str, inner: &'static TypeDescriptor) -> Self {
        Self::new(name, TypeKind::Nullable(inner))
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, TypeKind::String)
    }

    pub fn timestamp(name: &'static str) -> Self {
        Self::new(name, TypeKind::Timestamp)
    }

    pub fn enumeration(name: &'static str, repr: ScalarKind) -> Self {
        Self::new(name, TypeKind::Enum(repr))
    }

    pub fn composite(
        name: &'static str,
        ownership: Ownership,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self::new(name, TypeKind::Composite { ownership, fields })
    }

    pub fn sequence(
        name: &'static str,
        shape: SequenceShape,
        element: Option<&'static TypeDescriptor>,
    ) -> Self {
        Self::new(name, TypeKind::Sequence { shape, element })
    }

    pub fn interface(name: &'static str) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn any(name: &'static str) -> Self {
        Self::new(name, TypeKind::Any)
    }

    pub fn opaque(name: &'static str) -> Self {
        Self::new(name, TypeKind::Opaque)
    }

    /// The fully qualified name used for the envelope tag and diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Fields of a composite, in layout order. Empty for every other kind.
    pub fn fields(&self) -> &[FieldDescriptor] {
        match &self.kind {
            TypeKind::Composite { fields, .. } => fields,
            _ => &[],
        }
    }

    /// The envelope tag of this type, computed on first use.
    pub fn tag(&self) -> TypeTag {
        *self.tag.get_or_init(|| TypeTag::for_name(self.name))
    }

    /// Leaks the descriptor so it can be shared as `&'static`.
    ///
    /// Hand-built descriptors are meant to live for the whole process, like registered ones.
    pub fn leak(self) -> &'static TypeDescriptor {
        Box::leak(Box::new(self))
    }
}

/// Trait for types with a positional binary layout.
///
/// The trait replaces runtime reflection with an explicit, per-type contract:
/// - [`describe`](Schema::describe) builds the schema descriptor (field order included)
/// - [`to_value`](Schema::to_value) reads the fields, in that order, into a [`Value`] tree
/// - [`from_value`](Schema::from_value) is the factory that rebuilds the type from a decoded tree
///
/// Most users should use `#[derive(Schema)]` instead of a manual implementation.
pub trait Schema: Sized + 'static {
    /// Builds the descriptor of this type. Called once per type by the registry.
    fn describe() -> TypeDescriptor;

    /// Returns the cached descriptor of this type.
    fn descriptor() -> &'static TypeDescriptor {
        crate::registry::descriptor_of::<Self>()
    }

    /// Projects the value onto the value graph.
    fn to_value(&self) -> Value;

    /// Builds the value from a decoded value graph.
    ///
    /// # Errors
    /// Returns `CodecError::Shape` if the tree does not have the shape of `Self`.
    fn from_value(value: Value) -> Result<Self>;
}
