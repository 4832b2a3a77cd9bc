use std::collections::{BTreeSet, HashSet};

use bytes::{Bytes, BytesMut};
use posgraph::{
    deserialize, serialize, BinarySerializer, CodecError, Limits, Record, Scalar, Schema,
    ShapeError, TypeDescriptor, TypeTag, Value,
};

/// A type with no binary shape, like a complex number from a math library.
#[derive(Debug, PartialEq, Clone, Copy)]
struct Complex {
    re: f64,
    im: f64,
}

impl Schema for Complex {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::opaque("Complex")
    }

    fn to_value(&self) -> Value {
        Value::Sequence(vec![
            Value::Scalar(Scalar::F64(self.re)),
            Value::Scalar(Scalar::F64(self.im)),
        ])
    }

    fn from_value(value: Value) -> posgraph::Result<Self> {
        Err(value.mismatch(Self::descriptor()))
    }
}

#[derive(Schema, Debug)]
struct WithUnsupported {
    int: i32,
    unsupported: Complex,
}

#[derive(Schema, Debug)]
struct WithDynamic {
    items: Vec<Value>,
}

#[derive(Schema, Debug)]
struct WithSet {
    tags: HashSet<u16>,
}

#[derive(Schema, Debug)]
struct Node {
    next: Option<Box<Node>>,
}

fn chain(len: usize) -> Node {
    let mut node = Node { next: None };
    for _ in 1..len {
        node = Node {
            next: Some(Box::new(node)),
        };
    }
    node
}

#[test]
fn test_unsupported_field_fails() {
    let value = WithUnsupported {
        int: 1,
        unsupported: Complex { re: 1.0, im: 2.0 },
    };
    let err = serialize(&value).unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::Unsupported {
            type_name: "Complex"
        })
    ));
}

#[test]
fn test_any_element_type_is_rejected() {
    let value = WithDynamic {
        items: vec![
            Value::Scalar(Scalar::I32(1)),
            Value::String("2".to_string()),
            Value::Null,
        ],
    };
    let err = serialize(&value).unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::UnsupportedElement { .. })
    ));
}

#[test]
fn test_interface_element_type_is_rejected() {
    let shape = TypeDescriptor::interface("dyn Shape").leak();
    let list = TypeDescriptor::sequence(
        "Vec<dyn Shape>",
        posgraph::SequenceShape::List,
        Some(shape),
    );
    let mut sink = BytesMut::new();
    let err = BinarySerializer::new()
        .serialize_value(&Value::Sequence(Vec::new()), &list, &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::UnsupportedElement {
            element: "dyn Shape",
            ..
        })
    ));
}

#[test]
fn test_unordered_collections_have_no_element_type() {
    let value = WithSet {
        tags: [1u16, 2].into_iter().collect(),
    };
    assert!(matches!(
        serialize(&value).unwrap_err(),
        CodecError::Shape(ShapeError::MissingElementType { .. })
    ));
    assert!(matches!(
        serialize(&BTreeSet::from([1u8])).unwrap_err(),
        CodecError::Shape(ShapeError::MissingElementType { .. })
    ));
}

#[test]
fn test_heterogeneous_items_write_nothing() {
    let mixed = Value::Sequence(vec![
        Value::Scalar(Scalar::I32(1)),
        Value::String("2".to_string()),
        Value::Null,
    ]);
    let mut sink = BytesMut::new();
    let err = BinarySerializer::new()
        .serialize_value(&mixed, Vec::<i32>::descriptor(), &mut sink)
        .unwrap_err();
    match err {
        CodecError::Shape(ShapeError::Heterogeneous { index, found, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(found, "string");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Only the tag precedes the failed collection.
    assert_eq!(sink.len(), 16);
}

#[test]
fn test_null_item_requires_reference_element() {
    let items = Value::Sequence(vec![Value::Scalar(Scalar::U8(1)), Value::Null]);
    let mut sink = BytesMut::new();
    let err = BinarySerializer::new()
        .serialize_value(&items, Vec::<u8>::descriptor(), &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::Heterogeneous { index: 1, .. })
    ));
}

#[test]
fn test_wrong_scalar_kind_in_collection() {
    let items = Value::Sequence(vec![Value::Scalar(Scalar::I64(1))]);
    let mut sink = BytesMut::new();
    let err = BinarySerializer::new()
        .serialize_value(&items, Vec::<i32>::descriptor(), &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::Heterogeneous { index: 0, .. })
    ));
}

#[test]
fn test_value_mismatch() {
    let mut sink = BytesMut::new();
    let err = BinarySerializer::new()
        .serialize_value(&Value::String("1".into()), i32::descriptor(), &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::ValueMismatch { expected: "i32", .. })
    ));
}

#[test]
fn test_absent_primitive_field() {
    #[derive(Schema, Debug)]
    struct Pair {
        a: u8,
        b: u8,
    }

    let record = Record::new(
        Pair::descriptor().name(),
        vec![Value::Scalar(Scalar::U8(1)), Value::Null],
    );
    let mut sink = BytesMut::new();
    let err = BinarySerializer::new()
        .serialize_value(&Value::Record(record), Pair::descriptor(), &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::AbsentValue { .. })
    ));
}

#[test]
fn test_depth_limit_on_encode_and_decode() {
    let shallow = BinarySerializer::with_limits(Limits::default().with_max_depth(4));
    assert!(shallow.serialize(&chain(3)).is_ok());
    assert!(matches!(
        shallow.serialize(&chain(5)).unwrap_err(),
        CodecError::DepthLimit { limit: 4 }
    ));

    let mut deep = BinarySerializer::new().serialize(&chain(5)).unwrap();
    assert!(matches!(
        shallow.deserialize::<Node, _>(&mut deep).unwrap_err(),
        CodecError::DepthLimit { limit: 4 }
    ));
}

#[test]
fn test_any_root_is_unsupported() {
    let err = serialize(&Value::Scalar(Scalar::I32(1))).unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::Unsupported { .. })
    ));
}

#[test]
fn test_nested_unsupported_element_writes_nothing() {
    let nested = Value::Sequence(vec![Value::Sequence(vec![Value::Scalar(Scalar::I32(1))])]);
    let mut sink = BytesMut::new();
    let err = BinarySerializer::new()
        .serialize_value(&nested, Vec::<Vec<Value>>::descriptor(), &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::UnsupportedElement { .. })
    ));
    // Only the tag precedes the rejected collection.
    assert_eq!(sink.len(), 16);

    let mut sink = BytesMut::new();
    let err = BinarySerializer::new()
        .serialize_value(
            &Value::Sequence(Vec::new()),
            Vec::<Option<Value>>::descriptor(),
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::UnsupportedElement { .. })
    ));
    assert_eq!(sink.len(), 16);
}

#[test]
fn test_opaque_elements_are_rejected() {
    assert!(matches!(
        serialize(&Vec::<Complex>::new()).unwrap_err(),
        CodecError::Shape(ShapeError::UnsupportedElement {
            element: "Complex",
            ..
        })
    ));
    assert!(matches!(
        serialize(&vec![Complex { re: 1.0, im: 2.0 }]).unwrap_err(),
        CodecError::Shape(ShapeError::UnsupportedElement {
            element: "Complex",
            ..
        })
    ));

    // An empty collection in the stream is not accepted either.
    let mut bytes = TypeTag::of::<Vec<Complex>>().as_bytes().to_vec();
    bytes.extend_from_slice(&[0x01, 0, 0, 0, 0]);
    let err = deserialize::<Vec<Complex>, _>(&mut Bytes::from(bytes)).unwrap_err();
    assert!(matches!(
        err,
        CodecError::Shape(ShapeError::UnsupportedElement { .. })
    ));
}
