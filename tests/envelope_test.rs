use bytes::{Buf, BytesMut};
use posgraph::{
    deserialize, serialize, serialize_into, BinarySerializer, CodecError, IoSink, IoSource,
    Schema, TypeTag,
};

#[derive(Schema, Debug, PartialEq)]
struct Order {
    id: u32,
    note: String,
}

#[derive(Schema, Debug, PartialEq)]
struct Invoice {
    id: u32,
    note: String,
}

#[derive(Schema, Debug, PartialEq)]
#[posgraph(type_name = "shop.Receipt")]
struct ReceiptV1 {
    id: u32,
}

#[derive(Schema, Debug, PartialEq)]
#[posgraph(type_name = "shop.Receipt")]
struct ReceiptV2 {
    number: u32,
}

#[test]
fn test_tag_is_derived_from_type_name() {
    assert_eq!(
        TypeTag::of::<Order>(),
        TypeTag::for_name(std::any::type_name::<Order>())
    );
    assert_eq!(TypeTag::of::<ReceiptV1>(), TypeTag::for_name("shop.Receipt"));
    assert_ne!(TypeTag::of::<Order>(), TypeTag::of::<Invoice>());
}

#[test]
fn test_mismatch_is_detected_before_payload() {
    let order = Order {
        id: 1,
        note: "one".to_string(),
    };
    let mut bytes = serialize(&order).unwrap();
    let total = bytes.len();

    let err = deserialize::<Invoice, _>(&mut bytes).unwrap_err();
    match &err {
        CodecError::TypeMismatch {
            expected, actual, ..
        } => {
            assert_eq!(*expected, TypeTag::of::<Invoice>());
            assert_eq!(*actual, TypeTag::of::<Order>());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Only the tag was consumed.
    assert_eq!(bytes.remaining(), total - 16);

    let message = err.to_string();
    assert!(message.contains(&TypeTag::of::<Invoice>().to_string()));
    assert!(message.contains(&TypeTag::of::<Order>().to_string()));
}

#[test]
fn test_primitive_mismatch() {
    let mut bytes = serialize(&1u32).unwrap();
    assert!(matches!(
        deserialize::<i32, _>(&mut bytes).unwrap_err(),
        CodecError::TypeMismatch { .. }
    ));
}

#[test]
fn test_shared_type_name_is_not_detected() {
    // The tag identifies the name only, not the layout.
    let mut bytes = serialize(&ReceiptV1 { id: 9 }).unwrap();
    let decoded: ReceiptV2 = deserialize(&mut bytes).unwrap();
    assert_eq!(decoded, ReceiptV2 { number: 9 });
}

#[test]
fn test_consecutive_envelopes_in_one_sink() {
    let mut sink = BytesMut::new();
    serialize_into(&Order { id: 1, note: "a".into() }, &mut sink).unwrap();
    serialize_into(&42u64, &mut sink).unwrap();
    serialize_into(&vec![true, false], &mut sink).unwrap();

    let mut source = sink.freeze();
    assert_eq!(
        deserialize::<Order, _>(&mut source).unwrap(),
        Order { id: 1, note: "a".into() }
    );
    assert_eq!(deserialize::<u64, _>(&mut source).unwrap(), 42);
    assert_eq!(
        deserialize::<Vec<bool>, _>(&mut source).unwrap(),
        vec![true, false]
    );
    assert!(!source.has_remaining());
}

#[test]
fn test_std_io_streams() {
    let value = Invoice {
        id: 77,
        note: "через поток".to_string(),
    };
    let mut sink = IoSink::new(Vec::new());
    BinarySerializer::new().serialize_into(&value, &mut sink).unwrap();
    let written = sink.into_inner();
    assert_eq!(written, serialize(&value).unwrap().to_vec());

    let mut source = IoSource::new(std::io::Cursor::new(written));
    let decoded: Invoice = deserialize(&mut source).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_fixed_slice_sink() {
    let mut storage = [0u8; 20];
    let mut sink: &mut [u8] = &mut storage;
    serialize_into(&0x0403_0201u32, &mut sink).unwrap();
    assert_eq!(&storage[16..], &[1, 2, 3, 4]);

    let mut too_small = [0u8; 18];
    let mut sink: &mut [u8] = &mut too_small;
    assert!(matches!(
        serialize_into(&0u32, &mut sink).unwrap_err(),
        CodecError::Io(_)
    ));
}

#[test]
fn test_value_graph_api() {
    let serializer = BinarySerializer::new();
    let order = Order {
        id: 5,
        note: "five".into(),
    };
    let mut sink = BytesMut::new();
    serializer
        .serialize_value(&order.to_value(), Order::descriptor(), &mut sink)
        .unwrap();
    assert_eq!(&sink[..], &serialize(&order).unwrap()[..]);

    let mut source = sink.freeze();
    let value = serializer
        .deserialize_value(Order::descriptor(), &mut source)
        .unwrap();
    assert_eq!(value, order.to_value());
    assert_eq!(Order::from_value(value).unwrap(), order);
}
