//! Builds a small object graph, serializes it and reads it back.
//!
//! Run with `RUST_LOG=trace cargo run --example demo` to see every field being written.

use chrono::{DateTime, Utc};
use posgraph::{deserialize, inspect, serialize, CodecError, Schema, Value};
use rust_decimal::Decimal;

#[derive(Schema, Debug, Clone, PartialEq)]
struct TestChildObject {
    decimal: Decimal,
    byte: u8,
}

#[derive(Schema, Debug, Clone, Copy, PartialEq)]
#[posgraph(value)]
struct TestStruct {
    long: i64,
    float: f32,
}

#[derive(Schema, Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
enum Priority {
    Low,
    High,
}

#[derive(Schema, Debug, Clone, PartialEq)]
struct TestClass {
    array: [i32; 5],
    list: Vec<i32>,
    int: i32,
    nullable_int: Option<i32>,
    string: String,
    double: f64,
    created: DateTime<Utc>,
    priority: Priority,
    child_obj: Option<TestChildObject>,
    r#struct: TestStruct,
    test_class_obj: Option<Box<TestClass>>,
}

/// The same shape with a collection of erased values, which has no single element shape.
#[derive(Schema, Debug)]
struct WithDynamic {
    int: i32,
    enumerable: Vec<Value>,
}

fn sample(nullable_int: Option<i32>, nested: Option<TestClass>) -> TestClass {
    TestClass {
        array: [1, 2, 3, 4, 5],
        list: vec![6, 7, 8, 9, 10],
        int: 11,
        nullable_int,
        string: "Бла-бла длинный текст".to_string(),
        double: 12.0,
        created: DateTime::from_timestamp(1_262_304_000, 0).unwrap_or_default(),
        priority: Priority::High,
        child_obj: Some(TestChildObject {
            decimal: Decimal::new(1314, 2),
            byte: 15,
        }),
        r#struct: TestStruct {
            long: 16,
            float: 17.0,
        },
        test_class_obj: nested.map(Box::new),
    }
}

fn main() -> Result<(), CodecError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data = sample(None, Some(sample(Some(1234), None)));

    let bytes = serialize(&data)?;
    println!("Serialized size: {} bytes", bytes.len());
    println!();
    print!("{}", inspect::dump(TestClass::descriptor(), &bytes)?);
    println!();

    let mut reader = bytes;
    let deserialized: TestClass = deserialize(&mut reader)?;
    println!("Round trip equal: {}", deserialized == data);

    let dynamic = WithDynamic {
        int: 11,
        enumerable: vec![
            Value::from(posgraph::Scalar::I32(1)),
            Value::String("2".to_string()),
            Value::Null,
        ],
    };
    match serialize(&dynamic) {
        Ok(_) => println!("Unexpectedly serialized a dynamic collection"),
        Err(err) => println!("Dynamic collection rejected: {}", err),
    }
    Ok(())
}
