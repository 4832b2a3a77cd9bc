use std::fmt::Debug;
use std::sync::Arc;

use bytes::Buf;
use posgraph::{deserialize, serialize, Schema};
use rust_decimal::Decimal;

fn roundtrip<T: Schema + PartialEq + Debug>(value: T) {
    let mut bytes = serialize(&value).unwrap();
    let decoded: T = deserialize(&mut bytes).unwrap();
    assert_eq!(value, decoded);
    assert_eq!(bytes.remaining(), 0, "payload must be consumed exactly");
}

#[derive(Schema, Debug, PartialEq, Clone)]
struct TestChildObject {
    decimal: Decimal,
    byte: u8,
}

#[derive(Schema, Debug, PartialEq, Clone, Copy)]
#[posgraph(value)]
struct TestStruct {
    long: i64,
    float: f32,
}

#[derive(Schema, Debug, PartialEq, Clone)]
struct TestClass {
    array: [i32; 5],
    list: Vec<i32>,
    int: i32,
    nullable_int: Option<i32>,
    string: Option<String>,
    double: f64,
    child_obj: Option<TestChildObject>,
    r#struct: TestStruct,
    test_class_obj: Option<Box<TestClass>>,
}

#[derive(Schema, Debug, PartialEq)]
struct Tuple(u16, String, bool);

#[derive(Schema, Debug, PartialEq)]
struct Unit;

#[derive(Schema, Debug, PartialEq, Clone, Copy)]
#[repr(i16)]
enum Direction {
    North = -1,
    South = 1,
    East = 300,
}

#[derive(Schema, Debug, PartialEq)]
struct WithEnums {
    direction: Direction,
    directions: Vec<Direction>,
    maybe: Option<Direction>,
}

fn sample_graph() -> TestClass {
    let child = TestChildObject {
        decimal: Decimal::new(1314, 2),
        byte: 15,
    };
    let inner = TestClass {
        array: [1, 2, 3, 4, 5],
        list: vec![6, 7, 8, 9, 10],
        int: 11,
        nullable_int: Some(1234),
        string: Some("Бла-бла длинный текст".to_string()),
        double: 12.0,
        child_obj: Some(child.clone()),
        r#struct: TestStruct {
            long: 16,
            float: 17.0,
        },
        test_class_obj: None,
    };
    TestClass {
        nullable_int: None,
        test_class_obj: Some(Box::new(inner.clone())),
        ..inner
    }
}

#[test]
fn test_roundtrip_integers() {
    roundtrip(0u8);
    roundtrip(i8::MIN);
    roundtrip(i16::MIN);
    roundtrip(u16::MAX);
    roundtrip(i32::MIN);
    roundtrip(u32::MAX);
    roundtrip(i64::MIN);
    roundtrip(u64::MAX);
    roundtrip(i128::MIN);
    roundtrip(u128::MAX);
}

#[test]
fn test_roundtrip_floats_bool_char() {
    roundtrip(f32::MIN_POSITIVE);
    roundtrip(-0.1f64);
    roundtrip(f64::INFINITY);
    roundtrip(true);
    roundtrip(false);
    roundtrip('\u{10FFFF}');
}

#[test]
fn test_roundtrip_decimals() {
    roundtrip(Decimal::new(-1314, 2));
    roundtrip(Decimal::new(42, 0));
    roundtrip(Decimal::MAX);
    roundtrip(Decimal::MIN);
    roundtrip(Decimal::from_i128_with_scale(1, 28));
}

#[test]
fn test_decimal_scale_is_preserved() {
    let value = Decimal::new(1500, 3);
    let mut bytes = serialize(&value).unwrap();
    let decoded: Decimal = deserialize(&mut bytes).unwrap();
    assert_eq!(decoded.scale(), 3);
    assert_eq!(decoded.serialize(), value.serialize());
}

#[test]
fn test_roundtrip_strings() {
    roundtrip(String::new());
    roundtrip("abc".to_string());
    roundtrip("Бла-бла длинный текст 🦀".to_string());
}

#[test]
fn test_roundtrip_nullable() {
    roundtrip(Some(5i64));
    roundtrip(Some(String::new()));
    roundtrip(Some(vec![1u8, 2]));
    roundtrip(Some(Direction::East));
}

#[test]
fn test_roundtrip_sample_graph() {
    roundtrip(sample_graph());
}

#[test]
fn test_roundtrip_tuple_and_unit() {
    roundtrip(Tuple(7, "seven".to_string(), true));
    roundtrip(Unit);
    assert_eq!(serialize(&Unit).unwrap().len(), 16);
}

#[test]
fn test_roundtrip_enums() {
    roundtrip(WithEnums {
        direction: Direction::North,
        directions: vec![Direction::South, Direction::East, Direction::North],
        maybe: None,
    });
    roundtrip(WithEnums {
        direction: Direction::East,
        directions: Vec::new(),
        maybe: Some(Direction::South),
    });
}

#[test]
fn test_array_and_list_fidelity() {
    roundtrip([3u32, 1, 2]);
    roundtrip(vec![3u32, 1, 2]);
    roundtrip(vec![String::from("b"), String::from("a")]);
    roundtrip(vec![Some("x".to_string()), None, Some(String::new())]);

    let boxed: Box<[i16]> = vec![5, -5].into_boxed_slice();
    roundtrip(boxed);
}

#[test]
fn test_arrays_with_null_composite_elements() {
    let child = TestChildObject {
        decimal: Decimal::new(-5, 1),
        byte: 1,
    };
    roundtrip(vec![None, Some(child.clone()), None]);
    roundtrip([Some(child), None]);
}

#[test]
fn test_roundtrip_struct_elements() {
    roundtrip(vec![
        TestStruct {
            long: -1,
            float: 0.5,
        },
        TestStruct {
            long: i64::MAX,
            float: -2.0,
        },
    ]);
}

#[test]
fn test_roundtrip_shared_pointers() {
    roundtrip(Arc::new(TestChildObject {
        decimal: Decimal::ONE,
        byte: 2,
    }));
    roundtrip(Box::new(42u32));
}

#[cfg(feature = "chrono")]
#[test]
fn test_roundtrip_timestamps() {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    #[derive(Schema, Debug, PartialEq)]
    struct Event {
        at: DateTime<Utc>,
        local: NaiveDateTime,
        history: Vec<DateTime<Utc>>,
        maybe: Option<DateTime<Utc>>,
    }

    let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 123_456_700).unwrap();
    let local = NaiveDate::from_ymd_opt(1999, 12, 31)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();
    roundtrip(Event {
        at,
        local,
        history: vec![at, DateTime::<Utc>::from_timestamp(-1, 0).unwrap()],
        maybe: Some(at),
    });
    roundtrip(NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap());
}

#[cfg(feature = "smol_str")]
#[test]
fn test_roundtrip_smol_str() {
    roundtrip(smol_str::SmolStr::new("compact"));
}
