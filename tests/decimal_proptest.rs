use posgraph::primitive::{decimal_from_words, decimal_to_words};
use posgraph::{deserialize, serialize, Schema};
use proptest::{
    arbitrary::Arbitrary,
    prelude::{any, prop_assert_eq},
    proptest,
    strategy::{BoxedStrategy, Strategy},
};
use rust_decimal::Decimal;

#[derive(Schema, Debug, Clone, PartialEq)]
struct Ledger {
    owner: String,
    amounts: Vec<Decimal>,
    note: Option<String>,
}

/// A decimal built from an arbitrary 96-bit magnitude, sign and scale.
#[derive(Debug, Clone)]
struct AnyDecimal(Decimal);

impl Arbitrary for AnyDecimal {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
        (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28)
            .prop_map(|(lo, mid, hi, negative, scale)| {
                Self(Decimal::from_parts(lo, mid, hi, negative, scale))
            })
            .boxed()
    }
}

impl Arbitrary for Ledger {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
        (
            any::<String>(),
            proptest::collection::vec(any::<AnyDecimal>().prop_map(|d| d.0), 0..=8),
            proptest::option::of(any::<String>()),
        )
            .prop_map(|(owner, amounts, note)| Self {
                owner,
                amounts,
                note,
            })
            .boxed()
    }
}

proptest! {
    #[test]
    fn decimal_words_are_bit_exact(value in any::<AnyDecimal>()) {
        let words = decimal_to_words(&value.0);
        let decoded = decimal_from_words(words).unwrap();
        prop_assert_eq!(decoded.serialize(), value.0.serialize());
        prop_assert_eq!(decoded.scale(), value.0.scale());
    }

    #[test]
    fn decimal_envelope_round_trip(value in any::<AnyDecimal>()) {
        let mut bytes = serialize(&value.0).unwrap();
        let decoded: Decimal = deserialize(&mut bytes).unwrap();
        prop_assert_eq!(decoded.serialize(), value.0.serialize());
    }

    #[test]
    fn string_round_trip(value in any::<String>()) {
        let mut bytes = serialize(&value).unwrap();
        prop_assert_eq!(bytes.len(), 16 + 1 + 4 + value.len());
        let decoded: String = deserialize(&mut bytes).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn ledger_round_trip(value in any::<Ledger>()) {
        let mut bytes = serialize(&value).unwrap();
        let decoded: Ledger = deserialize(&mut bytes).unwrap();
        prop_assert_eq!(decoded, value);
    }
}
