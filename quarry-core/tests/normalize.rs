use proptest::prelude::*;
use quarry_core::{Filter, Operator, Value};

const OPERATORS: &[Operator] = &[
    Operator::Equal,
    Operator::NotEqual,
    Operator::Greater,
    Operator::LessEqual,
    Operator::Like,
    Operator::Contains,
    Operator::StartsWith,
    Operator::In,
    Operator::NotIn,
    Operator::Between,
    Operator::IsNull,
    Operator::IsBlank,
    Operator::IsNotTrue,
    Operator::IsEmptyNumericId,
    Operator::Box,
    Operator::Polygon,
];

fn arb_operator() -> impl Strategy<Value = Operator> {
    prop::sample::select(OPERATORS)
}

fn arb_text() -> impl Strategy<Value = Value> {
    "[a-z0-9 ,%]{0,12}".prop_map(|v| Value::Varchar(Some(v)))
}

fn arb_values() -> impl Strategy<Value = Vec<Value>> {
    prop_oneof![
        arb_text().prop_map(|v| vec![v]),
        prop::collection::vec(arb_text(), 0..4),
        prop::collection::vec(arb_text(), 0..4)
            .prop_map(|v| vec![Value::List(Some(v), Box::new(Value::Varchar(None)))]),
        Just(vec![Value::Null]),
    ]
}

proptest! {
    #[test]
    fn normalization_is_idempotent(operator in arb_operator(), values in arb_values()) {
        let (once, once_values) = operator.normalize(values);
        let (twice, twice_values) = once.normalize(once_values.clone());
        prop_assert_eq!(once, twice);
        prop_assert_eq!(once_values, twice_values);
    }

    #[test]
    fn zero_value_operators_drop_operands(operator in arb_operator(), values in arb_values()) {
        let filter = Filter::with_values("field", operator, values);
        if operator.is_zero_value() {
            prop_assert!(filter.right.is_empty());
        }
        prop_assert_eq!(filter.clone().normalized(), filter);
    }

    #[test]
    fn comma_lists_never_keep_empty_segments(text in "[a-z ,]{0,16}") {
        let (operator, values) = Operator::In.normalize(vec![Value::Varchar(Some(text.clone()))]);
        prop_assert_eq!(operator, Operator::In);
        if text.contains(',') {
            for value in &values {
                prop_assert!(matches!(value, Value::Varchar(Some(v)) if !v.is_empty() && v.trim() == v));
            }
        }
    }
}
