use ngl_core::{Object, Value, clone_value, equals, strict_equals};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i32..1000).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
        (0u32..10_000).prop_map(|ms| Value::Date(f64::from(ms))),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::vec(("[a-z$]{1,4}", inner), 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

fn is_composite(v: &Value) -> bool {
    matches!(v, Value::Array(_) | Value::Object(_))
}

proptest! {
    #[test]
    fn equals_is_reflexive(v in value()) {
        prop_assert!(equals(&v, &v));
    }

    #[test]
    fn clone_is_structurally_equal(v in value()) {
        let copy = clone_value(&v);
        prop_assert!(equals(&v, &copy));
        prop_assert!(equals(&copy, &v));
        if is_composite(&v) {
            prop_assert!(!v.same_reference(&copy));
        } else {
            prop_assert!(strict_equals(&v, &copy));
        }
    }

    #[test]
    fn equals_is_symmetric(a in value(), b in value()) {
        prop_assert_eq!(equals(&a, &b), equals(&b, &a));
    }

    #[test]
    fn scalar_equality_is_value_equality(a in leaf(), b in leaf()) {
        prop_assert_eq!(equals(&a, &b), strict_equals(&a, &b));
    }
}

#[test]
fn extra_significant_key_is_detected_both_ways() {
    let ab: Object = [("a", 1), ("b", 2)].into_iter().collect();
    let a: Object = [("a", 1)].into_iter().collect();
    assert!(!equals(&Value::from(ab.clone()), &Value::from(a.clone())));
    assert!(!equals(&Value::from(a), &Value::from(ab)));
}

#[test]
fn reserved_prefix_is_ignored() {
    let left: Object = [("a", 1), ("$x", 9)].into_iter().collect();
    let right: Object = [("a", 1)].into_iter().collect();
    assert!(equals(&Value::from(left), &Value::from(right)));
}

#[test]
fn clone_detaches_nested_storage() {
    let person = Object::new().with("age", 20);
    let original = Value::from(Object::new().with("person", person.clone()));
    let snapshot = clone_value(&original);

    person.insert("age", 21);
    assert!(!equals(&original, &snapshot));
}
