//! Integration tests for Value types
//!
//! Tests construction, tag-exact equality, numeric ordering, and display.

use std::cmp::Ordering;
use std::collections::HashSet;

use clql_foundation::{ScalarType, Value};
use proptest::prelude::*;

// =============================================================================
// Construction
// =============================================================================

#[test]
fn from_conversions_pick_the_right_tag() {
    assert_eq!(Value::from(true).value_type(), ScalarType::Bool);
    assert_eq!(Value::from(3).value_type(), ScalarType::Int);
    assert_eq!(Value::from(3_i64).value_type(), ScalarType::Int);
    assert_eq!(Value::from(3_u32).value_type(), ScalarType::Int);
    assert_eq!(Value::from(3.5).value_type(), ScalarType::Float);
    assert_eq!(Value::from("x").value_type(), ScalarType::String);
    assert_eq!(Value::from(String::from("x")).value_type(), ScalarType::String);
}

#[test]
fn accessors() {
    assert_eq!(Value::Int(7).as_int(), Some(7));
    assert_eq!(Value::Int(7).as_number(), Some(7.0));
    assert_eq!(Value::Float(1.5).as_float(), Some(1.5));
    assert_eq!(Value::from("go").as_str(), Some("go"));
    assert_eq!(Value::from("go").as_number(), None);
    assert_eq!(Value::Bool(false).as_bool(), Some(false));
}

// =============================================================================
// Equality and Ordering
// =============================================================================

#[test]
fn equality_is_tag_exact() {
    assert_eq!(Value::Int(1), Value::Int(1));
    assert_ne!(Value::Int(1), Value::Float(1.0));
    assert_ne!(Value::from("1"), Value::Int(1));
    assert_ne!(Value::Bool(true), Value::Int(1));
}

#[test]
fn ordering_is_numeric_only() {
    assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
    assert_eq!(Value::Int(2).compare(&Value::Float(1.5)), Some(Ordering::Greater));
    assert_eq!(Value::Float(2.0).compare(&Value::Int(2)), Some(Ordering::Equal));
    assert_eq!(Value::from("a").compare(&Value::from("b")), None);
    assert_eq!(Value::Bool(false).compare(&Value::Bool(true)), None);
    assert_eq!(Value::Float(f64::NAN).compare(&Value::Float(1.0)), None);
}

#[test]
fn hashing_agrees_with_equality() {
    let set: HashSet<Value> = [
        Value::Int(1),
        Value::Int(1),
        Value::Float(1.0),
        Value::from("1"),
    ]
    .into_iter()
    .collect();
    assert_eq!(set.len(), 3);
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn display_is_bare_and_debug_quotes_strings() {
    assert_eq!(Value::from("writeMsg").to_string(), "writeMsg");
    assert_eq!(format!("{:?}", Value::from("writeMsg")), "\"writeMsg\"");
    assert_eq!(Value::Int(-4).to_string(), "-4");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(ScalarType::Float.to_string(), "float");
}

proptest! {
    #[test]
    fn int_ordering_matches_i64(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(Value::Int(a).compare(&Value::Int(b)), Some(a.cmp(&b)));
    }

    #[test]
    fn equal_strings_are_equal_values(s in ".*") {
        prop_assert_eq!(Value::from(s.as_str()), Value::from(s.clone()));
    }
}
