//! Property-based tests for datagrid using proptest.

mod common;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use common::{Event, RecordingHost};
use datagrid::{
    compile_group_key, compile_sort_key, group_rows, sort_rows, Column, ColumnSpec, DynamicRow,
    FieldSpec, Filter, FilterChange, Number, SortDefinition, SortDirection, TypeClassifier, Value,
    ValueType,
};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
    ]
}

/// Numbers clustered around 2^53, where `f64` stops holding every integer.
fn wide_number_strategy() -> impl Strategy<Value = Value> {
    const BIG: i64 = 1 << 53;
    prop_oneof![
        (BIG - 4..BIG + 4).prop_map(Value::from),
        (BIG - 4..BIG + 4).prop_map(|n| Value::from(n as f64)),
        (BIG as u64 - 4..BIG as u64 + 4).prop_map(Value::from),
        (-BIG - 4..-BIG + 4).prop_map(|n| Value::from(n as f64 + 0.5)),
        Just(Value::from(-0.0f64)),
        Just(Value::from(0i64)),
    ]
}

fn hash_of(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn rows_from(values: &[Option<i64>]) -> Vec<DynamicRow> {
    values
        .iter()
        .map(|v| DynamicRow::new().with("A", *v))
        .collect()
}

fn json_rows_from(values: &[Option<i32>]) -> Vec<DynamicRow> {
    values
        .iter()
        .map(|v| DynamicRow::from_json(&serde_json::json!({ "A": v })).unwrap())
        .collect()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// The value order is total and agrees with equality and hashing.
    #[test]
    fn value_order_is_consistent(a in value_strategy(), b in value_strategy()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a == b, a.cmp(&b) == std::cmp::Ordering::Equal);
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    /// Equality and order stay transitive where integers exceed `f64` precision.
    #[test]
    fn number_order_is_transitive(
        a in wide_number_strategy(),
        b in wide_number_strategy(),
        c in wide_number_strategy(),
    ) {
        if a <= b && b <= c {
            prop_assert!(a <= c);
        }
        if a == b && b == c {
            prop_assert_eq!(&a, &c);
        }
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    /// Null sorts after every other value.
    #[test]
    fn null_sorts_last(a in value_strategy()) {
        prop_assert!(a <= Value::Null);
    }

    /// Sorting keeps every row and orders them by key.
    #[test]
    fn sort_orders_by_key(values in prop::collection::vec(prop::option::of(-1000i64..1000), 0..50)) {
        let rows = rows_from(&values);
        let spec = FieldSpec::typed("A", ValueType::optional(ValueType::I64));
        let key = compile_sort_key(&spec, &rows, &TypeClassifier::default()).unwrap();

        let sorted = sort_rows(&rows, &[SortDefinition::new(key.clone(), SortDirection::Ascending)]).unwrap();
        prop_assert_eq!(sorted.len(), rows.len());
        let keys: Vec<Value> = sorted.iter().map(|r| key.call(r).unwrap()).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] <= w[1]));

        let descending = sort_rows(&rows, &[SortDefinition::new(key.clone(), SortDirection::Descending)]).unwrap();
        let keys: Vec<Value> = descending.iter().map(|r| key.call(r).unwrap()).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] >= w[1]));
    }

    /// JSON numbers sort by numeric value, whatever their text.
    #[test]
    fn json_numbers_sort_as_floats(values in prop::collection::vec(prop::option::of(any::<i32>()), 1..30)) {
        let rows = json_rows_from(&values);
        let spec = FieldSpec::typed("A", ValueType::I32);
        let key = compile_sort_key(&spec, &rows, &TypeClassifier::default()).unwrap();

        for (row, expected) in rows.iter().zip(&values) {
            let expected = match expected {
                Some(n) => Value::Number(Number::F64(f64::from(*n))),
                None => Value::Null,
            };
            prop_assert_eq!(key.call(row).unwrap(), expected);
        }
    }

    /// Groups partition the rows and rows share a group iff their keys are equal.
    #[test]
    fn grouping_partitions_rows(values in prop::collection::vec(prop::option::of(0i64..5), 0..40)) {
        let rows = rows_from(&values);
        let key = compile_group_key::<DynamicRow>(&FieldSpec::typed("A", ValueType::I64)).unwrap();
        let groups = group_rows(&rows, &key);

        let total: usize = groups.iter().map(|(_, members)| members.len()).sum();
        prop_assert_eq!(total, rows.len());

        for (i, (group_key, members)) in groups.iter().enumerate() {
            for row in members {
                prop_assert_eq!(&key.call(row), group_key);
            }
            for (other_key, _) in &groups[i + 1..] {
                prop_assert_ne!(group_key, other_key);
            }
        }
    }

    /// Resolving the sort key repeatedly yields the same function.
    #[test]
    fn sort_key_resolution_is_memoized(calls in 1usize..10) {
        let host = RecordingHost::new(rows_from(&[Some(1), None]));
        let column: Column<DynamicRow> = Column::new(ColumnSpec::new("A").declared_type(ValueType::I64));
        let first = column.resolve_sort_key_fn(&host).unwrap().unwrap();
        for _ in 0..calls {
            let again = column.resolve_sort_key_fn(&host).unwrap().unwrap();
            prop_assert!(first.ptr_eq(&again));
        }
    }

    /// Re-assigning an equal value never propagates.
    #[test]
    fn equal_values_propagate_once(n in any::<i32>(), repeats in 1usize..5) {
        let host = RecordingHost::new(Vec::<DynamicRow>::new());
        let mut filter: Filter<DynamicRow> = Filter::new("A").with_declared_type(ValueType::I32);
        for _ in 0..repeats {
            filter.set_value(n, &host).unwrap();
        }
        let changes = host
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::FilterChanged(_, FilterChange::Value(_))))
            .count();
        prop_assert_eq!(changes, 1);
        prop_assert_eq!(filter.shadow().as_number, Some(f64::from(n)));
    }
}
