//! Row shapes.
//!
//! A grid holds rows of one shape for its whole lifetime:
//!
//! - **Static** rows are structs whose members are known at compile time.
//!   They describe their members through [`Row::member`], usually generated
//!   by `#[derive(GridRow)]`.
//! - **Dynamic** rows are string-keyed maps ([`DynamicRow`]) whose field types
//!   are only known from a declared type or from sampling values.

use std::collections::BTreeMap;

use crate::error::ConversionError;
use crate::types::ValueType;
use crate::value::Value;

/// How a row type exposes its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowShape {
    Static,
    Dynamic,
}

/// A member of a static row type: its declared type and a direct reader.
pub struct Member<R> {
    pub value_type: ValueType,
    pub read: fn(&R) -> Value,
}

impl<R> Member<R> {
    pub fn new(value_type: ValueType, read: fn(&R) -> Value) -> Self {
        Member { value_type, read }
    }
}

impl<R> Clone for Member<R> {
    fn clone(&self) -> Self {
        Member {
            value_type: self.value_type.clone(),
            read: self.read,
        }
    }
}

impl<R> std::fmt::Debug for Member<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

/// Trait for types displayed as grid rows.
///
/// Static rows are typically derived:
///
/// ```ignore
/// use datagrid_macros::GridRow;
///
/// #[derive(GridRow)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
/// ```
///
/// A manual static implementation:
///
/// ```
/// use datagrid::{CellType, Member, Row, RowShape};
///
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// impl Row for Person {
///     const SHAPE: RowShape = RowShape::Static;
///
///     fn member(field: &str) -> Option<Member<Self>> {
///         match field {
///             "name" => Some(Member::new(String::value_type(), |p: &Person| p.name.to_value())),
///             "age" => Some(Member::new(u32::value_type(), |p: &Person| p.age.to_value())),
///             _ => None,
///         }
///     }
/// }
///
/// assert!(Person::member("age").is_some());
/// assert!(Person::member("height").is_none());
/// ```
pub trait Row: Sized + 'static {
    const SHAPE: RowShape;

    /// Looks up a static member by name. Dynamic rows return `None`.
    fn member(field: &str) -> Option<Member<Self>> {
        let _ = field;
        None
    }

    /// Looks up a dynamic entry by key. Static rows return `None`.
    fn entry(&self, field: &str) -> Option<&Value> {
        let _ = field;
        None
    }
}

/// A row as a string-keyed map of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRow {
    entries: BTreeMap<String, Value>,
}

impl DynamicRow {
    pub fn new() -> Self {
        DynamicRow::default()
    }

    /// Builds a row from a JSON object, keeping each member as a raw JSON
    /// element.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ConversionError> {
        let object = json
            .as_object()
            .ok_or_else(|| ConversionError::new(json, "row object"))?;
        Ok(object
            .iter()
            .map(|(key, value)| (key.clone(), Value::Json(value.clone())))
            .collect())
    }

    /// Parses a JSON array of objects into rows.
    pub fn from_json_rows(json: &serde_json::Value) -> Result<Vec<Self>, ConversionError> {
        json.as_array()
            .ok_or_else(|| ConversionError::new(json, "row array"))?
            .iter()
            .map(DynamicRow::from_json)
            .collect()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DynamicRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        DynamicRow {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Row for DynamicRow {
    const SHAPE: RowShape = RowShape::Dynamic;

    fn entry(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellType;

    struct Item {
        name: String,
        count: i32,
    }

    impl Row for Item {
        const SHAPE: RowShape = RowShape::Static;

        fn member(field: &str) -> Option<Member<Self>> {
            match field {
                "name" => Some(Member::new(String::value_type(), |i: &Item| {
                    i.name.to_value()
                })),
                "count" => Some(Member::new(i32::value_type(), |i: &Item| i.count.to_value())),
                _ => None,
            }
        }
    }

    #[test]
    fn static_members() {
        let item = Item {
            name: "test".to_string(),
            count: 42,
        };
        let count = Item::member("count").unwrap();
        assert_eq!(count.value_type, ValueType::I32);
        assert_eq!((count.read)(&item), Value::from(42));
        assert!(Item::member("unknown").is_none());
        assert!(item.entry("name").is_none());
    }

    #[test]
    fn dynamic_entries() {
        let row = DynamicRow::new().with("A", 1).with("B", "x");
        assert_eq!(row.entry("A"), Some(&Value::from(1)));
        assert_eq!(row.entry("C"), None);
        assert!(DynamicRow::member("A").is_none());
        assert_eq!(row.len(), 2);
        let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn from_json_keeps_raw_elements() {
        let row = DynamicRow::from_json(&serde_json::json!({"A": 1, "B": "x"})).unwrap();
        assert_eq!(row.get("A"), Some(&Value::Json(serde_json::json!(1))));
        assert!(DynamicRow::from_json(&serde_json::json!([1])).is_err());

        let rows = DynamicRow::from_json_rows(&serde_json::json!([{"A": 1}, {"A": 2}])).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(DynamicRow::from_json_rows(&serde_json::json!([1])).is_err());
    }

    #[test]
    fn collect_from_pairs() {
        let row: DynamicRow = vec![("A", 1), ("B", 2)].into_iter().collect();
        assert_eq!(row.get("B"), Some(&Value::from(2)));
    }
}
