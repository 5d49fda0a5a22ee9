//! Accessor compilation.
//!
//! Columns are configured by field name at runtime, so the functions that
//! read, sort and group rows are built once per column from a [`FieldSpec`]
//! and then called once per row. Building resolves everything that does not
//! depend on the row (member lookup, declared type, the JSON-or-plain storage
//! decision) so the per-row work is a direct read plus at most one
//! conversion.
//!
//! | shape   | reader / group key     | sort key                                        |
//! |---------|------------------------|-------------------------------------------------|
//! | static  | member read            | member read                                     |
//! | dynamic | map lookup by key      | JSON element extraction or `change_type` to the declared type |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ConversionError, GridError, Result};
use crate::row::{Member, Row, RowShape};
use crate::types::{infer_dynamic_value_type, TypeClassifier, ValueType};
use crate::value::{Number, Value};

/// What an accessor is compiled from: a field name and an optional declared
/// type overriding the member's type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: String,
    #[serde(default)]
    pub declared_type: Option<ValueType>,
}

impl FieldSpec {
    pub fn new(field: impl Into<String>) -> Self {
        FieldSpec {
            field: field.into(),
            declared_type: None,
        }
    }

    pub fn typed(field: impl Into<String>, declared_type: ValueType) -> Self {
        FieldSpec {
            field: field.into(),
            declared_type: Some(declared_type),
        }
    }

    /// Returns `true` when no field is bound (computed or grouping-only
    /// columns).
    pub fn is_unbound(&self) -> bool {
        self.field.trim().is_empty()
    }
}

macro_rules! accessor_handle {
    ($(#[$doc:meta])* $name:ident => $out:ty) => {
        $(#[$doc])*
        pub struct $name<R>(Arc<dyn Fn(&R) -> $out + Send + Sync>);

        impl<R> $name<R> {
            /// Returns `true` if both handles share the same compiled function.
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl<R> Clone for $name<R> {
            fn clone(&self) -> Self {
                $name(Arc::clone(&self.0))
            }
        }

        impl<R> fmt::Debug for $name<R> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:p})", stringify!($name), Arc::as_ptr(&self.0))
            }
        }
    };
}

accessor_handle!(
    /// Compiled row -> value reader.
    ReadFn => Value
);

accessor_handle!(
    /// Compiled row -> group identity. Rows with equal keys share a group.
    GroupKeyFn => Value
);

accessor_handle!(
    /// Compiled row -> sort key. Conversion failures surface per row.
    SortKeyFn => Result<Value>
);

impl<R> ReadFn<R> {
    pub fn new(f: impl Fn(&R) -> Value + Send + Sync + 'static) -> Self {
        ReadFn(Arc::new(f))
    }

    pub fn call(&self, row: &R) -> Value {
        (self.0)(row)
    }
}

impl<R> GroupKeyFn<R> {
    pub fn new(f: impl Fn(&R) -> Value + Send + Sync + 'static) -> Self {
        GroupKeyFn(Arc::new(f))
    }

    pub fn call(&self, row: &R) -> Value {
        (self.0)(row)
    }
}

impl<R> SortKeyFn<R> {
    pub fn new(f: impl Fn(&R) -> Value + Send + Sync + 'static) -> Self {
        SortKeyFn(Arc::new(move |row| Ok(f(row))))
    }

    pub fn try_new(f: impl Fn(&R) -> Result<Value> + Send + Sync + 'static) -> Self {
        SortKeyFn(Arc::new(f))
    }

    pub fn call(&self, row: &R) -> Result<Value> {
        (self.0)(row)
    }
}

/// Resolves the value type of `field`: the declared type if any, `Object`
/// for an unbound field, otherwise the static member's type.
pub fn resolve_value_type<R: Row>(field: &str, declared: Option<&ValueType>) -> Result<ValueType> {
    if let Some(declared) = declared {
        return Ok(declared.clone());
    }
    if field.trim().is_empty() {
        return Ok(ValueType::Object);
    }
    match R::SHAPE {
        RowShape::Dynamic => Err(missing_declared_type(field)),
        RowShape::Static => Ok(static_member::<R>(field)?.value_type),
    }
}

fn missing_declared_type(field: &str) -> GridError {
    ConfigurationError::MissingDeclaredType {
        field: field.to_string(),
    }
    .into()
}

fn static_member<R: Row>(field: &str) -> Result<Member<R>> {
    R::member(field).ok_or_else(|| {
        ConfigurationError::UnknownMember {
            field: field.to_string(),
            row_type: std::any::type_name::<R>(),
        }
        .into()
    })
}

fn declared_type(spec: &FieldSpec) -> Result<&ValueType> {
    spec.declared_type
        .as_ref()
        .ok_or_else(|| missing_declared_type(&spec.field))
}

/// Reads a dynamic entry; missing keys and JSON `null` read as `Null`.
fn read_entry<R: Row>(row: &R, field: &str) -> Value {
    match row.entry(field) {
        Some(value) if !value.is_null() => value.clone(),
        _ => Value::Null,
    }
}

/// Compiles a reader for `spec`.
///
/// Dynamic rows require a declared type; a missing key reads as `Null`.
pub fn compile_reader<R: Row>(spec: &FieldSpec) -> Result<ReadFn<R>> {
    match R::SHAPE {
        RowShape::Static => {
            let read = static_member::<R>(&spec.field)?.read;
            debug!("compiled static reader for '{}'", spec.field);
            Ok(ReadFn::new(read))
        }
        RowShape::Dynamic => {
            declared_type(spec)?;
            let field = spec.field.clone();
            debug!("compiled dynamic reader for '{}'", field);
            Ok(ReadFn::new(move |row: &R| read_entry(row, &field)))
        }
    }
}

/// Compiles a group-key function for `spec`.
///
/// The key is the stored value itself; dynamic rows require a declared type.
pub fn compile_group_key<R: Row>(spec: &FieldSpec) -> Result<GroupKeyFn<R>> {
    match R::SHAPE {
        RowShape::Static => {
            let read = static_member::<R>(&spec.field)?.read;
            debug!("compiled static group key for '{}'", spec.field);
            Ok(GroupKeyFn::new(read))
        }
        RowShape::Dynamic => {
            declared_type(spec)?;
            let field = spec.field.clone();
            debug!("compiled dynamic group key for '{}'", field);
            Ok(GroupKeyFn::new(move |row: &R| read_entry(row, &field)))
        }
    }
}

/// Compiles a sort-key function for `spec`.
///
/// For dynamic rows `items` is sampled once, now, to decide how values are
/// stored. When they are raw JSON elements the key is extracted according to
/// the declared type: the string for `string`, an `f64` for numeric types and
/// the raw JSON text otherwise. Plain values are converted to the declared
/// type with [`Value::change_type`].
pub fn compile_sort_key<R: Row>(
    spec: &FieldSpec,
    items: &[R],
    classifier: &TypeClassifier,
) -> Result<SortKeyFn<R>> {
    match R::SHAPE {
        RowShape::Static => {
            let read = static_member::<R>(&spec.field)?.read;
            debug!("compiled static sort key for '{}'", spec.field);
            Ok(SortKeyFn::new(read))
        }
        RowShape::Dynamic => {
            let declared = declared_type(spec)?.clone();
            let field = spec.field.clone();
            let stored = infer_dynamic_value_type(items, &field);

            if stored == ValueType::Json {
                let extract = JsonKey::for_type(&declared, classifier);
                debug!(
                    "compiled dynamic sort key for '{}' over JSON elements ({:?})",
                    field, extract
                );
                Ok(SortKeyFn::try_new(move |row: &R| {
                    match row.entry(&field) {
                        None => Ok(Value::Null),
                        Some(Value::Json(json)) => extract.apply(json),
                        Some(other) => Ok(other.change_type(&declared)?),
                    }
                }))
            } else {
                debug!(
                    "compiled dynamic sort key for '{}' converting {} to {}",
                    field, stored, declared
                );
                Ok(SortKeyFn::try_new(move |row: &R| match row.entry(&field) {
                    None => Ok(Value::Null),
                    Some(value) => Ok(value.change_type(&declared)?),
                }))
            }
        }
    }
}

/// How a sort key is pulled out of a raw JSON element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonKey {
    String,
    Number,
    RawText,
}

impl JsonKey {
    fn for_type(declared: &ValueType, classifier: &TypeClassifier) -> Self {
        if *declared.strip_optional() == ValueType::String {
            JsonKey::String
        } else if classifier.is_numeric(declared) {
            JsonKey::Number
        } else {
            JsonKey::RawText
        }
    }

    fn apply(self, json: &serde_json::Value) -> Result<Value> {
        if json.is_null() {
            return Ok(Value::Null);
        }
        match self {
            JsonKey::String => json
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| ConversionError::new(json, "string").into()),
            JsonKey::Number => json
                .as_f64()
                .map(|n| Value::Number(Number::F64(n)))
                .ok_or_else(|| ConversionError::new(json, "f64").into()),
            JsonKey::RawText => Ok(Value::String(json.to_string())),
        }
    }
}

/// Partitions `rows` by group key. Groups appear in first-seen order and keep
/// the rows' relative order.
pub fn group_rows<'a, R>(rows: &'a [R], key: &GroupKeyFn<R>) -> Vec<(Value, Vec<&'a R>)> {
    let mut index: HashMap<Value, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<&'a R>)> = Vec::new();

    for row in rows {
        let value = key.call(row);
        match index.get(&value) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(value.clone(), groups.len());
                groups.push((value, vec![row]));
            }
        }
    }
    groups
}
