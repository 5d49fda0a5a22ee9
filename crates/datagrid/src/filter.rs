//! Filter descriptors.
//!
//! A [`Filter`] holds one active filter: the field it applies to, the
//! operator and the value the user entered. The value is type-erased
//! ([`Value`]); alongside it the filter keeps a [`FilterShadow`], the value
//! projected into the representation its field's [`DataCategory`] edits and
//! compares with.
//!
//! | category    | shadow slot           | external value      |
//! |-------------|-----------------------|---------------------|
//! | string      | `as_string`           | string or null      |
//! | numeric     | `as_number`           | `f64` or null       |
//! | enumerated  | `as_enum`             | enum value or null  |
//! | boolean     | `as_bool`             | bool or null        |
//! | date        | `as_date` + `as_time` | date-time or null   |
//! | time of day | `as_time`             | time or null        |
//! | other       | none                  | passthrough         |

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use log::{debug, trace};

use crate::accessor::{compile_sort_key, resolve_value_type, FieldSpec, SortKeyFn};
use crate::error::Result;
use crate::host::{FilterId, GridHost};
use crate::op::Op;
use crate::row::Row;
use crate::types::{DataCategory, TypeClassifier, ValueType};
use crate::value::{EnumValue, Number, Value};

/// A filter property change propagated to the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChange {
    Field(String),
    Value(Value),
    Operator(Option<Op>),
}

/// The filter value projected per data category.
///
/// Only the slot(s) of the field's current category are populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterShadow {
    pub as_string: Option<String>,
    pub as_number: Option<f64>,
    pub as_enum: Option<EnumValue>,
    pub as_bool: Option<bool>,
    pub as_date: Option<NaiveDate>,
    pub as_time: Option<NaiveTime>,
}

impl FilterShadow {
    /// Projects `value` for `category`.
    ///
    /// A null value yields an empty shadow. Conversion failures propagate.
    pub fn derive(value: &Value, category: DataCategory) -> Result<FilterShadow> {
        let mut shadow = FilterShadow::default();
        if value.is_null() {
            return Ok(shadow);
        }
        match category {
            DataCategory::String => {
                shadow.as_string = value
                    .change_type(&ValueType::String)?
                    .as_str()
                    .map(str::to_string);
            }
            DataCategory::Numeric => shadow.as_number = Some(value.to_f64()?),
            DataCategory::Enumerated => shadow.as_enum = Some(value.to_enum()?),
            DataCategory::Boolean => shadow.as_bool = Some(value.to_bool()?),
            DataCategory::Date => {
                let dt = value.to_date_time()?;
                shadow.as_date = Some(dt.date());
                shadow.as_time = Some(dt.time());
            }
            DataCategory::TimeOfDay => shadow.as_time = Some(value.to_time()?),
            DataCategory::Other => {}
        }
        Ok(shadow)
    }
}

/// Compiled filter test applied by the grid to each row.
pub struct FilterPredicate<R>(Arc<dyn Fn(&R) -> Result<bool> + Send + Sync>);

impl<R> FilterPredicate<R> {
    fn new(f: impl Fn(&R) -> Result<bool> + Send + Sync + 'static) -> Self {
        FilterPredicate(Arc::new(f))
    }

    fn constant(result: bool) -> Self {
        FilterPredicate::new(move |_| Ok(result))
    }

    pub fn matches(&self, row: &R) -> Result<bool> {
        (self.0)(row)
    }

    /// Keeps the rows that match, in order.
    pub fn apply<'a>(&self, rows: &'a [R]) -> Result<Vec<&'a R>> {
        let mut kept = Vec::new();
        for row in rows {
            if self.matches(row)? {
                kept.push(row);
            }
        }
        Ok(kept)
    }
}

impl<R> Clone for FilterPredicate<R> {
    fn clone(&self) -> Self {
        FilterPredicate(Arc::clone(&self.0))
    }
}

impl<R> fmt::Debug for FilterPredicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterPredicate({:p})", Arc::as_ptr(&self.0))
    }
}

/// One active filter of a grid over rows of type `R`.
pub struct Filter<R> {
    id: FilterId,
    field: String,
    declared_type: Option<ValueType>,
    title: Option<String>,
    operator: Option<Op>,
    value: Value,
    shadow: FilterShadow,
    _row: PhantomData<fn() -> R>,
}

impl<R> Clone for Filter<R> {
    fn clone(&self) -> Self {
        Filter {
            id: self.id,
            field: self.field.clone(),
            declared_type: self.declared_type.clone(),
            title: self.title.clone(),
            operator: self.operator,
            value: self.value.clone(),
            shadow: self.shadow.clone(),
            _row: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Filter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("id", &self.id)
            .field("field", &self.field)
            .field("declared_type", &self.declared_type)
            .field("title", &self.title)
            .field("operator", &self.operator)
            .field("value", &self.value)
            .field("shadow", &self.shadow)
            .finish()
    }
}

impl<R: Row> Filter<R> {
    pub fn new(field: impl Into<String>) -> Self {
        Filter {
            id: FilterId::new(),
            field: field.into(),
            declared_type: None,
            title: None,
            operator: None,
            value: Value::Null,
            shadow: FilterShadow::default(),
            _row: PhantomData,
        }
    }

    pub fn with_id(mut self, id: FilterId) -> Self {
        self.id = id;
        self
    }

    pub fn with_declared_type(mut self, declared_type: ValueType) -> Self {
        self.declared_type = Some(declared_type);
        self
    }

    pub fn with_operator(mut self, operator: Op) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn declared_type(&self) -> Option<&ValueType> {
        self.declared_type.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn operator(&self) -> Option<Op> {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn shadow(&self) -> &FilterShadow {
        &self.shadow
    }

    /// The field's type with any optional wrapper removed.
    pub fn data_type(&self) -> Result<ValueType> {
        let ty = resolve_value_type::<R>(&self.field, self.declared_type.as_ref())?;
        Ok(ty.strip_optional().clone())
    }

    pub fn category(&self, classifier: &TypeClassifier) -> Result<DataCategory> {
        Ok(classifier.category(&self.data_type()?))
    }

    fn propagate(&self, host: &dyn GridHost<R>, change: FilterChange) {
        host.filter_changed(self.id, &change);
    }

    /// Moves the filter to another field.
    ///
    /// The value is cleared and propagated first, then the field, then the
    /// operator is reset to the first one the grid offers for the new
    /// field's category.
    pub fn set_field(&mut self, field: impl Into<String>, host: &dyn GridHost<R>) -> Result<()> {
        self.value = Value::Null;
        self.shadow = FilterShadow::default();
        self.propagate(host, FilterChange::Value(Value::Null));

        self.field = field.into();
        self.propagate(host, FilterChange::Field(self.field.clone()));

        let category = self.category(host.classifier())?;
        self.operator = host.operators_for(category).first().copied();
        debug!(
            "filter {} moved to '{}' ({}), operator {:?}",
            self.id, self.field, category, self.operator
        );
        self.propagate(host, FilterChange::Operator(self.operator));
        Ok(())
    }

    /// Like [`Filter::set_field`], also replacing the declared type.
    pub fn set_field_with_type(
        &mut self,
        field: impl Into<String>,
        declared_type: Option<ValueType>,
        host: &dyn GridHost<R>,
    ) -> Result<()> {
        self.declared_type = declared_type;
        self.set_field(field, host)
    }

    /// Assigns the external value and re-derives the shadow from it.
    ///
    /// Assigning an equal value does nothing. If the value cannot be
    /// converted for the field's category the error is returned and the
    /// filter is left unchanged.
    pub fn set_value(&mut self, value: impl Into<Value>, host: &dyn GridHost<R>) -> Result<()> {
        let value = value.into();
        if value == self.value {
            return Ok(());
        }
        let category = self.category(host.classifier())?;
        let shadow = FilterShadow::derive(&value, category)?;
        self.commit(value, shadow, host);
        Ok(())
    }

    /// Replaces value and shadow together and propagates the value.
    fn commit(&mut self, value: Value, shadow: FilterShadow, host: &dyn GridHost<R>) {
        trace!("filter {} value {:?} -> {:?}", self.id, value, shadow);
        self.value = value;
        self.shadow = shadow;
        self.propagate(host, FilterChange::Value(self.value.clone()));
    }

    pub fn set_string_value(&mut self, value: Option<String>, host: &dyn GridHost<R>) {
        let shadow = FilterShadow {
            as_string: value.clone(),
            ..FilterShadow::default()
        };
        self.commit(Value::from(value), shadow, host);
        host.request_repipeline();
    }

    pub fn set_number_value(&mut self, value: Option<f64>, host: &dyn GridHost<R>) {
        let shadow = FilterShadow {
            as_number: value,
            ..FilterShadow::default()
        };
        self.commit(Value::from(value.map(Number::F64)), shadow, host);
        host.request_repipeline();
    }

    pub fn set_enum_value(&mut self, value: Option<EnumValue>, host: &dyn GridHost<R>) {
        let shadow = FilterShadow {
            as_enum: value.clone(),
            ..FilterShadow::default()
        };
        self.commit(Value::from(value), shadow, host);
        host.request_repipeline();
    }

    pub fn set_bool_value(&mut self, value: Option<bool>, host: &dyn GridHost<R>) {
        let shadow = FilterShadow {
            as_bool: value,
            ..FilterShadow::default()
        };
        self.commit(Value::from(value), shadow, host);
        host.request_repipeline();
    }

    /// Sets the date part. The value becomes the date combined with the held
    /// time of day (midnight if none). Clearing the date clears the value
    /// and the held time.
    pub fn set_date_value(&mut self, date: Option<NaiveDate>, host: &dyn GridHost<R>) {
        match date {
            Some(date) => {
                let time = self.shadow.as_time;
                let shadow = FilterShadow {
                    as_date: Some(date),
                    as_time: time,
                    ..FilterShadow::default()
                };
                let value = Value::DateTime(date.and_time(time.unwrap_or(NaiveTime::MIN)));
                self.commit(value, shadow, host);
            }
            None => self.commit(Value::Null, FilterShadow::default(), host),
        }
        host.request_repipeline();
    }

    /// Sets the time of day.
    ///
    /// For a date field the value is recombined only when a date is already
    /// held; otherwise only the time is kept for the next date. For a
    /// time-of-day field the time is the value.
    pub fn set_time_value(&mut self, time: Option<NaiveTime>, host: &dyn GridHost<R>) -> Result<()> {
        let category = self.category(host.classifier())?;
        if category == DataCategory::TimeOfDay {
            let shadow = FilterShadow {
                as_time: time,
                ..FilterShadow::default()
            };
            self.commit(Value::from(time), shadow, host);
        } else {
            let shadow = FilterShadow {
                as_date: self.shadow.as_date,
                as_time: time,
                ..FilterShadow::default()
            };
            match shadow.as_date {
                Some(date) => {
                    let value = Value::DateTime(date.and_time(time.unwrap_or(NaiveTime::MIN)));
                    self.commit(value, shadow, host);
                }
                None => self.shadow = shadow,
            }
        }
        host.request_repipeline();
        Ok(())
    }

    /// Stores the operator. It is not checked against the field's category.
    pub fn set_operator(&mut self, operator: Option<Op>, host: &dyn GridHost<R>) {
        self.operator = operator;
        debug!("filter {} operator {:?}", self.id, operator);
        self.propagate(host, FilterChange::Operator(operator));
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Asks the grid to drop this filter.
    pub fn remove(&self, host: &dyn GridHost<R>) {
        host.filter_removed(self.id);
    }

    /// Compiles the filter into a row test.
    ///
    /// Rows are read through the field's sort-key accessor. Without an
    /// operator, or without a value (except for `is empty` / `is not
    /// empty`), every row matches. String comparisons ignore case. An
    /// operator the grid does not offer for the field's category matches no
    /// row.
    pub fn predicate(&self, host: &dyn GridHost<R>) -> Result<FilterPredicate<R>> {
        let Some(op) = self.operator else {
            return Ok(FilterPredicate::constant(true));
        };
        let category = self.category(host.classifier())?;
        if !host.operators_for(category).contains(&op) {
            debug!("filter {}: '{}' not offered for {}", self.id, op, category);
            return Ok(FilterPredicate::constant(false));
        }

        let spec = FieldSpec {
            field: self.field.clone(),
            declared_type: self.declared_type.clone(),
        };
        let key = compile_sort_key(&spec, host.items(), host.classifier())?;

        match op {
            Op::IsEmpty => return Ok(emptiness(key, true)),
            Op::IsNotEmpty => return Ok(emptiness(key, false)),
            _ => {}
        }
        if self.value.is_null() {
            return Ok(FilterPredicate::constant(true));
        }

        let shadow = self.shadow.clone();
        let test: FilterPredicate<R> = match category {
            DataCategory::String => {
                let needle = shadow.as_string.unwrap_or_default().to_lowercase();
                keyed(key, move |value| {
                    let hay = value.change_type(&ValueType::String)?;
                    let hay = hay.as_str().unwrap_or_default().to_lowercase();
                    Ok(match op {
                        Op::Contains => hay.contains(&needle),
                        Op::NotContains => !hay.contains(&needle),
                        Op::Equals => hay == needle,
                        Op::NotEquals => hay != needle,
                        Op::StartsWith => hay.starts_with(&needle),
                        Op::EndsWith => hay.ends_with(&needle),
                        _ => false,
                    })
                })
            }
            DataCategory::Numeric => {
                let Some(target) = shadow.as_number else {
                    return Ok(FilterPredicate::constant(true));
                };
                keyed(key, move |value| {
                    Ok(op.eval_ordering(value.to_f64()?.total_cmp(&target)))
                })
            }
            DataCategory::Enumerated => {
                let Some(target) = shadow.as_enum else {
                    return Ok(FilterPredicate::constant(true));
                };
                keyed(key, move |value| {
                    let equal = value.as_enum() == Some(&target);
                    Ok(if op == Op::IsNot { !equal } else { equal })
                })
            }
            DataCategory::Boolean => {
                let Some(target) = shadow.as_bool else {
                    return Ok(FilterPredicate::constant(true));
                };
                keyed(key, move |value| Ok(op.eval_ordering(value.to_bool()?.cmp(&target))))
            }
            DataCategory::Date => {
                let Some(date) = shadow.as_date else {
                    return Ok(FilterPredicate::constant(true));
                };
                let target = date.and_time(shadow.as_time.unwrap_or(NaiveTime::MIN));
                keyed(key, move |value| {
                    Ok(op.eval_ordering(value.to_date_time()?.cmp(&target)))
                })
            }
            DataCategory::TimeOfDay => {
                let Some(target) = shadow.as_time else {
                    return Ok(FilterPredicate::constant(true));
                };
                keyed(key, move |value| Ok(op.eval_ordering(value.to_time()?.cmp(&target))))
            }
            DataCategory::Other => FilterPredicate::constant(false),
        };
        Ok(test)
    }
}

/// Null rows never match a comparison.
fn keyed<R: 'static>(
    key: SortKeyFn<R>,
    test: impl Fn(&Value) -> Result<bool> + Send + Sync + 'static,
) -> FilterPredicate<R> {
    FilterPredicate::new(move |row: &R| {
        let value = key.call(row)?;
        if value.is_null() {
            return Ok(false);
        }
        test(&value)
    })
}

fn emptiness<R: 'static>(key: SortKeyFn<R>, want_empty: bool) -> FilterPredicate<R> {
    FilterPredicate::new(move |row: &R| {
        let value = key.call(row)?;
        let empty = value.is_null() || value.as_str().is_some_and(str::is_empty);
        Ok(empty == want_empty)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn shadow_per_category() {
        let shadow = FilterShadow::derive(&Value::from("42"), DataCategory::Numeric).unwrap();
        assert_eq!(shadow.as_number, Some(42.0));
        assert_eq!(shadow.as_string, None);

        let shadow = FilterShadow::derive(&Value::from(7), DataCategory::String).unwrap();
        assert_eq!(shadow.as_string.as_deref(), Some("7"));

        let shadow = FilterShadow::derive(&Value::from("TRUE"), DataCategory::Boolean).unwrap();
        assert_eq!(shadow.as_bool, Some(true));

        let shadow =
            FilterShadow::derive(&Value::from("2024-01-10T14:30:00"), DataCategory::Date).unwrap();
        assert_eq!(shadow.as_date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(shadow.as_time, NaiveTime::from_hms_opt(14, 30, 0));

        let shadow = FilterShadow::derive(&Value::from("09:15"), DataCategory::TimeOfDay).unwrap();
        assert_eq!(shadow.as_time, NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(shadow.as_date, None);
    }

    #[test]
    fn null_yields_empty_shadow() {
        for category in [
            DataCategory::String,
            DataCategory::Numeric,
            DataCategory::Date,
            DataCategory::Other,
        ] {
            assert_eq!(
                FilterShadow::derive(&Value::Null, category).unwrap(),
                FilterShadow::default()
            );
        }
    }

    #[test]
    fn other_category_keeps_no_shadow() {
        let json = Value::Json(serde_json::json!({"a": 1}));
        assert_eq!(
            FilterShadow::derive(&json, DataCategory::Other).unwrap(),
            FilterShadow::default()
        );
    }

    #[test]
    fn conversion_failures_propagate() {
        assert!(FilterShadow::derive(&Value::from("abc"), DataCategory::Numeric)
            .unwrap_err()
            .is_conversion());
        assert!(FilterShadow::derive(&Value::from("yes"), DataCategory::Boolean).is_err());
        assert!(FilterShadow::derive(&Value::from(3), DataCategory::Enumerated).is_err());
        let dt: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(FilterShadow::derive(&Value::from(dt), DataCategory::Date).is_ok());
    }
}
