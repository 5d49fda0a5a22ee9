//! Runtime values read from rows and held by filters.
//!
//! [`Value`] is what every compiled accessor returns. It is totally ordered
//! and hashable so that it can serve directly as a sort key and a group key.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ConversionError;
use crate::types::ValueType;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Owned runtime value of a row field or filter input.
///
/// `Json` holds a raw JSON element as stored by dynamic rows loaded from JSON;
/// it is unwrapped on demand by the conversion methods.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    String(String),
    Number(Number),
    Bool(bool),
    Enum(EnumValue),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Raw JSON element.
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` for `Null` and for a JSON `null` element.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Json(serde_json::Value::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }

    /// The type a dynamic row value reports for type inference.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Object,
            Value::String(_) => ValueType::String,
            Value::Number(Number::I64(_)) => ValueType::I64,
            Value::Number(Number::U64(_)) => ValueType::U64,
            Value::Number(Number::F64(_)) => ValueType::F64,
            Value::Bool(_) => ValueType::Bool,
            Value::Enum(e) => ValueType::Enum(e.type_name.clone()),
            Value::DateTime(_) => ValueType::DateTime,
            Value::Time(_) => ValueType::Time,
            Value::Json(_) => ValueType::Json,
        }
    }

    /// Converts a JSON element into the equivalent plain value.
    ///
    /// Scalars become plain values; arrays and objects stay `Json`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Number(Number::U64(u))
                } else {
                    Value::Number(Number::F64(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            other => Value::Json(other.clone()),
        }
    }

    /// Converts this value into a JSON element.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(Number::I64(n)) => serde_json::Value::from(*n),
            Value::Number(Number::U64(n)) => serde_json::Value::from(*n),
            Value::Number(Number::F64(n)) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Json(json) => json.clone(),
            other => serde_json::Value::String(other.to_string()),
        }
    }

    fn unwrap_json(&self) -> Cow<'_, Value> {
        match self {
            Value::Json(json) => Cow::Owned(Value::from_json(json)),
            other => Cow::Borrowed(other),
        }
    }

    /// Converts this value to `target`, the generic conversion used for
    /// plain values stored in dynamic rows.
    ///
    /// `Null` converts to `Null` for every target.
    pub fn change_type(&self, target: &ValueType) -> Result<Value, ConversionError> {
        let target = target.strip_optional();
        let plain = self.unwrap_json();
        let plain = plain.as_ref();

        match (plain, target) {
            (Value::Null, _) => Ok(Value::Null),
            (_, ValueType::Object) => Ok(plain.clone()),
            (_, ValueType::Json) => Ok(Value::Json(self.to_json())),
            (Value::String(_), ValueType::String) => Ok(plain.clone()),
            (Value::Json(json), ValueType::String) => Ok(Value::String(json.to_string())),
            (_, ValueType::String) => Ok(Value::String(plain.to_string())),
            (_, ValueType::Bool) => plain.to_bool().map(Value::Bool),
            (_, ValueType::DateTime) => plain.to_date_time().map(Value::DateTime),
            (_, ValueType::Time) => plain.to_time().map(Value::Time),
            (Value::Enum(e), ValueType::Enum(name)) if e.type_name == *name => Ok(plain.clone()),
            (_, t) if t.is_number_type() => plain.to_number_of(t).map(Value::Number),
            _ => Err(ConversionError::new(plain, target)),
        }
    }

    fn to_number_of(&self, target: &ValueType) -> Result<Number, ConversionError> {
        let fail = || ConversionError::new(self, target);
        let source = match self {
            Value::Number(n) => *n,
            Value::Bool(b) => Number::I64(i64::from(*b)),
            Value::Enum(e) => Number::U64(u64::from(e.discriminant)),
            Value::String(s) => {
                let s = s.trim();
                if target.is_integer_type() {
                    if let Ok(i) = s.parse::<i64>() {
                        Number::I64(i)
                    } else {
                        Number::U64(s.parse::<u64>().map_err(|_| fail())?)
                    }
                } else {
                    Number::F64(s.parse::<f64>().map_err(|_| fail())?)
                }
            }
            _ => return Err(fail()),
        };
        source.convert(target).ok_or_else(fail)
    }

    /// Projects this value to a floating-point number.
    pub fn to_f64(&self) -> Result<f64, ConversionError> {
        match self.unwrap_json().as_ref() {
            Value::Number(n) => Ok(n.to_f64()),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Enum(e) => Ok(f64::from(e.discriminant)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ConversionError::new(self, "f64")),
            _ => Err(ConversionError::new(self, "f64")),
        }
    }

    /// Projects this value to a boolean. Numbers are `true` when non-zero.
    pub fn to_bool(&self) -> Result<bool, ConversionError> {
        match self.unwrap_json().as_ref() {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.to_f64() != 0.0),
            Value::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(ConversionError::new(self, "bool"))
                }
            }
            _ => Err(ConversionError::new(self, "bool")),
        }
    }

    /// Projects this value to a date-time. Bare dates map to midnight.
    pub fn to_date_time(&self) -> Result<NaiveDateTime, ConversionError> {
        match self.unwrap_json().as_ref() {
            Value::DateTime(dt) => Ok(*dt),
            Value::String(s) => parse_date_time(s.trim())
                .ok_or_else(|| ConversionError::new(self, "datetime")),
            _ => Err(ConversionError::new(self, "datetime")),
        }
    }

    /// Projects this value to a time of day.
    pub fn to_time(&self) -> Result<NaiveTime, ConversionError> {
        match self.unwrap_json().as_ref() {
            Value::Time(t) => Ok(*t),
            Value::DateTime(dt) => Ok(dt.time()),
            Value::String(s) => {
                let s = s.trim();
                TIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
                    .ok_or_else(|| ConversionError::new(self, "time"))
            }
            _ => Err(ConversionError::new(self, "time")),
        }
    }

    /// Projects this value to an enumeration value. Only enum values qualify.
    pub fn to_enum(&self) -> Result<EnumValue, ConversionError> {
        match self {
            Value::Enum(e) => Ok(e.clone()),
            _ => Err(ConversionError::new(self, "enum")),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Enum(_) => 3,
            Value::DateTime(_) => 4,
            Value::Time(_) => 5,
            Value::Json(_) => 6,
            Value::Null => 7,
        }
    }
}

fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

impl Ord for Value {
    /// Total order: values of the same kind compare naturally, `Null` sorts
    /// last and mismatched kinds order by kind.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Enum(a), Value::Enum(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Json(a), Value::Json(b)) => a.to_string().cmp(&b.to_string()),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Value::Null => {}
            Value::String(s) => s.hash(state),
            Value::Number(n) => n.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Enum(e) => e.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::Time(t) => t.hash(state),
            Value::Json(json) => json.to_string().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Enum(e) => f.write_str(&e.name),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::Json(serde_json::Value::String(s)) => f.write_str(s),
            Value::Json(json) => write!(f, "{}", json),
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision. Values
/// of different variants compare by numeric value, so `I64(1) == F64(1.0)`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Converts to the representation of a numeric `target` type.
    ///
    /// Integer targets round fractional values half to even and reject values
    /// outside their range. Returns `None` when the value does not fit.
    pub fn convert(self, target: &ValueType) -> Option<Number> {
        let (min, max): (i128, i128) = match target {
            ValueType::I8 => (i8::MIN.into(), i8::MAX.into()),
            ValueType::I16 => (i16::MIN.into(), i16::MAX.into()),
            ValueType::I32 => (i32::MIN.into(), i32::MAX.into()),
            ValueType::I64 => (i64::MIN.into(), i64::MAX.into()),
            ValueType::U8 => (0, u8::MAX.into()),
            ValueType::U16 => (0, u16::MAX.into()),
            ValueType::U32 => (0, u32::MAX.into()),
            ValueType::U64 => (0, u64::MAX.into()),
            ValueType::F32 => return Some(Number::F64(self.to_f64() as f32 as f64)),
            ValueType::F64 | ValueType::Decimal => return Some(Number::F64(self.to_f64())),
            _ => return None,
        };

        let wide: i128 = match self {
            Number::I64(n) => n.into(),
            Number::U64(n) => n.into(),
            Number::F64(n) => {
                let rounded = n.round_ties_even();
                if !rounded.is_finite() || rounded < min as f64 || rounded > max as f64 {
                    return None;
                }
                rounded as i128
            }
        };

        if wide < min || wide > max {
            return None;
        }
        if min < 0 {
            i64::try_from(wide).ok().map(Number::I64)
        } else {
            u64::try_from(wide).ok().map(Number::U64)
        }
    }
}

/// 2^64; every `i64` and `u64` lies strictly inside `(-BOUND, BOUND)`.
const INTEGER_BOUND: f64 = 18_446_744_073_709_551_616.0;

/// Compares an integer with a float without rounding either.
fn cmp_integer_float(a: i128, b: f64) -> Ordering {
    if b.is_nan() {
        return if b.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if b >= INTEGER_BOUND {
        return Ordering::Less;
    }
    if b <= -INTEGER_BOUND {
        return Ordering::Greater;
    }
    let floor = b.floor();
    match a.cmp(&(floor as i128)) {
        Ordering::Equal if b > floor => Ordering::Less,
        ordering => ordering,
    }
}

/// Float order with `-0.0 == 0.0`; NaNs sort by sign at the extremes.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    if a == 0.0 && b == 0.0 {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

impl Number {
    fn as_integer(self) -> Option<i128> {
        match self {
            Number::I64(n) => Some(n.into()),
            Number::U64(n) => Some(n.into()),
            Number::F64(_) => None,
        }
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(a), None) => cmp_integer_float(a, other.to_f64()),
            (None, Some(b)) => cmp_integer_float(b, self.to_f64()).reverse(),
            (None, None) => cmp_floats(self.to_f64(), other.to_f64()),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Equal numbers share an exact `f64`; both zeros hash alike.
        let n = self.to_f64();
        let n = if n == 0.0 { 0.0 } else { n };
        n.to_bits().hash(state);
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{}", n),
            Number::U64(n) => write!(f, "{}", n),
            Number::F64(n) => write!(f, "{}", n),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $wide:ty: $($ty:ty),+) => {
        $(
            impl From<$ty> for Number {
                fn from(n: $ty) -> Self {
                    Number::$variant(n as $wide)
                }
            }
        )+
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// A value of a user enumeration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnumValue {
    /// Name of the enumeration type.
    pub type_name: Cow<'static, str>,
    /// Stable discriminant of the variant.
    pub discriminant: u32,
    /// Variant name, used for display.
    pub name: Cow<'static, str>,
}

impl EnumValue {
    pub fn new(
        type_name: impl Into<Cow<'static, str>>,
        discriminant: u32,
        name: impl Into<Cow<'static, str>>,
    ) -> Self {
        EnumValue {
            type_name: type_name.into(),
            discriminant,
            name: name.into(),
        }
    }

    /// Captures a variant of a [`GridEnum`].
    pub fn of<E: GridEnum>(variant: &E) -> Self {
        EnumValue::new(E::TYPE_NAME, variant.discriminant(), variant.variant_name())
    }
}

/// Enumerations usable as grid values.
///
/// Use explicit discriminants rather than declaration order so that stored
/// filter values stay stable.
///
/// ```
/// use datagrid::{cell_enum, CellType, GridEnum, ValueType};
///
/// #[derive(Clone, Copy)]
/// enum Status {
///     Pending,
///     Done,
/// }
///
/// impl GridEnum for Status {
///     const TYPE_NAME: &'static str = "Status";
///
///     fn discriminant(&self) -> u32 {
///         match self {
///             Status::Pending => 0,
///             Status::Done => 1,
///         }
///     }
///
///     fn variant_name(&self) -> &'static str {
///         match self {
///             Status::Pending => "Pending",
///             Status::Done => "Done",
///         }
///     }
/// }
///
/// cell_enum!(Status);
///
/// assert_eq!(Status::value_type(), ValueType::enumeration("Status"));
/// ```
pub trait GridEnum {
    /// Name identifying the enumeration type.
    const TYPE_NAME: &'static str;

    fn discriminant(&self) -> u32;

    fn variant_name(&self) -> &'static str;
}

/// Rust types that can be exposed as row members.
///
/// `#[derive(GridRow)]` requires every non-skipped field to implement this.
pub trait CellType {
    /// The declared type of a member of this Rust type.
    fn value_type() -> ValueType;

    /// Reads the member as a [`Value`].
    fn to_value(&self) -> Value;
}

/// Implements [`CellType`] for types that implement [`GridEnum`].
#[macro_export]
macro_rules! cell_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::CellType for $ty {
                fn value_type() -> $crate::ValueType {
                    $crate::ValueType::enumeration(<$ty as $crate::GridEnum>::TYPE_NAME)
                }

                fn to_value(&self) -> $crate::Value {
                    $crate::Value::Enum($crate::EnumValue::of(self))
                }
            }
        )+
    };
}

macro_rules! numeric_cell {
    ($($ty:ty => $vt:ident),+ $(,)?) => {
        $(
            impl CellType for $ty {
                fn value_type() -> ValueType {
                    ValueType::$vt
                }

                fn to_value(&self) -> Value {
                    Value::Number(Number::from(*self))
                }
            }

            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )+
    };
}

numeric_cell!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => U64,
    f32 => F32,
    f64 => F64,
);

impl CellType for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl CellType for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl CellType for NaiveDateTime {
    fn value_type() -> ValueType {
        ValueType::DateTime
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl CellType for NaiveTime {
    fn value_type() -> ValueType {
        ValueType::Time
    }

    fn to_value(&self) -> Value {
        Value::Time(*self)
    }
}

impl CellType for serde_json::Value {
    fn value_type() -> ValueType {
        ValueType::Json
    }

    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl<T: CellType> CellType for Option<T> {
    fn value_type() -> ValueType {
        ValueType::Optional(Box::new(T::value_type()))
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
