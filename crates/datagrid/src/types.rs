//! Value types and their data categories.
//!
//! A [`ValueType`] is what a column declares (or what a static member has);
//! the [`TypeClassifier`] maps it to the coarse [`DataCategory`] that selects
//! parsing, comparison and operator behavior.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::row::Row;

/// Declared type of a field.
///
/// In configuration files types are written in a compact text form:
/// `string`, `bool`, `i32`, `f64`, `decimal`, `datetime`, `time`, `json`,
/// `object`, `enum:Status`, with a trailing `?` for optional (`i32?`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    /// A user enumeration, identified by its type name.
    Enum(Cow<'static, str>),
    DateTime,
    /// Time of day.
    Time,
    /// Raw JSON element.
    Json,
    /// Any other type.
    Object,
    /// Nullable wrapper around another type.
    Optional(Box<ValueType>),
}

const NUMERIC_TYPES: &[ValueType] = &[
    ValueType::I8,
    ValueType::I16,
    ValueType::I32,
    ValueType::I64,
    ValueType::U8,
    ValueType::U16,
    ValueType::U32,
    ValueType::U64,
    ValueType::F32,
    ValueType::F64,
    ValueType::Decimal,
];

impl ValueType {
    pub fn enumeration(name: impl Into<Cow<'static, str>>) -> Self {
        ValueType::Enum(name.into())
    }

    pub fn optional(inner: ValueType) -> Self {
        ValueType::Optional(Box::new(inner))
    }

    /// Removes every optional wrapper.
    pub fn strip_optional(&self) -> &ValueType {
        match self {
            ValueType::Optional(inner) => inner.strip_optional(),
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, ValueType::Optional(_))
    }

    pub fn is_integer_type(&self) -> bool {
        matches!(
            self.strip_optional(),
            ValueType::I8
                | ValueType::I16
                | ValueType::I32
                | ValueType::I64
                | ValueType::U8
                | ValueType::U16
                | ValueType::U32
                | ValueType::U64
        )
    }

    /// Whether this is one of the built-in numeric types, independent of any
    /// classifier configuration.
    pub fn is_number_type(&self) -> bool {
        NUMERIC_TYPES.contains(self.strip_optional())
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Bool => "bool",
            ValueType::I8 => "i8",
            ValueType::I16 => "i16",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::U8 => "u8",
            ValueType::U16 => "u16",
            ValueType::U32 => "u32",
            ValueType::U64 => "u64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Decimal => "decimal",
            ValueType::DateTime => "datetime",
            ValueType::Time => "time",
            ValueType::Json => "json",
            ValueType::Object => "object",
            ValueType::Enum(name) => return write!(f, "enum:{}", name),
            ValueType::Optional(inner) => return write!(f, "{}?", inner),
        };
        f.write_str(name)
    }
}

impl FromStr for ValueType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('?') {
            return Ok(ValueType::optional(inner.parse()?));
        }
        if let Some(name) = s.strip_prefix("enum:") {
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigurationError::UnknownValueType(s.to_string()));
            }
            return Ok(ValueType::enumeration(name.to_string()));
        }

        let ty = match s.to_ascii_lowercase().as_str() {
            "string" | "str" => ValueType::String,
            "bool" | "boolean" => ValueType::Bool,
            "i8" => ValueType::I8,
            "i16" => ValueType::I16,
            "i32" | "int" => ValueType::I32,
            "i64" | "long" => ValueType::I64,
            "u8" | "byte" => ValueType::U8,
            "u16" => ValueType::U16,
            "u32" => ValueType::U32,
            "u64" => ValueType::U64,
            "f32" | "float" => ValueType::F32,
            "f64" | "double" => ValueType::F64,
            "decimal" => ValueType::Decimal,
            "datetime" | "date" => ValueType::DateTime,
            "time" => ValueType::Time,
            "json" => ValueType::Json,
            "object" => ValueType::Object,
            _ => return Err(ConfigurationError::UnknownValueType(s.to_string())),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for ValueType {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ValueType> for String {
    fn from(ty: ValueType) -> Self {
        ty.to_string()
    }
}

/// Coarse kind of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    String,
    Numeric,
    Boolean,
    Enumerated,
    Date,
    TimeOfDay,
    Other,
}

impl DataCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DataCategory::String => "string",
            DataCategory::Numeric => "numeric",
            DataCategory::Boolean => "boolean",
            DataCategory::Enumerated => "enumerated",
            DataCategory::Date => "date",
            DataCategory::TimeOfDay => "time_of_day",
            DataCategory::Other => "other",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps value types to data categories.
///
/// The set of numeric types is supplied by the container; [`Default`] uses
/// every built-in integer, floating-point and decimal type. Optional wrappers
/// are always stripped before classifying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeClassifier {
    numeric: HashSet<ValueType>,
}

impl Default for TypeClassifier {
    fn default() -> Self {
        TypeClassifier::with_numeric_types(NUMERIC_TYPES.iter().cloned())
    }
}

impl TypeClassifier {
    pub fn with_numeric_types(types: impl IntoIterator<Item = ValueType>) -> Self {
        TypeClassifier {
            numeric: types.into_iter().collect(),
        }
    }

    pub fn numeric_types(&self) -> &HashSet<ValueType> {
        &self.numeric
    }

    pub fn is_numeric(&self, ty: &ValueType) -> bool {
        self.numeric.contains(ty.strip_optional())
    }

    pub fn is_enumerated(&self, ty: &ValueType) -> bool {
        matches!(ty.strip_optional(), ValueType::Enum(_))
    }

    pub fn category(&self, ty: &ValueType) -> DataCategory {
        let ty = ty.strip_optional();
        if *ty == ValueType::String {
            DataCategory::String
        } else if self.is_numeric(ty) {
            DataCategory::Numeric
        } else if self.is_enumerated(ty) {
            DataCategory::Enumerated
        } else if *ty == ValueType::Bool {
            DataCategory::Boolean
        } else if *ty == ValueType::DateTime {
            DataCategory::Date
        } else if *ty == ValueType::Time {
            DataCategory::TimeOfDay
        } else {
            DataCategory::Other
        }
    }
}

/// Infers the type of `field` on dynamic rows from the first non-null value.
///
/// Returns [`ValueType::Object`] when no row holds a value for the field, and
/// always for static rows, which have no entries.
pub fn infer_dynamic_value_type<R: Row>(rows: &[R], field: &str) -> ValueType {
    rows.iter()
        .filter_map(|row| row.entry(field))
        .find(|value| !value.is_null())
        .map(|value| value.value_type())
        .unwrap_or(ValueType::Object)
}
