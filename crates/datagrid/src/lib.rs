//! Datagrid - column data access and filter values for tabular grids.
//!
//! A grid is configured at runtime with columns and filters that name the
//! fields they read. This crate turns those names into compiled accessors
//! and typed filter state:
//!
//! - Type classification: string, numeric, boolean, enumerated, date,
//!   time-of-day or other, for declared and inferred field types
//! - Accessor compilation: reader, sort-key and group-key functions for
//!   static rows (struct members) and dynamic rows (string-keyed maps)
//! - Column descriptors with memoized accessors and grouping state
//! - Filter descriptors that normalize a raw value per data category
//!
//! The grid itself (sorting, grouping and filtering pipelines, rendering)
//! stays outside; it implements [`GridHost`] and pulls compiled functions
//! from the descriptors.
//!
//! # Quick Start
//!
//! ```rust
//! use datagrid::{
//!     compile_sort_key, sort_rows, DynamicRow, FieldSpec, SortDefinition, SortDirection,
//!     TypeClassifier, ValueType,
//! };
//! use serde_json::json;
//!
//! let rows = DynamicRow::from_json_rows(&json!([
//!     {"Name": "Ann", "Age": 30},
//!     {"Name": "Bob", "Age": 4},
//!     {"Name": "Cid", "Age": 12},
//! ]))
//! .unwrap();
//!
//! // Dynamic rows carry no member types: the column declares one.
//! let age = FieldSpec::typed("Age", ValueType::I32);
//! let key = compile_sort_key(&age, &rows, &TypeClassifier::default()).unwrap();
//!
//! let sorted = sort_rows(&rows, &[SortDefinition::new(key, SortDirection::Ascending)]).unwrap();
//! let names: Vec<String> = sorted.iter().map(|r| r.get("Name").unwrap().to_string()).collect();
//! assert_eq!(names, vec!["Bob", "Cid", "Ann"]);
//! ```
//!
//! # Row Shapes
//!
//! | Shape   | Field lookup     | Field type                         |
//! |---------|------------------|------------------------------------|
//! | Static  | struct member    | the member's [`CellType`]          |
//! | Dynamic | map key          | declared on the column (mandatory) |
//!
//! Static rows implement [`Row`] by hand or with `#[derive(GridRow)]`
//! (feature `derive`). [`DynamicRow`] is the dynamic shape.
//!
//! # Data Categories and Operators
//!
//! | Category    | Default operators |
//! |-------------|-------------------|
//! | String      | `contains`, `not contains`, `equals`, `not equals`, `starts with`, `ends with`, `is empty`, `is not empty` |
//! | Numeric     | `=`, `!=`, `>`, `>=`, `<`, `<=`, `is empty`, `is not empty` |
//! | Enumerated  | `is`, `is not` |
//! | Boolean     | `is` |
//! | Date / Time | `is`, `is not`, `is after`, `is on or after`, `is before`, `is on or before`, `is empty`, `is not empty` |

mod accessor;
mod column;
mod error;
mod filter;
mod host;
mod op;
mod options;
mod ordering;
mod row;
mod types;
mod value;

// Re-export public API
pub use accessor::{
    compile_group_key, compile_reader, compile_sort_key, group_rows, resolve_value_type,
    FieldSpec, GroupKeyFn, ReadFn, SortKeyFn,
};
pub use column::{Column, ColumnSpec};
pub use error::{ConfigurationError, ConversionError, GridError, Result};
pub use filter::{Filter, FilterChange, FilterPredicate, FilterShadow};
pub use host::{ColumnId, DeferredTask, FilterId, GridHost};
pub use op::{default_operators, Op, UnknownOperator};
pub use options::{GridOptions, ReconcileMode, DEFAULT_RECONCILE_DELAY_MS};
pub use ordering::{compare_keys, sort_rows, SortDefinition, SortDirection};
pub use row::{DynamicRow, Member, Row, RowShape};
pub use types::{infer_dynamic_value_type, DataCategory, TypeClassifier, ValueType};
pub use value::{CellType, EnumValue, GridEnum, Number, Value};

#[cfg(feature = "derive")]
pub use datagrid_macros::GridRow;
