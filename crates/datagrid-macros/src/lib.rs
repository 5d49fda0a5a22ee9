//! Proc macros for datagrid.
//!
//! # Derive Macros
//!
//! - [`GridRow`] - Implement the static-shape `datagrid::Row` member table
//!   from a struct definition

mod row;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `datagrid::Row` for a struct with named fields.
///
/// Every field becomes a member named after the field, with the field's
/// `CellType` as its declared type. Grids then address the field by that
/// name when building readers, sort keys and group keys.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Leave the field out of the member table |
/// | `rename = "..."` | Use a custom member name |
///
/// # Generated Code
///
/// 1. Member name constants (e.g. `Person::AGE`)
/// 2. `impl datagrid::Row` with `SHAPE = RowShape::Static` and a `member`
///    lookup by name
///
/// # Example
///
/// ```ignore
/// use datagrid::{compile_group_key, group_rows, FieldSpec, GridRow};
///
/// #[derive(GridRow)]
/// struct Person {
///     #[grid(rename = "Name")]
///     name: String,
///     #[grid(rename = "Age")]
///     age: Option<u32>,
///     #[grid(skip)]
///     notes: Vec<String>,
/// }
///
/// let people = vec![
///     Person { name: "Ann".into(), age: Some(30), notes: vec![] },
///     Person { name: "Bob".into(), age: Some(30), notes: vec![] },
/// ];
///
/// let key = compile_group_key::<Person>(&FieldSpec::new(Person::AGE)).unwrap();
/// assert_eq!(group_rows(&people, &key).len(), 1);
/// ```
///
/// Field types must implement `datagrid::CellType`; enumerations do so
/// through `datagrid::cell_enum!`.
#[proc_macro_derive(GridRow, attributes(grid))]
pub fn grid_row_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    row::grid_row_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
