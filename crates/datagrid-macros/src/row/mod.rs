//! Implementation of the `#[derive(GridRow)]` macro.
//!
//! Generates a static-shape `datagrid::Row` implementation (the member
//! table) and field name constants from a struct definition.

mod attrs;
mod derive;

pub use derive::grid_row_derive_impl;
