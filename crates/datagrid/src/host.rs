//! The container interface.
//!
//! Columns and filters do not own the grid they belong to. Every operation
//! that needs the grid's rows, defaults or notifications takes a
//! `&dyn GridHost<R>`; the grid implements this trait and decides when to
//! re-sort, re-group, re-filter or re-render in response.

use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::error::Result;
use crate::filter::FilterChange;
use crate::op::{default_operators, Op};
use crate::options::GridOptions;
use crate::row::Row;
use crate::types::{DataCategory, TypeClassifier};

/// Identity of a column within its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub Uuid);

impl ColumnId {
    pub fn new() -> Self {
        ColumnId(Uuid::new_v4())
    }
}

impl Default for ColumnId {
    fn default() -> Self {
        ColumnId::new()
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a filter within its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(pub Uuid);

impl FilterId {
    pub fn new() -> Self {
        FilterId(Uuid::new_v4())
    }
}

impl Default for FilterId {
    fn default() -> Self {
        FilterId::new()
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A one-shot task handed to [`GridHost::schedule_once`].
///
/// The grid runs it once after the delay, passing itself back in. The task
/// tolerates its column having been dropped in the meantime.
pub type DeferredTask<R> = Box<dyn FnOnce(&dyn GridHost<R>) -> Result<()> + Send>;

/// What the core needs from the grid that owns its columns and filters.
///
/// Notifications are one-way; the grid owns scheduling of the actual
/// recompute. Methods take `&self`, so implementations record requests
/// through interior mutability.
pub trait GridHost<R: Row> {
    /// The rows currently held by the grid, sampled for dynamic type
    /// inference.
    fn items(&self) -> &[R];

    /// Container-wide defaults.
    fn options(&self) -> &GridOptions;

    /// The type classification table, including the numeric type set.
    fn classifier(&self) -> &TypeClassifier;

    /// Operators offered for `category`, default operator first.
    fn operators_for(&self, category: DataCategory) -> Vec<Op> {
        default_operators(category).to_vec()
    }

    /// A column's grouping state or group-key function changed.
    fn grouping_changed(&self, column: ColumnId);

    /// A column was hidden or shown.
    fn column_hidden_changed(&self, column: ColumnId, hidden: bool) {
        let _ = (column, hidden);
    }

    /// A filter property changed and should be reflected in the grid's copy.
    fn filter_changed(&self, filter: FilterId, change: &FilterChange) {
        let _ = (filter, change);
    }

    /// The filter asks to be removed.
    fn filter_removed(&self, filter: FilterId);

    /// Re-render everything.
    fn request_rerender(&self);

    /// Re-run grouping and filtering.
    fn request_repipeline(&self);

    /// Runs `task` once after `delay`.
    fn schedule_once(&self, delay: Duration, task: DeferredTask<R>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(ColumnId::new(), ColumnId::new());
        assert_ne!(FilterId::new(), FilterId::new());
    }

    #[test]
    fn ids_display_as_uuid() {
        let id = FilterId(Uuid::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }
}
