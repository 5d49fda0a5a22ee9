//! Column descriptors.
//!
//! A [`Column`] holds one column's configuration and the accessors compiled
//! from it. Accessors are built on first use and cached for the column's
//! lifetime; the group key is the one exception, recompiled once by the
//! initial-grouping reconciliation (see [`crate::ReconcileMode`]).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::debug;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::accessor::{
    compile_group_key, compile_reader, compile_sort_key, resolve_value_type, FieldSpec, GroupKeyFn,
    ReadFn, SortKeyFn,
};
use crate::error::Result;
use crate::host::{ColumnId, DeferredTask, GridHost};
use crate::options::GridOptions;
use crate::ordering::SortDirection;
use crate::row::{Row, RowShape};
use crate::types::{infer_dynamic_value_type, TypeClassifier, ValueType};

/// Serializable column configuration.
///
/// Flags left as `None` inherit the grid's [`GridOptions`].
///
/// ```
/// use datagrid::{ColumnSpec, ValueType};
///
/// let spec = ColumnSpec::from_yaml_str(
///     "field: Age\ndeclared_type: i32?\ngroupable: true\ngrouping: true\n",
/// )
/// .unwrap();
/// assert_eq!(spec.declared_type, Some(ValueType::optional(ValueType::I32)));
/// assert_eq!(spec.groupable, Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub field: String,
    pub declared_type: Option<ValueType>,
    pub title: Option<String>,
    pub sortable: Option<bool>,
    pub filterable: Option<bool>,
    pub hideable: Option<bool>,
    pub groupable: Option<bool>,
    /// Starts the column as an active grouping dimension.
    pub grouping: bool,
    pub hidden: bool,
    pub initial_direction: SortDirection,
}

impl ColumnSpec {
    pub fn new(field: impl Into<String>) -> Self {
        ColumnSpec {
            field: field.into(),
            ..ColumnSpec::default()
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn declared_type(mut self, ty: ValueType) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = Some(filterable);
        self
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = Some(hideable);
        self
    }

    pub fn groupable(mut self, groupable: bool) -> Self {
        self.groupable = Some(groupable);
        self
    }

    pub fn grouping(mut self, grouping: bool) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn initial_direction(mut self, direction: SortDirection) -> Self {
        self.initial_direction = direction;
        self
    }

    pub fn field_spec(&self) -> FieldSpec {
        FieldSpec {
            field: self.field.clone(),
            declared_type: self.declared_type.clone(),
        }
    }
}

/// Group-key state shared with the deferred reconciliation task.
struct GroupSlot<R> {
    /// User-supplied group function.
    custom: Option<GroupKeyFn<R>>,
    /// Function in effect.
    active: Option<GroupKeyFn<R>>,
    reconciled: bool,
}

impl<R: Row> GroupSlot<R> {
    /// Adopts the user function, or compiles one from the field when there
    /// is none yet.
    fn compile(&mut self, field: &FieldSpec) -> Result<()> {
        if self.active.is_none() {
            self.active = self.custom.clone();
        }
        if self.active.is_none() && !field.is_unbound() {
            self.active = Some(compile_group_key(field)?);
        }
        Ok(())
    }

    /// Recompiles the group key once. Returns `false` if it already ran.
    fn reconcile(&mut self, field: &FieldSpec) -> Result<bool> {
        if self.reconciled {
            return Ok(false);
        }
        self.reconciled = true;
        self.active = None;
        self.compile(field)?;
        Ok(true)
    }
}

fn lock<R>(slot: &Mutex<GroupSlot<R>>) -> MutexGuard<'_, GroupSlot<R>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One column of a grid over rows of type `R`.
pub struct Column<R: Row> {
    id: ColumnId,
    spec: ColumnSpec,
    field: FieldSpec,
    reader: OnceCell<ReadFn<R>>,
    sort_key: OnceCell<SortKeyFn<R>>,
    group: Arc<Mutex<GroupSlot<R>>>,
    hideable: Option<bool>,
    hidden: bool,
    grouping: bool,
    reconcile_pending: bool,
    reconcile_scheduled: bool,
}

impl<R: Row> Column<R> {
    pub fn new(spec: ColumnSpec) -> Self {
        Column {
            id: ColumnId::new(),
            field: spec.field_spec(),
            hideable: spec.hideable,
            hidden: spec.hidden,
            grouping: false,
            spec,
            reader: OnceCell::new(),
            sort_key: OnceCell::new(),
            group: Arc::new(Mutex::new(GroupSlot {
                custom: None,
                active: None,
                reconciled: false,
            })),
            reconcile_pending: false,
            reconcile_scheduled: false,
        }
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn spec(&self) -> &ColumnSpec {
        &self.spec
    }

    pub fn field(&self) -> &str {
        &self.spec.field
    }

    /// Prepares the column once it is attached to `host`.
    ///
    /// Resolves `hideable` against the grid default, compiles the initial
    /// group key and, if the column starts grouped, arranges the one-time
    /// group-key reconciliation according to the grid's
    /// [`crate::ReconcileMode`].
    pub fn initialize(&mut self, host: &dyn GridHost<R>) -> Result<()> {
        if self.hideable.is_none() {
            self.hideable = Some(host.options().hideable);
        }

        lock(&self.group).compile(&self.field)?;

        if self.spec.grouping && self.groupable(host.options()) {
            self.grouping = true;
        }

        if self.grouping && !self.reconcile_scheduled {
            self.reconcile_pending = true;
            if let Some(delay) = host.options().reconcile.delay() {
                self.reconcile_scheduled = true;
                debug!(
                    "column '{}' scheduling group-key reconciliation in {:?}",
                    self.field.field, delay
                );
                host.schedule_once(delay, self.reconcile_task());
            }
        }
        Ok(())
    }

    fn reconcile_task(&self) -> DeferredTask<R> {
        let slot: Weak<Mutex<GroupSlot<R>>> = Arc::downgrade(&self.group);
        let field = self.field.clone();
        let id = self.id;
        Box::new(move |host: &dyn GridHost<R>| {
            let Some(slot) = slot.upgrade() else {
                debug!("column '{}' dropped before reconciliation", field.field);
                return Ok(());
            };
            let ran = lock(&slot).reconcile(&field)?;
            if ran {
                debug!("column '{}' reconciled group key", field.field);
                host.grouping_changed(id);
            }
            Ok(())
        })
    }

    /// Signals that the grid's rows are loaded.
    ///
    /// Runs a pending group-key reconciliation now. A deferred task scheduled
    /// for the same column becomes a no-op.
    pub fn data_ready(&mut self, host: &dyn GridHost<R>) -> Result<()> {
        if !self.reconcile_pending {
            return Ok(());
        }
        self.reconcile_pending = false;
        if lock(&self.group).reconcile(&self.field)? {
            debug!("column '{}' reconciled group key on data ready", self.field.field);
            host.grouping_changed(self.id);
        }
        Ok(())
    }

    pub fn title(&self) -> &str {
        self.spec.title.as_deref().unwrap_or(&self.spec.field)
    }

    /// The declared type, or the member's type for static rows.
    pub fn data_type(&self) -> Result<ValueType> {
        resolve_value_type::<R>(&self.field.field, self.field.declared_type.as_ref())
    }

    /// The type actually stored in `items`: inferred from the first non-null
    /// value for dynamic rows, [`Column::data_type`] otherwise.
    pub fn inner_data_type(&self, items: &[R]) -> Result<ValueType> {
        match R::SHAPE {
            RowShape::Dynamic => Ok(infer_dynamic_value_type(items, &self.field.field)),
            RowShape::Static => self.data_type(),
        }
    }

    pub fn is_numeric(&self, classifier: &TypeClassifier) -> Result<bool> {
        Ok(classifier.is_numeric(&self.data_type()?))
    }

    /// Replaces the sort-key function.
    pub fn set_sort_key_fn(&mut self, key: SortKeyFn<R>) {
        self.sort_key = OnceCell::with_value(key);
    }

    /// The sort-key function, compiled from the field on first call.
    ///
    /// Returns `None` for an unbound column without a user function.
    pub fn resolve_sort_key_fn(&self, host: &dyn GridHost<R>) -> Result<Option<SortKeyFn<R>>> {
        if let Some(key) = self.sort_key.get() {
            return Ok(Some(key.clone()));
        }
        if self.field.is_unbound() {
            return Ok(None);
        }
        let key = self
            .sort_key
            .get_or_try_init(|| compile_sort_key(&self.field, host.items(), host.classifier()))?;
        Ok(Some(key.clone()))
    }

    /// The value reader, compiled on first call. `None` for unbound columns.
    pub fn reader(&self) -> Result<Option<ReadFn<R>>> {
        if self.field.is_unbound() {
            return Ok(None);
        }
        let reader = self.reader.get_or_try_init(|| compile_reader(&self.field))?;
        Ok(Some(reader.clone()))
    }

    /// Replaces the group-key function. It stays in effect across the
    /// reconciliation.
    pub fn set_group_key_fn(&mut self, key: GroupKeyFn<R>) {
        let mut slot = lock(&self.group);
        slot.custom = Some(key.clone());
        slot.active = Some(key);
    }

    pub fn group_key_fn(&self) -> Option<GroupKeyFn<R>> {
        lock(&self.group).active.clone()
    }

    /// Activates or deactivates grouping. Ignored unless the column is
    /// groupable.
    pub fn set_grouping(&mut self, active: bool, host: &dyn GridHost<R>) {
        if self.groupable(host.options()) {
            self.grouping = active;
            host.grouping_changed(self.id);
        }
    }

    /// Deactivates grouping without notifying the grid.
    pub fn clear_grouping(&mut self) {
        self.grouping = false;
    }

    pub fn grouping(&self) -> bool {
        self.grouping
    }

    pub fn hide(&mut self, host: &dyn GridHost<R>) {
        self.hidden = true;
        host.column_hidden_changed(self.id, self.hidden);
    }

    pub fn show(&mut self, host: &dyn GridHost<R>) {
        self.hidden = false;
        host.column_hidden_changed(self.id, self.hidden);
    }

    pub fn toggle(&mut self, host: &dyn GridHost<R>) {
        self.hidden = !self.hidden;
        host.column_hidden_changed(self.id, self.hidden);
        host.request_rerender();
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// `false` until [`Column::initialize`] resolves an unset flag.
    pub fn hideable(&self) -> bool {
        self.hideable.unwrap_or(false)
    }

    pub fn sortable(&self, options: &GridOptions) -> bool {
        self.spec.sortable.unwrap_or(options.sortable)
    }

    pub fn filterable(&self, options: &GridOptions) -> bool {
        self.spec.filterable.unwrap_or(options.filterable)
    }

    pub fn groupable(&self, options: &GridOptions) -> bool {
        self.spec.groupable.unwrap_or(options.groupable)
    }

    pub fn initial_direction(&self) -> SortDirection {
        self.spec.initial_direction
    }
}

impl<R: Row> std::fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("spec", &self.spec)
            .field("hidden", &self.hidden)
            .field("grouping", &self.grouping)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_from_json() {
        let spec = ColumnSpec::from_json_str(
            r#"{"field": "A", "declared_type": "enum:Status", "initial_direction": "descending"}"#,
        )
        .unwrap();
        assert_eq!(spec.declared_type, Some(ValueType::enumeration("Status")));
        assert_eq!(spec.initial_direction, SortDirection::Descending);
        assert_eq!(spec.sortable, None);
        assert!(!spec.grouping);
    }

    #[test]
    fn spec_rejects_unknown_type() {
        let err = ColumnSpec::from_json_str(r#"{"field": "A", "declared_type": "money"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn flags_inherit_grid_defaults() {
        let options = GridOptions::default();
        let column: Column<crate::row::DynamicRow> = Column::new(ColumnSpec::new("A"));
        assert!(column.sortable(&options));
        assert!(!column.filterable(&options));
        assert!(!column.groupable(&options));
        assert!(column.groupable(&options.clone().groupable(true)));

        let column: Column<crate::row::DynamicRow> =
            Column::new(ColumnSpec::new("A").sortable(false).groupable(true));
        assert!(!column.sortable(&options));
        assert!(column.groupable(&options));
    }

    #[test]
    fn title_falls_back_to_field() {
        let column: Column<crate::row::DynamicRow> = Column::new(ColumnSpec::new("Age"));
        assert_eq!(column.title(), "Age");
        let column: Column<crate::row::DynamicRow> =
            Column::new(ColumnSpec::new("Age").title("Years"));
        assert_eq!(column.title(), "Years");
    }

    #[test]
    fn reconcile_runs_once() {
        let mut slot: GroupSlot<crate::row::DynamicRow> = GroupSlot {
            custom: None,
            active: None,
            reconciled: false,
        };
        let field = FieldSpec::typed("A", ValueType::I32);
        assert!(slot.reconcile(&field).unwrap());
        assert!(slot.active.is_some());
        assert!(!slot.reconcile(&field).unwrap());
    }
}
