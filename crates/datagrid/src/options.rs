//! Container-wide configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Delay used by [`ReconcileMode::Deferred`] when none is configured.
pub const DEFAULT_RECONCILE_DELAY_MS: u64 = 1000;

/// How a column that starts out grouped recompiles its group key once the
/// grid's rows are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Schedule a one-shot recompile through the grid after a fixed delay.
    Deferred {
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
    /// Schedule nothing; the grid calls `Column::data_ready` after loading
    /// its rows.
    OnDataReady,
}

fn default_delay_ms() -> u64 {
    DEFAULT_RECONCILE_DELAY_MS
}

impl Default for ReconcileMode {
    fn default() -> Self {
        ReconcileMode::Deferred {
            delay_ms: DEFAULT_RECONCILE_DELAY_MS,
        }
    }
}

impl ReconcileMode {
    /// The scheduling delay, or `None` when reconciliation waits for an
    /// explicit data-ready signal.
    pub fn delay(self) -> Option<Duration> {
        match self {
            ReconcileMode::Deferred { delay_ms } => Some(Duration::from_millis(delay_ms)),
            ReconcileMode::OnDataReady => None,
        }
    }
}

/// Defaults the grid applies to columns that do not set their own flags.
///
/// ```
/// use datagrid::{GridOptions, ReconcileMode};
///
/// let options = GridOptions::from_yaml_str(
///     "groupable: true\nreconcile:\n  mode: on_data_ready\n",
/// )
/// .unwrap();
/// assert!(options.groupable);
/// assert!(options.sortable);
/// assert_eq!(options.reconcile, ReconcileMode::OnDataReady);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub hideable: bool,
    pub groupable: bool,
    pub sortable: bool,
    pub filterable: bool,
    pub reconcile: ReconcileMode,
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            hideable: false,
            groupable: false,
            sortable: true,
            filterable: false,
            reconcile: ReconcileMode::default(),
        }
    }
}

impl GridOptions {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = hideable;
        self
    }

    pub fn groupable(mut self, groupable: bool) -> Self {
        self.groupable = groupable;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn reconcile(mut self, reconcile: ReconcileMode) -> Self {
        self.reconcile = reconcile;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = GridOptions::default();
        assert!(!options.hideable);
        assert!(!options.groupable);
        assert!(options.sortable);
        assert!(!options.filterable);
        assert_eq!(options.reconcile.delay(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let options = GridOptions::from_json_str(r#"{"filterable": true}"#).unwrap();
        assert!(options.filterable);
        assert!(options.sortable);
        assert_eq!(options.reconcile, ReconcileMode::default());
    }

    #[test]
    fn reconcile_modes_from_json() {
        let options =
            GridOptions::from_json_str(r#"{"reconcile": {"mode": "deferred", "delay_ms": 250}}"#)
                .unwrap();
        assert_eq!(options.reconcile.delay(), Some(Duration::from_millis(250)));

        let options = GridOptions::from_json_str(r#"{"reconcile": {"mode": "deferred"}}"#).unwrap();
        assert_eq!(options.reconcile.delay(), Some(Duration::from_millis(1000)));

        let options =
            GridOptions::from_json_str(r#"{"reconcile": {"mode": "on_data_ready"}}"#).unwrap();
        assert_eq!(options.reconcile.delay(), None);
    }

    #[test]
    fn invalid_config_is_an_error() {
        assert!(GridOptions::from_json_str("{").is_err());
        assert!(GridOptions::from_yaml_str("sortable: [1").is_err());
    }

    #[test]
    fn builder() {
        let options = GridOptions::default()
            .groupable(true)
            .hideable(true)
            .reconcile(ReconcileMode::OnDataReady);
        assert!(options.groupable);
        assert!(options.hideable);
        assert_eq!(options.reconcile, ReconcileMode::OnDataReady);
    }
}
