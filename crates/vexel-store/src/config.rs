use serde::{Deserialize, Serialize};
use vexel_types::Style;

/// Configuration for an [`ObjectStore`](crate::ObjectStore).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Style applied by callers that do not supply one.
    pub default_style: Style,
    /// Per-table record capacity reserved up front.
    pub initial_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_style: Style::default(),
            initial_capacity: 0,
        }
    }
}

impl StoreConfig {
    /// Reserve room for roughly `n` records of each kind.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            initial_capacity: n,
            ..Default::default()
        }
    }
}
