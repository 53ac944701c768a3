//! Planning domain type
//!
//! The persisted output of the planner for a Specification: a sequence of
//! layers, each a set of task names that may run concurrently. Layer
//! boundaries are the controller's barriers.

use serde::{Deserialize, Serialize};

/// Layered topological order of a Specification's tasks.
///
/// Serializes as the bare `[[name]]` two-dimensional list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Planning {
    pub layers: Vec<Vec<String>>,
}

impl Planning {
    pub fn new(layers: Vec<Vec<String>>) -> Self {
        Self { layers }
    }

    /// Every task name, in layer order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().flatten().map(String::as_str)
    }

    /// Total number of planned tasks across all layers.
    pub fn task_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }
}
