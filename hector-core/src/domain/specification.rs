//! Specification domain types
//!
//! A Specification is a named DAG: an ordered list of tasks, each bound to a
//! Component and to the names of the tasks it depends on.

use serde::{Deserialize, Serialize};

/// Named DAG over task names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub id: String,
    pub name: String,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub spec: Spec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub dag: Dag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dag {
    pub tasks: Vec<SpecificationTask>,
}

/// One node of the DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationTask {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(rename = "component")]
    pub component_id: String,
}

impl Specification {
    /// The tasks of the DAG.
    pub fn tasks(&self) -> &[SpecificationTask] {
        &self.spec.dag.tasks
    }

    /// Looks up a task by name.
    pub fn task(&self, name: &str) -> Option<&SpecificationTask> {
        self.spec.dag.tasks.iter().find(|t| t.name == name)
    }
}
