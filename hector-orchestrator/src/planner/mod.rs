//! Planner
//!
//! Turns a Specification's DAG into a layered topological order. The layers
//! are the controller's unit of parallelism: everything in a layer may run
//! concurrently, and layer boundaries are barriers.

pub mod topological;

pub use topological::TopologicalGrouped;

use thiserror::Error;

use hector_core::domain::{Planning, Specification};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("specification {0} contains a dependency cycle")]
    CycleDetected(String),
}

/// Planning strategy over a Specification.
pub trait Planner: Send + Sync {
    fn plan(&self, specification: &Specification) -> Result<Planning, PlanError>;
}
