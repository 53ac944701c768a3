//! Core domain types
//!
//! The fundamental business entities shared between the orchestrator (which
//! persists and executes them) and the client/CLI (which submit and query
//! them). All artifacts are immutable once persisted; only ResultDefinitions
//! change, and only through scoped per-job status updates.

pub mod component;
pub mod definition;
pub mod job;
pub mod planning;
pub mod result;
pub mod specification;

pub use component::{Component, Container, Put, ValueType};
pub use definition::{Data, Definition, DefinitionTask, ParamValue, Parameter};
pub use job::Job;
pub use planning::Planning;
pub use result::{ResultDefinition, ResultJob, Status};
pub use specification::{Dag, Spec, Specification, SpecificationTask};
