//! Job domain type
//!
//! A Job is the internal unit handed to an executor: one task of a
//! Definition joined with its Component. Jobs are owned by a single
//! controller invocation and are never exposed to clients.

use serde::{Deserialize, Serialize};

use crate::domain::definition::Parameter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub image: String,
    pub arguments: Vec<Parameter>,
    pub dependencies: Vec<String>,
    /// Files the staging sidecar downloads before the container starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_files: Vec<String>,
    /// Files the staging sidecar uploads after the container stops.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_files: Vec<String>,
}

impl Job {
    /// Serializes the arguments for a container invocation: two tokens per
    /// parameter, `--<name>` followed by the textual value, inputs before
    /// outputs in declaration order.
    pub fn argument_vector(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.arguments.len() * 2);
        for parameter in &self.arguments {
            args.push(format!("--{}", parameter.name));
            args.push(parameter.value.to_string());
        }
        args
    }
}
