//! Component domain types
//!
//! A Component is a reusable task template: the container image to run plus
//! the typed inputs and outputs a Definition must bind before execution.

use serde::{Deserialize, Serialize};

/// Reusable task template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub inputs: Vec<Put>,
    #[serde(default)]
    pub outputs: Vec<Put>,
    pub container: Container,
}

/// A declared input or output of a Component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Put {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

/// Container image description of a Component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub dockerfile: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
}

/// The closed set of parameter types a Component may declare.
///
/// Anything outside this set fails deserialization, so an invalid type never
/// reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
        };
        f.write_str(name)
    }
}
