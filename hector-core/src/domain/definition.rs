//! Definition domain types
//!
//! A Definition is a concrete execution request: for every task of a
//! Specification it binds the parameters declared by the task's Component to
//! runtime values. The service mints the id at submit time; a client-supplied
//! id is ignored.

use serde::{Deserialize, Serialize};

use crate::domain::component::ValueType;

/// Concrete execution request against a Specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "specificationId")]
    pub specification_id: String,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub data: Data,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub tasks: Vec<DefinitionTask>,
}

/// Parameter bindings for one task of the Specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionTask {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Parameter>,
    #[serde(default)]
    pub outputs: Vec<Parameter>,
}

/// A named runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
}

/// Heterogeneous parameter value.
///
/// Untagged on the wire; the variant order matters: integers must be tried
/// before floats so that `22` round-trips as an int and never widens, which
/// keeps the discriminant stable across store round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ParamValue {
    /// Runtime type of the value, matched against a Component declaration.
    pub fn value_type(&self) -> ValueType {
        match self {
            ParamValue::Bool(_) => ValueType::Bool,
            ParamValue::Int(_) => ValueType::Int,
            ParamValue::Float(_) => ValueType::Float,
            ParamValue::String(_) => ValueType::String,
        }
    }
}

impl std::fmt::Display for ParamValue {
    /// Textual form used in container argument vectors: booleans as
    /// `true`/`false`, numbers as decimal text, strings verbatim.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::String(s) => f.write_str(s),
        }
    }
}
