//! Artifact validation
//!
//! Shape checks applied to submitted artifacts before anything is persisted.
//! The parameter type set is already enforced by deserialization; what is
//! left here are the structural rules a schema cannot express: non-empty
//! identifiers, unique task names, and dependencies that resolve within the
//! same specification.

use thiserror::Error;

use hector_core::domain::{Component, Definition, Specification};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("task {0} is declared more than once")]
    DuplicateTask(String),

    #[error("task {task} depends on {dependency}, which is not a task of the specification")]
    DanglingDependency { task: String, dependency: String },
}

pub fn validate_component(component: &Component) -> Result<(), ValidationError> {
    if component.id.trim().is_empty() {
        return Err(ValidationError::EmptyField("component id"));
    }
    if component.name.trim().is_empty() {
        return Err(ValidationError::EmptyField("component name"));
    }
    if component.container.image.trim().is_empty() {
        return Err(ValidationError::EmptyField("container image"));
    }
    Ok(())
}

pub fn validate_specification(specification: &Specification) -> Result<(), ValidationError> {
    if specification.id.trim().is_empty() {
        return Err(ValidationError::EmptyField("specification id"));
    }
    if specification.name.trim().is_empty() {
        return Err(ValidationError::EmptyField("specification name"));
    }
    if specification.tasks().is_empty() {
        return Err(ValidationError::EmptyField("specification tasks"));
    }

    let mut seen = std::collections::HashSet::new();
    for task in specification.tasks() {
        if task.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("task name"));
        }
        if task.component_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("task component"));
        }
        if !seen.insert(task.name.as_str()) {
            return Err(ValidationError::DuplicateTask(task.name.clone()));
        }
    }

    for task in specification.tasks() {
        for dependency in &task.dependencies {
            if specification.task(dependency).is_none() {
                return Err(ValidationError::DanglingDependency {
                    task: task.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }
    Ok(())
}

pub fn validate_definition(definition: &Definition) -> Result<(), ValidationError> {
    if definition.name.trim().is_empty() {
        return Err(ValidationError::EmptyField("definition name"));
    }
    if definition.specification_id.trim().is_empty() {
        return Err(ValidationError::EmptyField("definition specificationId"));
    }

    let mut seen = std::collections::HashSet::new();
    for task in &definition.data.tasks {
        if !seen.insert(task.name.as_str()) {
            return Err(ValidationError::DuplicateTask(task.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hector_core::domain::{Container, Dag, Data, Spec, SpecificationTask};

    fn specification(tasks: Vec<SpecificationTask>) -> Specification {
        Specification {
            id: "spec-test".to_string(),
            name: "test".to_string(),
            api_version: "hector/v1".to_string(),
            spec: Spec {
                dag: Dag { tasks },
            },
        }
    }

    fn task(name: &str, dependencies: &[&str]) -> SpecificationTask {
        SpecificationTask {
            name: name.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            component_id: "comp-1".to_string(),
        }
    }

    #[test]
    fn test_component_requires_id_and_image() {
        let component = Component {
            id: " ".to_string(),
            name: "toy".to_string(),
            api_version: "hector/v1".to_string(),
            inputs: vec![],
            outputs: vec![],
            container: Container {
                dockerfile: "./Dockerfile".to_string(),
                image: "hector/toy:1.0.0".to_string(),
                command: vec![],
            },
        };
        assert!(matches!(
            validate_component(&component),
            Err(ValidationError::EmptyField("component id"))
        ));
    }

    #[test]
    fn test_specification_accepts_valid_dag() {
        let spec = specification(vec![task("A", &[]), task("B", &["A"])]);
        assert!(validate_specification(&spec).is_ok());
    }

    #[test]
    fn test_specification_rejects_duplicate_task_names() {
        let spec = specification(vec![task("A", &[]), task("A", &[])]);
        assert!(matches!(
            validate_specification(&spec),
            Err(ValidationError::DuplicateTask(name)) if name == "A"
        ));
    }

    #[test]
    fn test_specification_rejects_dangling_dependency() {
        let spec = specification(vec![task("A", &[]), task("B", &["Z"])]);
        assert!(matches!(
            validate_specification(&spec),
            Err(ValidationError::DanglingDependency { dependency, .. }) if dependency == "Z"
        ));
    }

    #[test]
    fn test_specification_rejects_empty_task_list() {
        let spec = specification(vec![]);
        assert!(validate_specification(&spec).is_err());
    }

    #[test]
    fn test_definition_requires_specification_id() {
        let definition = Definition {
            id: String::new(),
            name: "run".to_string(),
            specification_id: String::new(),
            api_version: "hector/v1".to_string(),
            data: Data { tasks: vec![] },
        };
        assert!(validate_definition(&definition).is_err());
    }
}
