//! Grouped topological sort (Kahn's algorithm, layered).

use std::collections::HashMap;

use hector_core::domain::{Planning, Specification, SpecificationTask};

use super::{PlanError, Planner};

/// Kahn-style layered planner.
///
/// Layer 0 holds the tasks with no dependencies; layer k+1 holds the tasks
/// whose last remaining dependency sits in layer k. Order inside a layer is
/// whatever the sweep produced; callers must not depend on it.
pub struct TopologicalGrouped;

impl Planner for TopologicalGrouped {
    fn plan(&self, specification: &Specification) -> Result<Planning, PlanError> {
        let tasks = specification.tasks();

        // Remaining-dependency count per task, and the initial frontier.
        let mut indegree: HashMap<&str, usize> = HashMap::new();
        let mut frontier: Vec<String> = Vec::new();
        for task in tasks {
            if task.dependencies.is_empty() {
                frontier.push(task.name.clone());
            } else {
                indegree.insert(&task.name, task.dependencies.len());
            }
        }

        let mut layers: Vec<Vec<String>> = Vec::new();
        while !frontier.is_empty() {
            let mut next: Vec<String> = Vec::new();
            for resolved in &frontier {
                for child in children(resolved, tasks) {
                    let remaining = indegree
                        .get_mut(child)
                        .expect("dependant task has an indegree entry");
                    *remaining -= 1;
                    if *remaining == 0 {
                        next.push(child.to_string());
                    }
                }
            }
            layers.push(std::mem::replace(&mut frontier, next));
        }

        let planning = Planning::new(layers);
        if planning.task_count() != tasks.len() {
            // Tasks left unplaced can only be on (or downstream of) a cycle.
            return Err(PlanError::CycleDetected(specification.id.clone()));
        }
        Ok(planning)
    }
}

/// Tasks that list `name` among their dependencies.
fn children<'a>(name: &str, tasks: &'a [SpecificationTask]) -> impl Iterator<Item = &'a str> {
    let name = name.to_string();
    tasks
        .iter()
        .filter(move |task| task.dependencies.iter().any(|dep| *dep == name))
        .map(|task| task.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_from(edges: &[(&str, &[&str])]) -> Specification {
        Specification {
            id: "spec-test".to_string(),
            name: "test".to_string(),
            api_version: "hector/v1".to_string(),
            spec: hector_core::domain::Spec {
                dag: hector_core::domain::Dag {
                    tasks: edges
                        .iter()
                        .map(|(name, deps)| SpecificationTask {
                            name: name.to_string(),
                            dependencies: deps.iter().map(|d| d.to_string()).collect(),
                            component_id: format!("comp-{}", name.to_lowercase()),
                        })
                        .collect(),
                },
            },
        }
    }

    fn sorted(mut layers: Vec<Vec<String>>) -> Vec<Vec<String>> {
        for layer in &mut layers {
            layer.sort();
        }
        layers
    }

    #[test]
    fn test_linear_chain() {
        let spec = spec_from(&[
            ("A", &[]),
            ("B", &["A"]),
            ("C", &["B"]),
            ("D", &["C"]),
        ]);
        let planning = TopologicalGrouped.plan(&spec).unwrap();
        assert_eq!(
            planning.layers,
            vec![vec!["A"], vec!["B"], vec!["C"], vec!["D"]]
        );
    }

    #[test]
    fn test_diamond() {
        let spec = spec_from(&[
            ("A", &[]),
            ("B", &["A"]),
            ("C", &["A"]),
            ("D", &["B", "C"]),
        ]);
        let planning = TopologicalGrouped.plan(&spec).unwrap();
        assert_eq!(
            sorted(planning.layers),
            vec![vec!["A"], vec!["B", "C"], vec!["D"]]
        );
    }

    #[test]
    fn test_every_dependency_lands_in_an_earlier_layer() {
        let spec = spec_from(&[
            ("ingest", &[]),
            ("clean", &["ingest"]),
            ("stats", &["clean"]),
            ("train", &["clean"]),
            ("report", &["stats", "train"]),
            ("archive", &["ingest"]),
        ]);
        let planning = TopologicalGrouped.plan(&spec).unwrap();

        // Completeness: the flat union is a permutation of the task set.
        let mut planned: Vec<&str> = planning.task_names().collect();
        planned.sort();
        let mut expected: Vec<&str> = spec.tasks().iter().map(|t| t.name.as_str()).collect();
        expected.sort();
        assert_eq!(planned, expected);

        // Layer order: every dependency sits strictly earlier.
        let layer_of: HashMap<&str, usize> = planning
            .layers
            .iter()
            .enumerate()
            .flat_map(|(k, layer)| layer.iter().map(move |name| (name.as_str(), k)))
            .collect();
        for task in spec.tasks() {
            for dep in &task.dependencies {
                assert!(layer_of[dep.as_str()] < layer_of[task.name.as_str()]);
            }
        }
    }

    #[test]
    fn test_cycle_is_rejected() {
        let spec = spec_from(&[("A", &["B"]), ("B", &["A"])]);
        let err = TopologicalGrouped.plan(&spec).unwrap_err();
        assert!(matches!(err, PlanError::CycleDetected(_)));
    }

    #[test]
    fn test_cycle_behind_valid_roots_is_rejected() {
        let spec = spec_from(&[("A", &[]), ("B", &["A", "C"]), ("C", &["B"])]);
        let err = TopologicalGrouped.plan(&spec).unwrap_err();
        assert!(matches!(err, PlanError::CycleDetected(_)));
    }
}
