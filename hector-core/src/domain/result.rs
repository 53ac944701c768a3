//! Execution result types
//!
//! A ResultDefinition aggregates one ResultJob per task of an execution.
//! Statuses move monotonically from `Waiting` to exactly one terminal value;
//! the store enforces nothing here, the controller's skip-if-terminal rule
//! does.

use serde::{Deserialize, Serialize};

/// Status of one job within an execution.
///
/// Wire form is the stable ordinal: 0 = WAITING, 1 = DONE, 2 = ERROR,
/// 3 = CANCELLED.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    #[default]
    Waiting = 0,
    Done = 1,
    Error = 2,
    Cancelled = 3,
}

impl Status {
    /// `Waiting` is the only non-terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Waiting)
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(ordinal: u8) -> Result<Self, String> {
        match ordinal {
            0 => Ok(Status::Waiting),
            1 => Ok(Status::Done),
            2 => Ok(Status::Error),
            3 => Ok(Status::Cancelled),
            other => Err(format!("unknown status ordinal {}", other)),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Waiting => "WAITING",
            Status::Done => "DONE",
            Status::Error => "ERROR",
            Status::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Terminal or in-flight record of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultJob {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logs: String,
    pub status: Status,
}

impl ResultJob {
    /// A fresh record for a job that has not been dispatched yet.
    pub fn waiting(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            logs: String::new(),
            status: Status::Waiting,
        }
    }
}

/// Aggregate execution record: one ResultJob per Specification task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDefinition {
    pub id: String,
    pub name: String,
    #[serde(rename = "specificationId")]
    pub specification_id: String,
    #[serde(rename = "resultJobs")]
    pub result_jobs: Vec<ResultJob>,
}

impl ResultDefinition {
    /// Whether any job is still pending execution.
    pub fn has_waiting(&self) -> bool {
        self.result_jobs
            .iter()
            .any(|job| job.status == Status::Waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_ordinals() {
        let statuses = [Status::Waiting, Status::Done, Status::Error, Status::Cancelled];
        for (ordinal, status) in statuses.iter().enumerate() {
            assert_eq!(serde_json::to_string(status).unwrap(), ordinal.to_string());
        }

        let back: Status = serde_json::from_str("3").unwrap();
        assert_eq!(back, Status::Cancelled);
        assert!(serde_json::from_str::<Status>("7").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!Status::Waiting.is_terminal());
        assert!(Status::Done.is_terminal());
        assert!(Status::Error.is_terminal());
        assert!(Status::Cancelled.is_terminal());
    }

    #[test]
    fn test_has_waiting() {
        let mut result_definition = ResultDefinition {
            id: "def-1".to_string(),
            name: "toy".to_string(),
            specification_id: "spec-1".to_string(),
            result_jobs: vec![
                ResultJob::waiting("job-a", "A"),
                ResultJob {
                    id: "job-b".to_string(),
                    name: "B".to_string(),
                    logs: "All right".to_string(),
                    status: Status::Done,
                },
            ],
        };
        assert!(result_definition.has_waiting());

        result_definition.result_jobs[0].status = Status::Cancelled;
        assert!(!result_definition.has_waiting());
    }
}
