use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::RecommendError;
use crate::models::Recommendation;

/// Normalized results of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    /// Server ranking order.
    pub items: Vec<Recommendation>,
    /// Size of the searched pool when the backend reports it.
    pub total_analyzed: Option<u64>,
    /// Names of uploaded files dropped for an unsupported format.
    pub rejected_files: Vec<String>,
}

impl RecommendationSet {
    pub fn partial_rejection(&self) -> bool {
        !self.rejected_files.is_empty()
    }
}

/// Exactly one of these is current per orchestrator.
#[derive(Debug, Clone, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Initializing,
    CheckingModel,
    BuildingModel,
    Submitting,
    Success(RecommendationSet),
    Empty,
    Failed(RecommendError),
}

impl WorkflowState {
    /// A run is in progress.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::Initializing
                | WorkflowState::CheckingModel
                | WorkflowState::BuildingModel
                | WorkflowState::Submitting
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Success(_) | WorkflowState::Empty | WorkflowState::Failed(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Initializing => "initializing",
            WorkflowState::CheckingModel => "checking-model",
            WorkflowState::BuildingModel => "building-model",
            WorkflowState::Submitting => "submitting",
            WorkflowState::Success(_) => "success",
            WorkflowState::Empty => "empty",
            WorkflowState::Failed(_) => "failed",
        }
    }

    pub fn recommendations(&self) -> Option<&RecommendationSet> {
        match self {
            WorkflowState::Success(set) => Some(set),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RecommendError> {
        match self {
            WorkflowState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Emitted on every transition so long-running steps are not silent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub run_id: Uuid,
    pub state: &'static str,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_and_terminal_are_disjoint() {
        let states = [
            WorkflowState::Idle,
            WorkflowState::Initializing,
            WorkflowState::CheckingModel,
            WorkflowState::BuildingModel,
            WorkflowState::Submitting,
            WorkflowState::Success(RecommendationSet {
                items: vec![],
                total_analyzed: None,
                rejected_files: vec![],
            }),
            WorkflowState::Empty,
            WorkflowState::Failed(RecommendError::ConcurrentRequest),
        ];
        let busy: Vec<&str> = states.iter().filter(|s| s.is_busy()).map(|s| s.name()).collect();
        let terminal: Vec<&str> = states
            .iter()
            .filter(|s| s.is_terminal())
            .map(|s| s.name())
            .collect();

        assert_eq!(
            busy,
            vec!["initializing", "checking-model", "building-model", "submitting"]
        );
        assert_eq!(terminal, vec!["success", "empty", "failed"]);
        assert!(!WorkflowState::Idle.is_busy() && !WorkflowState::Idle.is_terminal());
    }

    #[test]
    fn test_default_is_idle() {
        assert!(matches!(WorkflowState::default(), WorkflowState::Idle));
    }
}
