use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// The workflow step a remote failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Initialize,
    StatusCheck,
    Build,
    Submit,
    Catalog,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Initialize => "initialize",
            Step::StatusCheck => "status-check",
            Step::Build => "build",
            Step::Submit => "submit",
            Step::Catalog => "catalog",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised by a `Transport` implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Server reported failure: {0}")]
    Rejected(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Response carried no data")]
    MissingData,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error taxonomy of the recommendation core.
///
/// Cloneable so that a single model-build outcome can be handed to every
/// coalesced waiter and a failure can live inside `WorkflowState::Failed`.
#[derive(Debug, Clone, Error)]
pub enum RecommendError {
    #[error("{step} failed: {source}")]
    Transport {
        step: Step,
        #[source]
        source: Arc<TransportError>,
    },

    #[error("Model build failed: {0}")]
    ModelBuild(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A recommendation request is already in progress")]
    ConcurrentRequest,
}

impl RecommendError {
    pub fn transport(step: Step, source: TransportError) -> Self {
        RecommendError::Transport {
            step,
            source: Arc::new(source),
        }
    }

    /// Step context for remote failures. Validation and concurrency
    /// rejections happen before any step runs.
    pub fn step(&self) -> Option<Step> {
        match self {
            RecommendError::Transport { step, .. } => Some(*step),
            RecommendError::ModelBuild(_) => Some(Step::Build),
            RecommendError::Validation(_) | RecommendError::ConcurrentRequest => None,
        }
    }
}

/// Adds step context to a transport result.
pub(crate) trait StepContext<T> {
    fn at_step(self, step: Step) -> Result<T, RecommendError>;
}

impl<T> StepContext<T> for Result<T, TransportError> {
    fn at_step(self, step: Step) -> Result<T, RecommendError> {
        self.map_err(|e| RecommendError::transport(step, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_message_names_step() {
        let err = RecommendError::transport(
            Step::StatusCheck,
            TransportError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "status-check failed: API error (status 502): bad gateway"
        );
        assert_eq!(err.step(), Some(Step::StatusCheck));
    }

    #[test]
    fn test_model_build_error_is_build_step() {
        let err = RecommendError::ModelBuild("out of memory".to_string());
        assert_eq!(err.step(), Some(Step::Build));
        assert!(err.to_string().contains("out of memory"));
    }

    #[test]
    fn test_validation_has_no_step() {
        assert_eq!(RecommendError::Validation("x".into()).step(), None);
        assert_eq!(RecommendError::ConcurrentRequest.step(), None);
    }

    #[test]
    fn test_at_step_wraps_transport_error() {
        let result: Result<(), TransportError> = Err(TransportError::MissingData);
        let err = result.at_step(Step::Submit).unwrap_err();
        assert!(matches!(
            err,
            RecommendError::Transport {
                step: Step::Submit,
                ..
            }
        ));
    }
}
