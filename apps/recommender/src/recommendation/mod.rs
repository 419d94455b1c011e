// Recommendation core: packaging, model readiness, normalization and the
// workflow state machine that ties them together.
// All backend calls go through `Transport`; nothing here builds HTTP requests.

pub mod normalizer;
pub mod packager;
pub mod readiness;
pub mod state;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use normalizer::{normalize, to_fixed_1};
pub use packager::{package, UploadPayload};
pub use readiness::{ModelReadinessGuard, Readiness};
pub use state::{ProgressEvent, RecommendationSet, WorkflowState};
pub use workflow::{Orchestrator, WorkflowInput};
