//! Client for a CV/job recommendation backend.
//!
//! Uploads CVs or job descriptions, makes sure the server-side scoring model
//! is built, and normalizes the ranked matches that come back.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod models;
pub mod recommendation;
pub mod transport;

pub use catalog::Catalog;
pub use config::{Config, Limits};
pub use errors::{RecommendError, Step, TransportError};
pub use recommendation::{
    ModelReadinessGuard, Orchestrator, ProgressEvent, RecommendationSet, WorkflowInput,
    WorkflowState,
};
pub use transport::{HttpTransport, Transport, TransportConfig};
