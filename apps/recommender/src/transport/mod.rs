//! Transport: the seam between the recommendation core and the backend.
//!
//! The core only talks to the backend through `Transport`; `HttpTransport` is
//! the production implementation. Tests swap in a scripted double.

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::models::{JobDescriptor, SalaryReport};
use crate::recommendation::packager::UploadPayload;

pub mod envelope;
pub mod http;
pub mod token;

pub use envelope::{ApiEnvelope, CvMatchData, JobData, JobsData, ModelStatusData, UploadCvData};
pub use http::{HttpTransport, TransportConfig};
pub use token::{StaticToken, TokenProvider};

/// One method per backend operation. Implementations handle HTTP-level
/// failures (unreachable, non-2xx, unparseable bodies); interpreting the
/// envelope's `success` flag is left to the caller, except for `initialize`
/// whose body carries nothing else.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST /complete-flow/initialize
    async fn initialize(&self) -> Result<(), TransportError>;

    /// GET /recommendation/model-status
    async fn model_status(&self) -> Result<ApiEnvelope<ModelStatusData>, TransportError>;

    /// POST /recommendation/build-model
    async fn build_model(&self) -> Result<ApiEnvelope<serde_json::Value>, TransportError>;

    /// POST /complete-flow/upload-cv (multipart)
    async fn upload_cvs(
        &self,
        upload: &UploadPayload,
    ) -> Result<ApiEnvelope<UploadCvData>, TransportError>;

    /// POST /recommendation/cvs-for-custom-job?limit=N
    async fn cvs_for_custom_job(
        &self,
        job: &JobDescriptor,
        limit: u32,
    ) -> Result<ApiEnvelope<CvMatchData>, TransportError>;

    /// GET /recommendation/cvs-for-job/:jobId?limit=N
    async fn cvs_for_job(
        &self,
        job_id: &str,
        limit: u32,
    ) -> Result<ApiEnvelope<CvMatchData>, TransportError>;

    /// GET /recommendation/jobs?limit=N
    async fn jobs(&self, limit: u32) -> Result<ApiEnvelope<JobsData>, TransportError>;

    /// GET /recommendation/job/:jobId
    async fn job(&self, job_id: &str) -> Result<ApiEnvelope<JobData>, TransportError>;

    /// GET /report/analyze-jobs
    async fn salary_report(&self) -> Result<SalaryReport, TransportError>;
}
