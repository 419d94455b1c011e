use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::envelope::{ApiEnvelope, CvMatchData, JobData, JobsData, ModelStatusData, UploadCvData};
use super::token::TokenProvider;
use super::Transport;
use crate::errors::TransportError;
use crate::models::{DocumentKind, JobDescriptor, SalaryReport};
use crate::recommendation::packager::UploadPayload;

const INITIALIZE_PATH: &str = "/complete-flow/initialize";
const UPLOAD_CV_PATH: &str = "/complete-flow/upload-cv";
const MODEL_STATUS_PATH: &str = "/recommendation/model-status";
const BUILD_MODEL_PATH: &str = "/recommendation/build-model";
const CVS_FOR_CUSTOM_JOB_PATH: &str = "/recommendation/cvs-for-custom-job";
const CVS_FOR_JOB_PATH: &str = "/recommendation/cvs-for-job";
const JOBS_PATH: &str = "/recommendation/jobs";
const JOB_PATH: &str = "/recommendation/job";
const SALARY_REPORT_PATH: &str = "/report/analyze-jobs";

/// Where the backend lives and how requests are authorized. Resolved once
/// when the transport is built.
#[derive(Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub token_provider: Arc<dyn TokenProvider>,
    /// `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
}

/// `reqwest`-backed transport for the recommendation backend.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token_provider: Arc<dyn TokenProvider>,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_provider: config.token_provider,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `path` followed by `segment` as one percent-encoded path segment, so an
    /// id containing `/`, `?` or `#` cannot change the route or the query.
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base_url.clone()))?
            .push(segment);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token_provider.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and returns the raw body, mapping non-2xx statuses
    /// to `TransportError::Status`.
    async fn send_raw(&self, request: RequestBuilder) -> Result<String, TransportError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Prefer the envelope's message if the body has one
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|e| e.error.or(e.message))
                .unwrap_or(body);
            warn!("Backend returned {}: {}", status, message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Backend returned {} ({} bytes)", status, body.len());
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(TransportError::Parse)
    }
}

/// Builds the multipart body: `cvFile` for a single CV, repeated `cvFiles`
/// for several.
fn upload_form(upload: &UploadPayload) -> Result<Form, TransportError> {
    let field = upload.field_name();
    let mut form = Form::new();

    for file in &upload.files {
        let mime = file
            .document_kind()
            .unwrap_or(DocumentKind::Pdf)
            .mime();
        let part = Part::bytes(file.content.to_vec())
            .file_name(file.name.clone())
            .mime_str(mime)?;
        form = form.part(field, part);
    }

    Ok(form)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn initialize(&self) -> Result<(), TransportError> {
        let body = self
            .send_raw(self.client.post(self.url(INITIALIZE_PATH)))
            .await?;

        // The body is informational; only an explicit failure flag matters
        if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body) {
            if envelope.success == Some(false) {
                return Err(TransportError::Rejected(envelope.failure_message()));
            }
        }
        Ok(())
    }

    async fn model_status(&self) -> Result<ApiEnvelope<ModelStatusData>, TransportError> {
        self.send_json(self.client.get(self.url(MODEL_STATUS_PATH)))
            .await
    }

    async fn build_model(&self) -> Result<ApiEnvelope<serde_json::Value>, TransportError> {
        self.send_json(self.client.post(self.url(BUILD_MODEL_PATH)))
            .await
    }

    async fn upload_cvs(
        &self,
        upload: &UploadPayload,
    ) -> Result<ApiEnvelope<UploadCvData>, TransportError> {
        let form = upload_form(upload)?;
        self.send_json(self.client.post(self.url(UPLOAD_CV_PATH)).multipart(form))
            .await
    }

    async fn cvs_for_custom_job(
        &self,
        job: &JobDescriptor,
        limit: u32,
    ) -> Result<ApiEnvelope<CvMatchData>, TransportError> {
        let request = self
            .client
            .post(self.url(CVS_FOR_CUSTOM_JOB_PATH))
            .query(&[("limit", limit)])
            .json(job);
        self.send_json(request).await
    }

    async fn cvs_for_job(
        &self,
        job_id: &str,
        limit: u32,
    ) -> Result<ApiEnvelope<CvMatchData>, TransportError> {
        let request = self
            .client
            .get(self.url_with_segment(CVS_FOR_JOB_PATH, job_id)?)
            .query(&[("limit", limit)]);
        self.send_json(request).await
    }

    async fn jobs(&self, limit: u32) -> Result<ApiEnvelope<JobsData>, TransportError> {
        let request = self
            .client
            .get(self.url(JOBS_PATH))
            .query(&[("limit", limit)]);
        self.send_json(request).await
    }

    async fn job(&self, job_id: &str) -> Result<ApiEnvelope<JobData>, TransportError> {
        let url = self.url_with_segment(JOB_PATH, job_id)?;
        self.send_json(self.client.get(url)).await
    }

    async fn salary_report(&self) -> Result<SalaryReport, TransportError> {
        self.send_json(self.client.get(self.url(SALARY_REPORT_PATH)))
            .await
    }
}
