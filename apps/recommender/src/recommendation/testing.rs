//! Scripted `Transport` double shared by the recommendation tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::TransportError;
use crate::models::{Job, JobDescriptor, RecommendationRaw, SalaryBucket, SalaryReport};
use crate::recommendation::packager::UploadPayload;
use crate::transport::{
    ApiEnvelope, CvMatchData, JobData, JobsData, ModelStatusData, Transport, UploadCvData,
};

#[derive(Debug, Default)]
pub struct CallCounts {
    pub initialize: AtomicUsize,
    pub model_status: AtomicUsize,
    pub build: AtomicUsize,
    pub upload: AtomicUsize,
    pub custom_job: AtomicUsize,
    pub cvs_for_job: AtomicUsize,
    pub catalog: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        Self::get(&self.upload) + Self::get(&self.custom_job) + Self::get(&self.cvs_for_job)
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Items(Vec<Value>),
    Rejected(String),
    NoData,
    Status(u16),
}

pub struct ScriptedTransport {
    pub calls: CallCounts,
    model_built: AtomicBool,
    init_status: Option<u16>,
    build_succeeds: bool,
    build_delay: Duration,
    submit_delay: Duration,
    reply: Reply,
    pub last_limit: Mutex<Option<u32>>,
    pub last_job_id: Mutex<Option<String>>,
    pub last_job: Mutex<Option<JobDescriptor>>,
    pub uploaded: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            calls: CallCounts::default(),
            model_built: AtomicBool::new(true),
            init_status: None,
            build_succeeds: true,
            build_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            reply: Reply::Items(vec![]),
            last_limit: Mutex::new(None),
            last_job_id: Mutex::new(None),
            last_job: Mutex::new(None),
            uploaded: Mutex::new(Vec::new()),
        }
    }

    pub fn model_built(self, built: bool) -> Self {
        self.model_built.store(built, Ordering::SeqCst);
        self
    }

    pub fn init_fails_with(mut self, status: u16) -> Self {
        self.init_status = Some(status);
        self
    }

    pub fn build_fails(mut self) -> Self {
        self.build_succeeds = false;
        self
    }

    pub fn build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = delay;
        self
    }

    pub fn submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    /// `n` items with descending scores.
    pub fn items(self, n: usize) -> Self {
        let items = (0..n)
            .map(|i| json!({ "jobId": i + 1, "cvId": i + 1, "jobTitle": format!("Match {}", i + 1), "score": 0.9 - 0.1 * i as f64 }))
            .collect();
        self.reply(Reply::Items(items))
    }

    fn raw_items(&self) -> Result<Option<Vec<RecommendationRaw>>, TransportError> {
        match &self.reply {
            // Same lenient path as a real response body
            Reply::Items(items) => {
                let data: CvMatchData =
                    serde_json::from_value(json!({ "recommendations": items }))?;
                Ok(data.recommendations)
            }
            _ => Ok(None),
        }
    }

    async fn submit_reply<T>(
        &self,
        wrap: impl FnOnce(Option<Vec<RecommendationRaw>>) -> T,
    ) -> Result<ApiEnvelope<T>, TransportError> {
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        match &self.reply {
            Reply::Items(_) => Ok(ApiEnvelope::ok(wrap(self.raw_items()?))),
            Reply::Rejected(msg) => Ok(ApiEnvelope::failed(msg.clone())),
            Reply::NoData => Ok(ApiEnvelope {
                success: Some(true),
                data: None,
                error: None,
                message: None,
            }),
            Reply::Status(status) => Err(TransportError::Status {
                status: *status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn initialize(&self) -> Result<(), TransportError> {
        self.calls.initialize.fetch_add(1, Ordering::SeqCst);
        match self.init_status {
            Some(status) => Err(TransportError::Status {
                status,
                message: "initialize failed".to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn model_status(&self) -> Result<ApiEnvelope<ModelStatusData>, TransportError> {
        self.calls.model_status.fetch_add(1, Ordering::SeqCst);
        Ok(ApiEnvelope {
            success: None,
            data: Some(ModelStatusData {
                is_model_built: self.model_built.load(Ordering::SeqCst),
            }),
            error: None,
            message: None,
        })
    }

    async fn build_model(&self) -> Result<ApiEnvelope<Value>, TransportError> {
        self.calls.build.fetch_add(1, Ordering::SeqCst);
        if !self.build_delay.is_zero() {
            tokio::time::sleep(self.build_delay).await;
        }
        if self.build_succeeds {
            self.model_built.store(true, Ordering::SeqCst);
            Ok(ApiEnvelope::ok(json!({ "documents": 120 })))
        } else {
            Ok(ApiEnvelope::failed("not enough CVs to build model"))
        }
    }

    async fn upload_cvs(
        &self,
        upload: &UploadPayload,
    ) -> Result<ApiEnvelope<UploadCvData>, TransportError> {
        self.calls.upload.fetch_add(1, Ordering::SeqCst);
        *self.uploaded.lock().unwrap() = upload.files.iter().map(|f| f.name.clone()).collect();
        self.submit_reply(|items| UploadCvData {
            total_recommendations: items.as_ref().map(|i| i.len() as u64),
            job_recommendations: items,
        })
        .await
    }

    async fn cvs_for_custom_job(
        &self,
        job: &JobDescriptor,
        limit: u32,
    ) -> Result<ApiEnvelope<CvMatchData>, TransportError> {
        self.calls.custom_job.fetch_add(1, Ordering::SeqCst);
        *self.last_job.lock().unwrap() = Some(job.clone());
        *self.last_limit.lock().unwrap() = Some(limit);
        self.submit_reply(|items| CvMatchData {
            recommendations: items,
            total_cvs_analyzed: Some(50),
        })
        .await
    }

    async fn cvs_for_job(
        &self,
        job_id: &str,
        limit: u32,
    ) -> Result<ApiEnvelope<CvMatchData>, TransportError> {
        self.calls.cvs_for_job.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = Some(limit);
        *self.last_job_id.lock().unwrap() = Some(job_id.to_string());
        self.submit_reply(|items| CvMatchData {
            recommendations: items,
            total_cvs_analyzed: None,
        })
        .await
    }

    async fn jobs(&self, limit: u32) -> Result<ApiEnvelope<JobsData>, TransportError> {
        self.calls.catalog.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = Some(limit);
        let jobs: Vec<Job> = serde_json::from_value(json!([
            { "id": 1, "title": "Backend Developer", "company": "Acme" },
            { "id": "2", "title": "Tester" }
        ]))?;
        Ok(ApiEnvelope::ok(JobsData { jobs }))
    }

    async fn job(&self, job_id: &str) -> Result<ApiEnvelope<JobData>, TransportError> {
        self.calls.catalog.fetch_add(1, Ordering::SeqCst);
        if job_id == "404" {
            return Ok(ApiEnvelope::failed("Job not found"));
        }
        let job: Job = serde_json::from_value(json!({ "id": job_id, "title": "Backend Developer" }))?;
        Ok(ApiEnvelope::ok(JobData { job }))
    }

    async fn salary_report(&self) -> Result<SalaryReport, TransportError> {
        self.calls.catalog.fetch_add(1, Ordering::SeqCst);
        Ok(SalaryReport {
            average_salaries: vec![SalaryBucket {
                category: "IT".to_string(),
                average_salary: 21_500_000.0,
            }],
        })
    }
}
