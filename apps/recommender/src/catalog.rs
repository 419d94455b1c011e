//! Read-only catalog queries: the job list, single jobs and the salary
//! report. These bypass the workflow state machine entirely.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Limits;
use crate::errors::{RecommendError, Step, StepContext};
use crate::models::{Job, SalaryReport};
use crate::transport::{ApiEnvelope, Transport};

pub struct Catalog {
    transport: Arc<dyn Transport>,
    limits: Limits,
}

impl Catalog {
    pub fn new(transport: Arc<dyn Transport>, limits: Limits) -> Self {
        Self { transport, limits }
    }

    /// Jobs available for `cvs-for-job`, capped at `limit` (or the
    /// configured default).
    pub async fn list_jobs(&self, limit: Option<u32>) -> Result<Vec<Job>, RecommendError> {
        let limit = limit.unwrap_or(self.limits.jobs);
        let jobs = self
            .transport
            .jobs(limit)
            .await
            .and_then(ApiEnvelope::into_data)
            .at_step(Step::Catalog)?
            .jobs;

        info!("Fetched {} jobs (limit {})", jobs.len(), limit);
        Ok(jobs)
    }

    pub async fn job(&self, job_id: &str) -> Result<Job, RecommendError> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(RecommendError::Validation(
                "Job id cannot be empty".to_string(),
            ));
        }

        let job = self
            .transport
            .job(job_id)
            .await
            .and_then(ApiEnvelope::into_data)
            .at_step(Step::Catalog)?
            .job;

        debug!(job_id = %job.id, "Fetched job");
        Ok(job)
    }

    /// Average salary per job category.
    pub async fn salary_report(&self) -> Result<SalaryReport, RecommendError> {
        let report = self
            .transport
            .salary_report()
            .await
            .at_step(Step::Catalog)?;

        debug!("Salary report has {} categories", report.average_salaries.len());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::recommendation::testing::{CallCounts, ScriptedTransport};

    fn catalog() -> (Catalog, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        (Catalog::new(transport.clone(), Limits::default()), transport)
    }

    #[tokio::test]
    async fn test_list_jobs_uses_default_limit() {
        let (catalog, transport) = catalog();

        let jobs = catalog.list_jobs(None).await.unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "1");
        assert_eq!(jobs[1].id, "2");
        assert_eq!(*transport.last_limit.lock().unwrap(), Some(100));

        catalog.list_jobs(Some(5)).await.unwrap();
        assert_eq!(*transport.last_limit.lock().unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_job_lookup() {
        let (catalog, _) = catalog();
        let job = catalog.job(" 7 ").await.unwrap();
        assert_eq!(job.id, "7");
        assert_eq!(job.title.as_deref(), Some("Backend Developer"));
    }

    #[tokio::test]
    async fn test_missing_job_is_catalog_rejection() {
        let (catalog, _) = catalog();
        match catalog.job("404").await {
            Err(RecommendError::Transport { step, source }) => {
                assert_eq!(step, Step::Catalog);
                assert!(matches!(*source, TransportError::Rejected(ref m) if m == "Job not found"));
            }
            other => panic!("expected catalog failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_job_id_never_hits_backend() {
        let (catalog, transport) = catalog();
        assert!(matches!(
            catalog.job("   ").await,
            Err(RecommendError::Validation(_))
        ));
        assert_eq!(CallCounts::get(&transport.calls.catalog), 0);
    }

    #[tokio::test]
    async fn test_salary_report() {
        let (catalog, _) = catalog();
        let report = catalog.salary_report().await.unwrap();
        assert_eq!(report.average_salaries.len(), 1);
        assert_eq!(report.average_salaries[0].category, "IT");
    }
}
