//! Workflow orchestrator
//!
//! Drives one recommendation run through its states:
//!
//! ```text
//! Idle → Initializing → CheckingModel → (BuildingModel) → Submitting → Success | Empty | Failed
//! ```
//!
//! Runs are single-flight per orchestrator: a second `run` while one is in
//! progress is rejected with `ConcurrentRequest` and leaves the first run
//! untouched. `cancel` aborts the in-flight transport call and resets to
//! `Idle`; whatever the cancelled run would have produced is discarded.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::normalizer::normalize;
use super::packager::{package, UploadPayload};
use super::readiness::ModelReadinessGuard;
use super::state::{ProgressEvent, RecommendationSet, WorkflowState};
use crate::config::Limits;
use crate::errors::{RecommendError, Step, StepContext};
use crate::models::{CandidateFile, JobDescriptor, RecommendationRaw};
use crate::transport::{ApiEnvelope, Transport};

const PROGRESS_CAPACITY: usize = 64;

/// What the user asked for.
#[derive(Debug, Clone)]
pub enum WorkflowInput {
    /// One or more CVs; returns matching jobs.
    Files(Vec<CandidateFile>),
    /// A free-form job description; returns matching CVs.
    Job(JobDescriptor),
    /// An existing catalog job; returns matching CVs.
    JobId(String),
}

/// Validated input, ready to submit.
enum Submission {
    Upload(UploadPayload),
    CustomJob(JobDescriptor),
    ExistingJob(String),
}

impl Submission {
    fn prepare(input: WorkflowInput) -> Result<Self, RecommendError> {
        match input {
            WorkflowInput::Files(files) => package(files).map(Submission::Upload),
            WorkflowInput::Job(job) => {
                let job = job.normalized();
                job.validate()?;
                Ok(Submission::CustomJob(job))
            }
            WorkflowInput::JobId(job_id) => {
                let job_id = job_id.trim().to_string();
                if job_id.is_empty() {
                    return Err(RecommendError::Validation(
                        "Job id cannot be empty".to_string(),
                    ));
                }
                Ok(Submission::ExistingJob(job_id))
            }
        }
    }

    /// Only the CV upload flow goes through `/complete-flow/initialize`.
    fn needs_initialize(&self) -> bool {
        matches!(self, Submission::Upload(_))
    }

    fn progress_message(&self) -> String {
        match self {
            Submission::Upload(payload) => format!(
                "Uploading and analyzing {} CV file(s)",
                payload.files.len()
            ),
            Submission::CustomJob(job) => format!("Searching for CVs matching '{}'", job.title),
            Submission::ExistingJob(job_id) => format!("Searching for CVs matching job {job_id}"),
        }
    }
}

struct Submitted {
    raw: Vec<RecommendationRaw>,
    total_analyzed: Option<u64>,
    rejected_files: Vec<String>,
}

/// Why a run stopped before reaching a terminal state of its own.
enum Interrupt {
    Cancelled,
    Failed(RecommendError),
}

struct ActiveRun {
    id: Uuid,
    cancel: CancellationToken,
}

/// Resets the orchestrator if a run future is dropped mid-flight.
struct AbandonOnDrop<'a> {
    orchestrator: &'a Orchestrator,
    run_id: Uuid,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        self.orchestrator.abandon(self.run_id);
    }
}

/// One independent recommendation workflow. Nothing is shared between
/// instances; each owns its state, its model-build cache and its run slot.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    guard: ModelReadinessGuard,
    limits: Limits,
    state: watch::Sender<WorkflowState>,
    progress: broadcast::Sender<ProgressEvent>,
    active: Mutex<Option<ActiveRun>>,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>, limits: Limits) -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        let (progress, _) = broadcast::channel(PROGRESS_CAPACITY);

        Self {
            guard: ModelReadinessGuard::new(Arc::clone(&transport)),
            transport,
            limits,
            state,
            progress,
            active: Mutex::new(None),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// Read-only view of the current state.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// Every transition, in order, with a human-readable message.
    pub fn progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    /// Runs one workflow to completion.
    ///
    /// Returns `Err` only for rejections that never enter the state machine
    /// (validation, concurrent run). Remote failures come back as
    /// `Ok(WorkflowState::Failed)`; a cancelled run comes back as
    /// `Ok(WorkflowState::Idle)`.
    pub async fn run(&self, input: WorkflowInput) -> Result<WorkflowState, RecommendError> {
        if self.state.borrow().is_busy() {
            warn!("Rejecting recommendation request: a run is already in progress");
            return Err(RecommendError::ConcurrentRequest);
        }

        let submission = Submission::prepare(input).map_err(|err| {
            warn!("Rejecting recommendation request: {}", err);
            err
        })?;

        let (run_id, cancel) = self.begin()?;
        let _abandon = AbandonOnDrop {
            orchestrator: self,
            run_id,
        };

        let final_state = match self.execute(run_id, &cancel, submission).await {
            Ok(state) => self.finish(run_id, state),
            Err(Interrupt::Failed(err)) => {
                warn!(run_id = %run_id, "Recommendation run failed: {}", err);
                self.finish(run_id, WorkflowState::Failed(err))
            }
            Err(Interrupt::Cancelled) => {
                info!(run_id = %run_id, "Recommendation run stopped after cancellation");
                WorkflowState::Idle
            }
        };

        Ok(final_state)
    }

    /// Cancels the in-flight run, if any, and resets to `Idle`.
    pub fn cancel(&self) -> bool {
        let mut active = self.lock_active();
        let Some(run) = active.take() else {
            return false;
        };

        run.cancel.cancel();
        info!(run_id = %run.id, "Recommendation run cancelled");
        self.publish(run.id, WorkflowState::Idle, "Cancelled".to_string());
        true
    }

    async fn execute(
        &self,
        run_id: Uuid,
        cancel: &CancellationToken,
        submission: Submission,
    ) -> Result<WorkflowState, Interrupt> {
        if submission.needs_initialize() {
            until_cancelled(cancel, async {
                self.transport.initialize().await.at_step(Step::Initialize)
            })
            .await?;
        }

        self.transition(
            run_id,
            WorkflowState::CheckingModel,
            "Checking scoring model".to_string(),
        );
        let readiness = until_cancelled(
            cancel,
            self.guard.ensure_model_ready_with(|| {
                self.transition(
                    run_id,
                    WorkflowState::BuildingModel,
                    "Building scoring model".to_string(),
                )
            }),
        )
        .await?;
        debug!(run_id = %run_id, ?readiness, "Scoring model ready");

        self.transition(
            run_id,
            WorkflowState::Submitting,
            submission.progress_message(),
        );
        let submitted = until_cancelled(cancel, self.submit(&submission)).await?;

        let items = normalize(&submitted.raw);
        if items.is_empty() {
            return Ok(WorkflowState::Empty);
        }

        Ok(WorkflowState::Success(RecommendationSet {
            items,
            total_analyzed: submitted.total_analyzed,
            rejected_files: submitted.rejected_files,
        }))
    }

    async fn submit(&self, submission: &Submission) -> Result<Submitted, RecommendError> {
        match submission {
            Submission::Upload(payload) => {
                let data = self
                    .transport
                    .upload_cvs(payload)
                    .await
                    .and_then(ApiEnvelope::into_success)
                    .at_step(Step::Submit)?
                    .unwrap_or_default();
                Ok(Submitted {
                    raw: data.job_recommendations.unwrap_or_default(),
                    total_analyzed: data.total_recommendations,
                    rejected_files: payload.rejected.clone(),
                })
            }
            Submission::CustomJob(job) => {
                let data = self
                    .transport
                    .cvs_for_custom_job(job, self.limits.custom_job)
                    .await
                    .and_then(ApiEnvelope::into_success)
                    .at_step(Step::Submit)?
                    .unwrap_or_default();
                Ok(Submitted {
                    raw: data.recommendations.unwrap_or_default(),
                    total_analyzed: data.total_cvs_analyzed,
                    rejected_files: Vec::new(),
                })
            }
            Submission::ExistingJob(job_id) => {
                let data = self
                    .transport
                    .cvs_for_job(job_id, self.limits.cvs_for_job)
                    .await
                    .and_then(ApiEnvelope::into_success)
                    .at_step(Step::Submit)?
                    .unwrap_or_default();
                Ok(Submitted {
                    raw: data.recommendations.unwrap_or_default(),
                    total_analyzed: data.total_cvs_analyzed,
                    rejected_files: Vec::new(),
                })
            }
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the run slot and enters `Initializing`.
    fn begin(&self) -> Result<(Uuid, CancellationToken), RecommendError> {
        let mut active = self.lock_active();
        if active.is_some() {
            warn!("Rejecting recommendation request: a run is already in progress");
            return Err(RecommendError::ConcurrentRequest);
        }

        let run = ActiveRun {
            id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
        };
        let claimed = (run.id, run.cancel.clone());
        *active = Some(run);

        info!(run_id = %claimed.0, "Recommendation run started");
        self.publish(
            claimed.0,
            WorkflowState::Initializing,
            "Initializing recommendation system".to_string(),
        );
        Ok(claimed)
    }

    /// Publishes an intermediate state if `run_id` is still the active run.
    fn transition(&self, run_id: Uuid, state: WorkflowState, message: String) {
        let active = self.lock_active();
        if active.as_ref().map(|run| run.id) == Some(run_id) {
            self.publish(run_id, state, message);
        }
    }

    /// Publishes a terminal state and releases the run slot. A run that was
    /// cancelled in the meantime gets `Idle` back and publishes nothing.
    fn finish(&self, run_id: Uuid, state: WorkflowState) -> WorkflowState {
        let mut active = self.lock_active();
        if active.as_ref().map(|run| run.id) != Some(run_id) {
            debug!(run_id = %run_id, "Discarding result of a cancelled run");
            return WorkflowState::Idle;
        }
        *active = None;
        debug_assert!(state.is_terminal(), "finish called with {}", state.name());

        let message = match &state {
            WorkflowState::Success(set) => match set.total_analyzed {
                Some(total) => format!("Found {} recommendations out of {}", set.items.len(), total),
                None => format!("Found {} recommendations", set.items.len()),
            },
            WorkflowState::Empty => "No recommendations found".to_string(),
            WorkflowState::Failed(err) => err.to_string(),
            other => other.name().to_string(),
        };
        info!(run_id = %run_id, state = state.name(), "{}", message);
        self.publish(run_id, state.clone(), message);
        state
    }

    fn abandon(&self, run_id: Uuid) {
        let mut active = self.lock_active();
        if active.as_ref().map(|run| run.id) != Some(run_id) {
            return;
        }
        if let Some(run) = active.take() {
            run.cancel.cancel();
            warn!(run_id = %run_id, "Recommendation run dropped before completion");
            self.publish(run_id, WorkflowState::Idle, "Abandoned".to_string());
        }
    }

    fn publish(&self, run_id: Uuid, state: WorkflowState, message: String) {
        let name = state.name();
        debug!(run_id = %run_id, state = name, "{}", message);
        self.state.send_replace(state);
        // No subscribers is fine
        let _ = self.progress.send(ProgressEvent {
            run_id,
            state: name,
            message,
            at: Utc::now(),
        });
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    step: impl Future<Output = Result<T, RecommendError>>,
) -> Result<T, Interrupt> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        result = step => result.map_err(Interrupt::Failed),
    }
}
