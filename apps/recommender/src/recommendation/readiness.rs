//! Model Readiness Guard: makes sure the server-side scoring model is built
//! before a match query goes out.
//!
//! The status check runs on every call; the backend is the source of truth.
//! A build in progress is shared: concurrent callers await the same future
//! instead of issuing a second build.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::errors::{RecommendError, Step, StepContext};
use crate::transport::Transport;

type BuildFuture = Shared<BoxFuture<'static, Result<(), RecommendError>>>;
type BuildSlot = Mutex<Option<BuildFuture>>;

/// How the model came to be ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    AlreadyBuilt,
    Built,
}

pub struct ModelReadinessGuard {
    transport: Arc<dyn Transport>,
    in_flight: Arc<BuildSlot>,
}

impl ModelReadinessGuard {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn ensure_model_ready(&self) -> Result<Readiness, RecommendError> {
        self.ensure_model_ready_with(|| {}).await
    }

    /// Like `ensure_model_ready`, calling `on_build` once the status check
    /// has established that a build is needed.
    pub async fn ensure_model_ready_with<F>(&self, on_build: F) -> Result<Readiness, RecommendError>
    where
        F: FnOnce() + Send,
    {
        let status = self
            .transport
            .model_status()
            .await
            .and_then(|envelope| envelope.into_data())
            .at_step(Step::StatusCheck)?;

        if status.is_model_built {
            debug!("Scoring model already built");
            return Ok(Readiness::AlreadyBuilt);
        }

        on_build();
        self.shared_build().await?;
        Ok(Readiness::Built)
    }

    /// True while a build request issued through this guard is outstanding.
    pub fn build_in_flight(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the in-flight build, starting one if there is none.
    fn shared_build(&self) -> BuildFuture {
        let mut slot = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = slot.as_ref() {
            info!("Model build already in flight; awaiting its outcome");
            return existing.clone();
        }

        info!("Scoring model not built; requesting build");
        let transport = Arc::clone(&self.transport);
        let release = Arc::downgrade(&self.in_flight);
        let build = async move {
            let result = request_build(transport.as_ref()).await;
            clear_slot(&release);
            result
        }
        .boxed()
        .shared();

        *slot = Some(build.clone());
        build
    }
}

async fn request_build(transport: &dyn Transport) -> Result<(), RecommendError> {
    let envelope = transport.build_model().await.at_step(Step::Build)?;

    if envelope.success == Some(true) {
        info!("Scoring model built");
        Ok(())
    } else {
        let message = envelope.failure_message();
        warn!("Model build reported failure: {}", message);
        Err(RecommendError::ModelBuild(message))
    }
}

fn clear_slot(slot: &Weak<BuildSlot>) {
    if let Some(slot) = slot.upgrade() {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
