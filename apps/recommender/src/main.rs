mod cli;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recommender::models::CandidateFile;
use recommender::{
    Catalog, Config, HttpTransport, Limits, ModelReadinessGuard, Orchestrator, ProgressEvent,
    Transport, WorkflowInput, WorkflowState,
};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }

    // Logs go to stderr so stdout stays clean for results
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting recommender v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.api_url
    );
    if config.token.is_none() {
        warn!("RECOMMENDER_TOKEN not set; requests are sent without authorization");
    }

    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(config.transport_config()).context("Failed to build HTTP client")?,
    );
    let json = cli.json;

    match cli.command {
        Command::Upload { files } => {
            let mut candidates = Vec::with_capacity(files.len());
            for path in &files {
                let file = CandidateFile::from_path(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                info!("Loaded {} ({})", file.name, file.size_label());
                candidates.push(file);
            }
            run_workflow(transport, config.limits, WorkflowInput::Files(candidates), json).await
        }
        Command::CustomJob(args) => {
            let job = args.load().await?;
            run_workflow(transport, config.limits, WorkflowInput::Job(job), json).await
        }
        Command::CvsForJob { job_id } => {
            run_workflow(transport, config.limits, WorkflowInput::JobId(job_id), json).await
        }
        Command::Jobs { limit } => {
            let jobs = Catalog::new(transport, config.limits)
                .list_jobs(limit)
                .await?;
            output(json, &jobs, || cli::render_jobs(&jobs))
        }
        Command::Job { job_id } => {
            let job = Catalog::new(transport, config.limits).job(&job_id).await?;
            output(json, &job, || cli::render_job(&job))
        }
        Command::SalaryReport => {
            let report = Catalog::new(transport, config.limits)
                .salary_report()
                .await?;
            output(json, &report, || cli::render_salary_report(&report))
        }
        Command::ModelStatus { build } => model_status(transport, build, json).await,
    }
}

async fn run_workflow(
    transport: Arc<dyn Transport>,
    limits: Limits,
    input: WorkflowInput,
    json: bool,
) -> Result<()> {
    let orchestrator = Orchestrator::new(transport, limits);
    let printer = tokio::spawn(print_progress(orchestrator.progress()));

    let outcome = {
        let run = orchestrator.run(input);
        tokio::pin!(run);

        tokio::select! {
            outcome = &mut run => outcome,
            _ = interrupt_requested(tokio::signal::ctrl_c()) => {
                warn!("Interrupted; cancelling the current run");
                orchestrator.cancel();
                run.await
            }
        }
    };

    // Closing the channel ends the printer
    drop(orchestrator);
    let _ = printer.await;

    match outcome? {
        WorkflowState::Success(set) => output(json, &set, || cli::render_recommendations(&set)),
        WorkflowState::Empty => {
            if json {
                println!("[]");
            } else {
                println!("No recommendations found");
            }
            Ok(())
        }
        WorkflowState::Failed(err) => Err(anyhow::Error::new(err).context("Recommendation failed")),
        WorkflowState::Idle => {
            eprintln!("Cancelled");
            Ok(())
        }
        other => {
            warn!("Run ended in unexpected state {}", other.name());
            Ok(())
        }
    }
}

async fn model_status(transport: Arc<dyn Transport>, build: bool, json: bool) -> Result<()> {
    if build {
        let readiness = ModelReadinessGuard::new(transport)
            .ensure_model_ready()
            .await?;
        println!("Scoring model ready ({readiness:?})");
        return Ok(());
    }

    let status = transport
        .model_status()
        .await
        .and_then(|envelope| envelope.into_data())
        .context("Failed to fetch model status")?;
    output(json, &status, || {
        vec![if status.is_model_built {
            "Scoring model is built".to_string()
        } else {
            "Scoring model is not built".to_string()
        }]
    })
}

/// Resolves once the user hits Ctrl-C. If the handler cannot be installed
/// it never resolves, so the run continues uninterruptible.
async fn interrupt_requested(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(err) = signal.await {
        warn!("Ctrl-C handler unavailable, runs cannot be interrupted: {}", err);
        std::future::pending::<()>().await;
    }
}

async fn print_progress(mut events: broadcast::Receiver<ProgressEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => eprintln!("[{}] {}", event.state, event.message),
            Err(RecvError::Lagged(skipped)) => warn!("Skipped {} progress events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

fn output<T: Serialize>(json: bool, value: &T, render: impl FnOnce() -> Vec<String>) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        for line in render() {
            println!("{line}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_failed_signal_handler_never_interrupts() {
        let failed = async { Err(io::Error::new(io::ErrorKind::Other, "no signal driver")) };
        let waited = tokio::time::timeout(Duration::from_secs(3600), interrupt_requested(failed)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_delivered_signal_interrupts() {
        interrupt_requested(async { Ok(()) }).await;
    }
}
