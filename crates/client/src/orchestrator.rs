//! Generation job orchestrator.
//!
//! [`JobOrchestrator`] submits a [`GenerationConfig`], then polls the
//! backend on a fixed interval until the job completes or fails. Only one
//! job is active at a time: a new [`submit`](JobOrchestrator::submit) or a
//! [`dismiss`](JobOrchestrator::dismiss) abandons the previous job on the
//! client side (the backend is not told).
//!
//! Every submission takes a ticket from a monotonically increasing
//! counter. Results are applied only while their ticket is current, and
//! the ticket check and the state update happen under one lock, so a
//! superseded poll loop can never overwrite a newer job's state. The loop
//! of a superseded job is also cancelled through its
//! [`CancellationToken`] so it stops polling.
//!
//! State snapshots are published on a [`watch`] channel and lifecycle
//! events on a [`broadcast`] channel.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use maptoposter_core::generation::GenerationConfig;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::backend::GenerationBackend;
use crate::events::JobEvent;
use crate::job::{JobPhase, JobStatusReport, PosterArtifact};

/// Broadcast channel capacity for job events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Where a job failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// The request could not be made or its response was unusable.
    Transport,
    /// The backend reported the job as failed.
    Backend,
}

/// Why a job ended in [`JobState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Backend,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of the active job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// No job, or the last one was dismissed.
    Idle,
    /// Waiting for the backend to accept the job.
    Submitting,
    /// The job is running; the poll loop is active.
    Polling {
        job_id: String,
        progress: u8,
        message: String,
    },
    Complete {
        job_id: String,
        artifact: PosterArtifact,
    },
    Failed {
        /// `None` when submission failed before a job existed.
        job_id: Option<String>,
        failure: JobFailure,
    },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }

    /// Whether a new submission should be offered to the user.
    pub fn accepts_submission(&self) -> bool {
        !matches!(self, Self::Submitting | Self::Polling { .. })
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Idle | Self::Submitting => None,
            Self::Polling { job_id, .. } | Self::Complete { job_id, .. } => Some(job_id),
            Self::Failed { job_id, .. } => job_id.as_deref(),
        }
    }
}

/// Tunable parameters for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Fixed delay between status polls. Polling is unbounded.
    pub poll_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct Active {
    ticket: u64,
    cancel: CancellationToken,
}

/// State shared between the orchestrator handle and its poll loop.
struct Shared {
    active: Mutex<Active>,
    state_tx: watch::Sender<JobState>,
    event_tx: broadcast::Sender<JobEvent>,
}

impl Shared {
    fn new() -> Self {
        let (state_tx, _) = watch::channel(JobState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            active: Mutex::new(Active {
                ticket: 0,
                cancel: CancellationToken::new(),
            }),
            state_tx,
            event_tx,
        }
    }

    /// Supersede the active job and publish `state` for the new ticket.
    fn advance(&self, state: JobState) -> (u64, CancellationToken) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.cancel.cancel();
        active.ticket += 1;
        active.cancel = CancellationToken::new();
        self.state_tx.send_replace(state);
        (active.ticket, active.cancel.clone())
    }

    /// Publish `state` (and `event`) if `ticket` is still current.
    ///
    /// Returns `false` when the result belongs to a superseded job.
    fn apply(&self, ticket: u64, state: JobState, event: JobEvent) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.ticket != ticket {
            tracing::debug!(ticket, current = active.ticket, "Discarding stale job result");
            return false;
        }
        self.state_tx.send_replace(state);
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
        true
    }

    fn cancel_active(&self) {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives generation jobs against a [`GenerationBackend`].
///
/// Dropping the orchestrator stops the active poll loop.
pub struct JobOrchestrator<B> {
    backend: Arc<B>,
    shared: Arc<Shared>,
    config: OrchestratorConfig,
}

impl<B: GenerationBackend + 'static> JobOrchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, OrchestratorConfig::default())
    }

    pub fn with_config(backend: B, config: OrchestratorConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            shared: Arc::new(Shared::new()),
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> JobState {
        self.shared.state_tx.borrow().clone()
    }

    /// Receive lifecycle events of jobs applied from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Watch state snapshots.
    pub fn watch(&self) -> watch::Receiver<JobState> {
        self.shared.state_tx.subscribe()
    }

    /// Submit `config` as a new job, abandoning any active one.
    ///
    /// Resolves once the backend has accepted or rejected the job; polling
    /// continues in the background. Returns the job ID, including when a
    /// later submission superseded this one while it was in flight (its
    /// result is then discarded and no polling starts).
    pub async fn submit(&self, config: GenerationConfig) -> Result<String, JobFailure> {
        let (ticket, cancel) = self.shared.advance(JobState::Submitting);
        tracing::info!(ticket, city = %config.city, theme = %config.theme, "Submitting generation job");

        let job_id = match self.backend.generate(&config).await {
            Ok(job_id) => job_id,
            Err(e) => {
                tracing::error!(ticket, error = %e, "Generation request failed");
                let failure = JobFailure::transport(e.to_string());
                self.shared.apply(
                    ticket,
                    JobState::Failed {
                        job_id: None,
                        failure: failure.clone(),
                    },
                    JobEvent::Failed {
                        job_id: None,
                        failure: failure.clone(),
                    },
                );
                return Err(failure);
            }
        };

        let polling = JobState::Polling {
            job_id: job_id.clone(),
            progress: 0,
            message: String::new(),
        };
        let submitted = JobEvent::Submitted {
            job_id: job_id.clone(),
        };
        if self.shared.apply(ticket, polling, submitted) {
            tracing::info!(ticket, job_id = %job_id, "Generation job accepted");
            tokio::spawn(poll_loop(
                Arc::clone(&self.backend),
                Arc::clone(&self.shared),
                ticket,
                job_id.clone(),
                cancel,
                self.config.poll_interval,
            ));
        }

        Ok(job_id)
    }

    /// Resolve once the current job is settled: terminal, or dismissed.
    pub async fn wait_for_terminal(&self) -> JobState {
        let mut rx = self.shared.state_tx.subscribe();
        let settled = rx
            .wait_for(|s| s.is_terminal() || matches!(s, JobState::Idle))
            .await
            .map(|s| s.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// Abandon the active job and return to [`JobState::Idle`].
    pub fn dismiss(&self) {
        let (ticket, _) = self.shared.advance(JobState::Idle);
        tracing::debug!(ticket, "Job dismissed");
    }
}

impl<B> Drop for JobOrchestrator<B> {
    fn drop(&mut self) {
        self.shared.cancel_active();
    }
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Poll `job_id` until it settles, the ticket is superseded, or `cancel`
/// fires. The first poll runs immediately.
async fn poll_loop<B: GenerationBackend>(
    backend: Arc<B>,
    shared: Arc<Shared>,
    ticket: u64,
    job_id: String,
    cancel: CancellationToken,
    interval: Duration,
) {
    let mut attempt = 0u64;

    loop {
        attempt += 1;
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(ticket, job_id = %job_id, "Poll loop cancelled");
                return;
            }
            result = backend.status(&job_id) => result,
        };

        let (state, event) = match result {
            Ok(report) => {
                tracing::debug!(
                    job_id = %job_id,
                    attempt,
                    status = ?report.status,
                    progress = report.progress,
                    "Polled job status",
                );
                transition(&job_id, report)
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, attempt, error = %e, "Status request failed");
                failed(&job_id, JobFailure::transport(e.to_string()))
            }
        };

        let settled = state.is_terminal();
        if !shared.apply(ticket, state, event) || settled {
            if settled {
                tracing::info!(job_id = %job_id, attempts = attempt, "Generation job settled");
            }
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(ticket, job_id = %job_id, "Poll loop cancelled");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Map one status report to the next state and its event.
fn transition(job_id: &str, report: JobStatusReport) -> (JobState, JobEvent) {
    match report.status {
        JobPhase::Running => (
            JobState::Polling {
                job_id: job_id.to_string(),
                progress: report.progress,
                message: report.message.clone(),
            },
            JobEvent::Progress {
                job_id: job_id.to_string(),
                progress: report.progress,
                message: report.message,
            },
        ),
        JobPhase::Complete => match report.artifact() {
            Some(artifact) => (
                JobState::Complete {
                    job_id: job_id.to_string(),
                    artifact: artifact.clone(),
                },
                JobEvent::Completed {
                    job_id: job_id.to_string(),
                    artifact,
                },
            ),
            None => failed(
                job_id,
                JobFailure::backend("Job completed without an output file"),
            ),
        },
        JobPhase::Error => failed(job_id, JobFailure::backend(report.failure_message())),
    }
}

fn failed(job_id: &str, failure: JobFailure) -> (JobState, JobEvent) {
    (
        JobState::Failed {
            job_id: Some(job_id.to_string()),
            failure: failure.clone(),
        },
        JobEvent::Failed {
            job_id: Some(job_id.to_string()),
            failure,
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
