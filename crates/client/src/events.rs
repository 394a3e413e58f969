//! Job lifecycle events emitted by the orchestrator.
//!
//! Subscribers receive these over a broadcast channel, in the order the
//! orchestrator applied them. Events from superseded jobs are never sent.

use serde::Serialize;

use crate::job::PosterArtifact;
use crate::orchestrator::JobFailure;

/// A state change of the active generation job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JobEvent {
    /// The backend accepted the job and polling has started.
    Submitted { job_id: String },

    /// A poll reported the job still running.
    Progress {
        job_id: String,
        /// Completion percentage (0-100).
        progress: u8,
        message: String,
    },

    /// The job finished and produced a poster.
    Completed {
        job_id: String,
        artifact: PosterArtifact,
    },

    /// Submission or the job itself failed.
    Failed {
        /// `None` when submission failed before a job existed.
        job_id: Option<String>,
        failure: JobFailure,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Submitted { job_id }
            | Self::Progress { job_id, .. }
            | Self::Completed { job_id, .. } => Some(job_id),
            Self::Failed { job_id, .. } => job_id.as_deref(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}
