//! The generation backend seam.
//!
//! [`JobOrchestrator`](crate::orchestrator::JobOrchestrator) is written
//! against [`GenerationBackend`] rather than [`PosterApi`] so tests can
//! drive it with scripted responses.

use std::future::Future;
use std::sync::Arc;

use maptoposter_core::generation::GenerationConfig;

use crate::api::{PosterApi, PosterApiError};
use crate::job::JobStatusReport;

/// Submits generation jobs and reports their status.
pub trait GenerationBackend: Send + Sync {
    /// Start a job for `config` and return its identifier.
    fn generate(
        &self,
        config: &GenerationConfig,
    ) -> impl Future<Output = Result<String, PosterApiError>> + Send;

    /// Fetch the current status of `job_id`.
    fn status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<JobStatusReport, PosterApiError>> + Send;
}

impl GenerationBackend for PosterApi {
    fn generate(
        &self,
        config: &GenerationConfig,
    ) -> impl Future<Output = Result<String, PosterApiError>> + Send {
        self.submit_generation(config)
    }

    fn status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<JobStatusReport, PosterApiError>> + Send {
        self.job_status(job_id)
    }
}

impl<B: GenerationBackend> GenerationBackend for Arc<B> {
    fn generate(
        &self,
        config: &GenerationConfig,
    ) -> impl Future<Output = Result<String, PosterApiError>> + Send {
        (**self).generate(config)
    }

    fn status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<JobStatusReport, PosterApiError>> + Send {
        (**self).status(job_id)
    }
}
