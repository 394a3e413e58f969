//! Job status wire types and the output artifact.

use serde::{Deserialize, Deserializer, Serialize};

/// Message used when the backend reports an error without details.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Generation failed";

/// Phase of a backend job as reported by the status endpoint.
///
/// Only `complete` and `error` are terminal. The backend reports several
/// in-flight phases (`starting`, `geocoding`, `downloading`, ...); all of
/// them read as [`JobPhase::Running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Complete,
    Error,
    #[serde(other)]
    Running,
}

/// Body of `GET /api/status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobStatusReport {
    pub status: JobPhase,
    /// Completion percentage, clamped to 0-100.
    #[serde(default, deserialize_with = "clamped_progress")]
    pub progress: u8,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusReport {
    pub fn running(progress: u8, message: impl Into<String>) -> Self {
        Self {
            status: JobPhase::Running,
            progress: progress.min(100),
            message: message.into(),
            output_file: None,
            error: None,
        }
    }

    pub fn complete(output_file: impl Into<String>) -> Self {
        Self {
            status: JobPhase::Complete,
            progress: 100,
            message: String::new(),
            output_file: Some(output_file.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobPhase::Error,
            progress: 0,
            message: DEFAULT_FAILURE_MESSAGE.to_string(),
            output_file: None,
            error: Some(error.into()),
        }
    }

    /// The reported error, falling back to [`DEFAULT_FAILURE_MESSAGE`].
    pub fn failure_message(&self) -> &str {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
    }

    /// The artifact of a completed job, if the backend named one.
    pub fn artifact(&self) -> Option<PosterArtifact> {
        self.output_file
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(PosterArtifact::new)
    }
}

fn clamped_progress<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let value = Option::<f64>::deserialize(d)?.unwrap_or(0.0);
    if !value.is_finite() {
        return Ok(0);
    }
    Ok(value.clamp(0.0, 100.0) as u8)
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// The rendered poster of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterArtifact {
    /// Path as reported by the backend (may include directories).
    pub output_file: String,
}

impl PosterArtifact {
    pub fn new(output_file: impl Into<String>) -> Self {
        Self {
            output_file: output_file.into(),
        }
    }

    /// Last path component of the backend's output path.
    pub fn file_name(&self) -> &str {
        self.output_file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.output_file)
    }

    /// Route serving the full-resolution poster.
    pub fn download_path(&self) -> String {
        format!("/api/poster/{}", self.file_name())
    }

    /// Route serving a preview-sized poster.
    pub fn thumbnail_path(&self) -> String {
        format!("/api/poster/thumbnail/{}", self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(value: serde_json::Value) -> JobStatusReport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn in_flight_phases_read_as_running() {
        for status in ["starting", "geocoding", "downloading", "running", "rendering"] {
            let r = report(json!({"status": status, "progress": 10, "message": "..."}));
            assert_eq!(r.status, JobPhase::Running, "{status}");
        }
        assert_eq!(report(json!({"status": "complete"})).status, JobPhase::Complete);
        assert_eq!(report(json!({"status": "error"})).status, JobPhase::Error);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(report(json!({"status": "running", "progress": 140})).progress, 100);
        assert_eq!(report(json!({"status": "running", "progress": -3})).progress, 0);
        assert_eq!(report(json!({"status": "running", "progress": 42.7})).progress, 42);
        assert_eq!(report(json!({"status": "running", "progress": null})).progress, 0);
        assert_eq!(report(json!({"status": "running"})).progress, 0);
    }

    #[test]
    fn null_fields_decode_as_missing() {
        let r = report(json!({
            "status": "starting",
            "progress": 0,
            "message": null,
            "output_file": null,
            "error": null
        }));
        assert_eq!(r.message, "");
        assert!(r.artifact().is_none());
        assert_eq!(r.failure_message(), DEFAULT_FAILURE_MESSAGE);
    }

    #[test]
    fn failure_message_prefers_reported_error() {
        let r = report(json!({"status": "error", "message": "Generation failed", "error": "No roads found"}));
        assert_eq!(r.failure_message(), "No roads found");

        let r = report(json!({"status": "error", "error": "  "}));
        assert_eq!(r.failure_message(), "Generation failed");
    }

    #[test]
    fn artifact_paths_use_basename() {
        let artifact = PosterArtifact::new("posters/paris_noir_20260101.png");
        assert_eq!(artifact.file_name(), "paris_noir_20260101.png");
        assert_eq!(artifact.download_path(), "/api/poster/paris_noir_20260101.png");
        assert_eq!(
            artifact.thumbnail_path(),
            "/api/poster/thumbnail/paris_noir_20260101.png"
        );

        assert_eq!(PosterArtifact::new("C:\\out\\x.png").file_name(), "x.png");
        assert_eq!(PosterArtifact::new("x.png").file_name(), "x.png");
    }
}
