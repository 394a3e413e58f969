//! HTTP client and job orchestration for the map-poster backend.
//!
//! Provides the typed REST wrapper ([`api::PosterApi`]), the backend seam
//! the orchestrator is written against ([`backend::GenerationBackend`]),
//! job status wire types, and the [`orchestrator::JobOrchestrator`] that
//! drives a generation job from submission to a terminal state.

pub mod api;
pub mod backend;
pub mod events;
pub mod job;
pub mod orchestrator;
