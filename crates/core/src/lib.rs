//! Domain core for the map-poster client.
//!
//! Owns the custom-layer preset library (built-in and saved presets,
//! persistence, import/export), the generation configuration assembler,
//! theme drafts, and the injected capabilities (durable key-value storage,
//! user confirmation) the rest of the client is wired through. Nothing in
//! this crate talks to the network.

pub mod error;
pub mod generation;
pub mod numeric;
pub mod preset;
pub mod preset_actions;
pub mod preset_library;
pub mod preset_store;
pub mod prompt;
pub mod storage;
pub mod theme;
pub mod types;
