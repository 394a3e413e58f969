//! `maptoposter-cli` library crate.
//!
//! Terminal front end for the map-poster client. Re-exports internal
//! modules for integration testing. The binary entrypoint lives in
//! `main.rs`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod presenter;
pub mod prompt;
