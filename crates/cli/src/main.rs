//! `maptoposter` -- terminal client for the map-poster backend.
//!
//! Lists themes, geocodes addresses, submits poster jobs and follows them
//! to completion, and manages custom-layer presets stored on disk.
//!
//! # Environment variables
//!
//! | Variable                 | Default                             | Description                 |
//! |--------------------------|-------------------------------------|-----------------------------|
//! | `MAPTOPOSTER_API_URL`    | `http://localhost:5000`             | Backend base URL            |
//! | `MAPTOPOSTER_STORE_PATH` | `<data_dir>/maptoposter/store.json` | Saved preset store          |
//! | `POLL_INTERVAL_MS`       | `1000`                              | Delay between status polls  |
//! | `REQUEST_TIMEOUT_SECS`   | `30`                                | Per-request HTTP timeout    |
//! | `RUST_LOG`               | `maptoposter_cli=info,...`          | Log filter (logs go to stderr) |

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maptoposter_cli::cli::Cli;
use maptoposter_cli::commands;
use maptoposter_cli::config::CliConfig;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "maptoposter_cli=info,maptoposter_client=info,maptoposter_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::from_env();
    tracing::debug!(api_url = %config.api_url, store = %config.store_path.display(), "Loaded config");

    let mut stdout = std::io::stdout().lock();
    match commands::run(cli, config, &mut stdout).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
