use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use maptoposter_client::orchestrator::OrchestratorConfig;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
///
/// Every field has a default suitable for a backend running locally.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Backend base URL; routes live under `/api`.
    pub api_url: String,
    /// JSON file backing the preset store.
    pub store_path: PathBuf,
    /// Delay between job status polls.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                              |
    /// |--------------------------|--------------------------------------|
    /// | `MAPTOPOSTER_API_URL`    | `http://localhost:5000`              |
    /// | `MAPTOPOSTER_STORE_PATH` | `<data_dir>/maptoposter/store.json`  |
    /// | `POLL_INTERVAL_MS`       | `1000`                               |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("MAPTOPOSTER_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let store_path = lookup("MAPTOPOSTER_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_store_path);

        let poll_interval_ms: u64 =
            parse_or_default(&lookup, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);
        let request_timeout_secs: u64 =
            parse_or_default(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            api_url,
            store_path,
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
            request_timeout: Duration::from_secs(request_timeout_secs.max(1)),
        }
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            poll_interval: self.poll_interval,
        }
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("maptoposter")
        .join("store.json")
}

fn parse_or_default<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = %raw, default = %default, "Ignoring invalid config value");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = CliConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.store_path.ends_with("maptoposter/store.json"));
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = CliConfig::from_lookup(lookup(&[
            ("MAPTOPOSTER_API_URL", "http://posters.local:8080"),
            ("MAPTOPOSTER_STORE_PATH", "/tmp/presets.json"),
            ("POLL_INTERVAL_MS", "250"),
            ("REQUEST_TIMEOUT_SECS", " 5 "),
        ]));
        assert_eq!(config.api_url, "http://posters.local:8080");
        assert_eq!(config.store_path, PathBuf::from("/tmp/presets.json"));
        assert_eq!(config.orchestrator().poll_interval, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = CliConfig::from_lookup(lookup(&[
            ("POLL_INTERVAL_MS", "fast"),
            ("REQUEST_TIMEOUT_SECS", "-1"),
            ("MAPTOPOSTER_API_URL", "  "),
        ]));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
