use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub plex: PlexConfig,

    #[serde(default)]
    pub emby: EmbyConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// TMDB v3 API key. An empty key leaves the provider unavailable.
    #[serde(default)]
    pub api_key: String,

    /// ISO-639-1 language tag passed to every request (default: "en-US")
    #[serde(default = "default_language")]
    pub language: String,

    /// Override for the API root, mainly for testing against a mock server
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PlexConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub url: String,

    /// X-Plex-Token used for library searches
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct EmbyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("overseer.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// What to do when a provider feed lists the same id more than once.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first occurrence at its original position, drop the rest.
    #[default]
    FirstWins,
    /// Pass every occurrence through untouched.
    KeepAll,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Upper bound on in-flight availability probe calls per batch (default: 8)
    #[serde(default = "default_concurrency")]
    pub max_concurrent_probes: usize,

    /// Upper bound on in-flight detail fetches per lookup (default: 8)
    #[serde(default = "default_concurrency")]
    pub max_concurrent_details: usize,

    /// Per-call probe timeout in seconds (default: 10)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

fn default_concurrency() -> usize {
    8
}

fn default_probe_timeout() -> u64 {
    10
}

impl ReconcileConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: default_concurrency(),
            max_concurrent_details: default_concurrency(),
            probe_timeout_secs: default_probe_timeout(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}
