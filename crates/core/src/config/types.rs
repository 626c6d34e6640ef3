use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::checker::CheckerConfig;
use crate::quality::{NameFilters, QualityExclusion, ScoringPolicy};
use crate::scanner::ScannerConfig;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scoring: ScoringPolicy,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub checker: CheckerConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub debrid: DebridConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration. The stream cache and the library catalog share
/// one SQLite file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("debridarr.db")
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Candidate selection settings shared by both jobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectionConfig {
    /// Let candidates without an info hash bypass the debrid filter.
    #[serde(default = "default_allow_url_only")]
    pub allow_url_only_sources: bool,
    /// Quality types dropped before scoring.
    #[serde(default)]
    pub excluded_qualities: Vec<QualityExclusion>,
    /// Release groups dropped when found anywhere in the name (case-insensitive).
    #[serde(default)]
    pub excluded_groups: Vec<String>,
    /// Language tags dropped when found anywhere in the name (case-insensitive).
    #[serde(default)]
    pub excluded_languages: Vec<String>,
}

impl SelectionConfig {
    pub fn name_filters(&self) -> NameFilters {
        NameFilters::new(&self.excluded_groups, &self.excluded_languages)
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            allow_url_only_sources: default_allow_url_only(),
            excluded_qualities: Vec::new(),
            excluded_groups: Vec::new(),
            excluded_languages: Vec::new(),
        }
    }
}

fn default_allow_url_only() -> bool {
    true
}

/// Available debrid backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebridBackend {
    #[default]
    RealDebrid,
}

impl DebridBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebridBackend::RealDebrid => "real_debrid",
        }
    }
}

/// Debrid service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    #[serde(default)]
    pub backend: DebridBackend,
    /// API token
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_debrid_url")]
    pub base_url: String,
    /// Hashes per availability request (default: 100)
    #[serde(default = "default_debrid_batch_size")]
    pub batch_size: usize,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_debrid_timeout")]
    pub timeout_secs: u64,
}

impl Default for DebridConfig {
    fn default() -> Self {
        Self {
            backend: DebridBackend::default(),
            api_key: String::new(),
            base_url: default_debrid_url(),
            batch_size: default_debrid_batch_size(),
            timeout_secs: default_debrid_timeout(),
        }
    }
}

impl DebridConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_debrid_url() -> String {
    "https://api.real-debrid.com/rest/1.0".to_string()
}

fn default_debrid_batch_size() -> usize {
    100
}

fn default_debrid_timeout() -> u64 {
    30
}

/// Stream provider (Stremio addon) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Addon root URL, without the trailing `/manifest.json`.
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_provider_url() -> String {
    "https://torrentio.strem.fun".to_string()
}

fn default_provider_timeout() -> u64 {
    15
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub scoring: ScoringPolicy,
    pub selection: SelectionConfig,
    pub checker: CheckerConfig,
    pub scanner: ScannerConfig,
    pub debrid: SanitizedDebridConfig,
    pub provider: ProviderConfig,
}

/// Sanitized debrid config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub backend: String,
    pub base_url: String,
    pub api_key_configured: bool,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            logging: config.logging.clone(),
            scoring: config.scoring.clone(),
            selection: config.selection.clone(),
            checker: config.checker.clone(),
            scanner: config.scanner.clone(),
            debrid: SanitizedDebridConfig {
                backend: config.debrid.backend.as_str().to_string(),
                base_url: config.debrid.base_url.clone(),
                api_key_configured: !config.debrid.api_key.is_empty(),
                batch_size: config.debrid.batch_size,
                timeout_secs: config.debrid.timeout_secs,
            },
            provider: config.provider.clone(),
        }
    }
}
