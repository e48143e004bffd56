//! Configuration module
//!
//! Every setting comes from a command-line flag or, failing that, its
//! environment variable. Connection settings have no defaults.

use clap::Args;
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Raw settings as parsed by clap
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Base URL of ScanCode.io (e.g., https://scancode.example.com)
    #[arg(long, env = "SCANCODEIO_BASE")]
    pub base_url: Option<String>,

    /// API token for ScanCode.io
    #[arg(long, env = "SCANCODEIO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Project UUID to poll
    #[arg(long, env = "SCANCODEIO_PROJECT_UUID")]
    pub project_uuid: Option<String>,

    /// Polling interval in seconds
    #[arg(long, env = "POLL_INTERVAL_SEC", default_value_t = 10.0)]
    pub interval: f64,

    /// Overall timeout in seconds (default 2h)
    #[arg(long, env = "POLL_TIMEOUT_SEC", default_value_t = 7200.0)]
    pub timeout: f64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15.0)]
    pub request_timeout: f64,

    /// File that receives key=value outputs when the run succeeds
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,
}

/// Validated poller configuration
#[derive(Clone)]
pub struct Config {
    /// ScanCode.io base URL, without trailing slash
    pub base_url: String,

    pub token: String,

    pub project_uuid: String,

    /// Sleep between two polls, also applied after a failed request
    pub poll_interval: Duration,

    /// Give up once this much time has passed since the first poll
    pub timeout: Duration,

    pub request_timeout: Duration,

    /// CI output file appended to on success
    pub ci_output: Option<PathBuf>,
}

/// Configuration errors; all of them end the process with exit code 2
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("{name} must be a non-negative number of seconds, got {value}")]
    InvalidDuration { name: &'static str, value: f64 },

    #[error("--request-timeout must be greater than 0")]
    ZeroRequestTimeout,

    #[error("base URL must be an absolute http:// or https:// URL, got {0:?}")]
    InvalidBaseUrl(String),
}

impl Config {
    /// Validate parsed settings
    ///
    /// Missing connection settings are reported together, before any other
    /// check runs.
    pub fn from_args(args: ConfigArgs) -> Result<Self, ConfigError> {
        let base_url = non_empty(args.base_url);
        let token = non_empty(args.token);
        let project_uuid = non_empty(args.project_uuid);

        let mut missing = Vec::new();
        if base_url.is_none() {
            missing.push("SCANCODEIO_BASE/--base-url");
        }
        if token.is_none() {
            missing.push("SCANCODEIO_TOKEN/--token");
        }
        if project_uuid.is_none() {
            missing.push("SCANCODEIO_PROJECT_UUID/--project-uuid");
        }

        let (Some(base_url), Some(token), Some(project_uuid)) = (base_url, token, project_uuid)
        else {
            return Err(ConfigError::Missing(missing));
        };

        let request_timeout = seconds("--request-timeout", args.request_timeout)?;
        if request_timeout.is_zero() {
            return Err(ConfigError::ZeroRequestTimeout);
        }

        Ok(Self {
            base_url: validate_base_url(&base_url)?,
            token,
            project_uuid,
            poll_interval: seconds("--interval", args.interval)?,
            timeout: seconds("--timeout", args.timeout)?,
            request_timeout,
            ci_output: args.github_output.filter(|p| !p.as_os_str().is_empty()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("project_uuid", &self.project_uuid)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .field("request_timeout", &self.request_timeout)
            .field("ci_output", &self.ci_output)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn seconds(name: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { name, value })
}

fn validate_base_url(base_url: &str) -> Result<String, ConfigError> {
    let trimmed = base_url.trim_end_matches('/');
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(trimmed.to_string())
        }
        _ => Err(ConfigError::InvalidBaseUrl(base_url.to_string())),
    }
}
