//! Run status domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statuses that end a run successfully
pub const SUCCESS_STATUSES: &[&str] = &["success"];

/// Statuses that end a run unsuccessfully
pub const FAILURE_STATUSES: &[&str] = &["failure", "stopped", "aborted", "error"];

/// Statuses of a run that has not finished yet
pub const IN_PROGRESS_STATUSES: &[&str] = &["queued", "not_started", "running", "started", "pending"];

/// Classification of a run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Success,
    Failure,
    InProgress,
    /// Anything the service reports that is not a known status.
    /// Polled like `InProgress`.
    Unknown,
}

/// Status string of a run as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunStatus(String);

impl RunStatus {
    /// Placeholder used when a project has no runs or a run has no status
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the status into exactly one [`StatusClass`]
    ///
    /// Matching is exact: the service reports lowercase identifiers.
    pub fn class(&self) -> StatusClass {
        let status = self.as_str();
        if SUCCESS_STATUSES.contains(&status) {
            StatusClass::Success
        } else if FAILURE_STATUSES.contains(&status) {
            StatusClass::Failure
        } else if IN_PROGRESS_STATUSES.contains(&status) {
            StatusClass::InProgress
        } else {
            StatusClass::Unknown
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunStatus {
    fn from(status: &str) -> Self {
        Self::new(status)
    }
}
