//! Project snapshot domain types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::status::RunStatus;
use crate::dto::outcome::RunOutcome;

/// One poll's view of a ScanCode.io project
///
/// The whole JSON object is kept as returned by the service so it can be
/// dumped verbatim when a run fails. Accessors only read the handful of
/// fields the poller needs and are lenient about their shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectSnapshot(Map<String, Value>);

/// A response body that cannot be a project
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl ProjectSnapshot {
    /// Wrap a decoded response body; only JSON objects are projects
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Err(SnapshotError::NotAnObject("null")),
            Value::Bool(_) => Err(SnapshotError::NotAnObject("a boolean")),
            Value::Number(_) => Err(SnapshotError::NotAnObject("a number")),
            Value::String(_) => Err(SnapshotError::NotAnObject("a string")),
            Value::Array(_) => Err(SnapshotError::NotAnObject("an array")),
        }
    }

    /// Run records, most recent first
    ///
    /// A missing, `null` or non-array `runs` field reads as no runs.
    pub fn runs(&self) -> &[Value] {
        match self.0.get("runs") {
            Some(Value::Array(runs)) => runs.as_slice(),
            _ => &[],
        }
    }

    /// Most recent run record, if any
    pub fn latest_run(&self) -> Option<&Value> {
        self.runs().first()
    }

    /// Status of the most recent run, or `unknown`
    ///
    /// An empty status string also reads as `unknown`.
    pub fn run_status(&self) -> RunStatus {
        self.latest_run()
            .and_then(|run| run.get("status"))
            .and_then(Value::as_str)
            .filter(|status| !status.is_empty())
            .map(RunStatus::from)
            .unwrap_or_else(RunStatus::unknown)
    }

    pub fn latest_run_uuid(&self) -> String {
        self.latest_run()
            .map(|run| text_field(run.get("uuid")))
            .unwrap_or_default()
    }

    pub fn results_url(&self) -> String {
        text_field(self.0.get("results_url"))
    }

    pub fn summary_url(&self) -> String {
        text_field(self.0.get("summary_url"))
    }

    /// Outcome record describing the most recent run
    pub fn outcome(&self) -> RunOutcome {
        RunOutcome {
            status: self.run_status().to_string(),
            run_uuid: self.latest_run_uuid(),
            results_url: self.results_url(),
            summary_url: self.summary_url(),
        }
    }

    /// Full snapshot as indented JSON
    pub fn to_pretty_json(&self) -> String {
        // Serializing a map of JSON values cannot fail.
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Render an optional JSON field as plain text; absent and `null` are empty
fn text_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
