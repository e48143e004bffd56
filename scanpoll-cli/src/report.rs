//! Result reporting
//!
//! Turns a [`PollOutcome`] into the process's visible results: the JSON
//! line on stdout, the CI output file, the failure dump on stderr and the
//! exit code.

use anyhow::{Context, Result};
use scanpoll_core::domain::project::ProjectSnapshot;
use scanpoll_core::dto::outcome::RunOutcome;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use uuid::Uuid;

use crate::poller::PollOutcome;

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure,
    ConfigError,
    TimedOut,
}

impl ExitOutcome {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::ConfigError => 2,
            Self::TimedOut => 124,
        }
    }
}

impl From<ExitOutcome> for ExitCode {
    fn from(outcome: ExitOutcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

/// Report a finished poll and pick the exit status
pub fn finish(
    outcome: PollOutcome,
    ci_output: Option<&Path>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> ExitOutcome {
    match outcome {
        PollOutcome::Succeeded(run) => match report_success(&run, ci_output, out) {
            Ok(()) => ExitOutcome::Success,
            Err(e) => {
                error!("Failed to report run result: {:#}", e);
                ExitOutcome::Failure
            }
        },
        PollOutcome::Failed(project) => {
            error!("ScanCode.io run ended in a failure state.");
            if let Err(e) = write_failure_dump(err, &project) {
                error!("Failed to dump project: {:#}", e);
            }
            ExitOutcome::Failure
        }
        PollOutcome::TimedOut {
            elapsed,
            last_status,
        } => {
            let last = last_status.as_ref().map_or("none", |s| s.as_str());
            error!(
                "Timed out while waiting for ScanCode.io run to finish (after {:.0}s, last status: {}).",
                elapsed.as_secs_f64(),
                last
            );
            ExitOutcome::TimedOut
        }
    }
}

fn report_success(run: &RunOutcome, ci_output: Option<&Path>, out: &mut impl Write) -> Result<()> {
    if let Some(path) = ci_output {
        append_ci_output(path, run)?;
        info!("Wrote run outputs to {}", path.display());
    }
    write_outcome_line(out, run)
}

/// Write the outcome as one compact JSON line
pub fn write_outcome_line(out: &mut impl Write, run: &RunOutcome) -> Result<()> {
    let line = run.to_json_line().context("Failed to serialize run outcome")?;
    writeln!(out, "{}", line).context("Failed to write run outcome")?;
    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Append the outcome to a GitHub Actions style output file, creating it if needed
pub fn append_ci_output(path: &Path, run: &RunOutcome) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open CI output file {}", path.display()))?;

    let mut buf = String::new();
    for (key, value) in run.output_pairs() {
        push_output_entry(&mut buf, key, value);
    }

    file.write_all(buf.as_bytes())
        .with_context(|| format!("Failed to write CI output file {}", path.display()))
}

/// Format one output entry
///
/// Values come from the service. One containing a line break is written in
/// the `key<<DELIMITER` block form, so it cannot start entries of its own.
fn push_output_entry(buf: &mut String, key: &str, value: &str) {
    if value.contains(['\n', '\r']) {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        buf.push_str(&format!("{key}<<{delimiter}\n{value}\n{delimiter}\n"));
    } else {
        buf.push_str(&format!("{key}={value}\n"));
    }
}

/// Dump the full project as indented JSON
pub fn write_failure_dump(err: &mut impl Write, project: &ProjectSnapshot) -> Result<()> {
    writeln!(err, "{}", project.to_pretty_json()).context("Failed to write project dump")?;
    err.flush().context("Failed to flush stderr")?;
    Ok(())
}
