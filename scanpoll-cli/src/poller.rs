//! Run poller
//!
//! Fetches the project on a fixed interval until its latest run reaches a
//! terminal status or the overall timeout passes. Failed requests are logged
//! and retried on the same interval; they never end the loop by themselves.

use async_trait::async_trait;
use scanpoll_client::{ClientError, ScanCodeClient};
use scanpoll_core::domain::project::ProjectSnapshot;
use scanpoll_core::domain::status::{RunStatus, StatusClass};
use scanpoll_core::dto::outcome::RunOutcome;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;

/// Anything that can produce a fresh project snapshot
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn fetch_project(&self, project_uuid: &str) -> Result<ProjectSnapshot, ClientError>;
}

#[async_trait]
impl ProjectSource for ScanCodeClient {
    async fn fetch_project(&self, project_uuid: &str) -> Result<ProjectSnapshot, ClientError> {
        self.get_project(project_uuid).await
    }
}

/// How a poll ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Latest run reached a success status
    Succeeded(RunOutcome),
    /// Latest run reached a failure status; carries the snapshot that said so
    Failed(ProjectSnapshot),
    /// No terminal status within the timeout
    TimedOut {
        elapsed: Duration,
        /// Last status seen, if any request succeeded
        last_status: Option<RunStatus>,
    },
}

/// Remembers the last observed status so only changes get logged
#[derive(Debug, Default)]
pub struct StatusTracker {
    last: Option<RunStatus>,
}

impl StatusTracker {
    /// Record a status; returns true when it differs from the previous one
    pub fn observe(&mut self, status: &RunStatus) -> bool {
        if self.last.as_ref() == Some(status) {
            return false;
        }
        self.last = Some(status.clone());
        true
    }

    pub fn last(&self) -> Option<&RunStatus> {
        self.last.as_ref()
    }
}

/// Polls one project until its latest run finishes
pub struct Poller<S> {
    source: S,
    project_uuid: String,
    interval: Duration,
    timeout: Duration,
    tracker: StatusTracker,
}

impl<S: ProjectSource> Poller<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            project_uuid: config.project_uuid.clone(),
            interval: config.poll_interval,
            timeout: config.timeout,
            tracker: StatusTracker::default(),
        }
    }

    /// Starts the polling loop
    pub async fn run(&mut self) -> PollOutcome {
        let start = Instant::now();

        loop {
            let elapsed = start.elapsed();
            if elapsed > self.timeout {
                return PollOutcome::TimedOut {
                    elapsed,
                    last_status: self.tracker.last().cloned(),
                };
            }

            let project = match self.source.fetch_project(&self.project_uuid).await {
                Ok(project) => project,
                Err(e) => {
                    log_fetch_error(&e);
                    time::sleep(self.interval).await;
                    continue;
                }
            };

            let status = project.run_status();
            if self.tracker.observe(&status) {
                info!("Run status: {}", status);
            }

            match status.class() {
                StatusClass::Success => return PollOutcome::Succeeded(project.outcome()),
                StatusClass::Failure => return PollOutcome::Failed(project),
                StatusClass::InProgress | StatusClass::Unknown => {
                    debug!("Run not finished ({}), next poll in {:?}", status, self.interval);
                    time::sleep(self.interval).await;
                }
            }
        }
    }
}

fn log_fetch_error(err: &ClientError) {
    match err {
        ClientError::ApiError { status, message } => {
            warn!("HTTP error while polling project: {}", status);
            debug!("Response body: {}", message);
        }
        other => warn!("Network error while polling project: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanpoll_core::domain::status::{FAILURE_STATUSES, IN_PROGRESS_STATUSES, SUCCESS_STATUSES};
    use serde_json::{Value, json};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Log sink shared between the subscriber and the test
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        /// Statuses from the `Run status: ...` lines, in order
        fn statuses(&self) -> Vec<String> {
            let text = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            text.lines()
                .filter_map(|line| line.split_once("Run status: "))
                .map(|(_, status)| status.trim_end().to_string())
                .collect()
        }
    }

    /// Run the poller with a subscriber installed and return what it logged
    async fn run_logged<S: ProjectSource>(poller: &mut Poller<S>) -> (PollOutcome, Vec<String>) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let outcome = poller.run().await;
        (outcome, logs.statuses())
    }

    /// One scripted response
    #[derive(Clone)]
    enum Step {
        Project(Value),
        Http(u16),
        Garbage,
    }

    /// Replays steps in order, repeating the last one forever
    struct ScriptedSource {
        steps: Vec<Step>,
        calls: AtomicUsize,
        seen_uuids: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps,
                calls: AtomicUsize::new(0),
                seen_uuids: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProjectSource for ScriptedSource {
        async fn fetch_project(&self, project_uuid: &str) -> Result<ProjectSnapshot, ClientError> {
            self.seen_uuids.lock().unwrap().push(project_uuid.to_string());
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps[n.min(self.steps.len() - 1)].clone();
            match step {
                Step::Project(value) => Ok(serde_json::from_value(value).unwrap()),
                Step::Http(status) => Err(ClientError::api_error(status, "boom")),
                Step::Garbage => Err(ClientError::ParseError("expected object".to_string())),
            }
        }
    }

    fn config(interval_secs: u64, timeout_secs: u64) -> Config {
        Config {
            base_url: "http://scancode.test".to_string(),
            token: "secret".to_string(),
            project_uuid: "p1".to_string(),
            poll_interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
            request_timeout: Duration::from_secs(15),
            ci_output: None,
        }
    }

    fn with_status(status: &str) -> Step {
        Step::Project(json!({"runs": [{"status": status, "uuid": "u1"}]}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_then_success() {
        let source = ScriptedSource::new(vec![
            Step::Project(json!({"runs": [{"status": "running"}]})),
            Step::Project(json!({
                "runs": [{"status": "success", "uuid": "u1"}],
                "results_url": "r",
                "summary_url": "s"
            })),
        ]);
        let mut poller = Poller::new(source, &config(10, 7200));

        let (outcome, logged) = run_logged(&mut poller).await;

        assert_eq!(
            outcome,
            PollOutcome::Succeeded(RunOutcome {
                status: "success".to_string(),
                run_uuid: "u1".to_string(),
                results_url: "r".to_string(),
                summary_url: "s".to_string(),
            })
        );
        assert_eq!(poller.source.calls(), 2);
        assert_eq!(logged, ["running", "success"]);
        assert_eq!(*poller.source.seen_uuids.lock().unwrap(), ["p1", "p1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_success_status_succeeds() {
        for status in SUCCESS_STATUSES {
            let source = ScriptedSource::new(vec![with_status(status)]);
            let outcome = Poller::new(source, &config(10, 60)).run().await;
            match outcome {
                PollOutcome::Succeeded(run) => {
                    assert_eq!(run.status, *status);
                    assert_eq!(run.run_uuid, "u1");
                }
                other => panic!("{status}: unexpected outcome {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_failure_status_fails_with_snapshot() {
        for status in FAILURE_STATUSES {
            let source = ScriptedSource::new(vec![with_status(status)]);
            let mut poller = Poller::new(source, &config(10, 60));
            match poller.run().await {
                PollOutcome::Failed(project) => {
                    assert_eq!(project.run_status().as_str(), *status);
                }
                other => panic!("{status}: unexpected outcome {other:?}"),
            }
            assert_eq!(poller.source.calls(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_progress_statuses_keep_polling_until_timeout() {
        for status in IN_PROGRESS_STATUSES.iter().chain(&["unknown", "paused"]) {
            let source = ScriptedSource::new(vec![with_status(status)]);
            let mut poller = Poller::new(source, &config(10, 60));

            let (outcome, logged) = run_logged(&mut poller).await;

            match outcome {
                PollOutcome::TimedOut { last_status, .. } => {
                    assert_eq!(last_status.as_ref().map(RunStatus::as_str), Some(*status));
                }
                other => panic!("{status}: unexpected outcome {other:?}"),
            }
            // Polls at t = 0, 10, ..., 60; the check at t = 70 gives up.
            assert_eq!(poller.source.calls(), 7, "{status}");
            assert_eq!(logged, [*status], "{status}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_runs_is_unknown_and_continues() {
        let source = ScriptedSource::new(vec![
            Step::Project(json!({"runs": []})),
            Step::Project(json!({"runs": []})),
            with_status("failure"),
        ]);
        let mut poller = Poller::new(source, &config(5, 600));

        let (outcome, logged) = run_logged(&mut poller).await;

        assert!(matches!(outcome, PollOutcome::Failed(_)));
        assert_eq!(poller.source.calls(), 3);
        assert_eq!(logged, ["unknown", "failure"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_logged_once_per_consecutive_value() {
        let source = ScriptedSource::new(vec![
            with_status("queued"),
            with_status("queued"),
            with_status("running"),
            with_status("running"),
            with_status("queued"),
            with_status("success"),
        ]);
        let mut poller = Poller::new(source, &config(1, 600));

        let (_, logged) = run_logged(&mut poller).await;

        assert_eq!(poller.source.calls(), 6);
        assert_eq!(logged, ["queued", "running", "queued", "success"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_and_decode_errors_are_retried() {
        let source = ScriptedSource::new(vec![
            Step::Http(502),
            Step::Garbage,
            Step::Http(404),
            with_status("success"),
        ]);
        let start = Instant::now();

        let mut poller = Poller::new(source, &config(10, 600));

        let outcome = poller.run().await;

        assert!(matches!(outcome, PollOutcome::Succeeded(_)));
        assert_eq!(poller.source.calls(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_until_timeout() {
        let source = ScriptedSource::new(vec![Step::Http(503)]);

        let mut poller = Poller::new(source, &config(10, 25));

        match poller.run().await {
            PollOutcome::TimedOut {
                elapsed,
                last_status,
            } => {
                assert_eq!(elapsed, Duration::from_secs(30));
                assert_eq!(last_status, None);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(poller.source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_still_polls_once() {
        let source = ScriptedSource::new(vec![with_status("success")]);

        let mut poller = Poller::new(source, &config(10, 0));

        assert!(matches!(poller.run().await, PollOutcome::Succeeded(_)));
        assert_eq!(poller.source.calls(), 1);
    }

    #[test]
    fn test_status_tracker() {
        let mut tracker = StatusTracker::default();
        assert!(tracker.observe(&RunStatus::from("queued")));
        assert!(!tracker.observe(&RunStatus::from("queued")));
        assert!(tracker.observe(&RunStatus::from("running")));
        assert!(tracker.observe(&RunStatus::from("queued")));
        assert_eq!(tracker.last(), Some(&RunStatus::from("queued")));
    }
}
