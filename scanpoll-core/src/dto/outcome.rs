//! Run outcome DTO

use serde::{Deserialize, Serialize};

/// Result of a successful run, as published to stdout and CI output files
///
/// Field order is part of the output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: String,
    pub run_uuid: String,
    pub results_url: String,
    pub summary_url: String,
}

impl RunOutcome {
    /// Compact single-line JSON record
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// `key=value` pairs in CI output file order
    ///
    /// The status key is `run_status` here, unlike the JSON record.
    pub fn output_pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("run_status", &self.status),
            ("run_uuid", &self.run_uuid),
            ("results_url", &self.results_url),
            ("summary_url", &self.summary_url),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> RunOutcome {
        RunOutcome {
            status: "success".to_string(),
            run_uuid: "u1".to_string(),
            results_url: "r".to_string(),
            summary_url: "s".to_string(),
        }
    }

    #[test]
    fn test_json_line_is_compact_and_ordered() {
        let line = outcome().to_json_line().unwrap();
        assert_eq!(
            line,
            r#"{"status":"success","run_uuid":"u1","results_url":"r","summary_url":"s"}"#
        );
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_output_pairs() {
        let outcome = outcome();
        let pairs = outcome.output_pairs();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["run_status", "run_uuid", "results_url", "summary_url"]);
        assert_eq!(pairs[0].1, "success");
        assert_eq!(pairs[3].1, "s");
    }
}
