//! Model — artifact data structures and parse errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result classification for a step, a client pair, or a whole job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Success,
    TestFailed,
    Busted,
    Exception,
    Skipped,
    #[default]
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Success => "success",
            Verdict::TestFailed => "testfailed",
            Verdict::Busted => "busted",
            Verdict::Exception => "exception",
            Verdict::Skipped => "skipped",
            Verdict::Unknown => "unknown",
        }
    }

    /// Map an explicit `Result:` token from an end-of-step line.
    /// Unrecognized tokens fall through to `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "success" => Verdict::Success,
            "testfailed" => Verdict::TestFailed,
            "busted" => Verdict::Busted,
            "exception" => Verdict::Exception,
            "skipped" => Verdict::Skipped,
            _ => Verdict::Unknown,
        }
    }
}

/// A single failure line captured inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub linenumber: u64,
    pub line: String,
}

/// One named phase of a harness run, delimited by matched start/end markers.
///
/// Created on the start marker with placeholder finish fields so a truncated
/// log still yields a well-formed artifact; finalized exactly once on the
/// end marker and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// Raw timestamp string from the start line's log prefix.
    pub started: String,
    pub started_linenumber: u64,
    pub finished: String,
    pub finished_linenumber: u64,
    /// 0-based position of this step in the log; strictly increasing.
    pub order: usize,
    pub result: Verdict,
    pub errors: Vec<ErrorEntry>,
    /// Error count before any truncation to the retained-error cap.
    pub error_count: usize,
    /// Whole seconds between start and finish, never negative.
    pub duration: u64,
}

/// The step parser's artifact: all steps plus a flattened error list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepArtifact {
    pub steps: Vec<Step>,
    pub all_errors: Vec<ErrorEntry>,
    pub errors_truncated: bool,
}

/// Per-client results from a paired-session log.
///
/// Failure entries are `(linenumber, text)` pairs, ordered as seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientResult {
    pub name: String,
    #[serde(rename = "setup failures")]
    pub setup_failures: Vec<(u64, String)>,
    #[serde(rename = "session failures")]
    pub session_failures: Vec<(u64, String)>,
    #[serde(rename = "cleanup failures")]
    pub cleanup_failures: Vec<(u64, String)>,
    #[serde(rename = "failed blocks")]
    pub failed_blocks: Vec<(u64, String)>,
    /// Session blocks observed for this client.
    pub blocks: u64,
}

impl ClientResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Aggregate results from one protocol-parser run.
///
/// `anomalies` is owned by the run that produced it: each `parse()` call
/// starts from an empty list, so concurrent parses never share state.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SteeplechaseResult {
    pub clients: Vec<ClientResult>,
    #[serde(rename = "total passed")]
    pub total_passed: Option<u64>,
    #[serde(rename = "total failed")]
    pub total_failed: Option<u64>,
    pub anomalies: Vec<(u64, String)>,
    /// The error that aborted the parse, if any. The rest of the result is
    /// whatever had been built by that point.
    #[serde(skip)]
    pub failure: Option<ParseError>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// A phase's required terminating pattern never appeared.
    #[error("unexpected end of input after line {line}")]
    UnexpectedEof { line: u64 },

    /// A client session ended before its "test finished" marker.
    #[error("client exited early at line {line}")]
    ClientEarlyExit { line: u64, client: Option<String> },

    /// A step timestamp did not match the fixed time format.
    #[error("bad step timestamp {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl ParseError {
    /// Line number the error was raised at.
    pub fn line(&self) -> u64 {
        match self {
            ParseError::UnexpectedEof { line } => *line,
            ParseError::ClientEarlyExit { line, .. } => *line,
            ParseError::Timestamp { .. } => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Verdict ──────────────────────────────────────────────────

    #[test]
    fn test_verdict_wire_strings() {
        assert_eq!(Verdict::Success.as_str(), "success");
        assert_eq!(Verdict::TestFailed.as_str(), "testfailed");
        assert_eq!(Verdict::Busted.as_str(), "busted");
        assert_eq!(Verdict::Exception.as_str(), "exception");
        assert_eq!(Verdict::Skipped.as_str(), "skipped");
        assert_eq!(Verdict::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_verdict_serializes_lowercase() {
        let json = serde_json::to_string(&Verdict::TestFailed).unwrap();
        assert_eq!(json, "\"testfailed\"");
    }

    #[test]
    fn test_verdict_from_token_round_trips() {
        for v in [
            Verdict::Success,
            Verdict::TestFailed,
            Verdict::Busted,
            Verdict::Exception,
            Verdict::Skipped,
            Verdict::Unknown,
        ] {
            assert_eq!(Verdict::from_token(v.as_str()), v);
        }
    }

    #[test]
    fn test_verdict_from_unknown_token() {
        assert_eq!(Verdict::from_token("retry"), Verdict::Unknown);
    }

    // ── Wire keys ────────────────────────────────────────────────

    #[test]
    fn test_step_artifact_wire_keys() {
        let artifact = StepArtifact::default();
        let value = serde_json::to_value(&artifact).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("steps"));
        assert!(obj.contains_key("all_errors"));
        assert!(obj.contains_key("errors_truncated"));
    }

    #[test]
    fn test_client_result_wire_keys() {
        let client = ClientResult::new("client-1");
        let value = serde_json::to_value(&client).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("setup failures"));
        assert!(obj.contains_key("session failures"));
        assert!(obj.contains_key("cleanup failures"));
        assert!(obj.contains_key("failed blocks"));
        assert!(obj.contains_key("blocks"));
    }

    #[test]
    fn test_steeplechase_result_wire_keys() {
        let results = SteeplechaseResult::default();
        let value = serde_json::to_value(&results).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("total passed"));
        assert!(obj.contains_key("total failed"));
        assert!(obj.contains_key("clients"));
        assert!(obj.contains_key("anomalies"));
        assert!(!obj.contains_key("failure"));
    }

    #[test]
    fn test_error_entry_wire_keys() {
        let entry = ErrorEntry {
            linenumber: 7,
            line: "Failure".to_string(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["linenumber"], 7);
        assert_eq!(value["line"], "Failure");
    }
}
