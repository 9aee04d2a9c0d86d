//! Step — stateful section parser for harness step logs.
//!
//! Recognizes `##### Running <name> step.` / `##### Finished <name> step.`
//! marker pairs (plus the `Skipping` variants) and builds a [`StepArtifact`]
//! with per-step timing, results, and captured error lines.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use super::classify;
use super::errors::ErrorParser;
use super::model::{ParseError, Step, StepArtifact, Verdict};
use super::{MAX_STEP_ERROR_LINES, TIME_FORMAT};

static RE_STEP_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{5} Running (?P<name>.*?) step\.").unwrap());
static RE_SKIP_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{5} Skipping (?P<name>.*?) step\.$").unwrap());
static RE_STEP_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{5} Finished (?P<name>.*?) step\. Success: (?P<success>True|False|None)\s*$")
        .unwrap()
});
static RE_TEST_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^#{5} Finished (?P<name>.*?) step\. Success: (?P<success>True|False|None) - Result: (?P<result>busted|testfailed|exception|success|unknown)\s*$",
    )
    .unwrap()
});
static RE_SKIP_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{5}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingStart,
    Started { skipping: bool },
}

/// Section parser state machine. Runs until input is exhausted; a log that
/// truncates mid-step leaves that step with its placeholder finish fields.
#[derive(Debug)]
pub struct StepParser {
    artifact: StepArtifact,
    sub_parser: ErrorParser,
    state: State,
}

impl Default for StepParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StepParser {
    pub fn new() -> Self {
        Self {
            artifact: StepArtifact::default(),
            sub_parser: ErrorParser::new(),
            state: State::AwaitingStart,
        }
    }

    /// Consume one log line. `lineno` is 1-based.
    pub fn parse_line(&mut self, line: &str, lineno: u64) -> Result<(), ParseError> {
        let (time, rest) = classify::strip_prefix(line);

        match self.state {
            State::AwaitingStart => {
                self.check_step_start(rest, time, lineno);
                Ok(())
            }
            State::Started { skipping } => self.check_step_end(line, rest, time, lineno, skipping),
        }
    }

    fn check_step_start(&mut self, rest: &str, time: Option<&str>, lineno: u64) {
        let (caps, skipping) = if let Some(caps) = RE_STEP_START.captures(rest) {
            (caps, false)
        } else if let Some(caps) = RE_SKIP_START.captures(rest) {
            (caps, true)
        } else {
            return;
        };

        let started = time.unwrap_or_default().to_string();
        self.artifact.steps.push(Step {
            name: caps["name"].to_string(),
            started: started.clone(),
            started_linenumber: lineno,
            // placeholders in case no end-of-step is found (log truncated)
            finished: started,
            finished_linenumber: lineno + 1,
            order: self.artifact.steps.len(),
            result: Verdict::Unknown,
            errors: Vec::new(),
            error_count: 0,
            duration: 0,
        });
        self.state = State::Started { skipping };
    }

    fn check_step_end(
        &mut self,
        line: &str,
        rest: &str,
        time: Option<&str>,
        lineno: u64,
        skipping: bool,
    ) -> Result<(), ParseError> {
        let end_match: Option<(Option<String>, Option<String>)> = if skipping {
            RE_SKIP_END.is_match(rest).then(|| (None, None))
        } else if let Some(caps) = RE_STEP_END.captures(rest) {
            Some((caps.name("success").map(|m| m.as_str().to_string()), None))
        } else if let Some(caps) = RE_TEST_END.captures(rest) {
            Some((
                caps.name("success").map(|m| m.as_str().to_string()),
                caps.name("result").map(|m| m.as_str().to_string()),
            ))
        } else {
            None
        };

        let Some((success, explicit)) = end_match else {
            // Middle of a step: hand the raw line to the error sub-parser.
            self.sub_parser.feed(line, lineno);
            return Ok(());
        };

        let mut errors = self.sub_parser.drain();
        let error_count = errors.len();
        if error_count > MAX_STEP_ERROR_LINES {
            errors.truncate(MAX_STEP_ERROR_LINES);
            self.artifact.errors_truncated = true;
        }

        let finished = time.unwrap_or_default().to_string();
        let StepArtifact {
            steps, all_errors, ..
        } = &mut self.artifact;
        // A step is always open in the started state.
        let Some(step) = steps.last_mut() else {
            return Ok(());
        };

        let duration = duration_seconds(&step.started, &finished)?;
        all_errors.extend(errors.iter().cloned());
        step.finished = finished;
        step.finished_linenumber = lineno;
        step.result = step_result(success.as_deref(), skipping, explicit.as_deref(), error_count);
        step.errors = errors;
        step.error_count = error_count;
        step.duration = duration;
        self.state = State::AwaitingStart;
        Ok(())
    }

    pub fn artifact(&self) -> &StepArtifact {
        &self.artifact
    }

    pub fn into_artifact(self) -> StepArtifact {
        self.artifact
    }
}

/// Deterministic result precedence for a finished step.
///
/// An explicit `Result:` token wins over a nonzero error count; that
/// override is intentional for callers that embed the verdict in the
/// end-of-step line.
fn step_result(
    success: Option<&str>,
    skipped: bool,
    explicit: Option<&str>,
    error_count: usize,
) -> Verdict {
    if skipped {
        return Verdict::Skipped;
    }
    if let Some(token) = explicit {
        return Verdict::from_token(token);
    }
    if error_count > 0 {
        return Verdict::TestFailed;
    }
    match success {
        Some("True") => Verdict::Success,
        _ => Verdict::Busted,
    }
}

/// Whole seconds between two `%Y-%m-%d %H:%M:%S` timestamps, order-independent.
fn duration_seconds(started: &str, finished: &str) -> Result<u64, ParseError> {
    let start = parse_timestamp(started)?;
    let finish = parse_timestamp(finished)?;
    Ok((finish - start).num_seconds().unsigned_abs())
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT).map_err(|source| ParseError::Timestamp {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut StepParser, lines: &[&str]) {
        for (idx, line) in lines.iter().enumerate() {
            parser.parse_line(line, idx as u64 + 1).unwrap();
        }
    }

    // ── Happy path ───────────────────────────────────────────────

    #[test]
    fn test_single_step_success() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2015-07-16 06:27:55  INFO - ##### Running clobber step.",
                "2015-07-16 06:27:55  INFO - doing work",
                "2015-07-16 06:27:55  INFO - ##### Finished clobber step. Success: True",
            ],
        );
        let artifact = parser.into_artifact();
        assert_eq!(artifact.steps.len(), 1);
        let step = &artifact.steps[0];
        assert_eq!(step.name, "clobber");
        assert_eq!(step.result, Verdict::Success);
        assert_eq!(step.duration, 0);
        assert_eq!(step.order, 0);
        assert_eq!(step.started_linenumber, 1);
        assert_eq!(step.finished_linenumber, 3);
        assert!(step.errors.is_empty());
        assert!(artifact.all_errors.is_empty());
        assert!(!artifact.errors_truncated);
    }

    #[test]
    fn test_orders_strictly_increase() {
        let mut parser = StepParser::new();
        let mut lines = Vec::new();
        for name in ["clobber", "install", "run-tests"] {
            lines.push(format!(
                "2020-01-01 00:00:00 INFO - ##### Running {name} step."
            ));
            lines.push(format!(
                "2020-01-01 00:00:01 INFO - ##### Finished {name} step. Success: True"
            ));
        }
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        feed(&mut parser, &refs);
        let artifact = parser.into_artifact();
        assert_eq!(artifact.steps.len(), 3);
        for (idx, step) in artifact.steps.iter().enumerate() {
            assert_eq!(step.order, idx);
        }
    }

    // ── Result precedence ────────────────────────────────────────

    #[test]
    fn test_error_lines_force_testfailed() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2020-01-01 00:00:00 INFO - ##### Running run-tests step.",
                "2020-01-01 00:00:01 ERROR - TEST-UNEXPECTED-FAIL | t | boom",
                "2020-01-01 00:00:05 INFO - ##### Finished run-tests step. Success: True",
            ],
        );
        let artifact = parser.into_artifact();
        let step = &artifact.steps[0];
        assert_eq!(step.result, Verdict::TestFailed);
        assert_eq!(step.error_count, 1);
        assert_eq!(step.duration, 5);
        assert_eq!(artifact.all_errors.len(), 1);
    }

    #[test]
    fn test_explicit_token_overrides_errors() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2020-01-01 00:00:00 INFO - ##### Running run-tests step.",
                "2020-01-01 00:00:01 ERROR - Failure",
                "2020-01-01 00:00:02 INFO - ##### Finished run-tests step. Success: True - Result: success",
            ],
        );
        let artifact = parser.into_artifact();
        let step = &artifact.steps[0];
        assert_eq!(step.result, Verdict::Success);
        // the override changes the verdict, not the captured errors
        assert_eq!(step.error_count, 1);
    }

    #[test]
    fn test_explicit_exception_token() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2020-01-01 00:00:00 INFO - ##### Running run-tests step.",
                "2020-01-01 00:00:02 INFO - ##### Finished run-tests step. Success: False - Result: exception",
            ],
        );
        assert_eq!(parser.artifact().steps[0].result, Verdict::Exception);
    }

    #[test]
    fn test_success_false_is_busted() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2020-01-01 00:00:00 INFO - ##### Running build step.",
                "2020-01-01 00:00:02 INFO - ##### Finished build step. Success: False",
            ],
        );
        assert_eq!(parser.artifact().steps[0].result, Verdict::Busted);
    }

    #[test]
    fn test_success_none_is_busted() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2020-01-01 00:00:00 INFO - ##### Running build step.",
                "2020-01-01 00:00:02 INFO - ##### Finished build step. Success: None",
            ],
        );
        assert_eq!(parser.artifact().steps[0].result, Verdict::Busted);
    }

    #[test]
    fn test_skipped_step_overrides_errors() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2020-01-01 00:00:00 INFO - ##### Skipping install step.",
                "2020-01-01 00:00:00 INFO - Failure",
                "2020-01-01 00:00:00 INFO - #####",
            ],
        );
        let artifact = parser.into_artifact();
        let step = &artifact.steps[0];
        assert_eq!(step.name, "install");
        assert_eq!(step.result, Verdict::Skipped);
        assert_eq!(step.error_count, 1);
    }

    // ── Duration ─────────────────────────────────────────────────

    #[test]
    fn test_duration_absolute_value() {
        assert_eq!(
            duration_seconds("2020-01-01 00:00:00", "2020-01-01 00:00:05").unwrap(),
            5
        );
        assert_eq!(
            duration_seconds("2020-01-01 00:00:05", "2020-01-01 00:00:00").unwrap(),
            5
        );
    }

    #[test]
    fn test_bad_timestamp_is_hard_error() {
        let mut parser = StepParser::new();
        parser
            .parse_line("2020-01-01 00:00:00 INFO - ##### Running build step.", 1)
            .unwrap();
        // No prefix on the end marker: the empty start-of-step timestamp
        // placeholder cannot parse.
        let err = parser
            .parse_line("##### Finished build step. Success: True", 2)
            .unwrap_err();
        assert!(matches!(err, ParseError::Timestamp { .. }));
    }

    // ── Truncation ───────────────────────────────────────────────

    #[test]
    fn test_errors_capped_with_flag() {
        let mut parser = StepParser::new();
        parser
            .parse_line("2020-01-01 00:00:00 INFO - ##### Running run-tests step.", 1)
            .unwrap();
        for i in 0..105 {
            parser.parse_line("Failure", i + 2).unwrap();
        }
        parser
            .parse_line(
                "2020-01-01 00:00:09 INFO - ##### Finished run-tests step. Success: True",
                107,
            )
            .unwrap();
        let artifact = parser.into_artifact();
        let step = &artifact.steps[0];
        assert_eq!(step.errors.len(), MAX_STEP_ERROR_LINES);
        assert_eq!(step.error_count, 105);
        assert!(artifact.errors_truncated);
        assert_eq!(artifact.all_errors.len(), MAX_STEP_ERROR_LINES);
    }

    // ── Truncated log ────────────────────────────────────────────

    #[test]
    fn test_truncated_log_keeps_placeholders() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2020-01-01 00:00:00 INFO - ##### Running run-tests step.",
                "2020-01-01 00:00:01 INFO - working",
            ],
        );
        let artifact = parser.into_artifact();
        let step = &artifact.steps[0];
        assert_eq!(step.result, Verdict::Unknown);
        assert_eq!(step.finished, step.started);
        assert_eq!(step.finished_linenumber, step.started_linenumber + 1);
    }

    #[test]
    fn test_skip_end_does_not_close_running_step() {
        let mut parser = StepParser::new();
        feed(
            &mut parser,
            &[
                "2020-01-01 00:00:00 INFO - ##### Running build step.",
                "2020-01-01 00:00:00 INFO - #####",
            ],
        );
        // bare ##### only terminates skipped steps
        assert_eq!(parser.artifact().steps[0].result, Verdict::Unknown);
    }
}
