//! Classify — regex tagging of raw log lines into semantic categories.
//!
//! A flat, ordered table of (category, pattern) pairs plus a pure
//! `classify()` function. Lines are capped to [`MAX_LINE_LENGTH`] and have
//! any harness log prefix stripped before matching, so pathological input
//! costs bounded time.

use std::sync::LazyLock;

use regex::Regex;

use super::MAX_LINE_LENGTH;

/// Harness log prefix: `2015-07-16 06:27:55  INFO - `
pub(crate) static RE_LOG_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<time>\d+-\d+-\d+ \d+:\d+:\d+) +(?:DEBUG|INFO|WARNING|ERROR|CRITICAL|FATAL) - +",
    )
    .unwrap()
});

macro_rules! compiled {
    ($source:expr) => {
        LazyLock::new(|| Regex::new($source).unwrap())
    };
}

// Session-protocol markers. Patterns are start-anchored to keep the
// matching semantics of the original table.
pub(crate) static RE_TEST_START: LazyLock<Regex> = compiled!(r"^.*Waiting for results\.\.\.$");
pub(crate) static RE_TEST_END: LazyLock<Regex> = compiled!(r"^.*All clients finished$");
pub(crate) static RE_SC_ERROR: LazyLock<Regex> = compiled!(r"^steeplechase ERROR");
pub(crate) static RE_SESSION_START: LazyLock<Regex> = compiled!(r"^.*Run step: PC_.*_GUM");
pub(crate) static RE_CLIENT_START: LazyLock<Regex> = compiled!(r"^.*Log output for (.*):$");
pub(crate) static RE_CLIENT_END: LazyLock<Regex> = compiled!(r"^.*<<<<<<<$");
pub(crate) static RE_TEST_FAILURE: LazyLock<Regex> =
    compiled!(r#"^.*\{"action":"test_unexpected_fail""#);
pub(crate) static RE_RESULT_SUMMARY: LazyLock<Regex> = compiled!(r"^.*Result summary.*$");
pub(crate) static RE_TEST_FINISHED: LazyLock<Regex> = compiled!(r"^.*Test finished");
pub(crate) static RE_TOTAL_PASSED: LazyLock<Regex> = compiled!(r"^.*Passed: (\d+)");
pub(crate) static RE_TOTAL_FAILED: LazyLock<Regex> = compiled!(r"^.*Failed: (\d+)");

// Failure-family patterns used by the error sub-parser.
static RE_ERROR: LazyLock<Regex> = compiled!(r"^(?:TEST-UNEXPECTED-FAIL|TEST-UNEXPECTED-ERROR)");
static RE_CRASH: LazyLock<Regex> = compiled!(r"^(?:.*CRASH: |Crash reason: )");
static RE_AUTOMATION_ERROR: LazyLock<Regex> = compiled!(r"^Automation Error: ");
static RE_ASSERTION: LazyLock<Regex> = compiled!(r"^AssertionError: ");
static RE_FAILURE: LazyLock<Regex> = compiled!(r"^Failure");

/// External-resource errors that should not count as test failures.
static RE_EXCEPTION: LazyLock<Regex> =
    compiled!(r"^TEST-UNEXPECTED-ERROR.*TimeoutException: Error loading page, timed out");

// Section markers (capture-group variants live in `step.rs`).
static RE_STEP_START: LazyLock<Regex> = compiled!(r"^#{5} Running .*? step\.");
static RE_STEP_SKIP: LazyLock<Regex> = compiled!(r"^#{5} Skipping .*? step\.$");
static RE_STEP_END: LazyLock<Regex> =
    compiled!(r"^#{5} Finished .*? step\. Success: (?:True|False|None)");

/// Ordered category table. A line may carry several tags; the returned
/// order is the table order.
static CATEGORIES: LazyLock<Vec<(&'static str, &'static Regex)>> = LazyLock::new(|| {
    vec![
        ("step-start", &*RE_STEP_START),
        ("step-skip", &*RE_STEP_SKIP),
        ("step-end", &*RE_STEP_END),
        ("test-start", &*RE_TEST_START),
        ("test-end", &*RE_TEST_END),
        ("sc-error", &*RE_SC_ERROR),
        ("session-start", &*RE_SESSION_START),
        ("client-start", &*RE_CLIENT_START),
        ("client-end", &*RE_CLIENT_END),
        ("test-failure", &*RE_TEST_FAILURE),
        ("result-summary", &*RE_RESULT_SUMMARY),
        ("test-finished", &*RE_TEST_FINISHED),
        ("total-passed", &*RE_TOTAL_PASSED),
        ("total-failed", &*RE_TOTAL_FAILED),
        ("exception", &*RE_EXCEPTION),
        ("error", &*RE_ERROR),
        ("crash", &*RE_CRASH),
        ("automation-error", &*RE_AUTOMATION_ERROR),
        ("assertion", &*RE_ASSERTION),
        ("failure", &*RE_FAILURE),
    ]
});

/// Categories that mark a line as a failure inside an open step.
pub(crate) const FAILURE_CATEGORIES: [&str; 5] =
    ["error", "crash", "automation-error", "assertion", "failure"];

/// Truncate a line to [`MAX_LINE_LENGTH`] characters before matching.
pub fn cap_line(line: &str) -> &str {
    match line.char_indices().nth(MAX_LINE_LENGTH) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// Split a line into its optional prefix timestamp and the remainder.
pub fn strip_prefix(line: &str) -> (Option<&str>, &str) {
    match RE_LOG_PREFIX.captures(line) {
        Some(caps) => {
            let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let time = caps.name("time").map(|m| m.as_str());
            (time, &line[end..])
        }
        None => (None, line),
    }
}

/// Tag a raw line with every matching category, in table order.
///
/// Pure: no side effects. The line is capped and prefix-stripped first.
pub fn classify(line: &str) -> Vec<&'static str> {
    let (_, rest) = strip_prefix(cap_line(line));
    CATEGORIES
        .iter()
        .filter(|(_, re)| re.is_match(rest))
        .map(|(name, _)| *name)
        .collect()
}
