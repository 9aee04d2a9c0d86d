//! Protocol parser for steeplechase WebRTC harness logs.
//!
//! The log is consumed as a sequence of phases: scan to test start, then one
//! block per client (setup, session, cleanup), then the trailing totals.
//! Phase boundaries are detected one line too late in a couple of places,
//! so the cursor supports a single line of pushback.
//!
//! Harness anomalies ("steeplechase ERROR" lines and truncated phases) are
//! collected per run; a parse that aborts early still returns everything built
//! up to the point of failure, with the error attached.

use tracing::debug;

use super::classify::{
    RE_CLIENT_END, RE_CLIENT_START, RE_RESULT_SUMMARY, RE_SC_ERROR, RE_SESSION_START,
    RE_TEST_END, RE_TEST_FAILURE, RE_TEST_FINISHED, RE_TEST_START, RE_TOTAL_FAILED,
    RE_TOTAL_PASSED,
};
use super::cursor::LineCursor;
use super::model::{ClientResult, ParseError, SteeplechaseResult};

/// Cursor plus the run-local anomaly list. Every line passes through
/// `read()`, which notes harness error lines exactly once even when the
/// line is later requeued and replayed.
struct Scanner<'a> {
    cursor: LineCursor<'a>,
    anomalies: Vec<(u64, String)>,
}

impl<'a> Scanner<'a> {
    fn new(log: &'a str) -> Self {
        Self {
            cursor: LineCursor::new(log),
            anomalies: Vec::new(),
        }
    }

    /// Next line, or `UnexpectedEof` if the log ran out mid-phase.
    fn read(&mut self) -> Result<(u64, &'a str), ParseError> {
        let replaying = self.cursor.is_replaying();
        let (lineno, line) = self.cursor.next_line().ok_or(ParseError::UnexpectedEof {
            line: self.cursor.last_line(),
        })?;
        if !replaying && RE_SC_ERROR.is_match(line) {
            self.note(lineno, line);
        }
        Ok((lineno, line))
    }

    /// Like `read()`, but an early end of input is attributed to the named
    /// client rather than reported as a bare EOF.
    fn read_client(&mut self, client: &str) -> Result<(u64, &'a str), ParseError> {
        self.read().map_err(|err| match err {
            ParseError::UnexpectedEof { line } => ParseError::ClientEarlyExit {
                line,
                client: Some(client.to_owned()),
            },
            other => other,
        })
    }

    fn requeue(&mut self, lineno: u64, line: &'a str) {
        self.cursor.pushback(lineno, line);
    }

    fn note(&mut self, lineno: u64, message: impl Into<String>) {
        self.anomalies.push((lineno, message.into()));
    }
}

/// Parse a steeplechase run log.
///
/// Never fails outright: on a malformed log the returned result carries the
/// clients and totals recovered so far plus the error in `failure`.
pub fn parse(log: &str) -> SteeplechaseResult {
    let mut scanner = Scanner::new(log);
    let mut result = SteeplechaseResult::default();

    let outcome = run_phases(&mut scanner, &mut result);
    if let Err(err) = outcome {
        if let ParseError::UnexpectedEof { line } = &err {
            scanner.note(*line, "Reached unexpected EOF");
        }
        debug!(error = %err, "steeplechase parse aborted");
        result.failure = Some(err);
    }
    result.anomalies = scanner.anomalies;
    result
}

fn run_phases(scanner: &mut Scanner, result: &mut SteeplechaseResult) -> Result<(), ParseError> {
    process_setup(scanner)?;
    process_clients(scanner, &mut result.clients)?;
    process_cleanup(scanner, result)
}

/// Scan forward to the "Waiting for results..." marker that opens the run.
fn process_setup(scanner: &mut Scanner) -> Result<(), ParseError> {
    loop {
        let (lineno, line) = match scanner.read() {
            Ok(entry) => entry,
            Err(err) => {
                scanner.note(
                    err.line(),
                    "Tests are busted. No test start found.",
                );
                return Err(err);
            }
        };
        if RE_TEST_START.is_match(line) {
            debug!(lineno, "test start");
            return Ok(());
        }
    }
}

/// One block per client until the "All clients finished" marker. A premature
/// "Result summary" means no client blocks were emitted at all; the summary
/// line is handed back for the cleanup phase.
fn process_clients(
    scanner: &mut Scanner,
    clients: &mut Vec<ClientResult>,
) -> Result<(), ParseError> {
    loop {
        let (lineno, line) = match scanner.read() {
            Ok(entry) => entry,
            Err(err) => {
                scanner.note(
                    err.line(),
                    "Tests are busted. No test end or client start found",
                );
                return Err(err);
            }
        };
        if RE_TEST_END.is_match(line) {
            debug!(lineno, "all clients finished");
            return Ok(());
        }
        if let Some(caps) = RE_CLIENT_START.captures(line) {
            let name = caps[1].to_owned();
            debug!(lineno, client = %name, "client block");
            let mut client = ClientResult::new(&name);
            let outcome = process_client(scanner, &mut client);
            // Keep whatever the client block yielded even when it aborted.
            clients.push(client);
            if let Err(err) = outcome {
                if matches!(err, ParseError::ClientEarlyExit { .. }) {
                    scanner.note(
                        err.line(),
                        format!("Tests are busted. {name} exited early"),
                    );
                }
                return Err(err);
            }
        } else if RE_RESULT_SUMMARY.is_match(line) {
            scanner.requeue(lineno, line);
            return Ok(());
        }
    }
}

/// Setup, sessions, and cleanup for a single client.
fn process_client(scanner: &mut Scanner, client: &mut ClientResult) -> Result<(), ParseError> {
    client_setup(scanner, client)?;
    client_session(scanner, client)?;
    client_cleanup(scanner, client)
}

/// Client setup runs until the first session-start marker. A client-end
/// marker is handed back too: the session phase reads it and reports the
/// client as having exited before running any test.
fn client_setup(scanner: &mut Scanner, client: &mut ClientResult) -> Result<(), ParseError> {
    loop {
        let (lineno, line) = scanner.read_client(&client.name)?;
        if RE_SESSION_START.is_match(line) || RE_CLIENT_END.is_match(line) {
            scanner.requeue(lineno, line);
            return Ok(());
        }
        if RE_TEST_FAILURE.is_match(line) {
            client.setup_failures.push((lineno, line.to_owned()));
        }
    }
}

/// The client's test session: every session-start marker opens one block,
/// and the phase ends at the "Test finished" marker. A client-end marker
/// here means the client died mid-test.
fn client_session(scanner: &mut Scanner, client: &mut ClientResult) -> Result<(), ParseError> {
    loop {
        let (lineno, line) = scanner.read_client(&client.name)?;
        if RE_SESSION_START.is_match(line) {
            client.blocks += 1;
        } else if RE_TEST_FINISHED.is_match(line) {
            return Ok(());
        } else if RE_CLIENT_END.is_match(line) {
            return Err(ParseError::ClientEarlyExit {
                line: lineno,
                client: Some(client.name.clone()),
            });
        } else if RE_TEST_FAILURE.is_match(line) {
            client.session_failures.push((lineno, line.to_owned()));
        }
    }
}

/// After the last session, consume until the client-end marker.
fn client_cleanup(scanner: &mut Scanner, client: &mut ClientResult) -> Result<(), ParseError> {
    loop {
        let (lineno, line) = scanner.read_client(&client.name)?;
        if RE_CLIENT_END.is_match(line) {
            return Ok(());
        }
        if RE_TEST_FAILURE.is_match(line) {
            client.cleanup_failures.push((lineno, line.to_owned()));
        }
    }
}

/// Trailing totals. The failed counter is defined to appear after the
/// passed counter; a log that ends before it is truncated, and the totals
/// it never delivered stay `None` for the verdict layer.
fn process_cleanup(
    scanner: &mut Scanner,
    result: &mut SteeplechaseResult,
) -> Result<(), ParseError> {
    loop {
        let (_, line) = scanner.read()?;
        if let Some(caps) = RE_TOTAL_PASSED.captures(line) {
            result.total_passed = caps[1].parse().ok();
        }
        if let Some(caps) = RE_TOTAL_FAILED.captures(line) {
            result.total_failed = caps[1].parse().ok();
            return Ok(());
        }
    }
}

/// Parse a steeplechase log from a file on disk.
pub fn parse_file(path: &std::path::Path) -> std::io::Result<SteeplechaseResult> {
    let log = std::fs::read_to_string(path)?;
    Ok(parse(&log))
}

// ──────────────────────────── tests ────────────────────────────
