//! Cursor — single-line pushback over the lines of an in-memory log.
//!
//! Replaces generator-style requeueing with an explicit cursor object.
//! Pushback depth is one line by construction of the protocol parser, and
//! enforced here with an assertion.

/// Cursor over the lines of a log with 1-based numbering and a one-line
/// pushback slot. Lines are right-trimmed on the way out.
#[derive(Debug)]
pub struct LineCursor<'a> {
    lines: std::str::Lines<'a>,
    lineno: u64,
    pushed: Option<(u64, &'a str)>,
}

impl<'a> LineCursor<'a> {
    pub fn new(log: &'a str) -> Self {
        Self {
            lines: log.lines(),
            lineno: 0,
            pushed: None,
        }
    }

    /// Next line with its number; a pushed-back line is yielded first.
    pub fn next_line(&mut self) -> Option<(u64, &'a str)> {
        if let Some(entry) = self.pushed.take() {
            return Some(entry);
        }
        let line = self.lines.next()?;
        self.lineno += 1;
        Some((self.lineno, line.trim_end()))
    }

    /// Requeue a line so the next read returns it again.
    pub fn pushback(&mut self, lineno: u64, line: &'a str) {
        assert!(self.pushed.is_none(), "pushback depth exceeds one line");
        self.pushed = Some((lineno, line));
    }

    /// True while a pushed-back line is waiting to be re-read.
    pub fn is_replaying(&self) -> bool {
        self.pushed.is_some()
    }

    /// Last line number handed out; used to tag end-of-input errors.
    pub fn last_line(&self) -> u64 {
        self.lineno
    }

    pub fn at_end(&self) -> bool {
        self.pushed.is_none() && self.lines.clone().next().is_none()
    }
}
