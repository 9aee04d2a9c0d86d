//! Whole-log summarization: drive the step parser over every line of a
//! build log and package the result as a named artifact.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::classify::cap_line;
use super::model::{ParseError, StepArtifact};
use super::step::StepParser;

/// Summary artifact for one build log.
#[derive(Debug, Serialize, Deserialize)]
pub struct TextLogSummary {
    pub logurl: String,
    pub logname: String,
    pub step_data: StepArtifact,
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("failed to read log")]
    Io(#[from] std::io::Error),
    #[error("failed to parse log")]
    Parse(#[from] ParseError),
}

/// Feeds capped, numbered lines to a [`StepParser`].
#[derive(Debug, Default)]
pub struct LogSummaryBuilder {
    parser: StepParser,
    lineno: u64,
}

impl LogSummaryBuilder {
    pub fn new() -> Self {
        Self {
            parser: StepParser::new(),
            lineno: 0,
        }
    }

    pub fn feed_line(&mut self, line: &str) -> Result<(), ParseError> {
        self.lineno += 1;
        self.parser.parse_line(cap_line(line), self.lineno)
    }

    pub fn feed(&mut self, log: &str) -> Result<(), ParseError> {
        for line in log.lines() {
            self.feed_line(line.trim_end())?;
        }
        Ok(())
    }

    pub fn finish(self, logurl: impl Into<String>, logname: impl Into<String>) -> TextLogSummary {
        TextLogSummary {
            logurl: logurl.into(),
            logname: logname.into(),
            step_data: self.parser.into_artifact(),
        }
    }
}

/// Parse a build log from disk. `logurl` is the public URL the summary
/// should point readers at; the artifact name is the file's basename.
pub fn parse_log_file(path: &Path, logurl: &str) -> Result<TextLogSummary, SummaryError> {
    let log = std::fs::read_to_string(path)?;
    let logname = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_owned());

    let mut builder = LogSummaryBuilder::new();
    builder.feed(&log)?;
    let summary = builder.finish(logurl, logname);
    info!(
        steps = summary.step_data.steps.len(),
        errors = summary.step_data.all_errors.len(),
        "parsed build log"
    );
    Ok(summary)
}

// ──────────────────────────── tests ────────────────────────────
