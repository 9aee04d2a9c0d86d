//! Job payload shapes for the results service.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::parser::model::{SteeplechaseResult, Verdict};

/// One row of the job-details panel rendered next to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    pub title: String,
    pub value: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl JobDetail {
    pub fn text(title: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self {
            title: title.into(),
            value: value.to_string(),
            content_type: "text".to_owned(),
            url: None,
        }
    }

    pub fn link(title: impl Into<String>, value: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            content_type: "link".to_owned(),
            url: Some(url.into()),
        }
    }
}

/// A named artifact attached to a job, e.g. a parsed-log summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobArtifact {
    pub title: String,
    pub mimetype: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
        }
    }
}

/// Build attributes displayed in the results UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildInfo {
    pub product: String,
    pub release: String,
    pub repo: String,
    pub os_name: String,
    pub platform: String,
    pub architecture: String,
    pub package: String,
    pub revision: String,
    pub build_id: String,
}

/// Attributes of the machine the job ran on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineInfo {
    pub os_name: String,
    pub platform: String,
    pub architecture: String,
    pub host: String,
}

/// Everything about one job that the results service needs to see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestJob {
    /// Internal name, not shown in the UI.
    pub name: String,
    pub job_name: String,
    pub job_symbol: String,
    pub group_name: String,
    pub group_symbol: String,
    pub description: String,
    pub reason: String,
    pub who: String,
    pub guid: String,
    pub state: JobState,
    pub result: Verdict,
    pub submit_timestamp: Option<u64>,
    pub start_timestamp: Option<u64>,
    pub end_timestamp: Option<u64>,
    pub build: BuildInfo,
    pub machine: MachineInfo,
    pub build_url: Option<String>,
    pub job_details: Vec<JobDetail>,
    pub artifacts: Vec<JobArtifact>,
    /// Absolute paths queued for blob upload at completion.
    pub log_files: Vec<PathBuf>,
}

impl TestJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job_name: String::new(),
            job_symbol: String::new(),
            group_name: String::new(),
            group_symbol: String::new(),
            description: String::new(),
            reason: String::new(),
            who: String::new(),
            guid: Uuid::new_v4().to_string(),
            state: JobState::Pending,
            result: Verdict::Unknown,
            submit_timestamp: None,
            start_timestamp: None,
            end_timestamp: None,
            build: BuildInfo::default(),
            machine: MachineInfo::default(),
            build_url: None,
            job_details: Vec::new(),
            artifacts: Vec::new(),
            log_files: Vec::new(),
        }
    }

    pub fn add_artifact(&mut self, title: impl Into<String>, mimetype: impl Into<String>, payload: Value) {
        self.artifacts.push(JobArtifact {
            title: title.into(),
            mimetype: mimetype.into(),
            payload,
        });
    }

    /// Key prefix keeping this job's uploads apart from every other job's.
    /// Spaces are unusable in object keys and become dashes.
    pub fn unique_blob_prefix(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}/",
            self.build.repo,
            self.build.release,
            self.build.platform,
            self.build.architecture,
            self.build.build_id,
            self.guid,
        )
        .replace(' ', "-")
    }
}

/// Seconds since the Unix epoch.
pub fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Job-details rows summarizing a steeplechase run: overall totals first,
/// then block and failure counts per client. Unset totals render as "none".
pub fn result_summary(results: &SteeplechaseResult) -> Vec<JobDetail> {
    fn total(value: Option<u64>) -> String {
        value.map_or_else(|| "none".to_owned(), |n| n.to_string())
    }

    let mut summary = vec![
        JobDetail::text("Total Failed", total(results.total_failed)),
        JobDetail::text("Total Passed", total(results.total_passed)),
    ];
    for client in &results.clients {
        let name = &client.name;
        summary.push(JobDetail::text(format!("{name} Total Blocks"), client.blocks));
        summary.push(JobDetail::text(
            format!("{name} Failed Blocks"),
            client.failed_blocks.len(),
        ));
        summary.push(JobDetail::text(
            format!("{name} Session Failures"),
            client.session_failures.len(),
        ));
        summary.push(JobDetail::text(
            format!("{name} Setup Failures"),
            client.setup_failures.len(),
        ));
        summary.push(JobDetail::text(
            format!("{name} Cleanup Failures"),
            client.cleanup_failures.len(),
        ));
    }
    summary
}

// ──────────────────────────── tests ────────────────────────────
