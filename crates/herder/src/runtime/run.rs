//! Run — CLI definition and command dispatch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::conf::HerderConfig;
use crate::parser::model::SteeplechaseResult;
use crate::parser::summary::TextLogSummary;
use crate::parser::{steeplechase, summary, verdict, Verdict};
use crate::runtime::boot;
use crate::submit::model::{result_summary, JobDetail};
use crate::submit::service::{submit_complete, DryRunService, Submitter};
use crate::submit::TestJob;

#[derive(Debug, Parser)]
#[command(name = "herder", about = "Parse CI harness logs into result artifacts")]
pub struct Cli {
    /// Config file path (default: $HERDER_CONFIG_FILE or herder.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Public URL of the log, recorded in the artifact
    #[arg(long)]
    pub log_url: Option<String>,

    /// Write the JSON artifact here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Submit the job to the configured results service
    #[arg(long)]
    pub submit: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a step-structured harness log
    Steps { log: PathBuf },
    /// Parse a paired-client steeplechase log
    Steeplechase { log: PathBuf },
}

/// Run one CLI invocation and map the verdict to a process exit code:
/// success is 0, a broken harness is 2, anything else is 1.
pub fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let config = boot::boot(cli.config.as_deref(), cli.submit)?;

    let (verdict, artifact) = match &cli.command {
        Command::Steps { log } => {
            let log_url = log_url_for(cli.log_url.as_deref(), log);
            let summary = summary::parse_log_file(log, &log_url)?;
            let verdict = verdict::steps_verdict(&summary.step_data);
            if cli.submit {
                submit_job(&config, build_steps_job(&config, &summary, verdict), log)?;
            }
            (verdict, serde_json::to_value(&summary)?)
        }
        Command::Steeplechase { log } => {
            let results = steeplechase::parse_file(log)?;
            let verdict = verdict::steeplechase_verdict(&results);
            if cli.submit {
                submit_job(&config, build_steeplechase_job(&config, &results, verdict), log)?;
            }
            (verdict, serde_json::to_value(&results)?)
        }
    };

    write_artifact(cli.output.as_deref(), &artifact)?;
    info!(verdict = verdict.as_str(), "run classified");
    Ok(exit_code(verdict))
}

pub fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Success => 0,
        Verdict::Busted => 2,
        _ => 1,
    }
}

fn log_url_for(log_url: Option<&str>, log: &Path) -> String {
    match log_url {
        Some(url) => url.to_owned(),
        None => format!("file://{}", log.display()),
    }
}

fn write_artifact(
    output: Option<&Path>,
    artifact: &serde_json::Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = serde_json::to_string_pretty(artifact)?;
    match output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Hand the completed job to the results service. With no transport in
/// this crate the posting side is a dry run; everything else (details,
/// artifacts, timestamps) is the real payload.
fn submit_job(
    config: &HerderConfig,
    mut job: TestJob,
    log: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    job.log_files.push(log.to_path_buf());

    let submitter = Submitter::new(
        DryRunService,
        config.retries,
        Duration::from_secs(config.retry_wait_secs),
    );
    submit_complete(&submitter, None, std::slice::from_mut(&mut job))?;
    Ok(())
}

/// Job metadata shared by both log shapes: names and symbols from config.
fn base_job(config: &HerderConfig, verdict: Verdict) -> TestJob {
    let mut job = TestJob::new(&config.job_name);
    job.job_name = config.job_name.clone();
    job.job_symbol = config.job_symbol.clone();
    job.group_name = config.group_name.clone();
    job.group_symbol = config.group_symbol.clone();
    job.description = config.job_description.clone();
    job.reason = config.job_reason.clone();
    job.who = config.job_who.clone();
    job.result = verdict;
    job
}

/// Jenkins build identity details, appended after any result rows.
fn jenkins_details(config: &HerderConfig) -> Vec<JobDetail> {
    let mut details = Vec::new();
    if !config.jenkins_build_url.is_empty() {
        details.push(JobDetail::link(
            "artifact uploaded",
            "Jenkins Build URL (VPN required)",
            config.jenkins_build_url.clone(),
        ));
    }
    if !config.jenkins_build_tag.is_empty() {
        details.push(JobDetail::text(
            "artifact uploaded",
            config.jenkins_build_tag.clone(),
        ));
    }
    details
}

fn build_steps_job(config: &HerderConfig, summary: &TextLogSummary, verdict: Verdict) -> TestJob {
    let mut job = base_job(config, verdict);
    job.job_details.extend(jenkins_details(config));
    if let Ok(payload) = serde_json::to_value(summary) {
        job.add_artifact("text_log_summary", "json", payload);
    }
    job
}

fn build_steeplechase_job(
    config: &HerderConfig,
    results: &SteeplechaseResult,
    verdict: Verdict,
) -> TestJob {
    let mut job = base_job(config, verdict);
    job.job_details.extend(result_summary(results));
    job.job_details.extend(jenkins_details(config));
    if let Ok(payload) = serde_json::to_value(results) {
        job.add_artifact("Results", "json", payload);
    }
    job
}

// ──────────────────────────── tests ────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Verdict::Success), 0);
        assert_eq!(exit_code(Verdict::TestFailed), 1);
        assert_eq!(exit_code(Verdict::Exception), 1);
        assert_eq!(exit_code(Verdict::Unknown), 1);
        assert_eq!(exit_code(Verdict::Busted), 2);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "herder",
            "--log-url",
            "http://ci/log",
            "steps",
            "/tmp/build.log",
        ])
        .unwrap();
        assert_eq!(cli.log_url.as_deref(), Some("http://ci/log"));
        assert!(matches!(cli.command, Command::Steps { .. }));
        assert!(!cli.submit);

        let cli = Cli::try_parse_from(["herder", "--submit", "steeplechase", "/tmp/sc.log"]).unwrap();
        assert!(cli.submit);
        assert!(matches!(cli.command, Command::Steeplechase { .. }));
    }

    #[test]
    fn test_build_steeplechase_job_carries_config_and_summary() {
        let config = HerderConfig {
            jenkins_build_url: "http://jenkins/build/7".to_string(),
            jenkins_build_tag: "jenkins-webrtc-7".to_string(),
            ..HerderConfig::default()
        };
        let results = SteeplechaseResult {
            total_passed: Some(10),
            total_failed: Some(0),
            ..SteeplechaseResult::default()
        };
        let job = build_steeplechase_job(&config, &results, Verdict::Success);

        assert_eq!(job.job_symbol, config.job_symbol);
        assert_eq!(job.result, Verdict::Success);
        // Result rows come before the Jenkins build identity.
        assert_eq!(job.job_details[0].title, "Total Failed");
        assert!(job
            .job_details
            .iter()
            .any(|d| d.url.as_deref() == Some("http://jenkins/build/7")));
        assert_eq!(job.artifacts.len(), 1);
        assert_eq!(job.artifacts[0].title, "Results");
    }

    #[test]
    fn test_build_steps_job_attaches_log_summary_artifact() {
        let config = HerderConfig::default();
        let summary = TextLogSummary {
            logurl: "http://ci/build.log".to_string(),
            logname: "build.log".to_string(),
            step_data: Default::default(),
        };
        let job = build_steps_job(&config, &summary, Verdict::TestFailed);

        assert_eq!(job.result, Verdict::TestFailed);
        assert_eq!(job.artifacts.len(), 1);
        assert_eq!(job.artifacts[0].title, "text_log_summary");
        assert_eq!(job.artifacts[0].mimetype, "json");
        assert_eq!(job.artifacts[0].payload["logname"], "build.log");
    }
}
