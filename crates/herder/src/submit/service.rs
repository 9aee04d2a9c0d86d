//! Results-service boundary and the retrying submitter.

use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::blob::{upload_job_files, BlobStore};
use super::model::{timestamp_now, JobState, TestJob};

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The service did not answer in time; safe to retry.
    #[error("submission timed out")]
    Timeout,
    /// The service answered and said no; retrying will not help.
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("submission transport failed")]
    Io(#[from] std::io::Error),
}

/// Transport to the results service. One call posts a whole collection.
pub trait ResultsService {
    fn post(&self, jobs: &[TestJob]) -> Result<(), SubmitError>;
}

/// Wraps a [`ResultsService`] with a bounded retry loop. Only timeouts are
/// retried; a rejection or transport failure is final.
pub struct Submitter<S> {
    service: S,
    retries: u32,
    retry_wait: Duration,
}

impl<S: ResultsService> Submitter<S> {
    pub fn new(service: S, retries: u32, retry_wait: Duration) -> Self {
        Self {
            service,
            retries: retries.max(1),
            retry_wait,
        }
    }

    pub fn submit(&self, jobs: &[TestJob]) -> Result<(), SubmitError> {
        let mut last = SubmitError::Timeout;
        for attempt in 1..=self.retries {
            debug!(attempt, jobs = jobs.len(), "posting job collection");
            match self.service.post(jobs) {
                Ok(()) => {
                    info!(jobs = jobs.len(), "job collection posted");
                    return Ok(());
                }
                Err(SubmitError::Timeout) => {
                    warn!(attempt, retries = self.retries, "submission timed out");
                    last = SubmitError::Timeout;
                    if attempt < self.retries {
                        std::thread::sleep(self.retry_wait);
                    }
                }
                Err(err) => {
                    error!(error = %err, "submission failed");
                    return Err(err);
                }
            }
        }
        Err(last)
    }
}

/// Finalize jobs and post them: stamp completion times, upload queued files
/// to the blob store when one is configured, then submit the collection.
pub fn submit_complete<S: ResultsService>(
    submitter: &Submitter<S>,
    blob_store: Option<&dyn BlobStore>,
    jobs: &mut [TestJob],
) -> Result<(), SubmitError> {
    let now = timestamp_now();
    for job in jobs.iter_mut() {
        job.state = JobState::Completed;
        job.end_timestamp = Some(now);
        // A job cancelled before it started has no earlier timestamps.
        job.start_timestamp.get_or_insert(now);
        job.submit_timestamp.get_or_insert(now);
        if let Some(store) = blob_store {
            upload_job_files(store, job);
        }
    }
    submitter.submit(jobs)
}

/// Stand-in service for runs without a configured endpoint: logs the payload
/// it would have posted and reports success.
pub struct DryRunService;

impl ResultsService for DryRunService {
    fn post(&self, jobs: &[TestJob]) -> Result<(), SubmitError> {
        for job in jobs {
            let payload = json!({
                "guid": job.guid,
                "name": job.job_name,
                "symbol": job.job_symbol,
                "result": job.result,
                "state": job.state,
                "details": job.job_details,
            });
            info!(%payload, "dry-run submission");
        }
        Ok(())
    }
}

// ──────────────────────────── tests ────────────────────────────
