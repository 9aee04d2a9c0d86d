//! Blob storage boundary for bulk artifacts (raw logs, config dumps).

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{info, warn};

use super::model::{JobDetail, TestJob};

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("failed to read upload source")]
    Io(#[from] std::io::Error),
    #[error("upload rejected: {0}")]
    Upload(String),
}

/// Store for bulk files. Implementations return the public URL of the
/// uploaded object.
pub trait BlobStore {
    fn upload(&self, source: &Path, key: &str) -> Result<String, BlobError>;
}

/// Object key for one upload: prefix, then a timestamp in case the filename
/// is not unique, then the filename. Spaces become dashes.
pub fn object_key(prefix: &str, filename: &str) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    format!("{prefix}{stamp}{filename}").replace(' ', "-")
}

/// Upload every queued log file of a job, recording the outcome as job
/// details. A failed upload is noted and skipped; it never aborts the job.
pub fn upload_job_files(store: &dyn BlobStore, job: &mut TestJob) {
    let prefix = job.unique_blob_prefix();
    for path in job.log_files.clone() {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = object_key(&prefix, &filename);
        match store.upload(&path, &key) {
            Ok(url) => {
                info!(%url, "artifact uploaded");
                job.job_details
                    .push(JobDetail::link("artifact uploaded", &filename, url));
            }
            Err(err) => {
                warn!(file = %filename, error = %err, "artifact upload failed");
                job.job_details
                    .push(JobDetail::text("Error", format!("Failed to upload {filename}.")));
            }
        }
    }
}

// ──────────────────────────── tests ────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;

    use super::*;

    struct FakeStore {
        keys: RefCell<Vec<String>>,
        fail: bool,
    }

    impl BlobStore for FakeStore {
        fn upload(&self, _source: &Path, key: &str) -> Result<String, BlobError> {
            if self.fail {
                return Err(BlobError::Upload("denied".to_owned()));
            }
            self.keys.borrow_mut().push(key.to_owned());
            Ok(format!("http://blobs/{key}"))
        }
    }

    #[test]
    fn test_object_key_replaces_spaces() {
        let key = object_key("repo/rel/", "my log.txt");
        assert!(key.starts_with("repo/rel/"));
        assert!(key.ends_with("my-log.txt"));
        assert!(!key.contains(' '));
    }

    #[test]
    fn test_upload_appends_link_details() {
        let store = FakeStore {
            keys: RefCell::new(Vec::new()),
            fail: false,
        };
        let mut job = TestJob::new("job");
        job.log_files.push(PathBuf::from("/tmp/steeplechase.log"));

        upload_job_files(&store, &mut job);

        assert_eq!(store.keys.borrow().len(), 1);
        assert_eq!(job.job_details.len(), 1);
        let detail = &job.job_details[0];
        assert_eq!(detail.content_type, "link");
        assert_eq!(detail.value, "steeplechase.log");
        assert!(detail.url.as_deref().unwrap().starts_with("http://blobs/"));
    }

    #[test]
    fn test_failed_upload_is_noted_not_fatal() {
        let store = FakeStore {
            keys: RefCell::new(Vec::new()),
            fail: true,
        };
        let mut job = TestJob::new("job");
        job.log_files.push(PathBuf::from("/tmp/a.log"));
        job.log_files.push(PathBuf::from("/tmp/b.log"));

        upload_job_files(&store, &mut job);

        assert_eq!(job.job_details.len(), 2);
        assert!(job.job_details.iter().all(|d| d.title == "Error"));
        assert!(job.job_details[0].value.contains("a.log"));
    }
}
