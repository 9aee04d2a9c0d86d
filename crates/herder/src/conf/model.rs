//! Model — HerderConfig and validation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HerderConfig {
    /// Base URL of the results service. Empty disables submission.
    pub results_url: String,
    pub results_credentials_path: String,
    pub blob_credentials_path: String,
    pub retries: u32,
    pub retry_wait_secs: u64,
    pub group_name: String,
    pub group_symbol: String,
    pub job_name: String,
    pub job_symbol: String,
    pub job_description: String,
    pub job_reason: String,
    pub job_who: String,
    /// Jenkins build identity, filled from `BUILD_TAG` / `BUILD_URL`.
    pub jenkins_build_tag: String,
    pub jenkins_build_url: String,
}

impl Default for HerderConfig {
    fn default() -> Self {
        Self {
            results_url: String::new(),
            results_credentials_path: "credentials/results-credentials.json".to_string(),
            blob_credentials_path: "credentials/blob-credentials.json".to_string(),
            retries: 5,
            retry_wait_secs: 5,
            group_name: "Paired WebRTC Tests".to_string(),
            group_symbol: "PW".to_string(),
            job_name: "WebRTC Pair".to_string(),
            job_symbol: "p".to_string(),
            job_description: "Paired WebRTC tests across browser versions and platforms."
                .to_string(),
            job_reason: "scheduled".to_string(),
            job_who: "PlatformQuality".to_string(),
            jenkins_build_tag: String::new(),
            jenkins_build_url: String::new(),
        }
    }
}

impl HerderConfig {
    /// Validate configuration values. Submission-only requirements are
    /// checked only when submission is enabled.
    pub fn validate(&self, submitting: bool) -> Result<(), String> {
        if self.retries == 0 {
            return Err("retries must be > 0".to_string());
        }
        if submitting {
            if self.results_url.is_empty() {
                return Err("results_url must be set when submission is enabled".to_string());
            }
            if self.results_credentials_path.is_empty() {
                return Err(
                    "results_credentials_path must be set when submission is enabled".to_string(),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ─────────────────────────────────────────────────

    #[test]
    fn test_default_retry_settings() {
        let cfg = HerderConfig::default();
        assert_eq!(cfg.retries, 5);
        assert_eq!(cfg.retry_wait_secs, 5);
    }

    #[test]
    fn test_default_url_empty_disables_submission() {
        let cfg = HerderConfig::default();
        assert!(cfg.results_url.is_empty());
    }

    // ── Validation ───────────────────────────────────────────────

    #[test]
    fn test_validate_default_passes_without_submission() {
        assert!(HerderConfig::default().validate(false).is_ok());
    }

    #[test]
    fn test_validate_requires_url_for_submission() {
        let err = HerderConfig::default().validate(true).unwrap_err();
        assert!(err.contains("results_url"), "{err}");
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let cfg = HerderConfig {
            retries: 0,
            ..HerderConfig::default()
        };
        let err = cfg.validate(false).unwrap_err();
        assert!(err.contains("retries"), "{err}");
    }

    // ── Serialization ────────────────────────────────────────────

    #[test]
    fn test_deserialize_partial_toml() {
        let toml_str = r#"results_url = "https://results.example.org""#;
        let cfg: HerderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.results_url, "https://results.example.org");
        assert_eq!(cfg.retries, 5); // default
        assert_eq!(cfg.group_symbol, "PW"); // default
    }

    #[test]
    fn test_toml_round_trip() {
        let cfg = HerderConfig::default();
        let toml_str = toml::to_string(&cfg).unwrap();
        let back: HerderConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.job_symbol, cfg.job_symbol);
        assert_eq!(back.retry_wait_secs, cfg.retry_wait_secs);
    }
}
