//! Boot — logging init and config load.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::HerderConfig;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load and validate configuration. `submitting` enables the extra checks
/// a submission run needs (service URL, credentials).
pub fn boot(
    config_path: Option<&str>,
    submitting: bool,
) -> Result<HerderConfig, Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => HerderConfig::load_from(path)?,
        None => HerderConfig::load()?,
    };
    config.validate(submitting)?;
    info!(
        job = %config.job_name,
        symbol = %config.job_symbol,
        "configuration loaded"
    );
    Ok(config)
}
