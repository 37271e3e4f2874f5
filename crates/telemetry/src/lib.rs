//! Logging and tracing bootstrap.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use erudio_kernel::settings::{LogFormat, TelemetrySettings};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .map_err(|e| anyhow!("invalid log level '{}': {}", settings.log_level, e))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    // A second initialization (tests, embedded use) keeps the first subscriber.
    if installed.is_err() {
        tracing::debug!(target: "erudio-telemetry", "tracing subscriber already installed");
    }

    tracing::info!(
        target: "erudio-telemetry",
        format = ?settings.log_format,
        level = %settings.log_level,
        "telemetry initialized"
    );

    Ok(())
}
