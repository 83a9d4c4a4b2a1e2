//! Tracing subscriber setup
//!
//! `RUST_LOG` overrides the default filter. OpenTelemetry export is not
//! wired; spans go to stdout only.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "pixfeed=debug,tower_http=debug";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry(
    service_name: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    tracing::info!(
        service.name = service_name,
        service.version = env!("CARGO_PKG_VERSION"),
        log_format = if json { "json" } else { "text" },
        "Telemetry initialized"
    );
    Ok(())
}
