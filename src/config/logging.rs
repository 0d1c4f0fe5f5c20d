//! Global `tracing` subscriber

use crate::config::settings::{LogFormat, LoggingSettings};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter from `RUST_LOG`, falling back to the configured level
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

/// Install the global subscriber; fails if one is already installed
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
	let registry = tracing_subscriber::registry().with(env_filter(settings));

	match settings.format {
		LogFormat::Fmt => registry.with(fmt::layer().with_target(true)).try_init()?,
		LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init()?,
		LogFormat::Json => registry
			.with(fmt::layer().json().with_current_span(true))
			.try_init()?,
	}

	tracing::debug!(format = ?settings.format, level = %settings.level, "logging initialized");
	Ok(())
}
