//! Typed project settings
//!
//! ```rust,no_run
//! use storepify::config::settings::get_settings;
//!
//! let settings = get_settings().expect("valid settings");
//! println!("listening on {}", settings.bind_address);
//! ```

use crate::config::sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource, merge_value};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use storepify_debug_toolbar::ToolbarConfig;

/// Environment variable prefix of settings overrides
pub const ENV_PREFIX: &str = "STOREPIFY_";

/// Environment variable selecting the settings profile
pub const PROFILE_VAR: &str = "STOREPIFY_ENV";

const MIN_SECRET_KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to load {source_name}: {error}")]
	Source {
		source_name: String,
		error: SourceError,
	},

	#[error("Invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Fmt,
	Pretty,
	Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
	pub url: String,
	pub max_connections: u32,
}

impl Default for DatabaseSettings {
	fn default() -> Self {
		Self {
			url: "sqlite://storepify.sqlite3?mode=rwc".into(),
			max_connections: 5,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
	pub access_lifetime_secs: i64,
	pub refresh_lifetime_secs: i64,
}

impl Default for JwtSettings {
	fn default() -> Self {
		Self {
			access_lifetime_secs: 300,
			refresh_lifetime_secs: 86_400,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
	pub require_staff: bool,
	pub list_per_page: usize,
	/// Upper bound of order items per order in the admin form
	pub order_item_max: usize,
}

impl Default for AdminSettings {
	fn default() -> Self {
		Self {
			require_staff: true,
			list_per_page: 100,
			order_item_max: 2,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// Filter directive used when `RUST_LOG` is unset
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".into(),
			format: LogFormat::Fmt,
		}
	}
}

/// Project settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub debug: bool,
	pub secret_key: String,
	pub allowed_hosts: Vec<String>,
	pub internal_ips: Vec<IpAddr>,
	pub bind_address: String,
	pub database: DatabaseSettings,
	pub jwt: JwtSettings,
	pub admin: AdminSettings,
	pub debug_toolbar: ToolbarConfig,
	pub logging: LoggingSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			secret_key: String::new(),
			allowed_hosts: Vec::new(),
			internal_ips: vec![IpAddr::from([127, 0, 0, 1])],
			bind_address: "127.0.0.1:8000".into(),
			database: DatabaseSettings::default(),
			jwt: JwtSettings::default(),
			admin: AdminSettings::default(),
			debug_toolbar: ToolbarConfig::default(),
			logging: LoggingSettings::default(),
		}
	}
}

impl Settings {
	/// Reject combinations that are unsafe outside development
	pub fn validate(&self) -> Result<(), SettingsError> {
		if !self.debug && self.secret_key.len() < MIN_SECRET_KEY_LEN {
			return Err(SettingsError::ImproperlyConfigured(format!(
				"secret_key must be at least {} characters when debug is off",
				MIN_SECRET_KEY_LEN
			)));
		}
		if self.secret_key.is_empty() {
			return Err(SettingsError::ImproperlyConfigured(
				"secret_key must not be empty".into(),
			));
		}
		if self.admin.order_item_max == 0 {
			return Err(SettingsError::ImproperlyConfigured(
				"admin.order_item_max must be at least 1".into(),
			));
		}
		Ok(())
	}

	/// Toolbar configuration; the toolbar follows `debug` and `internal_ips`
	pub fn toolbar_config(&self) -> ToolbarConfig {
		ToolbarConfig {
			enabled: self.debug,
			internal_ips: self.internal_ips.clone(),
			..self.debug_toolbar.clone()
		}
	}
}

/// Merges prioritized sources into [`Settings`]
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merged settings as a JSON tree
	pub fn build_value(&self) -> Result<Value, SettingsError> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = json!({});
		for source in ordered {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			tracing::debug!(source = %source.description(), keys = values.len(), "settings source loaded");
			merge_value(&mut merged, Value::Object(values.into_iter().collect()));
		}
		Ok(merged)
	}

	/// Typed and validated settings
	pub fn build(&self) -> Result<Settings, SettingsError> {
		let settings: Settings = serde_json::from_value(self.build_value()?)?;
		settings.validate()?;
		Ok(settings)
	}
}

/// Builder with the project's standard source stack
///
/// Priority (highest first): `STOREPIFY_` environment variables,
/// `{settings_dir}/{profile}.toml`, `{settings_dir}/base.toml`, defaults.
pub fn builder_for(settings_dir: &Path, profile: &str) -> SettingsBuilder {
	SettingsBuilder::new()
		.add_source(
			DefaultSource::new()
				.with_value("debug", Value::Bool(false))
				.with_value("bind_address", Value::String("127.0.0.1:8000".into())),
		)
		.add_source(TomlFileSource::new(settings_dir.join("base.toml")))
		.add_source(TomlFileSource::new(settings_dir.join(format!("{}.toml", profile))))
		.add_source(EnvSource::new().with_prefix(ENV_PREFIX))
}

/// Settings for the profile named by `STOREPIFY_ENV` (default `local`)
pub fn get_settings() -> Result<Settings, SettingsError> {
	let profile = std::env::var(PROFILE_VAR).unwrap_or_else(|_| "local".to_string());
	let settings_dir = std::env::current_dir()
		.map(|dir| dir.join("settings"))
		.unwrap_or_else(|_| PathBuf::from("settings"));
	builder_for(&settings_dir, &profile).build()
}
