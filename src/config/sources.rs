//! Configuration sources for the layered settings system
//!
//! Sources are merged in priority order: environment variables over TOML
//! files over defaults. Sources with equal priority apply in the order they
//! were added, so a profile file added after `base.toml` overrides it.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

pub trait ConfigSource: Send + Sync {
	/// Load this source as a (possibly nested) key/value map
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Higher wins
	fn priority(&self) -> u8;

	fn description(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Environment variables, optionally filtered by prefix
///
/// Keys are lowercased after the prefix is stripped; a double underscore
/// nests, so `STOREPIFY_DATABASE__URL` sets `database.url`.
pub struct EnvSource {
	prefix: Option<String>,
	vars: Option<Vec<(String, String)>>,
}

/// Keys whose values are comma-separated lists
const LIST_KEYS: &[&str] = &["allowed_hosts", "internal_ips"];

impl EnvSource {
	pub fn new() -> Self {
		Self {
			prefix: None,
			vars: None,
		}
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	/// Read from `vars` instead of the process environment
	pub fn with_vars(mut self, vars: Vec<(String, String)>) -> Self {
		self.vars = Some(vars);
		self
	}

	fn parse_value(key: &str, value: String) -> Value {
		if LIST_KEYS.contains(&key) {
			return Value::Array(
				value
					.split(',')
					.map(str::trim)
					.filter(|item| !item.is_empty())
					.map(|item| Value::String(item.to_string()))
					.collect(),
			);
		}
		match value.trim().to_lowercase().as_str() {
			"true" | "yes" | "on" => return Value::Bool(true),
			"false" | "no" | "off" => return Value::Bool(false),
			_ => {}
		}
		if let Ok(num) = value.parse::<i64>() {
			Value::Number(num.into())
		} else {
			Value::String(value)
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let vars = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut config = IndexMap::new();
		for (key, value) in vars {
			let clean_key = match &self.prefix {
				Some(prefix) => match key.strip_prefix(prefix.as_str()) {
					Some(rest) => rest.to_string(),
					None => continue,
				},
				None => key,
			};
			let lower_key = clean_key.to_lowercase();
			// The profile selector is not a setting.
			if lower_key == "env" {
				continue;
			}

			let path: Vec<&str> = lower_key.split("__").collect();
			let leaf = path.last().copied().unwrap_or_default();
			let parsed = Self::parse_value(leaf, value);
			insert_path(&mut config, &path, parsed);
		}
		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("Environment variables (prefix: {})", prefix),
			None => "Environment variables".to_string(),
		}
	}
}

fn insert_path(config: &mut IndexMap<String, Value>, path: &[&str], value: Value) {
	match path {
		[] => {}
		[key] => {
			config.insert(key.to_string(), value);
		}
		[key, rest @ ..] => {
			let entry = config
				.entry(key.to_string())
				.or_insert_with(|| Value::Object(Default::default()));
			if !entry.is_object() {
				*entry = Value::Object(Default::default());
			}
			let mut nested = value;
			for segment in rest.iter().rev() {
				let mut map = serde_json::Map::new();
				map.insert(segment.to_string(), nested);
				nested = Value::Object(map);
			}
			merge_value(entry, nested);
		}
	}
}

/// TOML file; a missing file loads as empty
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;
		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Default values
#[derive(Default)]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

/// Deep-merge `overlay` into `base`; tables merge key by key, anything else replaces
pub fn merge_value(base: &mut Value, overlay: Value) {
	match (base, overlay) {
		(Value::Object(base), Value::Object(overlay)) => {
			for (key, value) in overlay {
				match base.get_mut(&key) {
					Some(existing) => merge_value(existing, value),
					None => {
						base.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::io::Write;

	fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_env_source_nests_and_types_values() {
		let source = EnvSource::new().with_prefix("STOREPIFY_").with_vars(vars(&[
			("STOREPIFY_DEBUG", "false"),
			("STOREPIFY_DATABASE__URL", "sqlite::memory:"),
			("STOREPIFY_DATABASE__MAX_CONNECTIONS", "4"),
			("STOREPIFY_INTERNAL_IPS", "127.0.0.1, 10.0.0.2"),
			("STOREPIFY_ENV", "production"),
			("HOME", "/root"),
		]));

		let config = source.load().unwrap();

		assert_eq!(config["debug"], json!(false));
		assert_eq!(
			config["database"],
			json!({"url": "sqlite::memory:", "max_connections": 4})
		);
		assert_eq!(config["internal_ips"], json!(["127.0.0.1", "10.0.0.2"]));
		assert!(!config.contains_key("env"));
		assert!(!config.contains_key("home"));
	}

	#[rstest]
	fn test_toml_source() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "debug = true\n[admin]\nlist_per_page = 10").unwrap();

		let config = TomlFileSource::new(file.path()).load().unwrap();
		assert_eq!(config["debug"], json!(true));
		assert_eq!(config["admin"]["list_per_page"], json!(10));
	}

	#[rstest]
	fn test_missing_toml_file_is_empty() {
		let config = TomlFileSource::new("/nonexistent/storepify.toml")
			.load()
			.unwrap();
		assert!(config.is_empty());
	}

	#[rstest]
	fn test_merge_value_is_deep() {
		let mut base = json!({"jwt": {"access_lifetime_secs": 300, "refresh_lifetime_secs": 86400}});
		merge_value(&mut base, json!({"jwt": {"access_lifetime_secs": 60}}));
		assert_eq!(
			base,
			json!({"jwt": {"access_lifetime_secs": 60, "refresh_lifetime_secs": 86400}})
		);
	}
}
