//! Toolbar configuration

use serde::Deserialize;
use std::net::IpAddr;

/// Path prefix the toolbar's own routes live under; never recorded.
pub const TOOLBAR_PREFIX: &str = "/__debug__";

/// Debug toolbar settings
///
/// Read from the `debug_toolbar` table of the project settings; `enabled`
/// follows the project's `debug` flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
	/// Record requests at all
	pub enabled: bool,
	/// Only requests from these addresses are recorded
	pub internal_ips: Vec<IpAddr>,
	/// Number of requests kept in the history
	pub history_size: usize,
	/// Statements at or above this duration are flagged slow
	pub sql_warning_threshold_ms: u64,
	/// A normalized statement repeated more than this many times is an N+1 hint
	pub n_plus_one_threshold: usize,
}

impl Default for ToolbarConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			internal_ips: vec![
				IpAddr::from([127, 0, 0, 1]),
				IpAddr::from([0, 0, 0, 0, 0, 0, 0, 1]),
			],
			history_size: 25,
			sql_warning_threshold_ms: 100,
			n_plus_one_threshold: 3,
		}
	}
}

impl ToolbarConfig {
	/// Whether a request from `ip` to `path` should be recorded
	pub fn should_record(&self, ip: Option<IpAddr>, path: &str) -> bool {
		if !self.enabled || path.starts_with(TOOLBAR_PREFIX) {
			return false;
		}
		ip.is_some_and(|ip| self.internal_ips.contains(&ip))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn enabled() -> ToolbarConfig {
		ToolbarConfig {
			enabled: true,
			..Default::default()
		}
	}

	#[rstest]
	#[case(Some("127.0.0.1"), "/store/products/", true)]
	#[case(Some("::1"), "/admin/", true)]
	#[case(Some("10.1.2.3"), "/store/products/", false)]
	#[case(None, "/store/products/", false)]
	#[case(Some("127.0.0.1"), "/__debug__/", false)]
	#[case(Some("127.0.0.1"), "/__debug__/3/", false)]
	fn test_should_record(#[case] ip: Option<&str>, #[case] path: &str, #[case] expected: bool) {
		let ip = ip.map(|ip| ip.parse().unwrap());
		assert_eq!(enabled().should_record(ip, path), expected);
	}

	#[rstest]
	fn test_disabled_records_nothing() {
		let config = ToolbarConfig::default();
		assert!(!config.should_record(Some("127.0.0.1".parse().unwrap()), "/"));
	}

	#[rstest]
	fn test_partial_settings_keep_defaults() {
		let config: ToolbarConfig =
			serde_json::from_value(serde_json::json!({"history_size": 5})).unwrap();
		assert_eq!(config.history_size, 5);
		assert_eq!(config.sql_warning_threshold_ms, 100);
		assert_eq!(config.internal_ips.len(), 2);
	}
}
