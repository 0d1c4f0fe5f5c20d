//! Project middleware

use async_trait::async_trait;
use std::sync::Arc;
use storepify_http::{Error, Handler, Middleware, Request, Response, Result};

/// Rejects requests whose `Host` is not in `allowed_hosts`
///
/// Entries match exactly, `.example.com` matches the domain and its
/// subdomains, and `*` matches anything. With an empty list only local
/// hosts are accepted, and only in debug mode.
pub struct AllowedHostsMiddleware {
	allowed_hosts: Vec<String>,
	debug: bool,
}

const LOCAL_HOSTS: &[&str] = &[".localhost", "127.0.0.1", "[::1]"];

impl AllowedHostsMiddleware {
	pub fn new(allowed_hosts: Vec<String>, debug: bool) -> Self {
		let allowed_hosts = allowed_hosts
			.into_iter()
			.map(|host| host.to_ascii_lowercase())
			.collect();
		Self {
			allowed_hosts,
			debug,
		}
	}

	pub fn is_allowed(&self, host: &str) -> bool {
		let host = strip_port(host).to_ascii_lowercase();
		if self.allowed_hosts.is_empty() {
			return self.debug && LOCAL_HOSTS.iter().any(|pattern| matches(pattern, &host));
		}
		self.allowed_hosts.iter().any(|pattern| matches(pattern, &host))
	}
}

fn strip_port(host: &str) -> &str {
	if host.starts_with('[') {
		return host.find(']').map_or(host, |end| &host[..=end]);
	}
	host.rsplit_once(':').map_or(host, |(name, _)| name)
}

fn matches(pattern: &str, host: &str) -> bool {
	if pattern == "*" {
		return true;
	}
	match pattern.strip_prefix('.') {
		Some(domain) => host == domain || host.ends_with(pattern),
		None => host == pattern,
	}
}

#[async_trait]
impl Middleware for AllowedHostsMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		// Requests built without a Host header (HTTP/1.0, in-process calls) are let through
		if let Some(host) = request.header("host") {
			if !self.is_allowed(host) {
				tracing::warn!(host, "disallowed host");
				return Err(Error::BadRequest(format!("Invalid HTTP_HOST header: '{host}'.")));
			}
		}
		next.handle(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("shop.example.com", true)]
	#[case("example.com:8000", true)]
	#[case("api.storepify.io", true)]
	#[case("storepify.io", false)]
	#[case("evil.com", false)]
	fn test_configured_hosts(#[case] host: &str, #[case] allowed: bool) {
		let middleware = AllowedHostsMiddleware::new(
			vec![".example.com".into(), "api.storepify.io".into()],
			false,
		);
		assert_eq!(middleware.is_allowed(host), allowed);
	}

	#[rstest]
	#[case("localhost:8000", true, true)]
	#[case("127.0.0.1", true, true)]
	#[case("[::1]:8000", true, true)]
	#[case("localhost", false, false)]
	#[case("example.com", true, false)]
	fn test_empty_list(#[case] host: &str, #[case] debug: bool, #[case] allowed: bool) {
		assert_eq!(AllowedHostsMiddleware::new(vec![], debug).is_allowed(host), allowed);
	}

	#[rstest]
	fn test_wildcard() {
		assert!(AllowedHostsMiddleware::new(vec!["*".into()], false).is_allowed("anything.test"));
	}
}
