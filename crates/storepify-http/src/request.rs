//! HTTP request representation

use crate::{Error, Result};
use bytes::Bytes;
use http::Extensions;
use hyper::header::AUTHORIZATION;
use hyper::{HeaderMap, Method, Uri, Version};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Incoming HTTP request with a fully buffered body
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
	/// Typed per-request data attached by middleware (authenticated user, etc.)
	pub extensions: Extensions,
	path_params: HashMap<String, String>,
}

impl Request {
	/// Create a request from its parts
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
			extensions: Extensions::new(),
			path_params: HashMap::new(),
		}
	}

	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use storepify_http::{Method, Request};
	///
	/// let request = Request::builder()
	/// 	.method(Method::GET)
	/// 	.uri("/store/products/?page=2")
	/// 	.build()
	/// 	.unwrap();
	///
	/// assert_eq!(request.path(), "/store/products/");
	/// assert_eq!(request.query_string(), Some("page=2"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// The request path without the query string
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// The raw query string, if any
	pub fn query_string(&self) -> Option<&str> {
		self.uri.query()
	}

	/// URL-decoded query pairs in their original order
	///
	/// Repeated keys are preserved, which multi-value parameters rely on.
	pub fn query_pairs(&self) -> Result<Vec<(String, String)>> {
		match self.uri.query() {
			Some(query) => serde_urlencoded::from_str(query)
				.map_err(|e| Error::BadRequest(format!("invalid query string: {}", e))),
			None => Ok(Vec::new()),
		}
	}

	/// Deserialize the query string into `T`
	pub fn query<T: DeserializeOwned>(&self) -> Result<T> {
		serde_urlencoded::from_str(self.uri.query().unwrap_or(""))
			.map_err(|e| Error::BadRequest(format!("invalid query parameters: {}", e)))
	}

	/// Deserialize the JSON body into `T`
	pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
		serde_json::from_slice(&self.body)
			.map_err(|e| Error::BadRequest(format!("invalid JSON body: {}", e)))
	}

	/// A path parameter captured by the router
	pub fn path_param(&self, name: &str) -> Option<&str> {
		self.path_params.get(name).map(String::as_str)
	}

	/// A path parameter parsed into `T`
	///
	/// Missing or unparsable parameters are reported as `NotFound`, since the
	/// URL does not address an existing resource.
	pub fn path_param_as<T: FromStr>(&self, name: &str) -> Result<T> {
		self.path_param(name)
			.and_then(|value| value.parse().ok())
			.ok_or_else(|| Error::NotFound(format!("invalid path parameter '{}'", name)))
	}

	/// Record a captured path parameter
	pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(name.into(), value.into());
	}

	/// A header value as a string, if present and valid UTF-8
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// The token of an `Authorization: Bearer <token>` header
	///
	/// # Examples
	///
	/// ```
	/// use storepify_http::Request;
	///
	/// let request = Request::builder()
	/// 	.uri("/")
	/// 	.header("Authorization", "Bearer abc.def")
	/// 	.build()
	/// 	.unwrap();
	/// assert_eq!(request.bearer_token(), Some("abc.def"));
	/// ```
	pub fn bearer_token(&self) -> Option<&str> {
		self.headers
			.get(AUTHORIZATION)
			.and_then(|v| v.to_str().ok())
			.and_then(|v| {
				let (scheme, token) = v.split_once(' ')?;
				(scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt"))
					.then(|| token.trim())
			})
			.filter(|token| !token.is_empty())
	}

	/// IP address of the peer
	pub fn client_ip(&self) -> Option<IpAddr> {
		self.remote_addr.map(|addr| addr.ip())
	}
}

/// Builder for [`Request`], mostly used by tests and internal dispatch
#[derive(Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	headers: Vec<(String, String)>,
	body: Option<Bytes>,
	remote_addr: Option<SocketAddr>,
}

impl RequestBuilder {
	/// Set the method (default `GET`)
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	/// Set the URI
	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Add a header
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	/// Set a raw body
	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = Some(body.into());
		self
	}

	/// Set a JSON body and the matching content type
	pub fn json<T: Serialize>(mut self, value: &T) -> Self {
		let body = serde_json::to_vec(value).unwrap_or_default();
		self.body = Some(Bytes::from(body));
		self.headers
			.push(("content-type".into(), "application/json".into()));
		self
	}

	/// Set the peer address
	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	/// Build the request
	pub fn build(self) -> Result<Request> {
		let uri: Uri = self
			.uri
			.as_deref()
			.unwrap_or("/")
			.parse()
			.map_err(|e| Error::BadRequest(format!("invalid URI: {}", e)))?;

		let mut headers = HeaderMap::new();
		for (name, value) in self.headers {
			let name = hyper::header::HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| Error::BadRequest(format!("invalid header name: {}", e)))?;
			let value = hyper::header::HeaderValue::from_str(&value)
				.map_err(|e| Error::BadRequest(format!("invalid header value: {}", e)))?;
			headers.append(name, value);
		}

		let mut request = Request::new(
			self.method.unwrap_or(Method::GET),
			uri,
			Version::HTTP_11,
			headers,
			self.body.unwrap_or_default(),
		);
		request.remote_addr = self.remote_addr;
		Ok(request)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::Deserialize;

	#[derive(Debug, Deserialize, PartialEq)]
	struct Paging {
		page: Option<u64>,
		search: Option<String>,
	}

	#[rstest]
	fn test_query_pairs_are_decoded_and_ordered() {
		let request = Request::builder()
			.uri("/admin/store/product/?q=red%20shoe&collection__id__exact=3&q=again")
			.build()
			.unwrap();

		let pairs = request.query_pairs().unwrap();
		assert_eq!(
			pairs,
			vec![
				("q".to_string(), "red shoe".to_string()),
				("collection__id__exact".to_string(), "3".to_string()),
				("q".to_string(), "again".to_string()),
			]
		);
	}

	#[rstest]
	fn test_typed_query() {
		let request = Request::builder()
			.uri("/store/products/?page=3&search=mug")
			.build()
			.unwrap();

		let paging: Paging = request.query().unwrap();
		assert_eq!(
			paging,
			Paging {
				page: Some(3),
				search: Some("mug".into())
			}
		);
	}

	#[rstest]
	fn test_invalid_json_body_is_bad_request() {
		let request = Request::builder().uri("/").body("{not json").build().unwrap();
		let result: Result<serde_json::Value> = request.json();
		assert!(matches!(result, Err(Error::BadRequest(_))));
	}

	#[rstest]
	#[case("Bearer token123", Some("token123"))]
	#[case("JWT token123", Some("token123"))]
	#[case("Basic dXNlcjpwYXNz", None)]
	#[case("Bearer ", None)]
	fn test_bearer_token(#[case] header: &str, #[case] expected: Option<&str>) {
		let request = Request::builder()
			.uri("/")
			.header("authorization", header)
			.build()
			.unwrap();
		assert_eq!(request.bearer_token(), expected);
	}

	#[rstest]
	fn test_path_param_as_rejects_non_numeric() {
		let mut request = Request::builder().uri("/").build().unwrap();
		request.set_path_param("id", "abc");
		let result: Result<i64> = request.path_param_as("id");
		assert!(matches!(result, Err(Error::NotFound(_))));
	}
}
