use crate::{Error, Result};
use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue, LOCATION};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// HTTP response representation
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create an empty response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use storepify_http::{Response, StatusCode};
	///
	/// let response = Response::new(StatusCode::ACCEPTED);
	/// assert_eq!(response.status, StatusCode::ACCEPTED);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// 301 redirect to `location`
	pub fn permanent_redirect(location: &str) -> Self {
		Self::new(StatusCode::MOVED_PERMANENTLY).with_header(LOCATION.as_str(), location)
	}

	/// Serialize `value` as the JSON body
	///
	/// # Examples
	///
	/// ```
	/// use storepify_http::Response;
	///
	/// let response = Response::ok().with_json(&serde_json::json!({"ok": true})).unwrap();
	/// assert_eq!(response.headers.get("content-type").unwrap(), "application/json");
	/// assert_eq!(response.body_json().unwrap()["ok"], true);
	/// ```
	pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
		let body = serde_json::to_vec(value)
			.map_err(|e| Error::Internal(format!("failed to serialize response: {}", e)))?;
		self.body = Bytes::from(body);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}

	/// Replace the body
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a header, ignoring names or values that are not valid HTTP tokens
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Parse the body as JSON
	pub fn body_json(&self) -> Option<serde_json::Value> {
		serde_json::from_slice(&self.body).ok()
	}
}
