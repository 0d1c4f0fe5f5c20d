//! Error type returned by handlers and middleware
//!
//! Every variant maps to an HTTP status code; the server renders errors
//! as a JSON body of the form `{"detail": "..."}`.

use crate::Response;
use hyper::StatusCode;
use thiserror::Error;

/// Request-processing error
#[derive(Debug, Error)]
pub enum Error {
	/// No route or record matched
	#[error("Not found: {0}")]
	NotFound(String),

	/// A route matched the path but not the method
	#[error("Method not allowed: {0}")]
	MethodNotAllowed(String),

	/// Malformed request (bad query string, bad JSON, bad parameters)
	#[error("Bad request: {0}")]
	BadRequest(String),

	/// Field-level validation failures, keyed by field name
	#[error("Validation failed")]
	Validation(serde_json::Value),

	/// Missing or invalid credentials
	#[error("Authentication failed: {0}")]
	Authentication(String),

	/// Authenticated but not allowed
	#[error("Permission denied: {0}")]
	Authorization(String),

	/// Storage layer failure
	#[error("Database error: {0}")]
	Database(String),

	/// Anything else
	#[error("Internal error: {0}")]
	Internal(String),
}

/// Result alias for request processing
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// HTTP status code for this error
	///
	/// # Examples
	///
	/// ```
	/// use storepify_http::{Error, StatusCode};
	///
	/// assert_eq!(Error::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
	/// assert_eq!(Error::Authorization("x".into()).status(), StatusCode::FORBIDDEN);
	/// ```
	pub fn status(&self) -> StatusCode {
		match self {
			Error::NotFound(_) => StatusCode::NOT_FOUND,
			Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
			Error::BadRequest(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
			Error::Authentication(_) => StatusCode::UNAUTHORIZED,
			Error::Authorization(_) => StatusCode::FORBIDDEN,
			Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Render this error as a JSON response
	pub fn into_response(self) -> Response {
		let status = self.status();
		let body = match &self {
			Error::Validation(errors) => serde_json::json!({
				"detail": self.to_string(),
				"errors": errors,
			}),
			_ => serde_json::json!({ "detail": self.to_string() }),
		};
		if status.is_server_error() {
			tracing::error!(status = status.as_u16(), error = %self, "request failed");
		}
		let mut response = Response::new(status).with_body(body.to_string());
		if let Ok(value) = "application/json".parse() {
			response.headers.insert(hyper::header::CONTENT_TYPE, value);
		}
		if matches!(self, Error::Authentication(_))
			&& let Ok(value) = "Bearer".parse()
		{
			response
				.headers
				.insert(hyper::header::WWW_AUTHENTICATE, value);
		}
		response
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::NotFound("a".into()), StatusCode::NOT_FOUND)]
	#[case(Error::MethodNotAllowed("a".into()), StatusCode::METHOD_NOT_ALLOWED)]
	#[case(Error::BadRequest("a".into()), StatusCode::BAD_REQUEST)]
	#[case(Error::Validation(serde_json::json!({})), StatusCode::BAD_REQUEST)]
	#[case(Error::Authentication("a".into()), StatusCode::UNAUTHORIZED)]
	#[case(Error::Authorization("a".into()), StatusCode::FORBIDDEN)]
	#[case(Error::Database("a".into()), StatusCode::INTERNAL_SERVER_ERROR)]
	fn test_status_mapping(#[case] error: Error, #[case] expected: StatusCode) {
		assert_eq!(error.status(), expected);
	}

	#[rstest]
	fn test_validation_response_carries_field_errors() {
		let error = Error::Validation(serde_json::json!({ "title": ["This field is required."] }));
		let response = error.into_response();

		let body = response.body_json().unwrap();
		assert_eq!(body["errors"]["title"][0], "This field is required.");
		assert_eq!(body["detail"], "Validation failed");
	}

	#[rstest]
	fn test_authentication_response_sets_challenge_header() {
		let response = Error::Authentication("no token".into()).into_response();
		assert_eq!(
			response.headers.get("www-authenticate").unwrap(),
			"Bearer"
		);
	}
}
