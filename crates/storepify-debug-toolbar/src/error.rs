//! Toolbar errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolbarError {
	#[error("No toolbar data for request {0}")]
	RequestNotFound(u64),

	#[error("Panel {panel} failed: {message}")]
	Panel { panel: String, message: String },
}

pub type ToolbarResult<T> = Result<T, ToolbarError>;

impl From<ToolbarError> for storepify_http::Error {
	fn from(err: ToolbarError) -> Self {
		match err {
			ToolbarError::RequestNotFound(_) => storepify_http::Error::NotFound(err.to_string()),
			ToolbarError::Panel { .. } => storepify_http::Error::Internal(err.to_string()),
		}
	}
}
