//! Error types for the admin

use crate::forms::ValidationErrors;
use storepify_db::DbError;
use thiserror::Error;

/// Admin error type
#[derive(Debug, Error)]
pub enum AdminError {
	/// Model not registered with the site
	#[error("Model '{0}' is not registered with admin")]
	ModelNotRegistered(String),

	/// Model registered twice
	#[error("The model {0} is already registered")]
	AlreadyRegistered(String),

	/// No record with the requested primary key
	#[error("{model} with ID \u{201c}{id}\u{201d} doesn't exist. Perhaps it was deleted?")]
	ObjectNotFound { model: String, id: i64 },

	/// Permission denied
	#[error("Permission denied: {0}")]
	PermissionDenied(String),

	/// Unknown or unavailable action
	#[error("Invalid action: {0}")]
	InvalidAction(String),

	/// Change list parameter that does not name a valid lookup
	#[error("Incorrect lookup parameters: {0}")]
	IncorrectLookupParameters(String),

	/// Form validation failed
	#[error("Validation error")]
	Validation(ValidationErrors),

	/// Admin configuration is invalid
	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),

	/// Storage failure
	#[error("Database error: {0}")]
	Database(#[from] DbError),
}

/// Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

impl From<AdminError> for storepify_http::Error {
	fn from(err: AdminError) -> Self {
		use storepify_http::Error;

		match err {
			AdminError::ModelNotRegistered(_) | AdminError::ObjectNotFound { .. } => {
				Error::NotFound(err.to_string())
			}
			AdminError::PermissionDenied(msg) => Error::Authorization(msg),
			AdminError::InvalidAction(_) | AdminError::IncorrectLookupParameters(_) => {
				Error::BadRequest(err.to_string())
			}
			AdminError::Validation(errors) => Error::Validation(errors.to_json()),
			AdminError::Database(db) => Error::Database(db.to_string()),
			AdminError::AlreadyRegistered(_) | AdminError::ImproperlyConfigured(_) => {
				Error::Internal(err.to_string())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use storepify_http::StatusCode;

	#[rstest]
	#[case(AdminError::ModelNotRegistered("store.tag".into()), StatusCode::NOT_FOUND)]
	#[case(AdminError::ObjectNotFound { model: "Product".into(), id: 4 }, StatusCode::NOT_FOUND)]
	#[case(AdminError::PermissionDenied("staff only".into()), StatusCode::FORBIDDEN)]
	#[case(AdminError::IncorrectLookupParameters("colour".into()), StatusCode::BAD_REQUEST)]
	#[case(AdminError::Validation(ValidationErrors::default()), StatusCode::BAD_REQUEST)]
	#[case(AdminError::ImproperlyConfigured("bad".into()), StatusCode::INTERNAL_SERVER_ERROR)]
	fn test_status_mapping(#[case] error: AdminError, #[case] status: StatusCode) {
		let http: storepify_http::Error = error.into();
		assert_eq!(http.status(), status);
	}
}
