//! Authentication errors

use serde_json::{Map, Value};
use storepify_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
	#[error("No active account found with the given credentials")]
	InvalidCredentials,

	#[error("Token is invalid or expired")]
	InvalidToken,

	#[error("Token has wrong type")]
	WrongTokenType,

	#[error("User not found")]
	UserNotFound,

	#[error("Password hashing failed: {0}")]
	Hash(String),

	/// Field name → messages
	#[error("Invalid user data")]
	Validation(Map<String, Value>),

	#[error(transparent)]
	Database(#[from] DbError),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<AuthError> for storepify_http::Error {
	fn from(err: AuthError) -> Self {
		use storepify_http::Error;

		match err {
			AuthError::InvalidCredentials
			| AuthError::InvalidToken
			| AuthError::WrongTokenType
			| AuthError::UserNotFound => Error::Authentication(err.to_string()),
			AuthError::Validation(errors) => Error::Validation(Value::Object(errors)),
			AuthError::Hash(_) => Error::Internal(err.to_string()),
			AuthError::Database(db) => crate::error::db_error(db),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use storepify_http::StatusCode;

	#[rstest]
	#[case(AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED)]
	#[case(AuthError::WrongTokenType, StatusCode::UNAUTHORIZED)]
	#[case(AuthError::Validation(Map::new()), StatusCode::BAD_REQUEST)]
	#[case(AuthError::Hash("salt".into()), StatusCode::INTERNAL_SERVER_ERROR)]
	fn test_status_mapping(#[case] err: AuthError, #[case] status: StatusCode) {
		assert_eq!(storepify_http::Error::from(err).status(), status);
	}
}
