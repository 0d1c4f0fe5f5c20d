use thiserror::Error;

/// Database layer error
#[derive(Debug, Error)]
pub enum DbError {
	/// Driver or query failure
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),

	/// Migration failure
	#[error(transparent)]
	Migrate(#[from] sqlx::migrate::MigrateError),

	/// A statement parameter SQLite cannot store
	#[error("cannot bind parameter: {0}")]
	Bind(String),

	/// A column held a value the caller could not interpret
	#[error("unexpected value in column '{column}': {message}")]
	Decode { column: String, message: String },
}

/// Result alias for database operations
pub type DbResult<T> = Result<T, DbError>;

/// Integrity constraint categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
	Unique,
	ForeignKey,
	NotNull,
	Check,
}

impl DbError {
	/// The violated constraint, if this error is an integrity error
	pub fn constraint_kind(&self) -> Option<ConstraintKind> {
		let DbError::Sqlx(sqlx::Error::Database(error)) = self else {
			return None;
		};
		match error.kind() {
			sqlx::error::ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
			sqlx::error::ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
			sqlx::error::ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
			sqlx::error::ErrorKind::CheckViolation => Some(ConstraintKind::Check),
			_ => None,
		}
	}
}
