//! Project-level errors and conversions at the HTTP edge

use storepify_admin::{AdminError, CheckMessage};
use storepify_db::DbError;
use storepify_http::Error;
use thiserror::Error;

/// Storage failures surface as 500s with the driver message
pub fn db_error(err: DbError) -> Error {
	tracing::error!(error = %err, "database error");
	Error::Database(err.to_string())
}

/// Failures that prevent the application from being assembled
#[derive(Debug, Error)]
pub enum StartupError {
	#[error("System check identified {} issue(s):\n{}", .0.len(), render_checks(.0))]
	Checks(Vec<CheckMessage>),

	#[error(transparent)]
	Admin(#[from] AdminError),
}

fn render_checks(messages: &[CheckMessage]) -> String {
	messages
		.iter()
		.map(|message| format!("  {message}"))
		.collect::<Vec<_>>()
		.join("\n")
}
