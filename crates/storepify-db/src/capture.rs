//! Per-task capture of executed SQL
//!
//! The debug toolbar wraps each request in [`capture`]; every statement the
//! [`Database`](crate::Database) runs inside that scope is appended to the
//! scope's [`QueryLog`]. Outside a scope, recording is a no-op.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

tokio::task_local! {
	static QUERY_LOG: Arc<QueryLog>;
}

/// One executed statement
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedQuery {
	pub sql: String,
	pub duration: Duration,
}

/// Statements captured during one scope
#[derive(Debug, Default)]
pub struct QueryLog {
	queries: Mutex<Vec<CapturedQuery>>,
}

impl QueryLog {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Snapshot of the captured statements, in execution order
	pub fn queries(&self) -> Vec<CapturedQuery> {
		self.queries.lock().clone()
	}

	pub fn len(&self) -> usize {
		self.queries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn push(&self, query: CapturedQuery) {
		self.queries.lock().push(query);
	}
}

/// Run `future` with `log` collecting every statement it executes
pub async fn capture<F: Future>(log: Arc<QueryLog>, future: F) -> F::Output {
	QUERY_LOG.scope(log, future).await
}

pub(crate) fn record(sql: &str, duration: Duration) {
	let _ = QUERY_LOG.try_with(|log| {
		log.push(CapturedQuery {
			sql: sql.to_string(),
			duration,
		})
	});
}
