//! Data recorded for one request

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use storepify_db::capture::CapturedQuery;

/// Request metadata captured before the handler runs
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
	pub method: String,
	pub path: String,
	pub query: Option<String>,
	pub headers: Vec<(String, String)>,
	pub client_ip: String,
	pub timestamp: DateTime<Utc>,
}

/// Everything the toolbar knows about one finished request
#[derive(Debug, Clone)]
pub struct ToolbarContext {
	pub id: u64,
	pub request: RequestInfo,
	pub status: u16,
	pub duration: Duration,
	pub queries: Vec<CapturedQuery>,
}

impl ToolbarContext {
	pub fn sql_time(&self) -> Duration {
		self.queries.iter().map(|q| q.duration).sum()
	}
}

/// History listing entry
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
	pub id: u64,
	pub method: String,
	pub path: String,
	pub status: u16,
	pub duration_ms: f64,
	pub query_count: usize,
	pub timestamp: DateTime<Utc>,
}

impl From<&ToolbarContext> for HistoryEntry {
	fn from(ctx: &ToolbarContext) -> Self {
		Self {
			id: ctx.id,
			method: ctx.request.method.clone(),
			path: ctx.request.path.clone(),
			status: ctx.status,
			duration_ms: millis(ctx.duration),
			query_count: ctx.queries.len(),
			timestamp: ctx.request.timestamp,
		}
	}
}

pub(crate) fn millis(duration: Duration) -> f64 {
	duration.as_secs_f64() * 1000.0
}
