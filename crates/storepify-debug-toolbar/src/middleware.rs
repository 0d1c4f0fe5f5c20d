//! Request recording middleware

use crate::config::ToolbarConfig;
use crate::context::{RequestInfo, ToolbarContext};
use crate::history::ToolbarHistory;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use storepify_db::capture::{self, QueryLog};
use storepify_http::{Handler, Middleware, Request, Response, Result};

/// Response header carrying the id to look the request up under `/__debug__/{id}/`
pub const TOOLBAR_ID_HEADER: &str = "x-debug-toolbar-id";

const RECORDED_HEADERS: &[&str] = &["host", "user-agent", "accept", "content-type", "referer"];

/// Records each eligible request into the toolbar history
pub struct DebugToolbarMiddleware {
	config: Arc<ToolbarConfig>,
	history: Arc<ToolbarHistory>,
}

impl DebugToolbarMiddleware {
	pub fn new(config: Arc<ToolbarConfig>, history: Arc<ToolbarHistory>) -> Self {
		Self { config, history }
	}
}

fn request_info(request: &Request) -> RequestInfo {
	RequestInfo {
		method: request.method.to_string(),
		path: request.path().to_string(),
		query: request.query_string().map(str::to_string),
		headers: RECORDED_HEADERS
			.iter()
			.filter_map(|name| {
				request
					.header(name)
					.map(|value| (name.to_string(), value.to_string()))
			})
			.collect(),
		client_ip: request
			.client_ip()
			.map(|ip| ip.to_string())
			.unwrap_or_default(),
		timestamp: Utc::now(),
	}
}

#[async_trait]
impl Middleware for DebugToolbarMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let info = request_info(&request);
		let log = QueryLog::new();
		let started = Instant::now();

		let result = capture::capture(log.clone(), next.handle(request)).await;

		let duration = started.elapsed();
		let status = match &result {
			Ok(response) => response.status.as_u16(),
			Err(error) => error.status().as_u16(),
		};
		let id = self.history.next_id();
		tracing::debug!(
			id,
			path = %info.path,
			status,
			queries = log.len(),
			"debug toolbar recorded request"
		);
		self.history.push(ToolbarContext {
			id,
			request: info,
			status,
			duration,
			queries: log.queries(),
		});

		result.map(|response| response.with_header(TOOLBAR_ID_HEADER, &id.to_string()))
	}

	fn should_continue(&self, request: &Request) -> bool {
		self.config.should_record(request.client_ip(), request.path())
	}
}
