//! Per-request structured logging

use crate::{Handler, Middleware, Request, Response, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Emits one `tracing` event per request with method, path, status and latency
#[derive(Debug, Default, Clone)]
pub struct RequestLoggingMiddleware;

#[async_trait]
impl Middleware for RequestLoggingMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let method = request.method.clone();
		let path = request.path().to_string();
		let span = tracing::info_span!("request", %method, %path);
		let started = Instant::now();

		let result = next.handle(request).instrument(span.clone()).await;
		let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

		let _entered = span.enter();
		match &result {
			Ok(response) => {
				tracing::info!(status = response.status.as_u16(), elapsed_ms, "handled")
			}
			Err(error) if error.status().is_server_error() => {
				tracing::error!(status = error.status().as_u16(), elapsed_ms, %error, "failed")
			}
			Err(error) => {
				tracing::info!(status = error.status().as_u16(), elapsed_ms, %error, "rejected")
			}
		}
		result
	}
}
