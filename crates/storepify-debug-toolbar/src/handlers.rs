//! JSON routes of the toolbar, mounted under `/__debug__`

use crate::context::HistoryEntry;
use crate::error::ToolbarError;
use crate::history::ToolbarHistory;
use crate::panels::PanelRegistry;
use serde_json::json;
use std::sync::Arc;
use storepify_http::{Request, Response, Router, handler_fn};

/// `GET /` lists the history, `GET /{id}/` returns the panels of one request
pub fn toolbar_router(registry: Arc<PanelRegistry>, history: Arc<ToolbarHistory>) -> Router {
	let list_history = history.clone();

	Router::new()
		.with_namespace("djdt")
		.get(
			"/",
			"history",
			handler_fn(move |_request: Request| {
				let entries: Vec<HistoryEntry> = list_history.entries();
				async move { Response::ok().with_json(&json!({ "requests": entries })) }
			}),
		)
		.get(
			"/{request_id:int}/",
			"request",
			handler_fn(move |request: Request| {
				let registry = registry.clone();
				let history = history.clone();
				async move {
					let id: u64 = request.path_param_as("request_id")?;
					let ctx = history.get(id).ok_or(ToolbarError::RequestNotFound(id))?;
					let panels = registry.generate_all(&ctx).await;
					Response::ok().with_json(&json!({
						"request": HistoryEntry::from(ctx.as_ref()),
						"panels": panels,
					}))
				}
			}),
		)
}
