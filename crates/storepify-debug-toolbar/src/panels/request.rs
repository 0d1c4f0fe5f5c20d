//! Request metadata panel

use crate::context::ToolbarContext;
use crate::error::ToolbarResult;
use crate::panels::{Panel, PanelStats};
use async_trait::async_trait;

pub struct RequestPanel;

#[async_trait]
impl Panel for RequestPanel {
	fn id(&self) -> &'static str {
		"request"
	}

	fn name(&self) -> &'static str {
		"Request"
	}

	fn priority(&self) -> i32 {
		100
	}

	async fn generate_stats(&self, ctx: &ToolbarContext) -> ToolbarResult<PanelStats> {
		let request = &ctx.request;
		Ok(PanelStats {
			panel_id: self.id().to_string(),
			panel_name: self.name().to_string(),
			summary: format!("{} {} ({})", request.method, request.path, ctx.status),
			data: serde_json::json!({
				"method": request.method,
				"path": request.path,
				"query": request.query,
				"headers": request.headers,
				"client_ip": request.client_ip,
				"status": ctx.status,
				"timestamp": request.timestamp,
			}),
		})
	}
}
