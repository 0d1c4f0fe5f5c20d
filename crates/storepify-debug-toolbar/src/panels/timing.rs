//! Wall-clock timing panel

use crate::context::{ToolbarContext, millis};
use crate::error::ToolbarResult;
use crate::panels::{Panel, PanelStats};
use async_trait::async_trait;

pub struct TimingPanel;

#[async_trait]
impl Panel for TimingPanel {
	fn id(&self) -> &'static str {
		"timing"
	}

	fn name(&self) -> &'static str {
		"Timing"
	}

	fn priority(&self) -> i32 {
		95
	}

	async fn generate_stats(&self, ctx: &ToolbarContext) -> ToolbarResult<PanelStats> {
		let total = millis(ctx.duration);
		let sql = millis(ctx.sql_time());
		Ok(PanelStats {
			panel_id: self.id().to_string(),
			panel_name: self.name().to_string(),
			summary: format!("{:.2}ms", total),
			data: serde_json::json!({
				"total_ms": total,
				"sql_ms": sql,
				"other_ms": (total - sql).max(0.0),
			}),
		})
	}
}
