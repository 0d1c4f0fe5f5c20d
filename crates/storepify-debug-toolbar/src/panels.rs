//! Toolbar panels
//!
//! A [`Panel`] turns a recorded [`ToolbarContext`] into [`PanelStats`]: a JSON
//! payload plus a one-line summary shown in the toolbar listing.

pub mod request;
pub mod sql;
pub mod timing;

use crate::config::ToolbarConfig;
use crate::context::ToolbarContext;
use crate::error::ToolbarResult;
use async_trait::async_trait;
use serde::Serialize;

pub use request::RequestPanel;
pub use sql::SqlPanel;
pub use timing::TimingPanel;

#[async_trait]
pub trait Panel: Send + Sync {
	fn id(&self) -> &'static str;

	fn name(&self) -> &'static str;

	/// Higher priority panels are listed first
	fn priority(&self) -> i32 {
		0
	}

	async fn generate_stats(&self, ctx: &ToolbarContext) -> ToolbarResult<PanelStats>;
}

/// Output of one panel for one request
#[derive(Debug, Clone, Serialize)]
pub struct PanelStats {
	pub panel_id: String,
	pub panel_name: String,
	pub summary: String,
	pub data: serde_json::Value,
}

/// Registered panels in display order
#[derive(Default)]
pub struct PanelRegistry {
	panels: Vec<Box<dyn Panel>>,
}

impl PanelRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Request, timing and SQL panels configured from `config`
	pub fn with_defaults(config: &ToolbarConfig) -> Self {
		let mut registry = Self::new();
		registry.register(Box::new(RequestPanel));
		registry.register(Box::new(TimingPanel));
		registry.register(Box::new(SqlPanel::new(
			config.sql_warning_threshold_ms,
			config.n_plus_one_threshold,
		)));
		registry
	}

	pub fn register(&mut self, panel: Box<dyn Panel>) {
		self.panels.push(panel);
		self.panels.sort_by_key(|panel| std::cmp::Reverse(panel.priority()));
	}

	pub fn panels(&self) -> impl Iterator<Item = &dyn Panel> {
		self.panels.iter().map(|panel| panel.as_ref())
	}

	/// Stats of every panel; a failing panel is logged and left out
	pub async fn generate_all(&self, ctx: &ToolbarContext) -> Vec<PanelStats> {
		let mut stats = Vec::with_capacity(self.panels.len());
		for panel in &self.panels {
			match panel.generate_stats(ctx).await {
				Ok(panel_stats) => stats.push(panel_stats),
				Err(error) => {
					tracing::warn!(panel = panel.id(), request = ctx.id, %error, "panel failed")
				}
			}
		}
		stats
	}
}
