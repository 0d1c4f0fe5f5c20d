//! SQL panel: totals, duplicates, slow statements and N+1 hints

use crate::context::{ToolbarContext, millis};
use crate::error::ToolbarResult;
use crate::panels::{Panel, PanelStats};
use crate::utils::sql_normalization::{detect_n_plus_one, normalize_sql, shape_counts};
use async_trait::async_trait;

pub struct SqlPanel {
	warning_threshold_ms: u64,
	n_plus_one_threshold: usize,
}

impl SqlPanel {
	pub fn new(warning_threshold_ms: u64, n_plus_one_threshold: usize) -> Self {
		Self {
			warning_threshold_ms,
			n_plus_one_threshold,
		}
	}
}

impl Default for SqlPanel {
	fn default() -> Self {
		Self::new(100, 3)
	}
}

#[async_trait]
impl Panel for SqlPanel {
	fn id(&self) -> &'static str {
		"sql"
	}

	fn name(&self) -> &'static str {
		"SQL"
	}

	fn priority(&self) -> i32 {
		90
	}

	async fn generate_stats(&self, ctx: &ToolbarContext) -> ToolbarResult<PanelStats> {
		let queries = &ctx.queries;
		let total_time = millis(ctx.sql_time());

		let counts = shape_counts(queries);
		let duplicate_count = counts.values().filter(|&&count| count > 1).count();
		let n_plus_one = detect_n_plus_one(queries, self.n_plus_one_threshold);
		let threshold = self.warning_threshold_ms as u128;

		let mut slow_count = 0;
		let queries_data: Vec<serde_json::Value> = queries
			.iter()
			.enumerate()
			.map(|(index, query)| {
				let normalized = normalize_sql(&query.sql);
				let is_slow = query.duration.as_millis() >= threshold;
				if is_slow {
					slow_count += 1;
				}
				serde_json::json!({
					"index": index,
					"sql": query.sql,
					"duration_ms": millis(query.duration),
					"is_duplicate": counts.get(&normalized).is_some_and(|&c| c > 1),
					"is_slow": is_slow,
					"is_n_plus_one": n_plus_one.contains(&normalized),
					"normalized": normalized,
				})
			})
			.collect();

		Ok(PanelStats {
			panel_id: self.id().to_string(),
			panel_name: self.name().to_string(),
			summary: format!("{} queries in {:.2}ms", queries.len(), total_time),
			data: serde_json::json!({
				"total_queries": queries.len(),
				"total_time_ms": total_time,
				"duplicate_count": duplicate_count,
				"slow_queries_count": slow_count,
				"n_plus_one_count": n_plus_one.len(),
				"n_plus_one_patterns": n_plus_one,
				"warning_threshold_ms": self.warning_threshold_ms,
				"queries": queries_data,
			}),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::RequestInfo;
	use chrono::Utc;
	use rstest::*;
	use std::time::Duration;
	use storepify_db::capture::CapturedQuery;

	fn context(queries: Vec<(String, u64)>) -> ToolbarContext {
		ToolbarContext {
			id: 1,
			request: RequestInfo {
				method: "GET".into(),
				path: "/admin/store/order/".into(),
				query: None,
				headers: vec![],
				client_ip: "127.0.0.1".into(),
				timestamp: Utc::now(),
			},
			status: 200,
			duration: Duration::from_millis(300),
			queries: queries
				.into_iter()
				.map(|(sql, ms)| CapturedQuery {
					sql,
					duration: Duration::from_millis(ms),
				})
				.collect(),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_duplicates_and_slow_queries() {
		let ctx = context(vec![
			("SELECT * FROM store_product WHERE id = 1".into(), 50),
			("SELECT * FROM store_product WHERE id = 2".into(), 150),
			("SELECT COUNT(*) FROM store_product".into(), 30),
		]);

		let stats = SqlPanel::default().generate_stats(&ctx).await.unwrap();

		assert_eq!(stats.panel_id, "sql");
		assert_eq!(stats.data["total_queries"], 3);
		assert_eq!(stats.data["duplicate_count"], 1);
		assert_eq!(stats.data["slow_queries_count"], 1);
		assert_eq!(stats.data["n_plus_one_count"], 0);
		assert_eq!(stats.data["queries"][1]["is_slow"], true);
		assert_eq!(stats.data["queries"][2]["is_duplicate"], false);
		assert_eq!(stats.summary, "3 queries in 230.00ms");
	}

	#[rstest]
	#[tokio::test]
	async fn test_n_plus_one_hint() {
		let mut queries = vec![("SELECT * FROM store_order".to_string(), 5)];
		queries.extend((1..=5).map(|id| {
			(
				format!("SELECT * FROM store_customer WHERE id = {}", id),
				1,
			)
		}));

		let stats = SqlPanel::default()
			.generate_stats(&context(queries))
			.await
			.unwrap();

		assert_eq!(stats.data["n_plus_one_count"], 1);
		assert_eq!(stats.data["queries"][0]["is_n_plus_one"], false);
		assert_eq!(stats.data["queries"][4]["is_n_plus_one"], true);
	}
}
