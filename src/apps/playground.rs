//! Scratch sub-application mounted under `/test`

use crate::error::db_error;
use crate::handler;
use sea_query::{Alias, Expr, Func, Query};
use serde::Serialize;
use std::sync::Arc;
use storepify_db::Database;
use storepify_http::{Request, Response, Result, Router};

pub struct PlaygroundState {
	pub db: Database,
}

#[derive(Debug, Serialize)]
struct Hello {
	message: &'static str,
	product_count: i64,
}

async fn say_hello(state: Arc<PlaygroundState>, _request: Request) -> Result<Response> {
	let count = Query::select()
		.expr(Func::count(Expr::col(Alias::new("id"))))
		.from(Alias::new("store_product"))
		.to_owned();
	let product_count = state.db.fetch_i64(&count).await.map_err(db_error)?;
	Response::ok().with_json(&Hello {
		message: "Hello from Storepify!",
		product_count,
	})
}

pub fn routes(state: Arc<PlaygroundState>) -> Router {
	Router::new()
		.with_namespace("playground")
		.get("/hello/", "hello", handler(&state, say_hello))
}
