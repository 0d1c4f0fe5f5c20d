//! Toolbar middleware and routes through a middleware chain

use rstest::*;
use std::net::SocketAddr;
use std::sync::Arc;
use storepify_db::Database;
use storepify_debug_toolbar::{DebugToolbar, TOOLBAR_ID_HEADER, ToolbarConfig};
use storepify_http::{
	Error, Method, MiddlewareChain, Request, Response, Router, StatusCode, handler_fn, respond,
};

struct App {
	chain: MiddlewareChain,
	toolbar: Arc<DebugToolbar>,
}

#[fixture]
async fn app() -> App {
	let db = Database::connect_in_memory().await.unwrap();
	db.execute_raw("CREATE TABLE store_customer (id INTEGER PRIMARY KEY, first_name TEXT)")
		.await
		.unwrap();

	let toolbar = Arc::new(DebugToolbar::new(ToolbarConfig {
		enabled: true,
		history_size: 3,
		..Default::default()
	}));

	let orders_db = db.clone();
	let router = Router::new()
		.get(
			"/orders/",
			"orders",
			handler_fn(move |_req: Request| {
				let db = orders_db.clone();
				async move {
					let db_error = |e: storepify_db::DbError| Error::Database(e.to_string());
					db.execute_raw("SELECT id FROM store_customer")
						.await
						.map_err(db_error)?;
					for id in 1..=4 {
						db.execute_raw(&format!(
							"SELECT first_name FROM store_customer WHERE id = {}",
							id
						))
						.await
						.map_err(db_error)?;
					}
					Response::ok().with_json(&serde_json::json!({"orders": []}))
				}
			}),
		)
		.get(
			"/broken/",
			"broken",
			handler_fn(|_req: Request| async { Err(Error::NotFound("gone".into())) }),
		)
		.include("/__debug__", toolbar.router());

	let chain = MiddlewareChain::new(Arc::new(router)).with_middleware(toolbar.middleware());
	App { chain, toolbar }
}

async fn get(app: &App, uri: &str, ip: &str) -> Response {
	let addr: SocketAddr = format!("{}:40000", ip).parse().unwrap();
	let request = Request::builder()
		.method(Method::GET)
		.uri(uri)
		.remote_addr(addr)
		.build()
		.unwrap();
	respond(&app.chain, request).await
}

#[rstest]
#[tokio::test]
async fn test_records_request_and_queries(#[future] app: App) {
	let app = app.await;

	let response = get(&app, "/orders/?page=1", "127.0.0.1").await;
	assert_eq!(response.status, StatusCode::OK);
	let id = response.headers.get(TOOLBAR_ID_HEADER).unwrap().to_str().unwrap().to_string();

	let response = get(&app, &format!("/__debug__/{}/", id), "127.0.0.1").await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(body["request"]["path"], "/orders/");
	assert_eq!(body["request"]["query_count"], 5);

	let panels = body["panels"].as_array().unwrap();
	let ids: Vec<_> = panels.iter().map(|p| p["panel_id"].as_str().unwrap()).collect();
	assert_eq!(ids, ["request", "timing", "sql"]);
	assert_eq!(panels[0]["data"]["query"], "page=1");
	assert_eq!(panels[2]["data"]["total_queries"], 5);
	assert_eq!(panels[2]["data"]["n_plus_one_count"], 1);
	assert_eq!(panels[2]["data"]["duplicate_count"], 1);
}

#[rstest]
#[tokio::test]
async fn test_toolbar_routes_are_not_recorded(#[future] app: App) {
	let app = app.await;

	get(&app, "/orders/", "127.0.0.1").await;
	let response = get(&app, "/__debug__/", "127.0.0.1").await;
	assert!(response.headers.get(TOOLBAR_ID_HEADER).is_none());

	let body = response.body_json().unwrap();
	assert_eq!(body["requests"].as_array().unwrap().len(), 1);
	assert_eq!(app.toolbar.history.len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_external_clients_are_ignored(#[future] app: App) {
	let app = app.await;

	let response = get(&app, "/orders/", "203.0.113.9").await;
	assert_eq!(response.status, StatusCode::OK);
	assert!(response.headers.get(TOOLBAR_ID_HEADER).is_none());
	assert!(app.toolbar.history.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_failed_requests_keep_their_status(#[future] app: App) {
	let app = app.await;

	let response = get(&app, "/broken/", "127.0.0.1").await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);

	let entries = app.toolbar.history.entries();
	assert_eq!(entries[0].status, 404);
	assert_eq!(entries[0].query_count, 0);
}

#[rstest]
#[tokio::test]
async fn test_history_is_bounded(#[future] app: App) {
	let app = app.await;

	for _ in 0..5 {
		get(&app, "/broken/", "127.0.0.1").await;
	}
	let ids: Vec<u64> = app.toolbar.history.entries().iter().map(|e| e.id).collect();
	assert_eq!(ids, [5, 4, 3]);

	let response = get(&app, "/__debug__/1/", "127.0.0.1").await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);
}
