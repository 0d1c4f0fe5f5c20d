//! Root route table, middleware and the debug toolbar

use crate::common::*;
use rstest::*;
use storepify::config::urls::build_admin_site;
use storepify::apps::store::StoreModels;
use storepify_http::{Method, Request, StatusCode, respond};

#[rstest]
#[tokio::test]
async fn test_playground_hello(#[future] app: TestApp) {
	let app = app.await;
	let coffee = add_collection(&app.db, "Coffee").await;
	add_product(&app.db, "Espresso", 1, coffee).await;
	add_product(&app.db, "Lungo", 1, coffee).await;

	let response = app.get("/test/hello/", None).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(body["message"], "Hello from Storepify!");
	assert_eq!(body["product_count"], 2);
}

#[rstest]
#[tokio::test]
async fn test_named_routes(#[future] app: TestApp) {
	let app = app.await;
	let router = &app.app.router;

	assert_eq!(router.reverse("store:product-list", &[]).unwrap(), "/store/products/");
	assert_eq!(
		router.reverse("store:collection-detail", &[("id", "4")]).unwrap(),
		"/store/collections/4/"
	);
	assert_eq!(router.reverse("users:me", &[]).unwrap(), "/auth/users/me/");
	assert_eq!(router.reverse("jwt:create", &[]).unwrap(), "/auth/jwt/create/");
	assert_eq!(router.reverse("playground:hello", &[]).unwrap(), "/test/hello/");
	assert_eq!(router.reverse("admin:index", &[]).unwrap(), "/admin/");
}

#[rstest]
#[tokio::test]
async fn test_missing_slash_and_unknown_paths(#[future] app: TestApp) {
	let app = app.await;

	let response = app.get("/store/products", None).await;
	assert_eq!(response.status, StatusCode::MOVED_PERMANENTLY);
	assert_eq!(response.headers["location"], "/store/products/");

	let response = app.get("/store/nothing-here/", None).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);

	let response = app.get("/auth/jwt/create/", None).await;
	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[rstest]
#[tokio::test]
async fn test_disallowed_host(#[future] app: TestApp) {
	let app = app.await;
	let request = Request::builder()
		.method(Method::GET)
		.uri("/test/hello/")
		.header("host", "evil.example")
		.build()
		.unwrap();
	let response = respond(app.app.handler().as_ref(), request).await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test]
async fn test_toolbar_only_in_debug(#[future] app: TestApp) {
	let app = app.await;
	assert!(app.app.toolbar.is_none());
	let response = app.get("/__debug__/", None).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn test_toolbar_records_store_queries() {
	let app = test_app(settings(true)).await;
	let coffee = add_collection(&app.db, "Coffee").await;
	add_product(&app.db, "Espresso", 1, coffee).await;

	let response = app.get("/store/products/", None).await;
	assert_eq!(response.status, StatusCode::OK);
	let id = response.headers["x-debug-toolbar-id"].to_str().unwrap().to_string();

	let body = app.get("/__debug__/", None).await.body_json().unwrap();
	let requests = body["requests"].as_array().unwrap();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0]["path"], "/store/products/");
	assert_eq!(requests[0]["query_count"], 2);

	let body = app.get(&format!("/__debug__/{id}/"), None).await.body_json().unwrap();
	let sql = body["panels"]
		.as_array()
		.unwrap()
		.iter()
		.find(|panel| panel["panel_id"] == "sql")
		.unwrap();
	assert_eq!(sql["data"]["total_queries"], 2);
}

#[rstest]
fn test_admin_site_passes_checks() {
	let site = build_admin_site(&StoreModels::new(), &settings(false)).unwrap();
	assert_eq!(site.model_admins().count(), 4);
}
