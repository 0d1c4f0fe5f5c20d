//! Admin JSON endpoints through the router

mod common;

use common::*;
use rstest::*;
use serde_json::json;
use std::sync::Arc;
use storepify_admin::{AdminSite, AdminUser, ModelAdminConfig, handlers};
use storepify_http::{Method, Request, Response, Router, StatusCode, respond};

async fn router(require_staff: bool) -> Router {
	let db = database().await;
	let models = models();
	let coffee = add_collection(&db, "Coffee").await;
	add_product(&db, "Espresso", 5, coffee).await;

	let mut site = AdminSite::new("admin")
		.with_site_header("Storepify Admin")
		.with_index_title("Admin")
		.with_require_staff(require_staff);
	site.register(Arc::new(
		ModelAdminConfig::new(models.product.clone())
			.with_list_display(&["title", "inventory"])
			.with_search_fields(&["title"]),
	))
	.unwrap();
	site.register(Arc::new(
		ModelAdminConfig::new(models.collection.clone()).with_search_fields(&["title"]),
	))
	.unwrap();

	Router::new().include("/admin", handlers::admin_router(Arc::new(site), db))
}

fn staff() -> AdminUser {
	AdminUser {
		id: 1,
		username: "admin".into(),
		is_staff: true,
		is_active: true,
	}
}

async fn call(
	router: &Router,
	method: Method,
	uri: &str,
	user: Option<AdminUser>,
	body: Option<serde_json::Value>,
) -> Response {
	let mut builder = Request::builder().method(method).uri(uri);
	if let Some(body) = &body {
		builder = builder.json(body);
	}
	let mut request = builder.build().unwrap();
	if let Some(user) = user {
		request.extensions.insert(user);
	}
	respond(router, request).await
}

#[rstest]
#[tokio::test]
async fn test_index_requires_staff() {
	let router = router(true).await;

	let response = call(&router, Method::GET, "/admin/", None, None).await;
	assert_eq!(response.status, StatusCode::UNAUTHORIZED);

	let mut customer = staff();
	customer.is_staff = false;
	let response = call(&router, Method::GET, "/admin/", Some(customer), None).await;
	assert_eq!(response.status, StatusCode::FORBIDDEN);

	let response = call(&router, Method::GET, "/admin/", Some(staff()), None).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(body["site_header"], "Storepify Admin");
	assert_eq!(body["apps"][0]["models"][1]["admin_url"], "/admin/store/product/");
}

#[rstest]
#[tokio::test]
async fn test_changelist_and_detail() {
	let router = router(false).await;

	let response = call(&router, Method::GET, "/admin/store/product/?q=esp", None, None).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(body["result_count"], 1);
	assert_eq!(body["rows"][0]["cells"][0]["display"]["value"], "Espresso");

	let response = call(&router, Method::GET, "/admin/store/product/1/change/", None, None).await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.body_json().unwrap()["values"]["inventory"], 5);
}

#[rstest]
#[tokio::test]
async fn test_errors_map_to_statuses() {
	let router = router(false).await;

	let response = call(&router, Method::GET, "/admin/store/tag/", None, None).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);

	let response = call(&router, Method::GET, "/admin/store/product/?colour=red", None, None).await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);

	let response = call(&router, Method::GET, "/admin/store/product/9/change/", None, None).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);

	let response = call(&router, Method::GET, "/admin/store/product/action/", None, None).await;
	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[rstest]
#[tokio::test]
async fn test_add_returns_created_with_messages() {
	let router = router(false).await;

	let response = call(
		&router,
		Method::POST,
		"/admin/store/collection/add/",
		None,
		Some(json!({"title": "Tea"})),
	)
	.await;
	assert_eq!(response.status, StatusCode::CREATED);
	let body = response.body_json().unwrap();
	assert_eq!(body["object"]["repr"], "Tea");
	assert_eq!(body["messages"][0]["level"], "success");

	let response = call(
		&router,
		Method::POST,
		"/admin/store/collection/add/",
		None,
		Some(json!({"title": ""})),
	)
	.await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test]
async fn test_action_endpoint_reports_messages() {
	let router = router(false).await;

	let response = call(
		&router,
		Method::POST,
		"/admin/store/product/action/",
		None,
		Some(json!({"action": "delete_selected", "selected": []})),
	)
	.await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(
		response.body_json().unwrap()["messages"][0]["level"],
		"warning"
	);

	let response = call(
		&router,
		Method::POST,
		"/admin/store/product/action/",
		None,
		Some(json!({"action": "delete_selected", "selected": [1]})),
	)
	.await;
	assert_eq!(
		response.body_json().unwrap()["messages"][0]["text"],
		"Successfully deleted 1 product."
	);
}

#[rstest]
#[tokio::test]
async fn test_autocomplete_endpoint() {
	let router = router(false).await;

	let response = call(
		&router,
		Method::GET,
		"/admin/autocomplete/?app_label=store&model_name=product&field_name=collection&term=cof",
		None,
		None,
	)
	.await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(
		response.body_json().unwrap(),
		json!({"results": [{"id": "1", "text": "Coffee"}], "pagination": {"more": false}})
	);
}
