//! Store admin behavior through the HTTP surface

use crate::common::*;
use rstest::*;
use serde_json::json;
use storepify_http::StatusCode;

#[rstest]
#[tokio::test]
async fn test_admin_requires_staff_token(#[future] app: TestApp) {
	let app = app.await;

	let response = app.get("/admin/", None).await;
	assert_eq!(response.status, StatusCode::UNAUTHORIZED);

	let customer = app.token_for("shopper", false).await;
	let response = app.get("/admin/", Some(&customer)).await;
	assert_eq!(response.status, StatusCode::FORBIDDEN);

	let staff = app.staff_token().await;
	let response = app.get("/admin/", Some(&staff)).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(body["site_header"], "Storepify Admin");
	assert_eq!(body["index_title"], "Admin");
}

#[rstest]
#[tokio::test]
async fn test_inventory_status_column(#[future] app: TestApp) {
	let app = app.await;
	let coffee = add_collection(&app.db, "Coffee").await;
	add_product(&app.db, "Arabica", 9, coffee).await;
	add_product(&app.db, "Breakfast Blend", 10, coffee).await;
	add_product(&app.db, "Cold Brew", 0, coffee).await;
	let token = app.staff_token().await;

	let response = app.get("/admin/store/product/?o=title", Some(&token)).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(column(&body, "inventory_status"), [json!("Low"), json!("Ok"), json!("Low")]);
	assert_eq!(column(&body, "collection_title")[0], "Coffee");
}

#[rstest]
#[tokio::test]
async fn test_low_inventory_filter(#[future] app: TestApp) {
	let app = app.await;
	let coffee = add_collection(&app.db, "Coffee").await;
	let low = add_product(&app.db, "Five", 5, coffee).await;
	add_product(&app.db, "Ten", 10, coffee).await;
	add_product(&app.db, "Fifteen", 15, coffee).await;
	let token = app.staff_token().await;

	let response = app.get("/admin/store/product/?inventory=%3C10", Some(&token)).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(body["result_count"], 1);
	assert_eq!(body["rows"][0]["pk"], low);
}

#[rstest]
#[tokio::test]
async fn test_clear_inventory_action(#[future] app: TestApp) {
	let app = app.await;
	let coffee = add_collection(&app.db, "Coffee").await;
	let first = add_product(&app.db, "Arabica", 12, coffee).await;
	let second = add_product(&app.db, "Robusta", 30, coffee).await;
	let untouched = add_product(&app.db, "Liberica", 7, coffee).await;
	let token = app.staff_token().await;

	let response = app
		.post(
			"/admin/store/product/action/",
			Some(&token),
			json!({"action": "clear_inventory", "selected": [first, second]}),
		)
		.await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(body["messages"][0]["level"], "success");
	assert_eq!(body["messages"][0]["text"], "2 Products were successfully updated.");

	assert_eq!(inventory(&app.db, first).await, 0);
	assert_eq!(inventory(&app.db, second).await, 0);
	assert_eq!(inventory(&app.db, untouched).await, 7);
}

#[rstest]
#[tokio::test]
async fn test_customer_orders_link(#[future] app: TestApp) {
	let app = app.await;
	let ada = add_customer(&app.db, "Ada", "Lovelace").await;
	let bob = add_customer(&app.db, "Bob", "Dylan").await;
	for _ in 0..3 {
		add_order(&app.db, ada).await;
	}
	let token = app.staff_token().await;

	let response = app.get("/admin/store/customer/", Some(&token)).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.body_json().unwrap();
	assert_eq!(
		column(&body, "orders"),
		[
			json!(format!("<a href=\"/admin/store/order/?customer__id={ada}\">3 Orders</a>")),
			json!(format!("<a href=\"/admin/store/order/?customer__id={bob}\">0 Orders</a>")),
		]
	);

	let response = app
		.get(&format!("/admin/store/order/?customer__id={ada}"), Some(&token))
		.await;
	assert_eq!(response.body_json().unwrap()["result_count"], 3);
}

#[rstest]
#[tokio::test]
async fn test_collection_products_link(#[future] app: TestApp) {
	let app = app.await;
	let coffee = add_collection(&app.db, "Coffee").await;
	add_collection(&app.db, "Tea").await;
	for i in 0..5 {
		add_product(&app.db, &format!("Coffee {i}"), 20, coffee).await;
	}
	let token = app.staff_token().await;

	let response = app.get("/admin/store/collection/", Some(&token)).await;
	let body = response.body_json().unwrap();
	assert_eq!(
		column(&body, "products_count"),
		[
			json!(format!("<a href=\"/admin/store/product/?collection__id={coffee}\">5</a>")),
			json!(format!("<a href=\"/admin/store/product/?collection__id={}\">0</a>", coffee + 1)),
		]
	);

	let response = app
		.get(&format!("/admin/store/product/?collection__id={coffee}"), Some(&token))
		.await;
	assert_eq!(response.body_json().unwrap()["result_count"], 5);
}

#[rstest]
#[case(0, false)]
#[case(1, true)]
#[case(2, true)]
#[case(3, false)]
#[tokio::test]
async fn test_order_item_bounds(#[future] app: TestApp, #[case] items: usize, #[case] accepted: bool) {
	let app = app.await;
	let coffee = add_collection(&app.db, "Coffee").await;
	let product = add_product(&app.db, "Arabica", 50, coffee).await;
	let customer = add_customer(&app.db, "Ada", "Lovelace").await;
	let token = app.staff_token().await;

	let rows: Vec<_> = (0..items)
		.map(|_| json!({"values": {"product": product, "quantity": 1, "unit_price": "4.50"}}))
		.collect();
	let response = app
		.post(
			"/admin/store/order/add/",
			Some(&token),
			json!({"customer": customer, "orderitem_set": rows}),
		)
		.await;

	if accepted {
		assert_eq!(response.status, StatusCode::CREATED);
		assert_eq!(count(&app.db, "store_orderitem").await, items as i64);
	} else {
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		let body = response.body_json().unwrap();
		assert!(body["errors"]["orderitem_set-__all__"].is_array());
		assert_eq!(count(&app.db, "store_order").await, 0);
	}
}

#[rstest]
#[tokio::test]
async fn test_add_product_prepopulates_slug(#[future] app: TestApp) {
	let app = app.await;
	let coffee = add_collection(&app.db, "Coffee").await;
	let token = app.staff_token().await;

	let response = app
		.post(
			"/admin/store/product/add/",
			Some(&token),
			json!({"title": "Flat White", "unit_price": "3.20", "inventory": 4, "collection": coffee}),
		)
		.await;
	assert_eq!(response.status, StatusCode::CREATED);
	let body = response.body_json().unwrap();
	assert_eq!(body["object"]["values"]["slug"], "flat-white");

	let response = app
		.post(
			"/admin/store/product/add/",
			Some(&token),
			json!({"title": "Cheap", "unit_price": "0.50", "inventory": 4, "collection": coffee}),
		)
		.await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);
	assert!(response.body_json().unwrap()["errors"]["unit_price"].is_array());
}

#[rstest]
#[tokio::test]
async fn test_product_list_pages_by_ten(#[future] app: TestApp) {
	let app = app.await;
	let coffee = add_collection(&app.db, "Coffee").await;
	for i in 0..11 {
		add_product(&app.db, &format!("Roast {i:02}"), 20, coffee).await;
	}
	let token = app.staff_token().await;

	let body = app.get("/admin/store/product/", Some(&token)).await.body_json().unwrap();
	assert_eq!(body["per_page"], 10);
	assert_eq!(body["num_pages"], 2);
	assert_eq!(body["result_count"], 11);
	assert_eq!(body["rows"].as_array().unwrap().len(), 10);

	let body = app.get("/admin/store/product/?p=2", Some(&token)).await.body_json().unwrap();
	assert_eq!(body["page"], 2);
	assert_eq!(column(&body, "title"), [json!("Roast 10")]);
}

#[rstest]
#[tokio::test]
async fn test_collections_sort_by_products_count(#[future] app: TestApp) {
	let app = app.await;
	let books = add_collection(&app.db, "Books").await;
	let coffee = add_collection(&app.db, "Coffee").await;
	let tea = add_collection(&app.db, "Tea").await;
	for i in 0..2 {
		add_product(&app.db, &format!("Book {i}"), 20, books).await;
	}
	for i in 0..5 {
		add_product(&app.db, &format!("Coffee {i}"), 20, coffee).await;
	}
	let token = app.staff_token().await;

	let pks = |body: &serde_json::Value| -> Vec<i64> {
		body["rows"]
			.as_array()
			.unwrap()
			.iter()
			.map(|row| row["pk"].as_i64().unwrap())
			.collect()
	};

	let response = app.get("/admin/store/collection/?o=-products_count", Some(&token)).await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(pks(&response.body_json().unwrap()), [coffee, books, tea]);

	let response = app.get("/admin/store/collection/?o=products_count", Some(&token)).await;
	assert_eq!(pks(&response.body_json().unwrap()), [tea, books, coffee]);
}
