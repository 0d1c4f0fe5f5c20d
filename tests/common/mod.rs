//! Application fixture and seed helpers

#![allow(dead_code)]

use rstest::fixture;
use sea_query::{Alias, Query};
use serde_json::Value;
use std::net::SocketAddr;
use storepify::MIGRATOR;
use storepify::apps::accounts::models::{NewUser, create_superuser, create_user};
use storepify::config::settings::Settings;
use storepify::config::urls::{Application, build_application};
use storepify_db::Database;
use storepify_http::{Method, Request, Response, respond};

pub const SECRET_KEY: &str = "integration-test-secret-key-0123456789";
pub const STAFF_PASSWORD: &str = "staff-password";

pub struct TestApp {
	pub db: Database,
	pub app: Application,
}

pub fn settings(debug: bool) -> Settings {
	Settings {
		debug,
		secret_key: SECRET_KEY.into(),
		..Default::default()
	}
}

pub async fn database() -> Database {
	let db = Database::connect_in_memory().await.unwrap();
	db.run_migrations(&MIGRATOR).await.unwrap();
	db
}

pub async fn test_app(settings: Settings) -> TestApp {
	let db = database().await;
	let app = build_application(&settings, db.clone()).unwrap();
	TestApp { db, app }
}

#[fixture]
pub async fn app() -> TestApp {
	test_app(settings(false)).await
}

impl TestApp {
	pub async fn request(
		&self,
		method: Method,
		uri: &str,
		token: Option<&str>,
		body: Option<Value>,
	) -> Response {
		let loopback: SocketAddr = ([127, 0, 0, 1], 40000).into();
		let mut builder = Request::builder().method(method).uri(uri).remote_addr(loopback);
		if let Some(token) = token {
			builder = builder.header("authorization", format!("Bearer {token}"));
		}
		if let Some(body) = &body {
			builder = builder.json(body);
		}
		respond(self.app.handler().as_ref(), builder.build().unwrap()).await
	}

	pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
		self.request(Method::GET, uri, token, None).await
	}

	pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
		self.request(Method::POST, uri, token, Some(body)).await
	}

	/// Access token of a freshly created user
	pub async fn token_for(&self, username: &str, staff: bool) -> String {
		if staff {
			create_superuser(&self.db, username, "", STAFF_PASSWORD).await.unwrap();
		} else {
			let new_user: NewUser = serde_json::from_value(serde_json::json!({
				"username": username,
				"password": STAFF_PASSWORD,
			}))
			.unwrap();
			create_user(&self.db, &new_user).await.unwrap();
		}
		let response = self
			.post(
				"/auth/jwt/create/",
				None,
				serde_json::json!({"username": username, "password": STAFF_PASSWORD}),
			)
			.await;
		response.body_json().unwrap()["access"]
			.as_str()
			.unwrap()
			.to_string()
	}

	pub async fn staff_token(&self) -> String {
		self.token_for("admin", true).await
	}
}

pub async fn add_collection(db: &Database, title: &str) -> i64 {
	let insert = Query::insert()
		.into_table(Alias::new("store_collection"))
		.columns([Alias::new("title")])
		.values_panic([title.into()])
		.to_owned();
	db.insert(&insert).await.unwrap()
}

pub async fn add_product(db: &Database, title: &str, inventory: i64, collection: i64) -> i64 {
	let slug = title.to_lowercase().replace(' ', "-");
	let insert = Query::insert()
		.into_table(Alias::new("store_product"))
		.columns([
			Alias::new("title"),
			Alias::new("slug"),
			Alias::new("unit_price"),
			Alias::new("inventory"),
			Alias::new("last_update"),
			Alias::new("collection_id"),
		])
		.values_panic([
			title.into(),
			slug.into(),
			"4.50".into(),
			inventory.into(),
			"2026-01-05T09:00:00Z".into(),
			collection.into(),
		])
		.to_owned();
	db.insert(&insert).await.unwrap()
}

pub async fn add_customer(db: &Database, first_name: &str, last_name: &str) -> i64 {
	let insert = Query::insert()
		.into_table(Alias::new("store_customer"))
		.columns([Alias::new("first_name"), Alias::new("last_name"), Alias::new("email")])
		.values_panic([
			first_name.into(),
			last_name.into(),
			format!("{}@example.com", first_name.to_lowercase()).into(),
		])
		.to_owned();
	db.insert(&insert).await.unwrap()
}

pub async fn add_order(db: &Database, customer: i64) -> i64 {
	let insert = Query::insert()
		.into_table(Alias::new("store_order"))
		.columns([Alias::new("placed_at"), Alias::new("customer_id")])
		.values_panic(["2026-02-01T12:00:00Z".into(), customer.into()])
		.to_owned();
	db.insert(&insert).await.unwrap()
}

pub async fn inventory(db: &Database, product: i64) -> i64 {
	let select = Query::select()
		.column(Alias::new("inventory"))
		.from(Alias::new("store_product"))
		.and_where(sea_query::Expr::col(Alias::new("id")).eq(product))
		.to_owned();
	db.fetch_i64(&select).await.unwrap()
}

pub async fn count(db: &Database, table: &str) -> i64 {
	let select = Query::select()
		.expr(sea_query::Func::count(sea_query::Expr::col(Alias::new("id"))))
		.from(Alias::new(table))
		.to_owned();
	db.fetch_i64(&select).await.unwrap()
}

/// Display value of `column` in every change list row
pub fn column(body: &Value, column: &str) -> Vec<Value> {
	body["rows"]
		.as_array()
		.unwrap()
		.iter()
		.map(|row| {
			row["cells"]
				.as_array()
				.unwrap()
				.iter()
				.find(|cell| cell["column"] == column)
				.unwrap()["display"]["value"]
				.clone()
		})
		.collect()
}
