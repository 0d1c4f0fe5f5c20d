//! Shared store schema and model metadata for admin tests

#![allow(dead_code)]

use std::sync::Arc;
use storepify_admin::{FieldDef, ModelMeta};
use storepify_db::Database;

const SCHEMA: &str = r#"
CREATE TABLE store_collection (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	title TEXT NOT NULL
);
CREATE TABLE store_product (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	title TEXT NOT NULL,
	slug TEXT NOT NULL,
	inventory INTEGER NOT NULL,
	unit_price TEXT NOT NULL,
	last_update TEXT NOT NULL,
	collection_id INTEGER NOT NULL REFERENCES store_collection (id) ON DELETE RESTRICT
);
CREATE TABLE store_customer (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	first_name TEXT NOT NULL,
	last_name TEXT NOT NULL,
	email TEXT NOT NULL UNIQUE,
	membership TEXT NOT NULL DEFAULT 'B'
);
CREATE TABLE store_order (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	placed_at TEXT NOT NULL,
	payment_status TEXT NOT NULL DEFAULT 'P',
	customer_id INTEGER NOT NULL REFERENCES store_customer (id) ON DELETE RESTRICT
);
CREATE TABLE store_orderitem (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	order_id INTEGER NOT NULL REFERENCES store_order (id) ON DELETE CASCADE,
	product_id INTEGER NOT NULL REFERENCES store_product (id) ON DELETE RESTRICT,
	quantity INTEGER NOT NULL,
	unit_price TEXT NOT NULL
);
"#;

pub struct Models {
	pub collection: Arc<ModelMeta>,
	pub product: Arc<ModelMeta>,
	pub customer: Arc<ModelMeta>,
	pub order: Arc<ModelMeta>,
	pub order_item: Arc<ModelMeta>,
}

pub fn models() -> Models {
	let collection = Arc::new(
		ModelMeta::new("store", "collection")
			.field(FieldDef::auto_id())
			.field(FieldDef::char("title", 255))
			.str_fields(&["title"])
			.ordering(&["title"]),
	);
	let product = Arc::new(
		ModelMeta::new("store", "product")
			.field(FieldDef::auto_id())
			.field(FieldDef::char("title", 255))
			.field(FieldDef::slug("slug"))
			.field(FieldDef::positive_integer("inventory"))
			.field(FieldDef::decimal("unit_price", 6, 2).min_value(1))
			.field(FieldDef::auto_now("last_update"))
			.field(FieldDef::foreign_key("collection", collection.clone()))
			.str_fields(&["title"]),
	);
	let customer = Arc::new(
		ModelMeta::new("store", "customer")
			.field(FieldDef::auto_id())
			.field(FieldDef::char("first_name", 255))
			.field(FieldDef::char("last_name", 255))
			.field(FieldDef::email("email").unique())
			.field(
				FieldDef::choice("membership", &[("B", "Bronze"), ("S", "Silver"), ("G", "Gold")])
					.default("B"),
			)
			.str_fields(&["first_name", "last_name"]),
	);
	let order = Arc::new(
		ModelMeta::new("store", "order")
			.field(FieldDef::auto_id())
			.field(FieldDef::auto_now_add("placed_at"))
			.field(
				FieldDef::choice(
					"payment_status",
					&[("P", "Pending"), ("C", "Complete"), ("F", "Failed")],
				)
				.default("P"),
			)
			.field(FieldDef::foreign_key("customer", customer.clone())),
	);
	let order_item = Arc::new(
		ModelMeta::new("store", "orderitem")
			.verbose_name("order item", "order items")
			.field(FieldDef::auto_id())
			.field(FieldDef::foreign_key("order", order.clone()))
			.field(FieldDef::foreign_key("product", product.clone()))
			.field(FieldDef::positive_integer("quantity").min_value(1))
			.field(FieldDef::decimal("unit_price", 6, 2)),
	);
	Models {
		collection,
		product,
		customer,
		order,
		order_item,
	}
}

pub async fn database() -> Database {
	let db = Database::connect_in_memory().await.unwrap();
	for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
		db.execute_raw(statement).await.unwrap();
	}
	db
}

pub async fn add_collection(db: &Database, title: &str) -> i64 {
	db.execute_raw(&format!(
		"INSERT INTO store_collection (title) VALUES ('{}')",
		title
	))
	.await
	.unwrap();
	last_id(db, "store_collection").await
}

pub async fn add_product(db: &Database, title: &str, inventory: i64, collection: i64) -> i64 {
	db.execute_raw(&format!(
		"INSERT INTO store_product (title, slug, inventory, unit_price, last_update, collection_id) \
		 VALUES ('{}', '{}', {}, '10.00', '2024-01-01T00:00:00Z', {})",
		title,
		slug::slugify(title),
		inventory,
		collection
	))
	.await
	.unwrap();
	last_id(db, "store_product").await
}

pub async fn add_customer(db: &Database, first: &str, last: &str) -> i64 {
	db.execute_raw(&format!(
		"INSERT INTO store_customer (first_name, last_name, email) VALUES ('{}', '{}', '{}@example.com')",
		first,
		last,
		first.to_lowercase()
	))
	.await
	.unwrap();
	last_id(db, "store_customer").await
}

pub async fn add_order(db: &Database, customer: i64) -> i64 {
	db.execute_raw(&format!(
		"INSERT INTO store_order (placed_at, customer_id) VALUES ('2024-01-01T00:00:00Z', {})",
		customer
	))
	.await
	.unwrap();
	last_id(db, "store_order").await
}

pub async fn add_order_item(db: &Database, order: i64, product: i64) -> i64 {
	db.execute_raw(&format!(
		"INSERT INTO store_orderitem (order_id, product_id, quantity, unit_price) VALUES ({}, {}, 1, '10.00')",
		order, product
	))
	.await
	.unwrap();
	last_id(db, "store_orderitem").await
}

pub async fn count(db: &Database, table: &str) -> i64 {
	let select = sea_query::Query::select()
		.expr(sea_query::Expr::col(sea_query::Alias::new("id")).count())
		.from(sea_query::Alias::new(table))
		.to_owned();
	db.fetch_i64(&select).await.unwrap()
}

async fn last_id(db: &Database, table: &str) -> i64 {
	let select = sea_query::Query::select()
		.expr(sea_query::Expr::col(sea_query::Alias::new("id")).max())
		.from(sea_query::Alias::new(table))
		.to_owned();
	db.fetch_i64(&select).await.unwrap()
}
