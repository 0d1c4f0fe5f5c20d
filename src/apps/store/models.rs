//! Store tables and their admin metadata

use serde::Serialize;
use sqlx::FromRow;
use std::sync::Arc;
use storepify_admin::{FieldDef, ModelMeta};

pub const MEMBERSHIP_CHOICES: &[(&str, &str)] = &[("B", "Bronze"), ("S", "Silver"), ("G", "Gold")];

pub const PAYMENT_STATUS_CHOICES: &[(&str, &str)] =
	&[("P", "Pending"), ("C", "Complete"), ("F", "Failed")];

/// Field metadata of every store model
#[derive(Debug, Clone)]
pub struct StoreModels {
	pub collection: Arc<ModelMeta>,
	pub product: Arc<ModelMeta>,
	pub customer: Arc<ModelMeta>,
	pub order: Arc<ModelMeta>,
	pub order_item: Arc<ModelMeta>,
}

impl StoreModels {
	pub fn new() -> Self {
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
				.field(FieldDef::text("description").null().blank())
				.field(FieldDef::decimal("unit_price", 6, 2).min_value(1))
				.field(FieldDef::positive_integer("inventory"))
				.field(FieldDef::auto_now("last_update"))
				.field(FieldDef::foreign_key("collection", collection.clone()))
				.str_fields(&["title"])
				.ordering(&["title"]),
		);

		let customer = Arc::new(
			ModelMeta::new("store", "customer")
				.field(FieldDef::auto_id())
				.field(FieldDef::char("first_name", 255))
				.field(FieldDef::char("last_name", 255))
				.field(FieldDef::email("email").unique())
				.field(FieldDef::char("phone", 255).blank().default(""))
				.field(FieldDef::date("birth_date").null().blank())
				.field(FieldDef::choice("membership", MEMBERSHIP_CHOICES).default("B"))
				.str_fields(&["first_name", "last_name"])
				.ordering(&["first_name", "last_name"]),
		);

		let order = Arc::new(
			ModelMeta::new("store", "order")
				.field(FieldDef::auto_id())
				.field(FieldDef::auto_now_add("placed_at"))
				.field(FieldDef::choice("payment_status", PAYMENT_STATUS_CHOICES).default("P"))
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

		Self {
			collection,
			product,
			customer,
			order,
			order_item,
		}
	}
}

impl Default for StoreModels {
	fn default() -> Self {
		Self::new()
	}
}

/// Product as served by the public store routes; prices stay decimal strings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
	pub id: i64,
	pub title: String,
	pub slug: String,
	pub description: Option<String>,
	pub unit_price: String,
	pub inventory: i64,
	pub last_update: String,
	pub collection_id: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Collection {
	pub id: i64,
	pub title: String,
	pub products_count: i64,
}
