//! Admin registrations of the store models

use crate::apps::store::models::StoreModels;
use crate::config::settings::AdminSettings;
use async_trait::async_trait;
use sea_query::{Alias, Expr, Query, SimpleExpr};
use std::sync::Arc;
use storepify_admin::site::url_with_query;
use storepify_admin::{
	ActionContext, AdminAction, AdminResult, AdminSite, Annotation, ComputedColumn, DisplayValue,
	FilterSpec, InlineConfig, Message, ModelAdminConfig, SimpleListFilter, format_html,
};
use storepify_db::Record;

pub const SITE_HEADER: &str = "Storepify Admin";
pub const INDEX_TITLE: &str = "Admin";

/// Products below this many units are "Low"
pub const LOW_INVENTORY_THRESHOLD: i64 = 10;

pub const ADMIN_PER_PAGE: usize = 10;

/// Stock classification shown in the product list
///
/// # Examples
///
/// ```
/// use storepify::apps::store::admin::inventory_status;
///
/// assert_eq!(inventory_status(9), "Low");
/// assert_eq!(inventory_status(10), "Ok");
/// ```
pub fn inventory_status(inventory: i64) -> &'static str {
	if inventory < LOW_INVENTORY_THRESHOLD {
		"Low"
	} else {
		"Ok"
	}
}

/// Single-option filter narrowing products to low stock
pub struct InventoryFilter;

impl SimpleListFilter for InventoryFilter {
	fn title(&self) -> &str {
		"inventory"
	}

	fn parameter_name(&self) -> &str {
		"inventory"
	}

	fn lookups(&self) -> Vec<(String, String)> {
		vec![("<10".into(), "Low".into())]
	}

	fn queryset(&self, value: &str) -> Option<SimpleExpr> {
		(value == "<10").then(|| Expr::col(Alias::new("inventory")).lt(LOW_INVENTORY_THRESHOLD))
	}
}

/// Sets the inventory of every selected product to zero
pub struct ClearInventory;

#[async_trait]
impl AdminAction for ClearInventory {
	fn name(&self) -> &str {
		"clear_inventory"
	}

	fn description(&self) -> &str {
		"Clear Inventory"
	}

	async fn run(&self, ctx: &ActionContext<'_>, selected: &[i64]) -> AdminResult<()> {
		let update = Query::update()
			.table(Alias::new(&ctx.model.table))
			.value(Alias::new("inventory"), 0)
			.and_where(Expr::col(Alias::new(&ctx.model.pk)).is_in(selected.iter().copied()))
			.to_owned();
		let updated = ctx.db.execute(&update).await?;

		tracing::info!(updated, "clear_inventory");
		ctx.message_user(Message::success(format!(
			"{} Products were successfully updated.",
			updated
		)));
		Ok(())
	}
}

fn integer(record: &Record, column: &str) -> i64 {
	record.get(column).and_then(|v| v.as_i64()).unwrap_or_default()
}

/// Link to `changelist` filtered by `param = record id`, labelled by `template`
fn filtered_link(
	site: &AdminSite,
	record: &Record,
	changelist: &str,
	param: &str,
	template: &str,
	count_column: &str,
) -> AdminResult<DisplayValue> {
	let url = site.reverse(changelist, &[])?;
	let id = integer(record, "id").to_string();
	let url = url_with_query(&url, &[(param, &id)]);
	let count = integer(record, count_column).to_string();
	Ok(format_html(template, &[&url, &count]))
}

pub fn product_admin(models: &StoreModels) -> ModelAdminConfig {
	ModelAdminConfig::new(models.product.clone())
		.with_autocomplete_fields(&["collection"])
		.with_prepopulated_field("slug", &["title"])
		.with_action(Arc::new(ClearInventory))
		.with_search_fields(&["title"])
		.with_list_display(&["title", "unit_price", "inventory_status", "collection_title"])
		.with_list_editable(&["unit_price"])
		.with_list_filter(vec![
			FilterSpec::from("collection"),
			FilterSpec::from("last_update"),
			FilterSpec::Simple(Arc::new(InventoryFilter)),
		])
		.with_list_per_page(ADMIN_PER_PAGE)
		.with_list_select_related(&["collection"])
		.with_computed_column(
			ComputedColumn::new("inventory_status", |record, _| {
				Ok(DisplayValue::text(inventory_status(integer(record, "inventory"))))
			})
			.ordering("inventory"),
		)
		.with_computed_column(ComputedColumn::new("collection_title", |record, _| {
			Ok(DisplayValue::text(
				record
					.get("collection__title")
					.and_then(|v| v.as_str())
					.unwrap_or_default(),
			))
		}))
}

pub fn customer_admin(models: &StoreModels) -> ModelAdminConfig {
	ModelAdminConfig::new(models.customer.clone())
		.with_list_display(&["id", "first_name", "last_name", "membership", "orders"])
		.with_list_editable(&["membership"])
		.with_list_per_page(ADMIN_PER_PAGE)
		.with_ordering(&["first_name", "last_name"])
		.with_search_fields(&["first_name__istartswith", "last_name__istartswith"])
		.with_annotation(Annotation::count("orders_count", &models.order, "customer"))
		.with_computed_column(
			ComputedColumn::new("orders", |record, site| {
				filtered_link(
					site,
					record,
					"admin:store_order_changelist",
					"customer__id",
					"<a href=\"{}\">{} Orders</a>",
					"orders_count",
				)
			})
			.ordering("orders_count"),
		)
}

pub fn collection_admin(models: &StoreModels) -> ModelAdminConfig {
	ModelAdminConfig::new(models.collection.clone())
		.with_list_display(&["title", "products_count"])
		.with_search_fields(&["title"])
		.with_annotation(Annotation::count("products_count", &models.product, "collection"))
		.with_computed_column(
			ComputedColumn::new("products_count", |record, site| {
				filtered_link(
					site,
					record,
					"admin:store_product_changelist",
					"collection__id",
					"<a href=\"{}\">{}</a>",
					"products_count",
				)
			})
			.ordering("products_count"),
		)
}

/// Order admin; items are edited inline, between 1 and `order_item_max` of them
pub fn order_admin(models: &StoreModels, order_item_max: usize) -> ModelAdminConfig {
	ModelAdminConfig::new(models.order.clone())
		.with_list_display(&["id", "placed_at", "customer"])
		.with_list_per_page(ADMIN_PER_PAGE)
		.with_autocomplete_fields(&["customer"])
		.with_inline(
			InlineConfig::tabular(models.order_item.clone(), "order")
				.min_num(1)
				.max_num(order_item_max)
				.extra(0)
				.autocomplete_fields(&["product"]),
		)
}

/// The project's admin site with every store model registered
pub fn admin_site(models: &StoreModels, settings: &AdminSettings) -> AdminResult<AdminSite> {
	let mut site = AdminSite::new("admin")
		.with_site_header(SITE_HEADER)
		.with_index_title(INDEX_TITLE)
		.with_list_per_page(settings.list_per_page)
		.with_require_staff(settings.require_staff);

	site.register(Arc::new(product_admin(models)))?;
	site.register(Arc::new(customer_admin(models)))?;
	site.register(Arc::new(collection_admin(models)))?;
	site.register(Arc::new(order_admin(models, settings.order_item_max)))?;
	Ok(site)
}
