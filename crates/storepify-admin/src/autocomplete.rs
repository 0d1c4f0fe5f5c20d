//! Search endpoint behind relation autocomplete widgets

use crate::lookups;
use crate::options::ModelAdmin;
use crate::site::AdminSite;
use crate::user::AdminUser;
use crate::{AdminError, AdminResult};
use sea_query::{Alias, Expr, Order, Query};
use serde::{Deserialize, Serialize};
use storepify_db::Database;

/// Results per page
pub const PAGE_SIZE: u64 = 20;

/// Query parameters of an autocomplete request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteParams {
	/// Model owning the relation field
	pub app_label: String,
	pub model_name: String,
	pub field_name: String,
	#[serde(default)]
	pub term: String,
	#[serde(default)]
	pub page: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AutocompleteResult {
	pub id: String,
	pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
	pub more: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AutocompleteResponse {
	pub results: Vec<AutocompleteResult>,
	pub pagination: Pagination,
}

/// Search the admin of the relation's target model
pub async fn search(
	site: &AdminSite,
	db: &Database,
	user: &AdminUser,
	params: &AutocompleteParams,
) -> AdminResult<AutocompleteResponse> {
	let source = site
		.find_model(&params.app_label, &params.model_name)
		.ok_or_else(|| {
			AdminError::ModelNotRegistered(format!("{}.{}", params.app_label, params.model_name))
		})?;
	let target = source
		.get_field(&params.field_name)
		.and_then(|field| field.related_model())
		.ok_or_else(|| {
			AdminError::IncorrectLookupParameters(format!(
				"{} has no relation named '{}'",
				source.label(),
				params.field_name
			))
		})?;
	let admin = site.get_model_admin(&target.app_label, &target.model_name)?;

	if !admin.has_view_permission(user).await {
		return Err(AdminError::PermissionDenied(format!(
			"cannot view {}",
			target.label()
		)));
	}
	let search_fields: Vec<String> = admin
		.search_fields()
		.into_iter()
		.map(str::to_string)
		.collect();
	if search_fields.is_empty() {
		return Err(AdminError::ImproperlyConfigured(format!(
			"{} must define search_fields to be used for autocomplete",
			target.label()
		)));
	}

	let page = params.page.unwrap_or(1).max(1);
	let offset = (page - 1)
		.checked_mul(PAGE_SIZE)
		.filter(|offset| i64::try_from(*offset).is_ok())
		.ok_or_else(|| AdminError::IncorrectLookupParameters(format!("Invalid page ({})", page)))?;
	let meta = admin.model();
	let mut select = Query::select();
	select.from(Alias::new(&meta.table));
	for field in meta.fields() {
		select.column((Alias::new(&meta.table), Alias::new(field.column())));
	}
	if let Some(condition) = lookups::search_condition(meta, &search_fields, &params.term)? {
		select.cond_where(condition);
	}
	order(admin.as_ref(), &mut select);
	// One extra row tells whether another page exists.
	select
		.limit(PAGE_SIZE + 1)
		.offset(offset);

	let records = db.fetch_all(&select).await?;
	let more = records.len() as u64 > PAGE_SIZE;
	let results = records
		.iter()
		.take(PAGE_SIZE as usize)
		.map(|record| AutocompleteResult {
			id: record
				.get(&meta.pk)
				.map(crate::model::value_text)
				.unwrap_or_default(),
			text: meta.object_repr(record),
		})
		.collect();

	tracing::debug!(model = %meta.label(), term = %params.term, page, more, "autocomplete");
	Ok(AutocompleteResponse {
		results,
		pagination: Pagination { more },
	})
}

fn order(admin: &dyn ModelAdmin, select: &mut sea_query::SelectStatement) {
	let meta = admin.model();
	let admin_ordering = admin.ordering();
	let ordering: Vec<&str> = if admin_ordering.is_empty() {
		meta.ordering.iter().map(String::as_str).collect()
	} else {
		admin_ordering
	};

	let mut has_pk = false;
	for item in ordering {
		let (name, order) = match item.strip_prefix('-') {
			Some(name) => (name, Order::Desc),
			None => (item, Order::Asc),
		};
		let Some(field) = meta.get_field(name) else {
			continue;
		};
		has_pk |= field.name == meta.pk;
		select.order_by_expr(
			Expr::col((Alias::new(&meta.table), Alias::new(field.column()))).into(),
			order,
		);
	}
	if !has_pk {
		select.order_by((Alias::new(&meta.table), Alias::new(&meta.pk)), Order::Asc);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{FieldDef, ModelMeta};
	use crate::options::ModelAdminConfig;
	use rstest::rstest;
	use std::sync::Arc;

	fn site(search: &[&str]) -> AdminSite {
		let product = Arc::new(
			ModelMeta::new("store", "product")
				.field(FieldDef::auto_id())
				.field(FieldDef::char("title", 255))
				.str_fields(&["title"]),
		);
		let order = Arc::new(ModelMeta::new("store", "order").field(FieldDef::auto_id()));
		let item = Arc::new(
			ModelMeta::new("store", "orderitem")
				.field(FieldDef::auto_id())
				.field(FieldDef::foreign_key("order", order.clone()))
				.field(FieldDef::foreign_key("product", product.clone())),
		);

		let mut site = AdminSite::new("admin");
		site.register(Arc::new(
			ModelAdminConfig::new(product).with_search_fields(search),
		))
		.unwrap();
		site.register(Arc::new(ModelAdminConfig::new(order).with_inline(
			crate::inlines::InlineConfig::tabular(item, "order").autocomplete_fields(&["product"]),
		)))
		.unwrap();
		site
	}

	async fn db_with_products(n: usize) -> Database {
		let db = Database::connect_in_memory().await.unwrap();
		db.execute_raw("CREATE TABLE store_product (id INTEGER PRIMARY KEY, title TEXT NOT NULL)")
			.await
			.unwrap();
		for i in 1..=n {
			db.execute_raw(&format!(
				"INSERT INTO store_product (title) VALUES ('Coffee {:02}')",
				i
			))
			.await
			.unwrap();
		}
		db.execute_raw("INSERT INTO store_product (title) VALUES ('Tea')")
			.await
			.unwrap();
		db
	}

	fn params(term: &str, page: Option<u64>) -> AutocompleteParams {
		AutocompleteParams {
			app_label: "store".into(),
			model_name: "orderitem".into(),
			field_name: "product".into(),
			term: term.into(),
			page,
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_pages_through_matches() {
		let db = db_with_products(25).await;
		let site = site(&["title"]);
		let user = AdminUser::anonymous_staff();

		let first = search(&site, &db, &user, &params("coffee", None)).await.unwrap();
		assert_eq!(first.results.len(), 20);
		assert!(first.pagination.more);
		assert_eq!(first.results[0].text, "Coffee 01");

		let second = search(&site, &db, &user, &params("coffee", Some(2))).await.unwrap();
		assert_eq!(second.results.len(), 5);
		assert!(!second.pagination.more);
	}

	#[rstest]
	#[case(u64::MAX)]
	#[case(u64::MAX / PAGE_SIZE + 2)]
	#[tokio::test]
	async fn test_out_of_range_page_is_rejected(#[case] page: u64) {
		let db = db_with_products(3).await;
		let err = search(&site(&["title"]), &db, &AdminUser::anonymous_staff(), &params("", Some(page)))
			.await
			.unwrap_err();
		assert!(matches!(err, AdminError::IncorrectLookupParameters(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_term_narrows_results() {
		let db = db_with_products(3).await;
		let result = search(&site(&["title"]), &db, &AdminUser::anonymous_staff(), &params("te", None))
			.await
			.unwrap();
		assert_eq!(
			result.results,
			vec![AutocompleteResult {
				id: "4".into(),
				text: "Tea".into()
			}]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_target_without_search_fields_is_rejected() {
		let db = db_with_products(1).await;
		let err = search(&site(&[]), &db, &AdminUser::anonymous_staff(), &params("", None))
			.await
			.unwrap_err();
		assert!(matches!(err, AdminError::ImproperlyConfigured(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_non_staff_is_denied() {
		let db = db_with_products(1).await;
		let mut user = AdminUser::anonymous_staff();
		user.is_staff = false;
		let err = search(&site(&["title"]), &db, &user, &params("", None))
			.await
			.unwrap_err();
		assert!(matches!(err, AdminError::PermissionDenied(_)));
	}
}
