//! Public read-only store endpoints

use crate::apps::store::models::{Collection, Product, StoreModels};
use crate::error::db_error;
use sea_query::{Alias, Expr, LikeExpr, Order, Query, SelectStatement};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storepify_admin::Annotation;
use storepify_db::Database;
use storepify_http::{Error, Request, Response, Result};

pub const PAGE_SIZE: u64 = 10;

const PRODUCT_COLUMNS: &[&str] = &[
	"id",
	"title",
	"slug",
	"description",
	"unit_price",
	"inventory",
	"last_update",
	"collection_id",
];

pub struct StoreState {
	pub db: Database,
	pub models: StoreModels,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductQuery {
	page: Option<u64>,
	collection_id: Option<i64>,
	search: Option<String>,
}

/// One page of results
#[derive(Debug, Serialize)]
pub struct Page<T> {
	pub count: i64,
	pub page: u64,
	pub num_pages: u64,
	pub next: Option<u64>,
	pub previous: Option<u64>,
	pub results: Vec<T>,
}

fn products_base(query: &ProductQuery) -> SelectStatement {
	let mut select = Query::select();
	select.from(Alias::new("store_product"));
	if let Some(collection_id) = query.collection_id {
		select.and_where(Expr::col(Alias::new("collection_id")).eq(collection_id));
	}
	if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
		let escaped = term.replace('!', "!!").replace('%', "!%").replace('_', "!_");
		select.and_where(
			Expr::col(Alias::new("title")).like(LikeExpr::new(format!("%{}%", escaped)).escape('!')),
		);
	}
	select
}

pub async fn product_list(state: Arc<StoreState>, request: Request) -> Result<Response> {
	let query: ProductQuery = request.query()?;
	let page = query.page.unwrap_or(1);
	if page == 0 {
		return Err(Error::NotFound("Invalid page.".into()));
	}

	let count_select = products_base(&query)
		.expr(Expr::col(Alias::new("id")).count())
		.to_owned();
	let count = state.db.fetch_i64(&count_select).await.map_err(db_error)?;
	let num_pages = ((count.max(0) as u64).div_ceil(PAGE_SIZE)).max(1);
	if page > num_pages {
		return Err(Error::NotFound("Invalid page.".into()));
	}

	let select = products_base(&query)
		.columns(PRODUCT_COLUMNS.iter().map(|c| Alias::new(*c)))
		.order_by(Alias::new("title"), Order::Asc)
		.order_by(Alias::new("id"), Order::Asc)
		.limit(PAGE_SIZE)
		.offset((page - 1) * PAGE_SIZE)
		.to_owned();
	let results: Vec<Product> = state.db.fetch_all_as(&select).await.map_err(db_error)?;

	Response::ok().with_json(&Page {
		count,
		page,
		num_pages,
		next: (page < num_pages).then_some(page + 1),
		previous: (page > 1).then(|| page - 1),
		results,
	})
}

pub async fn product_detail(state: Arc<StoreState>, request: Request) -> Result<Response> {
	let id: i64 = request.path_param_as("id")?;
	let select = Query::select()
		.columns(PRODUCT_COLUMNS.iter().map(|c| Alias::new(*c)))
		.from(Alias::new("store_product"))
		.and_where(Expr::col(Alias::new("id")).eq(id))
		.to_owned();
	let product: Option<Product> = state.db.fetch_optional_as(&select).await.map_err(db_error)?;
	let product = product.ok_or_else(|| Error::NotFound("No Product matches the given query.".into()))?;
	Response::ok().with_json(&product)
}

fn collections_select(models: &StoreModels) -> SelectStatement {
	let products_count = Annotation::count("products_count", &models.product, "collection");
	Query::select()
		.columns([Alias::new("id"), Alias::new("title")])
		.expr_as(
			products_count.expr(&models.collection),
			Alias::new(products_count.alias()),
		)
		.from(Alias::new("store_collection"))
		.to_owned()
}

pub async fn collection_list(state: Arc<StoreState>, _request: Request) -> Result<Response> {
	let select = collections_select(&state.models)
		.order_by(Alias::new("title"), Order::Asc)
		.order_by(Alias::new("id"), Order::Asc)
		.to_owned();
	let collections: Vec<Collection> = state.db.fetch_all_as(&select).await.map_err(db_error)?;
	Response::ok().with_json(&collections)
}

pub async fn collection_detail(state: Arc<StoreState>, request: Request) -> Result<Response> {
	let id: i64 = request.path_param_as("id")?;
	let select = collections_select(&state.models)
		.and_where(Expr::col((Alias::new("store_collection"), Alias::new("id"))).eq(id))
		.to_owned();
	let collection: Option<Collection> =
		state.db.fetch_optional_as(&select).await.map_err(db_error)?;
	let collection =
		collection.ok_or_else(|| Error::NotFound("No Collection matches the given query.".into()))?;
	Response::ok().with_json(&collection)
}
