//! Routes mounted under `/store`

use crate::apps::store::views::{self, StoreState};
use crate::handler;
use std::sync::Arc;
use storepify_http::Router;

pub fn routes(state: Arc<StoreState>) -> Router {
	Router::new()
		.with_namespace("store")
		.get("/products/", "product-list", handler(&state, views::product_list))
		.get("/products/{id:int}/", "product-detail", handler(&state, views::product_detail))
		.get("/collections/", "collection-list", handler(&state, views::collection_list))
		.get(
			"/collections/{id:int}/",
			"collection-detail",
			handler(&state, views::collection_detail),
		)
}
