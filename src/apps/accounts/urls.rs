//! Routes mounted under `/auth`

use crate::apps::accounts::views::{self, AccountsState};
use crate::handler;
use std::sync::Arc;
use storepify_http::Router;

pub fn user_routes(state: Arc<AccountsState>) -> Router {
	Router::new()
		.with_namespace("users")
		.post("/users/", "register", handler(&state, views::register))
		.get("/users/me/", "me", handler(&state, views::me))
}

pub fn jwt_routes(state: Arc<AccountsState>) -> Router {
	Router::new()
		.with_namespace("jwt")
		.post("/jwt/create/", "create", handler(&state, views::create_token))
		.post("/jwt/refresh/", "refresh", handler(&state, views::refresh_token))
		.post("/jwt/verify/", "verify", handler(&state, views::verify_token))
}
