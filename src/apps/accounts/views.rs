//! User registration and token endpoints

use crate::apps::accounts::jwt::JwtAuth;
use crate::apps::accounts::models::{self, NewUser, User};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use storepify_db::Database;
use storepify_http::{Error, Request, Response, Result};

pub struct AccountsState {
	pub db: Database,
	pub jwt: Arc<JwtAuth>,
}

#[derive(Debug, Deserialize)]
struct Credentials {
	username: String,
	password: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
	refresh: String,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
	token: String,
}

pub async fn register(state: Arc<AccountsState>, request: Request) -> Result<Response> {
	let new_user: NewUser = request.json()?;
	let user = models::create_user(&state.db, &new_user).await?;
	Response::created().with_json(&user)
}

pub async fn me(_state: Arc<AccountsState>, request: Request) -> Result<Response> {
	let user = request.extensions.get::<User>().ok_or_else(|| {
		Error::Authentication("Authentication credentials were not provided.".into())
	})?;
	Response::ok().with_json(user)
}

pub async fn create_token(state: Arc<AccountsState>, request: Request) -> Result<Response> {
	let credentials: Credentials = request.json()?;
	let user = models::authenticate(&state.db, &credentials.username, &credentials.password).await?;
	let pair = state.jwt.issue_pair(user.id, &user.username)?;
	tracing::info!(user_id = user.id, "token pair issued");
	Response::ok().with_json(&pair)
}

pub async fn refresh_token(state: Arc<AccountsState>, request: Request) -> Result<Response> {
	let body: RefreshRequest = request.json()?;
	let access = state.jwt.refresh(&body.refresh)?;
	Response::ok().with_json(&json!({ "access": access }))
}

pub async fn verify_token(state: Arc<AccountsState>, request: Request) -> Result<Response> {
	let body: VerifyRequest = request.json()?;
	state.jwt.decode(&body.token)?;
	Response::ok().with_json(&json!({}))
}
