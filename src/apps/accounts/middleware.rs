//! Bearer token authentication

use crate::apps::accounts::error::AuthError;
use crate::apps::accounts::jwt::{JwtAuth, TokenType};
use crate::apps::accounts::models;
use async_trait::async_trait;
use std::sync::Arc;
use storepify_db::Database;
use storepify_http::{Handler, Middleware, Request, Response, Result};

/// Attaches the authenticated [`models::User`] and its
/// [`storepify_admin::AdminUser`] view to the request
///
/// Requests without an `Authorization: Bearer` header pass through
/// anonymous; a bad token or an inactive user is rejected with 401.
pub struct JwtAuthenticationMiddleware {
	jwt: Arc<JwtAuth>,
	db: Database,
}

impl JwtAuthenticationMiddleware {
	pub fn new(jwt: Arc<JwtAuth>, db: Database) -> Self {
		Self { jwt, db }
	}
}

#[async_trait]
impl Middleware for JwtAuthenticationMiddleware {
	async fn process(&self, mut request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let token = request.bearer_token().map(str::to_owned);
		if let Some(token) = token {
			let claims = self.jwt.verify(&token, TokenType::Access)?;
			let user = models::get(&self.db, claims.user_id()?)
				.await?
				.filter(|user| user.is_active)
				.ok_or(AuthError::UserNotFound)?;
			tracing::debug!(user_id = user.id, "request authenticated");
			request.extensions.insert(user.to_admin_user());
			request.extensions.insert(user);
		}
		next.handle(request).await
	}
}
