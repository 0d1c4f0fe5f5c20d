//! HS256 access and refresh tokens

use crate::apps::accounts::error::{AuthError, AuthResult};
use crate::config::settings::JwtSettings;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
	Access,
	Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
	/// User id
	pub sub: String,
	pub username: String,
	pub token_type: TokenType,
	pub iat: i64,
	pub exp: i64,
}

impl Claims {
	pub fn new(user_id: i64, username: &str, token_type: TokenType, expires_in: Duration) -> Self {
		let now = Utc::now();
		Self {
			sub: user_id.to_string(),
			username: username.to_string(),
			token_type,
			iat: now.timestamp(),
			exp: (now + expires_in).timestamp(),
		}
	}

	pub fn user_id(&self) -> AuthResult<i64> {
		self.sub.parse().map_err(|_| AuthError::InvalidToken)
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
	pub access: String,
	pub refresh: String,
}

/// Signs and verifies tokens with the project secret
pub struct JwtAuth {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	validation: Validation,
	access_lifetime: Duration,
	refresh_lifetime: Duration,
}

impl JwtAuth {
	pub fn new(secret: &[u8], settings: &JwtSettings) -> Self {
		let mut validation = Validation::new(Algorithm::HS256);
		validation.leeway = 0;
		Self {
			encoding_key: EncodingKey::from_secret(secret),
			decoding_key: DecodingKey::from_secret(secret),
			validation,
			access_lifetime: Duration::seconds(settings.access_lifetime_secs),
			refresh_lifetime: Duration::seconds(settings.refresh_lifetime_secs),
		}
	}

	pub fn encode(&self, claims: &Claims) -> AuthResult<String> {
		encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
			tracing::error!(error = %e, "failed to sign token");
			AuthError::InvalidToken
		})
	}

	/// Signature and expiry checked claims of `token`
	pub fn decode(&self, token: &str) -> AuthResult<Claims> {
		decode::<Claims>(token, &self.decoding_key, &self.validation)
			.map(|data| data.claims)
			.map_err(|e| {
				tracing::debug!(error = %e, "token rejected");
				AuthError::InvalidToken
			})
	}

	/// Decode `token` and require it to be of `expected` type
	pub fn verify(&self, token: &str, expected: TokenType) -> AuthResult<Claims> {
		let claims = self.decode(token)?;
		if claims.token_type != expected {
			return Err(AuthError::WrongTokenType);
		}
		Ok(claims)
	}

	pub fn issue_access(&self, user_id: i64, username: &str) -> AuthResult<String> {
		self.encode(&Claims::new(user_id, username, TokenType::Access, self.access_lifetime))
	}

	pub fn issue_pair(&self, user_id: i64, username: &str) -> AuthResult<TokenPair> {
		Ok(TokenPair {
			access: self.issue_access(user_id, username)?,
			refresh: self.encode(&Claims::new(
				user_id,
				username,
				TokenType::Refresh,
				self.refresh_lifetime,
			))?,
		})
	}

	/// New access token for a valid refresh token
	pub fn refresh(&self, refresh_token: &str) -> AuthResult<String> {
		let claims = self.verify(refresh_token, TokenType::Refresh)?;
		self.issue_access(claims.user_id()?, &claims.username)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	const SECRET: &[u8] = b"test-secret-key-that-is-long-enough-0123";

	#[fixture]
	fn auth() -> JwtAuth {
		JwtAuth::new(SECRET, &JwtSettings::default())
	}

	#[rstest]
	fn test_pair_types(auth: JwtAuth) {
		let pair = auth.issue_pair(7, "alice").unwrap();

		let access = auth.verify(&pair.access, TokenType::Access).unwrap();
		assert_eq!(access.user_id().unwrap(), 7);
		assert_eq!(access.username, "alice");
		assert_eq!(access.exp - access.iat, 300);

		let refresh = auth.verify(&pair.refresh, TokenType::Refresh).unwrap();
		assert_eq!(refresh.exp - refresh.iat, 86400);
	}

	#[rstest]
	fn test_refresh_token_is_not_an_access_token(auth: JwtAuth) {
		let pair = auth.issue_pair(1, "bob").unwrap();
		assert!(matches!(
			auth.verify(&pair.refresh, TokenType::Access),
			Err(AuthError::WrongTokenType)
		));
		assert!(matches!(auth.refresh(&pair.access), Err(AuthError::WrongTokenType)));
	}

	#[rstest]
	fn test_refresh_issues_access(auth: JwtAuth) {
		let pair = auth.issue_pair(3, "carol").unwrap();
		let access = auth.refresh(&pair.refresh).unwrap();
		assert_eq!(auth.verify(&access, TokenType::Access).unwrap().sub, "3");
	}

	#[rstest]
	fn test_expired_token_rejected(auth: JwtAuth) {
		let claims = Claims::new(1, "dave", TokenType::Access, Duration::seconds(-10));
		let token = auth.encode(&claims).unwrap();
		assert!(matches!(auth.decode(&token), Err(AuthError::InvalidToken)));
	}

	#[rstest]
	fn test_foreign_signature_rejected(auth: JwtAuth) {
		let other = JwtAuth::new(b"another-secret-key-that-is-long-enough", &JwtSettings::default());
		let token = other.issue_access(1, "eve").unwrap();
		assert!(auth.decode(&token).is_err());
		assert!(auth.decode("not.a.token").is_err());
	}
}
