//! Argon2id password hashing

use crate::apps::accounts::error::{AuthError, AuthResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// PHC string of `password` with a fresh random salt
pub fn hash_password(password: &str) -> AuthResult<String> {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| AuthError::Hash(e.to_string()))
}

/// Whether `password` matches the stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, hash: &str) -> bool {
	let Ok(parsed) = PasswordHash::new(hash) else {
		tracing::warn!("stored password hash is not a valid PHC string");
		return false;
	};
	Argon2::default()
		.verify_password(password.as_bytes(), &parsed)
		.is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_hash_and_verify() {
		let hash = hash_password("correct horse").unwrap();
		assert!(hash.starts_with("$argon2id$"));
		assert!(verify_password("correct horse", &hash));
		assert!(!verify_password("wrong horse", &hash));
	}

	#[rstest]
	fn test_salts_differ() {
		assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
	}

	#[rstest]
	fn test_malformed_hash_never_matches() {
		assert!(!verify_password("anything", "plaintext"));
	}
}
