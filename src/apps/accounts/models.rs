//! Project user model

use crate::apps::accounts::error::{AuthError, AuthResult};
use crate::apps::accounts::hashers::{hash_password, verify_password};
use chrono::{SecondsFormat, Utc};
use sea_query::{Alias, Expr, Query, SelectStatement};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sqlx::FromRow;
use storepify_admin::AdminUser;
use storepify_db::Database;
use storepify_db::error::ConstraintKind;

pub const USER_TABLE: &str = "accounts_user";
pub const MIN_PASSWORD_LENGTH: usize = 8;
const USERNAME_MAX_LENGTH: usize = 150;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
	pub id: i64,
	pub username: String,
	pub email: String,
	#[serde(skip_serializing)]
	pub password: String,
	pub is_staff: bool,
	pub is_active: bool,
	pub date_joined: String,
}

impl User {
	pub fn check_password(&self, password: &str) -> bool {
		verify_password(password, &self.password)
	}

	pub fn to_admin_user(&self) -> AdminUser {
		AdminUser {
			id: self.id,
			username: self.username.clone(),
			is_staff: self.is_staff,
			is_active: self.is_active,
		}
	}
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
	pub username: String,
	#[serde(default)]
	pub email: String,
	pub password: String,
	#[serde(skip)]
	pub is_staff: bool,
}

impl NewUser {
	fn validate(&self) -> AuthResult<()> {
		let mut errors = Map::new();
		let username = self.username.trim();
		if username.is_empty() {
			errors.insert("username".into(), json!(["This field may not be blank."]));
		} else if username.chars().count() > USERNAME_MAX_LENGTH {
			errors.insert(
				"username".into(),
				json!([format!(
					"Ensure this field has no more than {USERNAME_MAX_LENGTH} characters."
				)]),
			);
		}
		if self.password.chars().count() < MIN_PASSWORD_LENGTH {
			errors.insert(
				"password".into(),
				json!([format!(
					"This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
				)]),
			);
		}
		if !self.email.is_empty() && !self.email.contains('@') {
			errors.insert("email".into(), json!(["Enter a valid email address."]));
		}
		if errors.is_empty() {
			Ok(())
		} else {
			Err(AuthError::Validation(errors))
		}
	}
}

fn select_users() -> SelectStatement {
	Query::select()
		.columns([
			Alias::new("id"),
			Alias::new("username"),
			Alias::new("email"),
			Alias::new("password"),
			Alias::new("is_staff"),
			Alias::new("is_active"),
			Alias::new("date_joined"),
		])
		.from(Alias::new(USER_TABLE))
		.to_owned()
}

fn taken(username: &str) -> AuthError {
	let mut errors = Map::new();
	errors.insert(
		"username".into(),
		Value::from(vec![format!("A user with username '{username}' already exists.")]),
	);
	AuthError::Validation(errors)
}

/// Validate, hash and store a new user
pub async fn create_user(db: &Database, new_user: &NewUser) -> AuthResult<User> {
	new_user.validate()?;
	let username = new_user.username.trim();
	if find_by_username(db, username).await?.is_some() {
		return Err(taken(username));
	}

	let password = hash_password(&new_user.password)?;
	let date_joined = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
	let insert = Query::insert()
		.into_table(Alias::new(USER_TABLE))
		.columns([
			Alias::new("username"),
			Alias::new("email"),
			Alias::new("password"),
			Alias::new("is_staff"),
			Alias::new("is_active"),
			Alias::new("date_joined"),
		])
		.values_panic([
			username.into(),
			new_user.email.clone().into(),
			password.into(),
			new_user.is_staff.into(),
			true.into(),
			date_joined.into(),
		])
		.to_owned();

	let id = match db.insert(&insert).await {
		Ok(id) => id,
		Err(e) if e.constraint_kind() == Some(ConstraintKind::Unique) => return Err(taken(username)),
		Err(e) => return Err(e.into()),
	};
	tracing::info!(user_id = id, username, is_staff = new_user.is_staff, "user created");
	get(db, id).await?.ok_or(AuthError::UserNotFound)
}

/// Create an active staff user
pub async fn create_superuser(
	db: &Database,
	username: &str,
	email: &str,
	password: &str,
) -> AuthResult<User> {
	let new_user = NewUser {
		username: username.to_string(),
		email: email.to_string(),
		password: password.to_string(),
		is_staff: true,
	};
	create_user(db, &new_user).await
}

pub async fn get(db: &Database, id: i64) -> AuthResult<Option<User>> {
	let select = select_users()
		.and_where(Expr::col(Alias::new("id")).eq(id))
		.to_owned();
	Ok(db.fetch_optional_as(&select).await?)
}

pub async fn find_by_username(db: &Database, username: &str) -> AuthResult<Option<User>> {
	let select = select_users()
		.and_where(Expr::col(Alias::new("username")).eq(username))
		.to_owned();
	Ok(db.fetch_optional_as(&select).await?)
}

/// Active user with matching credentials
pub async fn authenticate(db: &Database, username: &str, password: &str) -> AuthResult<User> {
	match find_by_username(db, username).await? {
		Some(user) if user.is_active && user.check_password(password) => Ok(user),
		_ => {
			tracing::info!(username, "authentication failed");
			Err(AuthError::InvalidCredentials)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::MIGRATOR;
	use rstest::{fixture, rstest};

	#[fixture]
	async fn db() -> Database {
		let db = Database::connect_in_memory().await.unwrap();
		db.run_migrations(&MIGRATOR).await.unwrap();
		db
	}

	fn new_user(username: &str, password: &str) -> NewUser {
		NewUser {
			username: username.into(),
			email: format!("{username}@example.com"),
			password: password.into(),
			is_staff: false,
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_and_authenticate(#[future] db: Database) {
		let db = db.await;
		let user = create_user(&db, &new_user("alice", "s3cret-pass")).await.unwrap();
		assert!(user.is_active);
		assert!(!user.is_staff);
		assert_ne!(user.password, "s3cret-pass");

		let found = authenticate(&db, "alice", "s3cret-pass").await.unwrap();
		assert_eq!(found.id, user.id);
		assert!(matches!(
			authenticate(&db, "alice", "wrong-pass").await,
			Err(AuthError::InvalidCredentials)
		));
		assert!(matches!(
			authenticate(&db, "nobody", "s3cret-pass").await,
			Err(AuthError::InvalidCredentials)
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_duplicate_username(#[future] db: Database) {
		let db = db.await;
		create_user(&db, &new_user("bob", "password1")).await.unwrap();
		let Err(AuthError::Validation(errors)) = create_user(&db, &new_user("bob", "password2")).await
		else {
			panic!("duplicate username accepted");
		};
		assert!(errors.contains_key("username"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_short_password_and_blank_username(#[future] db: Database) {
		let db = db.await;
		let Err(AuthError::Validation(errors)) = create_user(&db, &new_user(" ", "short")).await else {
			panic!("invalid user accepted");
		};
		assert!(errors.contains_key("username"));
		assert!(errors.contains_key("password"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_superuser_is_staff(#[future] db: Database) {
		let db = db.await;
		let admin = create_superuser(&db, "admin", "admin@example.com", "admin-pass")
			.await
			.unwrap();
		assert!(admin.to_admin_user().can_access_admin());
		let json = serde_json::to_value(&admin).unwrap();
		assert!(json.get("password").is_none());
	}
}
