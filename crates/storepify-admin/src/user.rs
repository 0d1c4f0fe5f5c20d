//! The authenticated user as seen by the admin

use serde::Serialize;

/// User attached to admin requests by the authentication middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
	pub id: i64,
	pub username: String,
	pub is_staff: bool,
	pub is_active: bool,
}

impl AdminUser {
	/// Whether the user may use the admin at all
	pub fn can_access_admin(&self) -> bool {
		self.is_active && self.is_staff
	}

	/// Stand-in user for sites that do not require staff logins
	pub fn anonymous_staff() -> Self {
		Self {
			id: 0,
			username: "anonymous".into(),
			is_staff: true,
			is_active: true,
		}
	}
}
