//! The admin site registry

use crate::actions::{AdminAction, DeleteSelected};
use crate::checks::{self, CheckMessage};
use crate::model::{ModelMeta, capfirst};
use crate::options::ModelAdmin;
use crate::{AdminError, AdminResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default number of rows per change list page
pub const DEFAULT_LIST_PER_PAGE: usize = 100;

/// Registered model as listed on the index page
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexModel {
	pub object_name: String,
	pub name: String,
	pub admin_url: String,
	pub add_url: String,
}

/// One application section of the index page
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexApp {
	pub app_label: String,
	pub name: String,
	pub models: Vec<IndexModel>,
}

/// Index page content
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexView {
	pub site_header: String,
	pub site_title: String,
	pub index_title: String,
	pub apps: Vec<IndexApp>,
}

/// Collection of model admins served under one URL prefix
pub struct AdminSite {
	pub name: String,
	pub site_header: String,
	pub site_title: String,
	pub index_title: String,
	pub url_prefix: String,
	pub list_per_page: usize,
	/// Reject requests without an active staff user
	pub require_staff: bool,
	registry: BTreeMap<(String, String), Arc<dyn ModelAdmin>>,
}

impl AdminSite {
	/// # Examples
	///
	/// ```
	/// use storepify_admin::AdminSite;
	///
	/// let site = AdminSite::new("admin").with_site_header("Storepify Admin");
	/// assert_eq!(site.site_header, "Storepify Admin");
	/// assert_eq!(site.reverse("admin:index", &[]).unwrap(), "/admin/");
	/// ```
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			url_prefix: format!("/{}", name),
			name,
			site_header: "Administration".into(),
			site_title: "Site admin".into(),
			index_title: "Site administration".into(),
			list_per_page: DEFAULT_LIST_PER_PAGE,
			require_staff: true,
			registry: BTreeMap::new(),
		}
	}

	pub fn with_site_header(mut self, header: impl Into<String>) -> Self {
		self.site_header = header.into();
		self
	}

	pub fn with_site_title(mut self, title: impl Into<String>) -> Self {
		self.site_title = title.into();
		self
	}

	pub fn with_index_title(mut self, title: impl Into<String>) -> Self {
		self.index_title = title.into();
		self
	}

	pub fn with_list_per_page(mut self, per_page: usize) -> Self {
		self.list_per_page = per_page.max(1);
		self
	}

	pub fn with_require_staff(mut self, require: bool) -> Self {
		self.require_staff = require;
		self
	}

	/// Register a model admin
	pub fn register(&mut self, admin: Arc<dyn ModelAdmin>) -> AdminResult<()> {
		let meta = admin.model();
		let key = (meta.app_label.clone(), meta.model_name.clone());
		if self.registry.contains_key(&key) {
			return Err(AdminError::AlreadyRegistered(meta.label()));
		}
		tracing::debug!(model = %meta.label(), "registered model admin");
		self.registry.insert(key, admin);
		Ok(())
	}

	pub fn is_registered(&self, app_label: &str, model_name: &str) -> bool {
		self.registry
			.contains_key(&(app_label.to_string(), model_name.to_string()))
	}

	pub fn get_model_admin(
		&self,
		app_label: &str,
		model_name: &str,
	) -> AdminResult<Arc<dyn ModelAdmin>> {
		self.registry
			.get(&(app_label.to_string(), model_name.to_string()))
			.cloned()
			.ok_or_else(|| AdminError::ModelNotRegistered(format!("{}.{}", app_label, model_name)))
	}

	/// Registered admins ordered by app label and model name
	pub fn model_admins(&self) -> impl Iterator<Item = &Arc<dyn ModelAdmin>> {
		self.registry.values()
	}

	/// Metadata of any model reachable from the registry: registered
	/// models, their inline models and relation targets
	pub fn find_model(&self, app_label: &str, model_name: &str) -> Option<ModelMeta> {
		let matches =
			|meta: &ModelMeta| meta.app_label == app_label && meta.model_name == model_name;

		for admin in self.registry.values() {
			let meta = admin.model();
			if matches(meta) {
				return Some(meta.clone());
			}
			for inline in admin.inlines() {
				if matches(inline.model.as_ref()) {
					return Some((*inline.model).clone());
				}
			}
			for field in meta.fields() {
				if let Some(target) = field.related_model()
					&& matches(target.as_ref())
				{
					return Some((**target).clone());
				}
			}
		}
		None
	}

	/// Actions offered for `admin`: `delete_selected` followed by its own
	pub fn actions_for(&self, admin: &dyn ModelAdmin) -> Vec<Arc<dyn AdminAction>> {
		let mut actions: Vec<Arc<dyn AdminAction>> = vec![Arc::new(DeleteSelected)];
		actions.extend(admin.actions());
		actions
	}

	/// Build the URL for a named admin route
	///
	/// Names follow `admin:index`, `admin:autocomplete` and
	/// `admin:{app}_{model}_{changelist|add|change|delete|action|editable}`;
	/// `change` and `delete` take an `object_id` parameter.
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> AdminResult<String> {
		let not_found = || {
			AdminError::ImproperlyConfigured(format!("Reverse for '{}' not found", name))
		};
		let route = name
			.strip_prefix(&format!("{}:", self.name))
			.ok_or_else(not_found)?;

		match route {
			"index" => return Ok(format!("{}/", self.url_prefix)),
			"autocomplete" => return Ok(format!("{}/autocomplete/", self.url_prefix)),
			_ => {}
		}

		for (app_label, model_name) in self.registry.keys() {
			let Some(suffix) = route.strip_prefix(&format!("{}_{}_", app_label, model_name)) else {
				continue;
			};
			let base = format!("{}/{}/{}/", self.url_prefix, app_label, model_name);
			let object_id = params
				.iter()
				.find(|(key, _)| *key == "object_id")
				.map(|(_, value)| *value);
			return match (suffix, object_id) {
				("changelist", _) => Ok(base),
				("add", _) => Ok(format!("{}add/", base)),
				("action", _) => Ok(format!("{}action/", base)),
				("editable", _) => Ok(format!("{}editable/", base)),
				("change", Some(id)) => Ok(format!("{}{}/change/", base, id)),
				("delete", Some(id)) => Ok(format!("{}{}/delete/", base, id)),
				_ => Err(not_found()),
			};
		}
		Err(not_found())
	}

	/// Index page listing every registered model
	pub fn index(&self) -> IndexView {
		let mut apps: Vec<IndexApp> = Vec::new();
		for ((app_label, model_name), admin) in &self.registry {
			let meta = admin.model();
			let base = format!("{}/{}/{}/", self.url_prefix, app_label, model_name);
			let model = IndexModel {
				object_name: capfirst(model_name),
				name: capfirst(&meta.verbose_name_plural),
				add_url: format!("{}add/", base),
				admin_url: base,
			};
			match apps.last_mut() {
				Some(app) if app.app_label == *app_label => app.models.push(model),
				_ => apps.push(IndexApp {
					app_label: app_label.clone(),
					name: capfirst(app_label),
					models: vec![model],
				}),
			}
		}
		IndexView {
			site_header: self.site_header.clone(),
			site_title: self.site_title.clone(),
			index_title: self.index_title.clone(),
			apps,
		}
	}

	/// Run system checks over every registration
	pub fn check(&self) -> Vec<CheckMessage> {
		checks::run(self)
	}
}

/// `url` with `pairs` appended as an encoded query string
///
/// # Examples
///
/// ```
/// use storepify_admin::site::url_with_query;
///
/// assert_eq!(
/// 	url_with_query("/admin/store/order/", &[("customer__id", "3")]),
/// 	"/admin/store/order/?customer__id=3"
/// );
/// ```
pub fn url_with_query(url: &str, pairs: &[(&str, &str)]) -> String {
	format!(
		"{}?{}",
		url,
		serde_urlencoded::to_string(pairs).unwrap_or_default()
	)
}
