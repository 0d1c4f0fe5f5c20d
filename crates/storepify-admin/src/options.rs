//! Model admin configuration and trait
//!
//! This module defines how models are displayed and managed in the admin.

use crate::actions::AdminAction;
use crate::annotations::Annotation;
use crate::display::ComputedColumn;
use crate::filters::FilterSpec;
use crate::inlines::InlineConfig;
use crate::model::ModelMeta;
use crate::user::AdminUser;
use async_trait::async_trait;
use std::sync::Arc;

/// Column showing the row's text representation
pub const STR_COLUMN: &str = "__str__";

/// Trait for configuring model administration
///
/// Implement this trait to customize how a model is listed and edited.
/// Every method except [`model`](Self::model) has a default.
#[async_trait]
pub trait ModelAdmin: Send + Sync {
	/// Model managed by this admin
	fn model(&self) -> &ModelMeta;

	/// Columns of the change list: field names, `related__field` paths
	/// through `list_select_related`, computed column names or `__str__`
	fn list_display(&self) -> Vec<&str> {
		vec![STR_COLUMN]
	}

	/// Columns linking to the change form (first column by default)
	fn list_display_links(&self) -> Vec<&str> {
		self.list_display().into_iter().take(1).collect()
	}

	/// Columns editable directly from the change list
	fn list_editable(&self) -> Vec<&str> {
		vec![]
	}

	fn list_filter(&self) -> Vec<FilterSpec> {
		vec![]
	}

	/// Searched fields; `__istartswith` or `__exact` suffixes change the match
	fn search_fields(&self) -> Vec<&str> {
		vec![]
	}

	/// Ordering for list view (prefix with "-" for descending)
	fn ordering(&self) -> Vec<&str> {
		vec![]
	}

	/// Number of items per page (None = use site default)
	fn list_per_page(&self) -> Option<usize> {
		None
	}

	/// Relations joined into the change list query
	fn list_select_related(&self) -> Vec<&str> {
		vec![]
	}

	/// Relations selected through the autocomplete endpoint
	fn autocomplete_fields(&self) -> Vec<&str> {
		vec![]
	}

	/// Fields filled from other fields when left empty (`slug` from `title`)
	fn prepopulated_fields(&self) -> Vec<(&str, Vec<&str>)> {
		vec![]
	}

	fn readonly_fields(&self) -> Vec<&str> {
		vec![]
	}

	/// Fields shown in forms (None = all editable fields)
	fn fields(&self) -> Option<Vec<&str>> {
		None
	}

	/// Custom actions; `delete_selected` is always available in addition
	fn actions(&self) -> Vec<Arc<dyn AdminAction>> {
		vec![]
	}

	fn inlines(&self) -> Vec<InlineConfig> {
		vec![]
	}

	/// Aggregates added to the change list query
	fn annotations(&self) -> Vec<Annotation> {
		vec![]
	}

	fn computed_columns(&self) -> Vec<ComputedColumn> {
		vec![]
	}

	/// Check if user has permission to view this model
	async fn has_view_permission(&self, user: &AdminUser) -> bool {
		user.can_access_admin()
	}

	async fn has_add_permission(&self, user: &AdminUser) -> bool {
		user.can_access_admin()
	}

	async fn has_change_permission(&self, user: &AdminUser) -> bool {
		user.can_access_admin()
	}

	async fn has_delete_permission(&self, user: &AdminUser) -> bool {
		user.can_access_admin()
	}
}

/// Configuration-based model admin implementation
///
/// Provides a simple way to configure model admin without implementing the trait.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use storepify_admin::{FieldDef, ModelAdmin, ModelAdminConfig, ModelMeta};
///
/// let meta = ModelMeta::new("store", "order").field(FieldDef::auto_id());
/// let admin = ModelAdminConfig::new(Arc::new(meta))
/// 	.with_list_display(&["id", "placed_at"])
/// 	.with_list_per_page(10);
///
/// assert_eq!(admin.list_display(), vec!["id", "placed_at"]);
/// assert_eq!(admin.list_per_page(), Some(10));
/// ```
#[derive(Clone)]
pub struct ModelAdminConfig {
	model: Arc<ModelMeta>,
	list_display: Vec<String>,
	list_display_links: Option<Vec<String>>,
	list_editable: Vec<String>,
	list_filter: Vec<FilterSpec>,
	search_fields: Vec<String>,
	ordering: Vec<String>,
	list_per_page: Option<usize>,
	list_select_related: Vec<String>,
	autocomplete_fields: Vec<String>,
	prepopulated_fields: Vec<(String, Vec<String>)>,
	readonly_fields: Vec<String>,
	fields: Option<Vec<String>>,
	actions: Vec<Arc<dyn AdminAction>>,
	inlines: Vec<InlineConfig>,
	annotations: Vec<Annotation>,
	computed_columns: Vec<ComputedColumn>,
}

fn owned(fields: &[&str]) -> Vec<String> {
	fields.iter().map(|f| f.to_string()).collect()
}

fn borrowed(fields: &[String]) -> Vec<&str> {
	fields.iter().map(String::as_str).collect()
}

impl ModelAdminConfig {
	pub fn new(model: Arc<ModelMeta>) -> Self {
		Self {
			model,
			list_display: vec![STR_COLUMN.into()],
			list_display_links: None,
			list_editable: vec![],
			list_filter: vec![],
			search_fields: vec![],
			ordering: vec![],
			list_per_page: None,
			list_select_related: vec![],
			autocomplete_fields: vec![],
			prepopulated_fields: vec![],
			readonly_fields: vec![],
			fields: None,
			actions: vec![],
			inlines: vec![],
			annotations: vec![],
			computed_columns: vec![],
		}
	}

	pub fn with_list_display(mut self, fields: &[&str]) -> Self {
		self.list_display = owned(fields);
		self
	}

	pub fn with_list_display_links(mut self, fields: &[&str]) -> Self {
		self.list_display_links = Some(owned(fields));
		self
	}

	pub fn with_list_editable(mut self, fields: &[&str]) -> Self {
		self.list_editable = owned(fields);
		self
	}

	pub fn with_list_filter(mut self, filters: Vec<FilterSpec>) -> Self {
		self.list_filter = filters;
		self
	}

	pub fn with_search_fields(mut self, fields: &[&str]) -> Self {
		self.search_fields = owned(fields);
		self
	}

	pub fn with_ordering(mut self, fields: &[&str]) -> Self {
		self.ordering = owned(fields);
		self
	}

	pub fn with_list_per_page(mut self, per_page: usize) -> Self {
		self.list_per_page = Some(per_page);
		self
	}

	pub fn with_list_select_related(mut self, fields: &[&str]) -> Self {
		self.list_select_related = owned(fields);
		self
	}

	pub fn with_autocomplete_fields(mut self, fields: &[&str]) -> Self {
		self.autocomplete_fields = owned(fields);
		self
	}

	pub fn with_prepopulated_field(mut self, target: &str, sources: &[&str]) -> Self {
		self.prepopulated_fields.push((target.to_string(), owned(sources)));
		self
	}

	pub fn with_readonly_fields(mut self, fields: &[&str]) -> Self {
		self.readonly_fields = owned(fields);
		self
	}

	pub fn with_fields(mut self, fields: &[&str]) -> Self {
		self.fields = Some(owned(fields));
		self
	}

	pub fn with_action(mut self, action: Arc<dyn AdminAction>) -> Self {
		self.actions.push(action);
		self
	}

	pub fn with_inline(mut self, inline: InlineConfig) -> Self {
		self.inlines.push(inline);
		self
	}

	pub fn with_annotation(mut self, annotation: Annotation) -> Self {
		self.annotations.push(annotation);
		self
	}

	pub fn with_computed_column(mut self, column: ComputedColumn) -> Self {
		self.computed_columns.push(column);
		self
	}
}

#[async_trait]
impl ModelAdmin for ModelAdminConfig {
	fn model(&self) -> &ModelMeta {
		&self.model
	}

	fn list_display(&self) -> Vec<&str> {
		borrowed(&self.list_display)
	}

	fn list_display_links(&self) -> Vec<&str> {
		match &self.list_display_links {
			Some(links) => borrowed(links),
			None => self.list_display().into_iter().take(1).collect(),
		}
	}

	fn list_editable(&self) -> Vec<&str> {
		borrowed(&self.list_editable)
	}

	fn list_filter(&self) -> Vec<FilterSpec> {
		self.list_filter.clone()
	}

	fn search_fields(&self) -> Vec<&str> {
		borrowed(&self.search_fields)
	}

	fn ordering(&self) -> Vec<&str> {
		borrowed(&self.ordering)
	}

	fn list_per_page(&self) -> Option<usize> {
		self.list_per_page
	}

	fn list_select_related(&self) -> Vec<&str> {
		borrowed(&self.list_select_related)
	}

	fn autocomplete_fields(&self) -> Vec<&str> {
		borrowed(&self.autocomplete_fields)
	}

	fn prepopulated_fields(&self) -> Vec<(&str, Vec<&str>)> {
		self.prepopulated_fields
			.iter()
			.map(|(target, sources)| (target.as_str(), borrowed(sources)))
			.collect()
	}

	fn readonly_fields(&self) -> Vec<&str> {
		borrowed(&self.readonly_fields)
	}

	fn fields(&self) -> Option<Vec<&str>> {
		self.fields.as_deref().map(borrowed)
	}

	fn actions(&self) -> Vec<Arc<dyn AdminAction>> {
		self.actions.clone()
	}

	fn inlines(&self) -> Vec<InlineConfig> {
		self.inlines.clone()
	}

	fn annotations(&self) -> Vec<Annotation> {
		self.annotations.clone()
	}

	fn computed_columns(&self) -> Vec<ComputedColumn> {
		self.computed_columns.clone()
	}
}
