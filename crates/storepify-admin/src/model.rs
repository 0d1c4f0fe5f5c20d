//! Model metadata
//!
//! The admin works on tables through a [`ModelMeta`] description: which
//! columns exist, what kind of values they hold and how a row is rendered
//! as text. Relations point at the metadata of the target model.

use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use storepify_db::Record;

/// Kind of value a field stores
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
	/// Auto-incrementing integer primary key
	AutoId,
	/// Integer with optional bounds
	Integer { min: Option<i64>, max: Option<i64> },
	/// Fixed-point decimal stored as text
	Decimal {
		max_digits: u32,
		decimal_places: u32,
		min: Option<Decimal>,
	},
	/// Free text with an optional length limit
	Text { max_length: Option<usize> },
	/// URL-safe identifier
	Slug { max_length: usize },
	Email,
	/// `YYYY-MM-DD`
	Date,
	/// RFC 3339 timestamp; auto fields are set on save
	DateTime { auto_now: bool, auto_now_add: bool },
	/// One of a fixed set of `(value, label)` pairs
	Choice(Vec<(String, String)>),
	/// Reference to another model's primary key
	ForeignKey(Arc<ModelMeta>),
	Boolean,
}

/// One model field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
	pub name: String,
	pub verbose_name: String,
	pub kind: FieldKind,
	pub null: bool,
	pub blank: bool,
	pub unique: bool,
	pub default: Option<Value>,
}

impl FieldDef {
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		let name = name.into();
		Self {
			verbose_name: name.replace('_', " "),
			name,
			kind,
			null: false,
			blank: false,
			unique: false,
			default: None,
		}
	}

	pub fn auto_id() -> Self {
		Self::new("id", FieldKind::AutoId).verbose_name("ID")
	}

	pub fn integer(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Integer { min: None, max: None })
	}

	pub fn positive_integer(name: impl Into<String>) -> Self {
		Self::new(
			name,
			FieldKind::Integer {
				min: Some(0),
				max: None,
			},
		)
	}

	pub fn decimal(name: impl Into<String>, max_digits: u32, decimal_places: u32) -> Self {
		Self::new(
			name,
			FieldKind::Decimal {
				max_digits,
				decimal_places,
				min: None,
			},
		)
	}

	pub fn char(name: impl Into<String>, max_length: usize) -> Self {
		Self::new(
			name,
			FieldKind::Text {
				max_length: Some(max_length),
			},
		)
	}

	pub fn text(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Text { max_length: None })
	}

	pub fn slug(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Slug { max_length: 50 })
	}

	pub fn email(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Email)
	}

	pub fn date(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Date)
	}

	pub fn datetime(name: impl Into<String>) -> Self {
		Self::new(
			name,
			FieldKind::DateTime {
				auto_now: false,
				auto_now_add: false,
			},
		)
	}

	/// Timestamp refreshed on every save
	pub fn auto_now(name: impl Into<String>) -> Self {
		Self::new(
			name,
			FieldKind::DateTime {
				auto_now: true,
				auto_now_add: false,
			},
		)
	}

	/// Timestamp set once on creation
	pub fn auto_now_add(name: impl Into<String>) -> Self {
		Self::new(
			name,
			FieldKind::DateTime {
				auto_now: false,
				auto_now_add: true,
			},
		)
	}

	pub fn choice(name: impl Into<String>, choices: &[(&str, &str)]) -> Self {
		Self::new(
			name,
			FieldKind::Choice(
				choices
					.iter()
					.map(|(value, label)| (value.to_string(), label.to_string()))
					.collect(),
			),
		)
	}

	pub fn foreign_key(name: impl Into<String>, target: Arc<ModelMeta>) -> Self {
		Self::new(name, FieldKind::ForeignKey(target))
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Boolean).default(Value::Bool(false))
	}

	pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = verbose_name.into();
		self
	}

	pub fn null(mut self) -> Self {
		self.null = true;
		self.blank = true;
		self
	}

	pub fn blank(mut self) -> Self {
		self.blank = true;
		self
	}

	pub fn unique(mut self) -> Self {
		self.unique = true;
		self
	}

	pub fn default(mut self, value: impl Into<Value>) -> Self {
		self.default = Some(value.into());
		self
	}

	/// Lower bound for integer and decimal fields
	pub fn min_value(mut self, min: i64) -> Self {
		match &mut self.kind {
			FieldKind::Integer { min: bound, .. } => *bound = Some(min),
			FieldKind::Decimal { min: bound, .. } => *bound = Some(Decimal::from(min)),
			_ => {}
		}
		self
	}

	/// Database column; relations store `<name>_id`
	pub fn column(&self) -> String {
		match self.kind {
			FieldKind::ForeignKey(_) => format!("{}_id", self.name),
			_ => self.name.clone(),
		}
	}

	/// Whether forms accept input for this field
	pub fn is_editable(&self) -> bool {
		!matches!(
			self.kind,
			FieldKind::AutoId
				| FieldKind::DateTime { auto_now: true, .. }
				| FieldKind::DateTime {
					auto_now_add: true,
					..
				}
		)
	}

	/// Target model for relations
	pub fn related_model(&self) -> Option<&Arc<ModelMeta>> {
		match &self.kind {
			FieldKind::ForeignKey(target) => Some(target),
			_ => None,
		}
	}

	/// Whether values of this field are integers in storage
	pub fn is_integer(&self) -> bool {
		matches!(
			self.kind,
			FieldKind::AutoId | FieldKind::Integer { .. } | FieldKind::ForeignKey(_)
		)
	}

	/// Label for a stored choice value, if this is a choice field
	pub fn choice_label(&self, value: &str) -> Option<&str> {
		match &self.kind {
			FieldKind::Choice(choices) => choices
				.iter()
				.find(|(stored, _)| stored == value)
				.map(|(_, label)| label.as_str()),
			_ => None,
		}
	}
}

/// Description of one model's table
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMeta {
	pub app_label: String,
	pub model_name: String,
	pub verbose_name: String,
	pub verbose_name_plural: String,
	pub table: String,
	pub pk: String,
	pub ordering: Vec<String>,
	str_fields: Vec<String>,
	fields: Vec<FieldDef>,
}

impl ModelMeta {
	/// Metadata for `app_label.model_name`, stored in `<app_label>_<model_name>`
	///
	/// # Examples
	///
	/// ```
	/// use storepify_admin::{FieldDef, ModelMeta};
	///
	/// let meta = ModelMeta::new("store", "collection")
	/// 	.field(FieldDef::auto_id())
	/// 	.field(FieldDef::char("title", 255))
	/// 	.str_fields(&["title"]);
	///
	/// assert_eq!(meta.table, "store_collection");
	/// assert_eq!(meta.verbose_name_plural, "collections");
	/// ```
	pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
		let app_label = app_label.into();
		let model_name = model_name.into();
		Self {
			table: format!("{}_{}", app_label, model_name),
			verbose_name: model_name.clone(),
			verbose_name_plural: format!("{}s", model_name),
			app_label,
			model_name,
			pk: "id".into(),
			ordering: Vec::new(),
			str_fields: Vec::new(),
			fields: Vec::new(),
		}
	}

	pub fn verbose_name(mut self, singular: &str, plural: &str) -> Self {
		self.verbose_name = singular.to_string();
		self.verbose_name_plural = plural.to_string();
		self
	}

	pub fn field(mut self, field: FieldDef) -> Self {
		self.fields.push(field);
		self
	}

	/// Fields joined with spaces to render a row as text
	pub fn str_fields(mut self, fields: &[&str]) -> Self {
		self.str_fields = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	/// Default ordering (`-` prefix for descending)
	pub fn ordering(mut self, ordering: &[&str]) -> Self {
		self.ordering = ordering.iter().map(|f| f.to_string()).collect();
		self
	}

	pub fn fields(&self) -> &[FieldDef] {
		&self.fields
	}

	/// Look up a field by name, by column, or `pk`
	pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
		let name = if name == "pk" { self.pk.as_str() } else { name };
		self.fields
			.iter()
			.find(|f| f.name == name)
			.or_else(|| self.fields.iter().find(|f| f.column() == name))
	}

	/// `app_label.model_name`
	pub fn label(&self) -> String {
		format!("{}.{}", self.app_label, self.model_name)
	}

	/// Columns needed by [`object_repr`](Self::object_repr)
	pub fn str_columns(&self) -> Vec<String> {
		let mut columns = vec![self.pk.clone()];
		for name in &self.str_fields {
			if let Some(field) = self.get_field(name) {
				columns.push(field.column());
			}
		}
		columns
	}

	/// Text representation of a row
	pub fn object_repr(&self, record: &Record) -> String {
		if self.str_fields.is_empty() {
			let pk = record.get(&self.pk).map(value_text).unwrap_or_default();
			return format!("{} object ({})", capfirst(&self.verbose_name), pk);
		}
		self.str_fields
			.iter()
			.filter_map(|name| self.get_field(name))
			.map(|field| record.get(&field.column()).map(value_text).unwrap_or_default())
			.collect::<Vec<_>>()
			.join(" ")
	}

	/// Singular or plural verbose name for `count` objects
	pub fn verbose_name_for(&self, count: u64) -> &str {
		if count == 1 {
			&self.verbose_name
		} else {
			&self.verbose_name_plural
		}
	}
}

/// Text form of a stored value; NULL renders empty
pub fn value_text(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Upper-case the first character
pub fn capfirst(text: &str) -> String {
	let mut chars = text.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
