//! Child rows edited together with their parent
//!
//! An inline edits rows of a child model that reference the parent through
//! a foreign key. The number of submitted rows is bounded by `min_num` and
//! `max_num`.

use crate::model::ModelMeta;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default upper bound on inline rows
pub const DEFAULT_MAX_NUM: usize = 1000;

/// Tabular inline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct InlineConfig {
	pub model: Arc<ModelMeta>,
	/// Field on the child model pointing at the parent
	pub fk_field: String,
	pub min_num: usize,
	pub max_num: usize,
	/// Blank rows offered by clients
	pub extra: usize,
	pub autocomplete_fields: Vec<String>,
}

impl InlineConfig {
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use storepify_admin::{FieldDef, InlineConfig, ModelMeta};
	///
	/// let order = Arc::new(ModelMeta::new("store", "order").field(FieldDef::auto_id()));
	/// let item = ModelMeta::new("store", "orderitem")
	/// 	.field(FieldDef::auto_id())
	/// 	.field(FieldDef::foreign_key("order", order));
	///
	/// let inline = InlineConfig::tabular(Arc::new(item), "order").min_num(1).max_num(2);
	/// assert_eq!(inline.prefix(), "orderitem_set");
	/// ```
	pub fn tabular(model: Arc<ModelMeta>, fk_field: impl Into<String>) -> Self {
		Self {
			model,
			fk_field: fk_field.into(),
			min_num: 0,
			max_num: DEFAULT_MAX_NUM,
			extra: 3,
			autocomplete_fields: Vec::new(),
		}
	}

	pub fn min_num(mut self, min_num: usize) -> Self {
		self.min_num = min_num;
		self
	}

	pub fn max_num(mut self, max_num: usize) -> Self {
		self.max_num = max_num;
		self
	}

	pub fn extra(mut self, extra: usize) -> Self {
		self.extra = extra;
		self
	}

	pub fn autocomplete_fields(mut self, fields: &[&str]) -> Self {
		self.autocomplete_fields = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	/// Key under which rows are submitted and errors reported
	pub fn prefix(&self) -> String {
		format!("{}_set", self.model.model_name)
	}

	/// Column on the child table referencing the parent
	pub fn fk_column(&self) -> String {
		self.model
			.get_field(&self.fk_field)
			.map(|f| f.column())
			.unwrap_or_else(|| format!("{}_id", self.fk_field))
	}

	/// Check the number of rows that remain after deletions and additions
	pub fn validate_count(&self, active: usize) -> Result<(), String> {
		if active > self.max_num {
			return Err(format!(
				"Please submit at most {} {}.",
				self.max_num,
				plural_form(self.max_num)
			));
		}
		if active < self.min_num {
			return Err(format!(
				"Please submit at least {} {}.",
				self.min_num,
				plural_form(self.min_num)
			));
		}
		Ok(())
	}
}

fn plural_form(n: usize) -> &'static str {
	if n == 1 { "form" } else { "forms" }
}

/// One submitted child row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineRow {
	/// Existing row id; `None` creates a row
	#[serde(default)]
	pub id: Option<i64>,
	#[serde(default)]
	pub values: serde_json::Map<String, serde_json::Value>,
	/// Delete the existing row
	#[serde(default, rename = "DELETE")]
	pub delete: bool,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::FieldDef;
	use rstest::rstest;

	fn order_items() -> InlineConfig {
		let order = Arc::new(ModelMeta::new("store", "order").field(FieldDef::auto_id()));
		let item = ModelMeta::new("store", "orderitem")
			.field(FieldDef::auto_id())
			.field(FieldDef::foreign_key("order", order));
		InlineConfig::tabular(Arc::new(item), "order")
			.min_num(1)
			.max_num(2)
			.extra(0)
	}

	#[rstest]
	#[case(0, Err("Please submit at least 1 form.".to_string()))]
	#[case(1, Ok(()))]
	#[case(2, Ok(()))]
	#[case(3, Err("Please submit at most 2 forms.".to_string()))]
	fn test_row_count_bounds(#[case] count: usize, #[case] expected: Result<(), String>) {
		assert_eq!(order_items().validate_count(count), expected);
	}

	#[rstest]
	fn test_delete_flag_deserializes() {
		let row: InlineRow = serde_json::from_value(serde_json::json!({"id": 4, "DELETE": true})).unwrap();
		assert_eq!(row.id, Some(4));
		assert!(row.delete);
		assert!(row.values.is_empty());
	}

	#[rstest]
	fn test_fk_column() {
		assert_eq!(order_items().fk_column(), "order_id");
	}
}
