//! Change form cleaning and validation
//!
//! Submitted JSON values are checked against each field's kind and
//! normalized into the stored representation. Errors are collected per
//! field so a client can show all of them at once.

use crate::model::{FieldDef, FieldKind, ModelMeta};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;
use storepify_db::Record;

/// Key for errors that belong to no single field
pub const NON_FIELD_ERRORS: &str = "__all__";

pub const REQUIRED_MESSAGE: &str = "This field is required.";

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug pattern")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern")
});

/// Field name → error messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.0.entry(field.into()).or_default().push(message.into());
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, field: &str) -> Option<&[String]> {
		self.0.get(field).map(Vec::as_slice)
	}

	/// Merge `other` with every key prefixed (`orderitem_set-0-quantity`)
	pub fn extend_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
		for (field, messages) in other.0 {
			self.0
				.entry(format!("{}-{}", prefix, field))
				.or_default()
				.extend(messages);
		}
	}

	pub fn to_json(&self) -> Value {
		serde_json::to_value(&self.0).unwrap_or(Value::Null)
	}
}

/// Whether the form creates a row or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
	Add,
	Change,
}

/// Cleaning options taken from the model admin
#[derive(Debug, Clone, Default)]
pub struct FormOptions<'a> {
	/// Restrict input to these fields (all editable fields when `None`)
	pub fields: Option<Vec<&'a str>>,
	pub readonly_fields: Vec<&'a str>,
	/// Target field → source fields
	pub prepopulated_fields: Vec<(&'a str, Vec<&'a str>)>,
	/// Fields supplied by the caller rather than the form (inline parent keys)
	pub exclude: Vec<&'a str>,
}

/// Current time in the stored timestamp format
pub fn now_timestamp() -> String {
	Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Clean `input` for `meta`, returning column → stored value
///
/// In [`FormMode::Change`] fields missing from the input keep their
/// stored value and are left out of the result.
pub fn clean_form(
	meta: &ModelMeta,
	options: &FormOptions<'_>,
	input: &serde_json::Map<String, Value>,
	mode: FormMode,
) -> Result<Record, ValidationErrors> {
	let mut input = input.clone();
	prepopulate(&mut input, &options.prepopulated_fields);

	let mut errors = ValidationErrors::new();
	let mut cleaned = Record::new();

	for field in meta.fields() {
		if let FieldKind::DateTime {
			auto_now,
			auto_now_add,
		} = field.kind
		{
			if auto_now || (auto_now_add && mode == FormMode::Add) {
				cleaned.insert(field.column(), Value::String(now_timestamp()));
			}
			continue;
		}
		if !field.is_editable()
			|| options.readonly_fields.contains(&field.name.as_str())
			|| options.exclude.contains(&field.name.as_str())
		{
			continue;
		}
		if let Some(allowed) = &options.fields
			&& !allowed.contains(&field.name.as_str())
		{
			continue;
		}

		let raw = input.get(&field.name).or_else(|| input.get(&field.column()));
		let value = match raw {
			Some(raw) => clean_value(field, raw),
			None if mode == FormMode::Change => continue,
			None => missing_value(field),
		};
		match value {
			Ok(value) => {
				cleaned.insert(field.column(), value);
			}
			Err(message) => errors.add(field.name.clone(), message),
		}
	}

	if errors.is_empty() {
		Ok(cleaned)
	} else {
		Err(errors)
	}
}

fn prepopulate(input: &mut serde_json::Map<String, Value>, prepopulated: &[(&str, Vec<&str>)]) {
	for (target, sources) in prepopulated {
		let empty = match input.get(*target) {
			None | Some(Value::Null) => true,
			Some(Value::String(s)) => s.trim().is_empty(),
			Some(_) => false,
		};
		if !empty {
			continue;
		}
		let source_text: Vec<String> = sources
			.iter()
			.filter_map(|source| input.get(*source))
			.map(crate::model::value_text)
			.filter(|text| !text.trim().is_empty())
			.collect();
		if !source_text.is_empty() {
			input.insert(
				target.to_string(),
				Value::String(slug::slugify(source_text.join(" "))),
			);
		}
	}
}

fn missing_value(field: &FieldDef) -> Result<Value, String> {
	if let Some(default) = &field.default {
		return Ok(default.clone());
	}
	if field.null {
		return Ok(Value::Null);
	}
	if field.blank {
		return Ok(Value::String(String::new()));
	}
	Err(REQUIRED_MESSAGE.into())
}

fn is_empty(raw: &Value) -> bool {
	match raw {
		Value::Null => true,
		Value::String(s) => s.trim().is_empty(),
		_ => false,
	}
}

fn as_text(raw: &Value) -> String {
	match raw {
		Value::String(s) => s.trim().to_string(),
		other => other.to_string(),
	}
}

/// Validate and normalize one submitted value
pub fn clean_value(field: &FieldDef, raw: &Value) -> Result<Value, String> {
	if matches!(field.kind, FieldKind::Boolean) {
		return Ok(Value::Bool(match raw {
			Value::Bool(b) => *b,
			Value::Number(n) => n.as_i64() == Some(1),
			Value::String(s) => matches!(s.as_str(), "1" | "true" | "True" | "on"),
			_ => false,
		}));
	}

	if is_empty(raw) {
		return if field.null {
			Ok(Value::Null)
		} else if field.blank {
			Ok(Value::String(String::new()))
		} else {
			Err(REQUIRED_MESSAGE.into())
		};
	}

	let text = as_text(raw);
	match &field.kind {
		FieldKind::AutoId | FieldKind::Boolean => Ok(raw.clone()),
		FieldKind::Integer { min, max } => {
			let value = parse_integer(raw, &text).ok_or("Enter a whole number.")?;
			if let Some(min) = min
				&& value < *min
			{
				return Err(format!("Ensure this value is greater than or equal to {}.", min));
			}
			if let Some(max) = max
				&& value > *max
			{
				return Err(format!("Ensure this value is less than or equal to {}.", max));
			}
			Ok(Value::from(value))
		}
		FieldKind::Decimal {
			max_digits,
			decimal_places,
			min,
		} => clean_decimal(&text, *max_digits, *decimal_places, *min),
		FieldKind::Text { max_length } => {
			check_length(&text, *max_length)?;
			Ok(Value::String(text))
		}
		FieldKind::Slug { max_length } => {
			if !SLUG_RE.is_match(&text) {
				return Err(
					"Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens."
						.into(),
				);
			}
			check_length(&text, Some(*max_length))?;
			Ok(Value::String(text))
		}
		FieldKind::Email => {
			if !EMAIL_RE.is_match(&text) {
				return Err("Enter a valid email address.".into());
			}
			check_length(&text, Some(254))?;
			Ok(Value::String(text))
		}
		FieldKind::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
			.map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
			.map_err(|_| "Enter a valid date.".into()),
		FieldKind::DateTime { .. } => DateTime::parse_from_rfc3339(&text)
			.map(|dt| {
				Value::String(
					dt.with_timezone(&Utc)
						.to_rfc3339_opts(SecondsFormat::Secs, true),
				)
			})
			.map_err(|_| "Enter a valid date/time.".into()),
		FieldKind::Choice(choices) => {
			if choices.iter().any(|(value, _)| *value == text) {
				Ok(Value::String(text))
			} else {
				Err(format!(
					"Select a valid choice. {} is not one of the available choices.",
					text
				))
			}
		}
		FieldKind::ForeignKey(_) => parse_integer(raw, &text)
			.map(Value::from)
			.ok_or_else(|| {
				"Select a valid choice. That choice is not one of the available choices.".into()
			}),
	}
}

fn parse_integer(raw: &Value, text: &str) -> Option<i64> {
	match raw {
		Value::Number(n) => n.as_i64(),
		_ => text.parse().ok(),
	}
}

fn check_length(text: &str, max_length: Option<usize>) -> Result<(), String> {
	let length = text.chars().count();
	match max_length {
		Some(max) if length > max => Err(format!(
			"Ensure this value has at most {} characters (it has {}).",
			max, length
		)),
		_ => Ok(()),
	}
}

fn clean_decimal(
	text: &str,
	max_digits: u32,
	decimal_places: u32,
	min: Option<Decimal>,
) -> Result<Value, String> {
	let value = Decimal::from_str(text).map_err(|_| "Enter a number.".to_string())?;
	let normalized = value.normalize();

	let places = normalized.scale();
	let digits = normalized.mantissa().unsigned_abs().to_string().len() as u32;
	let digits = digits.max(places);
	let whole_digits = digits - places;

	if digits > max_digits {
		return Err(format!(
			"Ensure that there are no more than {} digits in total.",
			max_digits
		));
	}
	if places > decimal_places {
		return Err(format!(
			"Ensure that there are no more than {} decimal places.",
			decimal_places
		));
	}
	if whole_digits > max_digits - decimal_places {
		return Err(format!(
			"Ensure that there are no more than {} digits before the decimal point.",
			max_digits - decimal_places
		));
	}
	if let Some(min) = min
		&& value < min
	{
		return Err(format!("Ensure this value is greater than or equal to {}.", min));
	}

	Ok(Value::String(format!(
		"{:.*}",
		decimal_places as usize,
		normalized
	)))
}

/// Convert a cleaned value into a query value
pub fn to_query_value(value: &Value) -> sea_query::Value {
	match value {
		Value::Null => sea_query::Value::String(None),
		Value::Bool(b) => (*b).into(),
		Value::Number(n) => match n.as_i64() {
			Some(i) => i.into(),
			None => n.as_f64().unwrap_or_default().into(),
		},
		Value::String(s) => s.clone().into(),
		other => other.to_string().into(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::Arc;

	fn product() -> ModelMeta {
		let collection = ModelMeta::new("store", "collection").field(FieldDef::auto_id());
		ModelMeta::new("store", "product")
			.field(FieldDef::auto_id())
			.field(FieldDef::char("title", 255))
			.field(FieldDef::slug("slug"))
			.field(FieldDef::text("description").null())
			.field(FieldDef::decimal("unit_price", 6, 2).min_value(1))
			.field(FieldDef::positive_integer("inventory"))
			.field(FieldDef::auto_now("last_update"))
			.field(FieldDef::foreign_key("collection", Arc::new(collection)))
	}

	fn input(value: Value) -> serde_json::Map<String, Value> {
		value.as_object().cloned().unwrap()
	}

	#[rstest]
	fn test_add_prepopulates_slug_and_normalizes() {
		let options = FormOptions {
			prepopulated_fields: vec![("slug", vec!["title"])],
			..Default::default()
		};
		let cleaned = clean_form(
			&product(),
			&options,
			&input(json!({
				"title": "Green Tea Bags",
				"unit_price": "4.5",
				"inventory": 12,
				"collection": "3"
			})),
			FormMode::Add,
		)
		.unwrap();

		assert_eq!(cleaned["slug"], "green-tea-bags");
		assert_eq!(cleaned["unit_price"], "4.50");
		assert_eq!(cleaned["collection_id"], 3);
		assert!(cleaned["description"].is_null());
		assert!(cleaned["last_update"].as_str().unwrap().ends_with('Z'));
		assert!(!cleaned.contains_key("id"));
	}

	#[rstest]
	fn test_add_collects_every_error() {
		let errors = clean_form(
			&product(),
			&FormOptions::default(),
			&input(json!({
				"title": "x".repeat(256),
				"slug": "not a slug",
				"unit_price": "0.50",
				"inventory": -1
			})),
			FormMode::Add,
		)
		.unwrap_err();

		assert_eq!(
			errors.get("title").unwrap()[0],
			"Ensure this value has at most 255 characters (it has 256)."
		);
		assert!(errors.get("slug").is_some());
		assert_eq!(
			errors.get("unit_price").unwrap()[0],
			"Ensure this value is greater than or equal to 1."
		);
		assert_eq!(
			errors.get("inventory").unwrap()[0],
			"Ensure this value is greater than or equal to 0."
		);
		assert_eq!(errors.get("collection").unwrap()[0], REQUIRED_MESSAGE);
	}

	#[rstest]
	fn test_change_only_touches_submitted_fields() {
		let cleaned = clean_form(
			&product(),
			&FormOptions::default(),
			&input(json!({"unit_price": 12})),
			FormMode::Change,
		)
		.unwrap();

		assert_eq!(cleaned["unit_price"], "12.00");
		assert!(cleaned.contains_key("last_update"));
		assert!(!cleaned.contains_key("title"));
	}

	#[rstest]
	#[case("1234.5", Ok("1234.50"))]
	#[case("12345.67", Err("Ensure that there are no more than 6 digits in total."))]
	#[case("12345.6", Err("Ensure that there are no more than 4 digits before the decimal point."))]
	#[case("1.234", Err("Ensure that there are no more than 2 decimal places."))]
	#[case("abc", Err("Enter a number."))]
	fn test_decimal_rules(#[case] raw: &str, #[case] expected: Result<&str, &str>) {
		let field = FieldDef::decimal("unit_price", 6, 2);
		let result = clean_value(&field, &json!(raw));
		match expected {
			Ok(stored) => assert_eq!(result.unwrap(), json!(stored)),
			Err(message) => assert_eq!(result.unwrap_err(), message),
		}
	}

	#[rstest]
	fn test_choice_rejects_unknown_value() {
		let field = FieldDef::choice("membership", &[("B", "Bronze"), ("G", "Gold")]);
		assert_eq!(clean_value(&field, &json!("G")).unwrap(), json!("G"));
		assert_eq!(
			clean_value(&field, &json!("X")).unwrap_err(),
			"Select a valid choice. X is not one of the available choices."
		);
	}

	#[rstest]
	fn test_prefixed_errors() {
		let mut inner = ValidationErrors::new();
		inner.add("quantity", REQUIRED_MESSAGE);
		let mut outer = ValidationErrors::new();
		outer.extend_prefixed("orderitem_set-0", inner);

		assert_eq!(
			outer.to_json(),
			json!({"orderitem_set-0-quantity": [REQUIRED_MESSAGE]})
		);
	}
}
