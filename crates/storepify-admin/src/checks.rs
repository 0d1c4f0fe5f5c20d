//! System checks over admin registrations

use crate::options::{ModelAdmin, STR_COLUMN};
use crate::site::AdminSite;
use serde::Serialize;
use std::fmt;

/// A failed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckMessage {
	pub id: &'static str,
	pub msg: String,
}

impl CheckMessage {
	fn new(id: &'static str, msg: impl Into<String>) -> Self {
		Self { id, msg: msg.into() }
	}
}

impl fmt::Display for CheckMessage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.id, self.msg)
	}
}

/// Check every registered model admin
pub fn run(site: &AdminSite) -> Vec<CheckMessage> {
	let mut messages = Vec::new();
	for admin in site.model_admins() {
		check_autocomplete(site, admin.as_ref(), &mut messages);
		check_list_display(admin.as_ref(), &mut messages);
		check_list_editable(admin.as_ref(), &mut messages);
		check_ordering(admin.as_ref(), &mut messages);
		check_inlines(admin.as_ref(), &mut messages);
	}
	for message in &messages {
		tracing::warn!(id = message.id, "{}", message.msg);
	}
	messages
}

fn check_autocomplete_field(
	site: &AdminSite,
	label: &str,
	model: &crate::model::ModelMeta,
	field_name: &str,
	messages: &mut Vec<CheckMessage>,
) {
	let Some(field) = model.get_field(field_name) else {
		messages.push(CheckMessage::new(
			"admin.E037",
			format!(
				"The value of 'autocomplete_fields' of {} refers to '{}', which is not a field of '{}'.",
				label,
				field_name,
				model.label()
			),
		));
		return;
	};
	let Some(target) = field.related_model() else {
		messages.push(CheckMessage::new(
			"admin.E038",
			format!(
				"The value of 'autocomplete_fields' of {} must be a foreign key, but '{}' is not.",
				label, field_name
			),
		));
		return;
	};
	match site.get_model_admin(&target.app_label, &target.model_name) {
		Err(_) => messages.push(CheckMessage::new(
			"admin.E039",
			format!(
				"An admin for model \"{}\" has to be registered to be referenced by {}.autocomplete_fields.",
				target.label(),
				label
			),
		)),
		Ok(target_admin) if target_admin.search_fields().is_empty() => {
			messages.push(CheckMessage::new(
				"admin.E040",
				format!(
					"{} must define \"search_fields\", because it's referenced by {}.autocomplete_fields.",
					target.label(),
					label
				),
			))
		}
		Ok(_) => {}
	}
}

fn check_autocomplete(site: &AdminSite, admin: &dyn ModelAdmin, messages: &mut Vec<CheckMessage>) {
	let meta = admin.model();
	let label = meta.label();
	for field_name in admin.autocomplete_fields() {
		check_autocomplete_field(site, &label, meta, field_name, messages);
	}
	for inline in admin.inlines() {
		let inline_label = inline.model.label();
		for field_name in &inline.autocomplete_fields {
			check_autocomplete_field(site, &inline_label, &inline.model, field_name, messages);
		}
	}
}

fn is_column(admin: &dyn ModelAdmin, name: &str) -> bool {
	let meta = admin.model();
	if name == STR_COLUMN
		|| meta.get_field(name).is_some()
		|| admin.computed_columns().iter().any(|c| c.name == name)
	{
		return true;
	}
	match name.split_once(crate::lookups::LOOKUP_SEP) {
		Some((relation, field)) => meta
			.get_field(relation)
			.and_then(|f| f.related_model())
			.is_some_and(|target| target.get_field(field).is_some()),
		None => false,
	}
}

fn check_list_display(admin: &dyn ModelAdmin, messages: &mut Vec<CheckMessage>) {
	let label = admin.model().label();
	let display = admin.list_display();
	for name in &display {
		if !is_column(admin, name) {
			messages.push(CheckMessage::new(
				"admin.E108",
				format!(
					"The value of 'list_display' of {} refers to '{}', which is not a callable or attribute of '{}'.",
					label, name, label
				),
			));
		}
	}
	for link in admin.list_display_links() {
		if !display.contains(&link) {
			messages.push(CheckMessage::new(
				"admin.E111",
				format!(
					"The value of 'list_display_links' of {} refers to '{}', which is not defined in 'list_display'.",
					label, link
				),
			));
		}
	}
}

fn check_list_editable(admin: &dyn ModelAdmin, messages: &mut Vec<CheckMessage>) {
	let label = admin.model().label();
	let display = admin.list_display();
	let links = admin.list_display_links();
	for name in admin.list_editable() {
		if !display.contains(&name) {
			messages.push(CheckMessage::new(
				"admin.E122",
				format!(
					"The value of 'list_editable' of {} refers to '{}', which is not contained in 'list_display'.",
					label, name
				),
			));
		} else if links.contains(&name) {
			messages.push(CheckMessage::new(
				"admin.E123",
				format!(
					"The value of 'list_editable' of {} refers to '{}', which cannot be in both 'list_editable' and 'list_display_links'.",
					label, name
				),
			));
		} else if display.first() == Some(&name) {
			messages.push(CheckMessage::new(
				"admin.E124",
				format!(
					"The value of 'list_editable' of {} refers to the first field in 'list_display' ('{}'), which cannot be used unless 'list_display_links' is set.",
					label, name
				),
			));
		}
		match admin.model().get_field(name) {
			Some(field) if field.is_editable() => {}
			_ => messages.push(CheckMessage::new(
				"admin.E125",
				format!(
					"The value of 'list_editable' of {} refers to '{}', which is not an editable field.",
					label, name
				),
			)),
		}
	}
}

fn check_ordering(admin: &dyn ModelAdmin, messages: &mut Vec<CheckMessage>) {
	let meta = admin.model();
	let label = meta.label();
	let annotations = admin.annotations();
	for item in admin.ordering() {
		let name = item.trim_start_matches('-');
		if name == "pk" || meta.get_field(name).is_some() || annotations.iter().any(|a| a.alias() == name) {
			continue;
		}
		messages.push(CheckMessage::new(
			"admin.E033",
			format!(
				"The value of 'ordering' of {} refers to '{}', which is not a field of '{}'.",
				label, name, label
			),
		));
	}
	for column in admin.computed_columns() {
		let Some(key) = &column.ordering else {
			continue;
		};
		if meta.get_field(key).is_none() && !annotations.iter().any(|a| a.alias() == key) {
			messages.push(CheckMessage::new(
				"admin.E033",
				format!(
					"Column '{}' of {} orders by '{}', which is neither a field nor an annotation.",
					column.name, label, key
				),
			));
		}
	}
}

fn check_inlines(admin: &dyn ModelAdmin, messages: &mut Vec<CheckMessage>) {
	let meta = admin.model();
	for inline in admin.inlines() {
		let inline_label = inline.model.label();
		if inline.min_num > inline.max_num {
			messages.push(CheckMessage::new(
				"admin.E208",
				format!(
					"The inline {} of {} has min_num {} greater than max_num {}.",
					inline_label,
					meta.label(),
					inline.min_num,
					inline.max_num
				),
			));
		}
		let points_at_parent = inline
			.model
			.get_field(&inline.fk_field)
			.and_then(|f| f.related_model())
			.is_some_and(|target| {
				target.app_label == meta.app_label && target.model_name == meta.model_name
			});
		if !points_at_parent {
			messages.push(CheckMessage::new(
				"admin.E202",
				format!(
					"'{}' has no foreign key '{}' to '{}'.",
					inline_label,
					inline.fk_field,
					meta.label()
				),
			));
		}
	}
}
