//! Change list cell values and computed columns

use crate::site::AdminSite;
use crate::AdminResult;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use storepify_db::Record;

/// Placeholder rendered for empty values
pub const EMPTY_VALUE_DISPLAY: &str = "-";

/// Rendered cell content
///
/// `Html` content is trusted markup produced by [`format_html`]; `Text` is
/// plain text that consumers must escape themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DisplayValue {
	Text(String),
	Html(String),
}

impl DisplayValue {
	pub fn text(value: impl Into<String>) -> Self {
		let value = value.into();
		if value.is_empty() {
			DisplayValue::Text(EMPTY_VALUE_DISPLAY.into())
		} else {
			DisplayValue::Text(value)
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			DisplayValue::Text(s) | DisplayValue::Html(s) => s,
		}
	}

	pub fn is_html(&self) -> bool {
		matches!(self, DisplayValue::Html(_))
	}
}

impl fmt::Display for DisplayValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Fill each `{}` in a trusted template with an HTML-escaped argument
///
/// # Examples
///
/// ```
/// use storepify_admin::display::format_html;
///
/// let link = format_html(r#"<a href="{}">{}</a>"#, &["/admin/?a=1&b=2", "<b>"]);
/// assert_eq!(
/// 	link.as_str(),
/// 	r#"<a href="/admin/?a=1&amp;b=2">&lt;b&gt;</a>"#
/// );
/// ```
pub fn format_html(template: &str, args: &[&str]) -> DisplayValue {
	let mut out = String::with_capacity(template.len());
	let mut args = args.iter();
	let mut pieces = template.split("{}").peekable();

	while let Some(piece) = pieces.next() {
		out.push_str(piece);
		if pieces.peek().is_some() {
			if let Some(arg) = args.next() {
				out.push_str(&html_escape::encode_quoted_attribute(arg));
			}
		}
	}

	DisplayValue::Html(out)
}

type RenderFn = dyn Fn(&Record, &AdminSite) -> AdminResult<DisplayValue> + Send + Sync;

/// A change list column computed from the row rather than read from a field
#[derive(Clone)]
pub struct ComputedColumn {
	pub name: String,
	pub header: String,
	/// Column or annotation the column sorts by; unsortable when `None`
	pub ordering: Option<String>,
	render: Arc<RenderFn>,
}

impl ComputedColumn {
	pub fn new<F>(name: impl Into<String>, render: F) -> Self
	where
		F: Fn(&Record, &AdminSite) -> AdminResult<DisplayValue> + Send + Sync + 'static,
	{
		let name = name.into();
		Self {
			header: crate::model::capfirst(&name.replace('_', " ")),
			name,
			ordering: None,
			render: Arc::new(render),
		}
	}

	pub fn header(mut self, header: impl Into<String>) -> Self {
		self.header = header.into();
		self
	}

	pub fn ordering(mut self, key: impl Into<String>) -> Self {
		self.ordering = Some(key.into());
		self
	}

	pub fn render(&self, record: &Record, site: &AdminSite) -> AdminResult<DisplayValue> {
		(self.render)(record, site)
	}
}

impl fmt::Debug for ComputedColumn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComputedColumn")
			.field("name", &self.name)
			.field("header", &self.header)
			.field("ordering", &self.ordering)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_format_html_escapes_arguments_only() {
		let value = format_html("<a href=\"{}\">{} Orders</a>", &["/o/?x=\"1\"", "3"]);
		assert!(value.is_html());
		assert_eq!(value.as_str(), "<a href=\"/o/?x=&quot;1&quot;\">3 Orders</a>");
	}

	#[rstest]
	fn test_missing_arguments_leave_placeholder_empty() {
		assert_eq!(format_html("{}-{}", &["a"]).as_str(), "a-");
	}

	#[rstest]
	#[case("", "-")]
	#[case("Ok", "Ok")]
	fn test_text_uses_empty_placeholder(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(DisplayValue::text(input).as_str(), expected);
	}
}
