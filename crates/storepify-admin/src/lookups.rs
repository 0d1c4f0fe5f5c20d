//! Field lookups (`field__op=value`) and search conditions
//!
//! Change list query parameters such as `customer__id=3` or
//! `inventory__lt=10` are resolved against the model's fields and turned
//! into `sea-query` conditions on the model's table.

use crate::model::{FieldDef, ModelMeta};
use crate::{AdminError, AdminResult};
use sea_query::{Alias, Condition, Expr, LikeExpr, SimpleExpr};

/// Separator between field names and lookup operators
pub const LOOKUP_SEP: &str = "__";

/// Comparison applied by a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOp {
	Exact,
	Lt,
	Lte,
	Gt,
	Gte,
	IStartsWith,
	IContains,
	In,
	IsNull,
}

impl LookupOp {
	fn parse(name: &str) -> Option<Self> {
		Some(match name {
			"exact" => LookupOp::Exact,
			"lt" => LookupOp::Lt,
			"lte" => LookupOp::Lte,
			"gt" => LookupOp::Gt,
			"gte" => LookupOp::Gte,
			"istartswith" => LookupOp::IStartsWith,
			"icontains" => LookupOp::IContains,
			"in" => LookupOp::In,
			"isnull" => LookupOp::IsNull,
			_ => return None,
		})
	}
}

/// A lookup resolved against a model
#[derive(Debug, Clone)]
pub struct Lookup<'a> {
	pub field: &'a FieldDef,
	pub column: String,
	pub op: LookupOp,
}

/// Resolve `path` (for example `collection__id__exact`) against `meta`
pub fn resolve<'a>(meta: &'a ModelMeta, path: &str) -> AdminResult<Lookup<'a>> {
	let mut parts = path.split(LOOKUP_SEP);
	let name = parts.next().unwrap_or_default();
	let field = meta.get_field(name).ok_or_else(|| {
		AdminError::IncorrectLookupParameters(format!(
			"{} has no field named '{}'",
			meta.label(),
			name
		))
	})?;

	let mut rest: Vec<&str> = parts.collect();
	if field.related_model().is_some() && matches!(rest.first(), Some(&"id") | Some(&"pk")) {
		rest.remove(0);
	}

	let op = match rest.as_slice() {
		[] => LookupOp::Exact,
		[op] => LookupOp::parse(op).ok_or_else(|| {
			AdminError::IncorrectLookupParameters(format!(
				"Unsupported lookup '{}' for field '{}'",
				op, field.name
			))
		})?,
		_ => {
			return Err(AdminError::IncorrectLookupParameters(format!(
				"Cannot resolve '{}' into a field of {}",
				path,
				meta.label()
			)));
		}
	};

	Ok(Lookup {
		column: field.column(),
		field,
		op,
	})
}

/// Build the condition for `path=value`
///
/// # Examples
///
/// ```
/// use storepify_admin::{FieldDef, ModelMeta, lookups};
///
/// let meta = ModelMeta::new("store", "product")
/// 	.field(FieldDef::auto_id())
/// 	.field(FieldDef::positive_integer("inventory"));
///
/// assert!(lookups::condition(&meta, "inventory__lt", "10").is_ok());
/// assert!(lookups::condition(&meta, "inventory__lt", "ten").is_err());
/// assert!(lookups::condition(&meta, "colour", "red").is_err());
/// ```
pub fn condition(meta: &ModelMeta, path: &str, value: &str) -> AdminResult<SimpleExpr> {
	let lookup = resolve(meta, path)?;
	let column = Expr::col((Alias::new(&meta.table), Alias::new(&lookup.column)));

	Ok(match lookup.op {
		LookupOp::Exact => column.eq(typed_value(lookup.field, value)?),
		LookupOp::Lt => column.lt(typed_value(lookup.field, value)?),
		LookupOp::Lte => column.lte(typed_value(lookup.field, value)?),
		LookupOp::Gt => column.gt(typed_value(lookup.field, value)?),
		LookupOp::Gte => column.gte(typed_value(lookup.field, value)?),
		LookupOp::IStartsWith => column.like(like_pattern(value, false)),
		LookupOp::IContains => column.like(like_pattern(value, true)),
		LookupOp::In => {
			let values = value
				.split(',')
				.map(|v| typed_value(lookup.field, v.trim()))
				.collect::<AdminResult<Vec<_>>>()?;
			column.is_in(values)
		}
		LookupOp::IsNull => match value {
			"1" | "true" | "True" => column.is_null(),
			"0" | "false" | "False" => column.is_not_null(),
			other => {
				return Err(AdminError::IncorrectLookupParameters(format!(
					"'{}' is not a valid isnull value",
					other
				)));
			}
		},
	})
}

/// Condition matching rows where every whitespace-separated term of `query`
/// matches at least one of `search_fields`
///
/// A bare field name searches with `icontains`; `__istartswith` and
/// `__exact` suffixes select other comparisons.
pub fn search_condition(
	meta: &ModelMeta,
	search_fields: &[String],
	query: &str,
) -> AdminResult<Option<Condition>> {
	if search_fields.is_empty() || query.trim().is_empty() {
		return Ok(None);
	}

	let mut all = Condition::all();
	for term in query.split_whitespace() {
		let mut any = Condition::any();
		for field in search_fields {
			let path = if field.contains(LOOKUP_SEP) {
				field.clone()
			} else {
				format!("{}{}icontains", field, LOOKUP_SEP)
			};
			any = any.add(condition(meta, &path, term)?);
		}
		all = all.add(any);
	}
	Ok(Some(all))
}

fn typed_value(field: &FieldDef, raw: &str) -> AdminResult<sea_query::Value> {
	if field.is_integer() {
		return raw.parse::<i64>().map(Into::into).map_err(|_| {
			AdminError::IncorrectLookupParameters(format!(
				"Field '{}' expected a number but got '{}'",
				field.name, raw
			))
		});
	}
	if matches!(field.kind, crate::model::FieldKind::Boolean) {
		return Ok(matches!(raw, "1" | "true" | "True").into());
	}
	Ok(raw.to_string().into())
}

fn like_pattern(term: &str, contains: bool) -> LikeExpr {
	let escaped = term
		.replace('!', "!!")
		.replace('%', "!%")
		.replace('_', "!_");
	let pattern = if contains {
		format!("%{}%", escaped)
	} else {
		format!("{}%", escaped)
	};
	LikeExpr::new(pattern).escape('!')
}
