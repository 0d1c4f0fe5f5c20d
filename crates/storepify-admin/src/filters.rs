//! List filtering for change list views
//!
//! A change list shows one panel per configured filter. Field filters are
//! derived from the field kind (relations, dates, choices, booleans);
//! custom filters implement [`SimpleListFilter`] with a fixed set of
//! lookups on a single query parameter.

use crate::lookups;
use crate::model::{FieldDef, FieldKind, ModelMeta};
use crate::{AdminError, AdminResult};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use sea_query::{Alias, Condition, Order, Query, SimpleExpr};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use storepify_db::Database;

/// Current change list query parameters
pub type FilterParams = BTreeMap<String, String>;

/// Parameters that never select a filter value
pub const PAGE_VAR: &str = "p";
pub const SEARCH_VAR: &str = "q";
pub const ORDER_VAR: &str = "o";

/// One selectable entry of a filter panel
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilterChoice {
	pub display: String,
	pub selected: bool,
	/// Change list query string that selects this choice
	pub query_string: String,
}

/// Filter panel shown beside the change list
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilterPanel {
	pub title: String,
	pub choices: Vec<FilterChoice>,
}

/// Custom filter offering fixed lookups on one parameter
///
/// # Examples
///
/// ```
/// use sea_query::{Alias, Expr, SimpleExpr};
/// use storepify_admin::SimpleListFilter;
///
/// struct StockFilter;
///
/// impl SimpleListFilter for StockFilter {
/// 	fn title(&self) -> &str {
/// 		"stock"
/// 	}
///
/// 	fn parameter_name(&self) -> &str {
/// 		"stock"
/// 	}
///
/// 	fn lookups(&self) -> Vec<(String, String)> {
/// 		vec![("none".into(), "Sold out".into())]
/// 	}
///
/// 	fn queryset(&self, value: &str) -> Option<SimpleExpr> {
/// 		(value == "none").then(|| Expr::col(Alias::new("inventory")).eq(0))
/// 	}
/// }
///
/// assert!(StockFilter.queryset("other").is_none());
/// ```
pub trait SimpleListFilter: Send + Sync {
	fn title(&self) -> &str;

	fn parameter_name(&self) -> &str;

	/// `(value, label)` pairs offered in the panel
	fn lookups(&self) -> Vec<(String, String)>;

	/// Condition for the selected `value`; `None` leaves the list unfiltered
	fn queryset(&self, value: &str) -> Option<SimpleExpr>;
}

/// Entry of a model admin's `list_filter`
#[derive(Clone)]
pub enum FilterSpec {
	/// Filter derived from a model field
	Field(String),
	/// Custom filter
	Simple(Arc<dyn SimpleListFilter>),
}

impl From<&str> for FilterSpec {
	fn from(field: &str) -> Self {
		FilterSpec::Field(field.to_string())
	}
}

impl std::fmt::Debug for FilterSpec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FilterSpec::Field(name) => f.debug_tuple("Field").field(name).finish(),
			FilterSpec::Simple(filter) => f.debug_tuple("Simple").field(&filter.parameter_name()).finish(),
		}
	}
}

impl FilterSpec {
	/// Instantiate the filter for `meta`
	pub fn build(&self, meta: &ModelMeta) -> AdminResult<Box<dyn ListFilter>> {
		match self {
			FilterSpec::Simple(filter) => Ok(Box::new(SimpleFilterAdapter(filter.clone()))),
			FilterSpec::Field(name) => {
				let field = meta.get_field(name).ok_or_else(|| {
					AdminError::ImproperlyConfigured(format!(
						"list_filter refers to '{}', which does not refer to a field of {}",
						name,
						meta.label()
					))
				})?;
				match &field.kind {
					FieldKind::ForeignKey(target) => Ok(Box::new(RelatedFieldListFilter::new(
						meta,
						field,
						target.clone(),
					))),
					FieldKind::Date | FieldKind::DateTime { .. } => {
						Ok(Box::new(DateFieldListFilter::new(meta, field)))
					}
					FieldKind::Choice(choices) => Ok(Box::new(ChoicesFieldListFilter::new(
						meta,
						field,
						choices.clone(),
					))),
					FieldKind::Boolean => Ok(Box::new(ChoicesFieldListFilter::new(
						meta,
						field,
						vec![("1".into(), "Yes".into()), ("0".into(), "No".into())],
					))),
					_ => Err(AdminError::ImproperlyConfigured(format!(
						"list_filter field '{}' has no filter for its kind",
						name
					))),
				}
			}
		}
	}
}

/// A filter instantiated for one model
#[async_trait]
pub trait ListFilter: Send + Sync {
	fn title(&self) -> String;

	/// Query parameters consumed by this filter
	fn expected_parameters(&self) -> Vec<String>;

	async fn choices(&self, db: &Database, params: &FilterParams) -> AdminResult<Vec<FilterChoice>>;

	/// Narrowing for the current selection; `None` when nothing is selected
	fn queryset(&self, params: &FilterParams) -> AdminResult<Option<Condition>>;

	async fn panel(&self, db: &Database, params: &FilterParams) -> AdminResult<FilterPanel> {
		Ok(FilterPanel {
			title: self.title(),
			choices: self.choices(db, params).await?,
		})
	}
}

/// Query string for `params` with this filter's parameters replaced by `set`
///
/// The page parameter is dropped so a new selection starts on page 1.
pub fn query_string_with(params: &FilterParams, expected: &[String], set: &[(String, String)]) -> String {
	let mut pairs: Vec<(&str, &str)> = params
		.iter()
		.filter(|(key, _)| key.as_str() != PAGE_VAR && !expected.contains(key))
		.map(|(k, v)| (k.as_str(), v.as_str()))
		.collect();
	pairs.extend(set.iter().map(|(k, v)| (k.as_str(), v.as_str())));

	if pairs.is_empty() {
		return "?".into();
	}
	format!("?{}", serde_urlencoded::to_string(&pairs).unwrap_or_default())
}

struct SimpleFilterAdapter(Arc<dyn SimpleListFilter>);

#[async_trait]
impl ListFilter for SimpleFilterAdapter {
	fn title(&self) -> String {
		self.0.title().to_string()
	}

	fn expected_parameters(&self) -> Vec<String> {
		vec![self.0.parameter_name().to_string()]
	}

	async fn choices(&self, _db: &Database, params: &FilterParams) -> AdminResult<Vec<FilterChoice>> {
		let expected = self.expected_parameters();
		let current = params.get(self.0.parameter_name());

		let mut choices = vec![FilterChoice {
			display: "All".into(),
			selected: current.is_none(),
			query_string: query_string_with(params, &expected, &[]),
		}];
		for (value, label) in self.0.lookups() {
			choices.push(FilterChoice {
				selected: current == Some(&value),
				query_string: query_string_with(
					params,
					&expected,
					&[(self.0.parameter_name().to_string(), value)],
				),
				display: label,
			});
		}
		Ok(choices)
	}

	fn queryset(&self, params: &FilterParams) -> AdminResult<Option<Condition>> {
		Ok(params
			.get(self.0.parameter_name())
			.and_then(|value| self.0.queryset(value))
			.map(|expr| Condition::all().add(expr)))
	}
}

/// Filter by related object (`collection__id__exact=5`)
pub struct RelatedFieldListFilter {
	base: ModelMeta,
	field: FieldDef,
	target: Arc<ModelMeta>,
}

impl RelatedFieldListFilter {
	pub fn new(base: &ModelMeta, field: &FieldDef, target: Arc<ModelMeta>) -> Self {
		Self {
			base: base.clone(),
			field: field.clone(),
			target,
		}
	}

	fn exact_param(&self) -> String {
		format!("{}__id__exact", self.field.name)
	}

	fn isnull_param(&self) -> String {
		format!("{}__isnull", self.field.name)
	}
}

#[async_trait]
impl ListFilter for RelatedFieldListFilter {
	fn title(&self) -> String {
		self.field.verbose_name.clone()
	}

	fn expected_parameters(&self) -> Vec<String> {
		let mut params = vec![self.exact_param()];
		if self.field.null {
			params.push(self.isnull_param());
		}
		params
	}

	async fn choices(&self, db: &Database, params: &FilterParams) -> AdminResult<Vec<FilterChoice>> {
		let expected = self.expected_parameters();
		let exact = self.exact_param();
		let current = params.get(&exact);

		let mut select = Query::select();
		select.from(Alias::new(&self.target.table));
		for column in self.target.str_columns() {
			select.column(Alias::new(column));
		}
		for key in &self.target.ordering {
			let (column, order) = match key.strip_prefix('-') {
				Some(column) => (column, Order::Desc),
				None => (key.as_str(), Order::Asc),
			};
			select.order_by(Alias::new(column), order);
		}
		select.order_by(Alias::new(&self.target.pk), Order::Asc);

		let mut choices = vec![FilterChoice {
			display: "All".into(),
			selected: current.is_none() && !params.contains_key(&self.isnull_param()),
			query_string: query_string_with(params, &expected, &[]),
		}];
		for record in db.fetch_all(&select).await? {
			let id = record
				.get(&self.target.pk)
				.map(crate::model::value_text)
				.unwrap_or_default();
			choices.push(FilterChoice {
				display: self.target.object_repr(&record),
				selected: current == Some(&id),
				query_string: query_string_with(params, &expected, &[(exact.clone(), id)]),
			});
		}
		if self.field.null {
			choices.push(FilterChoice {
				display: crate::display::EMPTY_VALUE_DISPLAY.into(),
				selected: params.contains_key(&self.isnull_param()),
				query_string: query_string_with(
					params,
					&expected,
					&[(self.isnull_param(), "True".into())],
				),
			});
		}
		Ok(choices)
	}

	fn queryset(&self, params: &FilterParams) -> AdminResult<Option<Condition>> {
		let mut condition = Condition::all();
		let mut narrowed = false;
		for param in self.expected_parameters() {
			if let Some(value) = params.get(&param) {
				condition = condition.add(lookups::condition(&self.base, &param, value)?);
				narrowed = true;
			}
		}
		Ok(narrowed.then_some(condition))
	}
}

/// Filter by date ranges relative to today
pub struct DateFieldListFilter {
	base: ModelMeta,
	field: FieldDef,
}

impl DateFieldListFilter {
	pub fn new(base: &ModelMeta, field: &FieldDef) -> Self {
		Self {
			base: base.clone(),
			field: field.clone(),
		}
	}

	fn since_param(&self) -> String {
		format!("{}__gte", self.field.name)
	}

	fn until_param(&self) -> String {
		format!("{}__lt", self.field.name)
	}

	/// `(label, [since, until))` ranges offered for `today`
	pub fn ranges(today: NaiveDate) -> Vec<(&'static str, Option<(NaiveDate, NaiveDate)>)> {
		let tomorrow = today + Duration::days(1);
		let month_start = today.with_day(1);
		let next_month = month_start.and_then(|start| {
			if start.month() == 12 {
				NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
			} else {
				NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
			}
		});
		let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1);
		let next_year = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1);

		let mut ranges = vec![
			("Any date", None),
			("Today", Some((today, tomorrow))),
			("Past 7 days", Some((today - Duration::days(7), tomorrow))),
		];
		if let (Some(start), Some(end)) = (month_start, next_month) {
			ranges.push(("This month", Some((start, end))));
		}
		if let (Some(start), Some(end)) = (year_start, next_year) {
			ranges.push(("This year", Some((start, end))));
		}
		ranges
	}
}

#[async_trait]
impl ListFilter for DateFieldListFilter {
	fn title(&self) -> String {
		self.field.verbose_name.clone()
	}

	fn expected_parameters(&self) -> Vec<String> {
		vec![self.since_param(), self.until_param()]
	}

	async fn choices(&self, _db: &Database, params: &FilterParams) -> AdminResult<Vec<FilterChoice>> {
		let expected = self.expected_parameters();
		let since = params.get(&self.since_param());
		let until = params.get(&self.until_param());

		Ok(Self::ranges(Utc::now().date_naive())
			.into_iter()
			.map(|(label, range)| match range {
				None => FilterChoice {
					display: label.into(),
					selected: since.is_none() && until.is_none(),
					query_string: query_string_with(params, &expected, &[]),
				},
				Some((start, end)) => {
					let start = start.format("%Y-%m-%d").to_string();
					let end = end.format("%Y-%m-%d").to_string();
					FilterChoice {
						display: label.into(),
						selected: since == Some(&start) && until == Some(&end),
						query_string: query_string_with(
							params,
							&expected,
							&[(self.since_param(), start), (self.until_param(), end)],
						),
					}
				}
			})
			.collect())
	}

	fn queryset(&self, params: &FilterParams) -> AdminResult<Option<Condition>> {
		let mut condition = Condition::all();
		let mut narrowed = false;
		for param in self.expected_parameters() {
			if let Some(value) = params.get(&param) {
				if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
					return Err(AdminError::IncorrectLookupParameters(format!(
						"'{}' is not a valid date for {}",
						value, param
					)));
				}
				condition = condition.add(lookups::condition(&self.base, &param, value)?);
				narrowed = true;
			}
		}
		Ok(narrowed.then_some(condition))
	}
}

/// Filter by one of a fixed set of stored values
pub struct ChoicesFieldListFilter {
	base: ModelMeta,
	field: FieldDef,
	choices: Vec<(String, String)>,
}

impl ChoicesFieldListFilter {
	pub fn new(base: &ModelMeta, field: &FieldDef, choices: Vec<(String, String)>) -> Self {
		Self {
			base: base.clone(),
			field: field.clone(),
			choices,
		}
	}

	fn param(&self) -> String {
		format!("{}__exact", self.field.name)
	}
}

#[async_trait]
impl ListFilter for ChoicesFieldListFilter {
	fn title(&self) -> String {
		self.field.verbose_name.clone()
	}

	fn expected_parameters(&self) -> Vec<String> {
		vec![self.param()]
	}

	async fn choices(&self, _db: &Database, params: &FilterParams) -> AdminResult<Vec<FilterChoice>> {
		let expected = self.expected_parameters();
		let current = params.get(&self.param());

		let mut choices = vec![FilterChoice {
			display: "All".into(),
			selected: current.is_none(),
			query_string: query_string_with(params, &expected, &[]),
		}];
		for (value, label) in &self.choices {
			choices.push(FilterChoice {
				display: label.clone(),
				selected: current == Some(value),
				query_string: query_string_with(params, &expected, &[(self.param(), value.clone())]),
			});
		}
		Ok(choices)
	}

	fn queryset(&self, params: &FilterParams) -> AdminResult<Option<Condition>> {
		match params.get(&self.param()) {
			Some(value) => Ok(Some(
				Condition::all().add(lookups::condition(&self.base, &self.param(), value)?),
			)),
			None => Ok(None),
		}
	}
}
