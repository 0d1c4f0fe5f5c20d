//! Change list engine
//!
//! Turns a model admin and the request's query parameters into one page
//! of rows: search (`q`), filters, field lookups, ordering (`o`) and
//! pagination (`p`). Relations are rendered from joined columns when they
//! are in `list_select_related`, otherwise with one batched query per
//! relation column.

use crate::display::{ComputedColumn, DisplayValue};
use crate::filters::{FilterPanel, FilterParams, ListFilter, ORDER_VAR, PAGE_VAR, SEARCH_VAR};
use crate::lookups::{self, LOOKUP_SEP};
use crate::model::{FieldDef, FieldKind, ModelMeta, capfirst, value_text};
use crate::options::{ModelAdmin, STR_COLUMN};
use crate::site::AdminSite;
use crate::{AdminError, AdminResult};
use sea_query::{Alias, Condition, Expr, JoinType, Order, Query, SelectStatement, SimpleExpr};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use storepify_db::{Database, Record};

/// Column header
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ColumnHeader {
	pub name: String,
	pub label: String,
	pub sortable: bool,
	/// `"asc"` or `"desc"` when the list is currently sorted by this column
	pub sorted: Option<&'static str>,
	pub editable: bool,
	pub link: bool,
}

/// One rendered cell
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Cell {
	pub column: String,
	/// Raw stored value (for editable columns and clients)
	pub value: Value,
	pub display: DisplayValue,
}

/// One rendered row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Row {
	pub pk: i64,
	pub change_url: String,
	pub cells: Vec<Cell>,
}

impl Row {
	pub fn cell(&self, column: &str) -> Option<&Cell> {
		self.cells.iter().find(|c| c.column == column)
	}
}

/// Action offered in the action menu
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionChoice {
	pub name: String,
	pub description: String,
}

/// One page of the change list
#[derive(Debug, Clone, Serialize)]
pub struct ChangeListView {
	pub app_label: String,
	pub model_name: String,
	pub title: String,
	/// Rows matching the current search and filters
	pub result_count: u64,
	/// Rows in the table
	pub full_result_count: u64,
	pub page: u64,
	pub num_pages: u64,
	pub per_page: u64,
	pub columns: Vec<ColumnHeader>,
	pub rows: Vec<Row>,
	pub filters: Vec<FilterPanel>,
	pub actions: Vec<ActionChoice>,
	pub search_enabled: bool,
	pub query: String,
	pub add_url: String,
}

enum Source<'a> {
	Str,
	Field(&'a FieldDef),
	Related {
		relation: &'a FieldDef,
		field: &'a FieldDef,
	},
	Computed(ComputedColumn),
}

struct Column<'a> {
	name: String,
	label: String,
	source: Source<'a>,
}

/// Change list for one model admin and one set of query parameters
pub struct ChangeList<'a> {
	site: &'a AdminSite,
	admin: &'a dyn ModelAdmin,
	meta: &'a ModelMeta,
	params: FilterParams,
}

fn qualified(table: &str, column: &str) -> SimpleExpr {
	Expr::col((Alias::new(table), Alias::new(column))).into()
}

impl<'a> ChangeList<'a> {
	pub fn new(
		site: &'a AdminSite,
		admin: &'a dyn ModelAdmin,
		params: impl IntoIterator<Item = (String, String)>,
	) -> Self {
		Self {
			site,
			admin,
			meta: admin.model(),
			params: params.into_iter().collect(),
		}
	}

	fn columns(&self) -> AdminResult<Vec<Column<'a>>> {
		let computed = self.admin.computed_columns();
		let meta = self.meta;

		self.admin
			.list_display()
			.into_iter()
			.map(|name| {
				if name == STR_COLUMN {
					return Ok(Column {
						name: name.to_string(),
						label: capfirst(&meta.verbose_name),
						source: Source::Str,
					});
				}
				if let Some(column) = computed.iter().find(|c| c.name == name) {
					return Ok(Column {
						name: name.to_string(),
						label: column.header.clone(),
						source: Source::Computed(column.clone()),
					});
				}
				if let Some(field) = meta.get_field(name) {
					return Ok(Column {
						name: name.to_string(),
						label: capfirst(&field.verbose_name),
						source: Source::Field(field),
					});
				}
				if let Some((relation_name, field_name)) = name.split_once(LOOKUP_SEP)
					&& let Some(relation) = meta.get_field(relation_name)
					&& let Some(target) = relation.related_model()
					&& let Some(field) = target.get_field(field_name)
				{
					return Ok(Column {
						name: name.to_string(),
						label: capfirst(&field.verbose_name),
						source: Source::Related { relation, field },
					});
				}
				Err(AdminError::ImproperlyConfigured(format!(
					"list_display refers to '{}', which is not a field, related field or computed column of {}",
					name,
					meta.label()
				)))
			})
			.collect()
	}

	/// Relations joined into the query
	fn joined(&self, columns: &[Column<'a>]) -> Vec<&'a FieldDef> {
		let mut names: BTreeSet<String> = self
			.admin
			.list_select_related()
			.into_iter()
			.map(str::to_string)
			.collect();
		for column in columns {
			if let Source::Related { relation, .. } = column.source {
				names.insert(relation.name.clone());
			}
		}
		names
			.iter()
			.filter_map(|name| self.meta.get_field(name))
			.filter(|field| field.related_model().is_some())
			.collect()
	}

	fn filters(&self) -> AdminResult<Vec<Box<dyn ListFilter>>> {
		self.admin
			.list_filter()
			.iter()
			.map(|spec| spec.build(self.meta))
			.collect()
	}

	/// WHERE clause from search, filters and remaining lookup parameters
	fn condition(&self, filters: &[Box<dyn ListFilter>]) -> AdminResult<Option<Condition>> {
		let mut parts: Vec<Condition> = Vec::new();
		let mut consumed: BTreeSet<String> = [PAGE_VAR, SEARCH_VAR, ORDER_VAR]
			.iter()
			.map(|s| s.to_string())
			.collect();

		for filter in filters {
			consumed.extend(filter.expected_parameters());
			if let Some(condition) = filter.queryset(&self.params)? {
				parts.push(condition);
			}
		}

		for (key, value) in &self.params {
			if consumed.contains(key) || key.starts_with('_') {
				continue;
			}
			parts.push(Condition::all().add(lookups::condition(self.meta, key, value)?));
		}

		if let Some(query) = self.params.get(SEARCH_VAR) {
			let search_fields: Vec<String> = self
				.admin
				.search_fields()
				.into_iter()
				.map(str::to_string)
				.collect();
			if let Some(condition) = lookups::search_condition(self.meta, &search_fields, query)? {
				parts.push(condition);
			}
		}

		if parts.is_empty() {
			return Ok(None);
		}
		Ok(Some(parts.into_iter().fold(Condition::all(), Condition::add)))
	}

	fn order_expr_for_key(&self, key: &str) -> AdminResult<SimpleExpr> {
		if self.admin.annotations().iter().any(|a| a.alias() == key) {
			return Ok(Expr::col(Alias::new(key)).into());
		}
		match self.meta.get_field(key) {
			Some(field) => Ok(qualified(&self.meta.table, &field.column())),
			None => Err(AdminError::IncorrectLookupParameters(format!(
				"Cannot order {} by '{}'",
				self.meta.label(),
				key
			))),
		}
	}

	fn order_expr(&self, columns: &[Column<'a>], name: &str) -> AdminResult<SimpleExpr> {
		let Some(column) = columns.iter().find(|c| c.name == name) else {
			return self.order_expr_for_key(name);
		};
		match &column.source {
			Source::Field(field) => Ok(qualified(&self.meta.table, &field.column())),
			Source::Related { relation, field, .. } => {
				Ok(qualified(&relation.name, &field.column()))
			}
			Source::Computed(computed) => match &computed.ordering {
				Some(key) => self.order_expr_for_key(key),
				None => Err(AdminError::IncorrectLookupParameters(format!(
					"Column '{}' is not sortable",
					name
				))),
			},
			Source::Str => Err(AdminError::IncorrectLookupParameters(format!(
				"Column '{}' is not sortable",
				name
			))),
		}
	}

	/// Ordering as `(name, descending)`; the `o` parameter wins over defaults
	fn ordering_names(&self) -> Vec<(String, bool)> {
		let parse = |item: &str| match item.strip_prefix('-') {
			Some(name) => (name.to_string(), true),
			None => (item.to_string(), false),
		};

		if let Some(requested) = self.params.get(ORDER_VAR)
			&& !requested.trim().is_empty()
		{
			return requested
				.split(',')
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(parse)
				.collect();
		}

		let admin_ordering = self.admin.ordering();
		if !admin_ordering.is_empty() {
			return admin_ordering.into_iter().map(parse).collect();
		}
		if !self.meta.ordering.is_empty() {
			return self.meta.ordering.iter().map(|s| parse(s)).collect();
		}
		vec![(self.meta.pk.clone(), true)]
	}

	fn ordering(&self, columns: &[Column<'a>]) -> AdminResult<Vec<(SimpleExpr, Order)>> {
		let names = self.ordering_names();
		let mut ordering = Vec::with_capacity(names.len() + 1);
		let mut has_pk = false;

		for (name, descending) in &names {
			if name == "pk" || *name == self.meta.pk {
				has_pk = true;
			}
			let order = if *descending { Order::Desc } else { Order::Asc };
			ordering.push((self.order_expr(columns, name)?, order));
		}
		if !has_pk {
			ordering.push((qualified(&self.meta.table, &self.meta.pk), Order::Desc));
		}
		Ok(ordering)
	}

	fn base_select(&self, joined: &[&'a FieldDef]) -> SelectStatement {
		let meta = self.meta;
		let mut select = Query::select();
		select.from(Alias::new(&meta.table));

		for field in meta.fields() {
			select.column((Alias::new(&meta.table), Alias::new(field.column())));
		}
		for annotation in self.admin.annotations() {
			select.expr_as(annotation.expr(meta), Alias::new(annotation.alias()));
		}
		for relation in joined {
			let Some(target) = relation.related_model() else {
				continue;
			};
			select.join_as(
				JoinType::LeftJoin,
				Alias::new(&target.table),
				Alias::new(&relation.name),
				Expr::col((Alias::new(&relation.name), Alias::new(&target.pk)))
					.equals((Alias::new(&meta.table), Alias::new(relation.column()))),
			);
			for field in target.fields() {
				select.expr_as(
					Expr::col((Alias::new(&relation.name), Alias::new(field.column()))),
					Alias::new(format!("{}{}{}", relation.name, LOOKUP_SEP, field.column())),
				);
			}
		}
		select
	}

	fn count_select(&self, condition: Option<&Condition>) -> SelectStatement {
		let mut select = Query::select();
		select
			.expr(Expr::col((Alias::new(&self.meta.table), Alias::new(&self.meta.pk))).count())
			.from(Alias::new(&self.meta.table));
		if let Some(condition) = condition {
			select.cond_where(condition.clone());
		}
		select
	}

	fn per_page(&self) -> u64 {
		self.admin
			.list_per_page()
			.unwrap_or(self.site.list_per_page)
			.max(1) as u64
	}

	fn page(&self, num_pages: u64) -> AdminResult<u64> {
		let page = match self.params.get(PAGE_VAR) {
			None => 1,
			Some(raw) => raw.parse::<u64>().map_err(|_| {
				AdminError::IncorrectLookupParameters(format!("Invalid page ({})", raw))
			})?,
		};
		if page == 0 || page > num_pages {
			return Err(AdminError::IncorrectLookupParameters(format!(
				"Invalid page ({})",
				page
			)));
		}
		Ok(page)
	}

	async fn fetch_page(
		&self,
		db: &Database,
		columns: &[Column<'a>],
		condition: Option<Condition>,
		page: u64,
		per_page: u64,
	) -> AdminResult<Vec<Record>> {
		let joined = self.joined(columns);
		let mut select = self.base_select(&joined);
		if let Some(condition) = condition {
			select.cond_where(condition);
		}
		for (expr, order) in self.ordering(columns)? {
			select.order_by_expr(expr, order);
		}
		select.limit(per_page).offset((page - 1) * per_page);

		Ok(db.fetch_all(&select).await?)
	}

	/// Rows of the current page as raw records
	pub async fn get_results(&self, db: &Database) -> AdminResult<Vec<Record>> {
		let columns = self.columns()?;
		let condition = self.condition(&self.filters()?)?;
		let result_count = db
			.fetch_i64(&self.count_select(condition.as_ref()))
			.await?
			.max(0) as u64;
		let per_page = self.per_page();
		let page = self.page(result_count.div_ceil(per_page).max(1))?;

		self.fetch_page(db, &columns, condition, page, per_page).await
	}

	/// Render the current page
	pub async fn view(&self, db: &Database) -> AdminResult<ChangeListView> {
		let columns = self.columns()?;
		let filters = self.filters()?;
		let condition = self.condition(&filters)?;

		let result_count = db
			.fetch_i64(&self.count_select(condition.as_ref()))
			.await?
			.max(0) as u64;
		let full_result_count = if condition.is_some() {
			db.fetch_i64(&self.count_select(None)).await?.max(0) as u64
		} else {
			result_count
		};
		let per_page = self.per_page();
		let num_pages = result_count.div_ceil(per_page).max(1);
		let page = self.page(num_pages)?;

		let records = self
			.fetch_page(db, &columns, condition, page, per_page)
			.await?;
		let joined = self.joined(&columns);
		let related = self.related_reprs(db, &columns, &joined, &records).await?;
		let rows = records
			.iter()
			.map(|record| self.render_row(record, &columns, &joined, &related))
			.collect::<AdminResult<Vec<_>>>()?;

		let mut panels = Vec::with_capacity(filters.len());
		for filter in &filters {
			panels.push(filter.panel(db, &self.params).await?);
		}

		Ok(ChangeListView {
			app_label: self.meta.app_label.clone(),
			model_name: self.meta.model_name.clone(),
			title: format!("Select {} to change", self.meta.verbose_name),
			result_count,
			full_result_count,
			page,
			num_pages,
			per_page,
			columns: self.headers(&columns)?,
			rows,
			filters: panels,
			actions: self
				.site
				.actions_for(self.admin)
				.iter()
				.map(|action| ActionChoice {
					name: action.name().to_string(),
					description: action.description().to_string(),
				})
				.collect(),
			search_enabled: !self.admin.search_fields().is_empty(),
			query: self.params.get(SEARCH_VAR).cloned().unwrap_or_default(),
			add_url: self.site.reverse(&self.url_name("add"), &[])?,
		})
	}

	fn url_name(&self, suffix: &str) -> String {
		format!(
			"{}:{}_{}_{}",
			self.site.name, self.meta.app_label, self.meta.model_name, suffix
		)
	}

	fn headers(&self, columns: &[Column<'a>]) -> AdminResult<Vec<ColumnHeader>> {
		let editable = self.admin.list_editable();
		let links = self.admin.list_display_links();
		let sorted_by: HashMap<String, bool> = match self.params.get(ORDER_VAR) {
			Some(_) => self.ordering_names().into_iter().collect(),
			None => HashMap::new(),
		};

		Ok(columns
			.iter()
			.map(|column| {
				let sortable = match &column.source {
					Source::Str => false,
					Source::Computed(computed) => computed.ordering.is_some(),
					Source::Field(_) | Source::Related { .. } => true,
				};
				ColumnHeader {
					name: column.name.clone(),
					label: column.label.clone(),
					sortable,
					sorted: sorted_by
						.get(&column.name)
						.map(|desc| if *desc { "desc" } else { "asc" }),
					editable: editable.contains(&column.name.as_str()),
					link: links.contains(&column.name.as_str()),
				}
			})
			.collect())
	}

	/// Text of related rows for relation columns that are not joined, keyed
	/// by relation name and then primary key
	async fn related_reprs(
		&self,
		db: &Database,
		columns: &[Column<'a>],
		joined: &[&'a FieldDef],
		records: &[Record],
	) -> AdminResult<HashMap<String, HashMap<i64, String>>> {
		let mut reprs = HashMap::new();

		for column in columns {
			let Source::Field(field) = column.source else {
				continue;
			};
			let Some(target) = field.related_model() else {
				continue;
			};
			if joined.iter().any(|j| j.name == field.name) || reprs.contains_key(&field.name) {
				continue;
			}

			let ids: BTreeSet<i64> = records
				.iter()
				.filter_map(|r| r.get(&field.column()).and_then(Value::as_i64))
				.collect();
			let mut by_id = HashMap::new();
			if !ids.is_empty() {
				let mut select = Query::select();
				select
					.from(Alias::new(&target.table))
					.and_where(Expr::col(Alias::new(&target.pk)).is_in(ids));
				for column in target.str_columns() {
					select.column(Alias::new(column));
				}
				for record in db.fetch_all(&select).await? {
					if let Some(id) = record.get(&target.pk).and_then(Value::as_i64) {
						by_id.insert(id, target.object_repr(&record));
					}
				}
			}
			reprs.insert(field.name.clone(), by_id);
		}
		Ok(reprs)
	}

	fn render_row(
		&self,
		record: &Record,
		columns: &[Column<'a>],
		joined: &[&'a FieldDef],
		related: &HashMap<String, HashMap<i64, String>>,
	) -> AdminResult<Row> {
		let pk = record
			.get(&self.meta.pk)
			.and_then(Value::as_i64)
			.ok_or_else(|| {
				AdminError::ImproperlyConfigured(format!(
					"{} rows must have an integer primary key",
					self.meta.label()
				))
			})?;
		let pk_text = pk.to_string();

		let mut cells = Vec::with_capacity(columns.len());
		for column in columns {
			let (value, display) = match &column.source {
				Source::Str => (
					Value::String(self.meta.object_repr(record)),
					DisplayValue::text(self.meta.object_repr(record)),
				),
				Source::Computed(computed) => (Value::Null, computed.render(record, self.site)?),
				Source::Related { relation, field, .. } => {
					let value = record
						.get(&format!("{}{}{}", relation.name, LOOKUP_SEP, field.column()))
						.cloned()
						.unwrap_or(Value::Null);
					let display = DisplayValue::text(value_text(&value));
					(value, display)
				}
				Source::Field(field) => {
					let value = record.get(&field.column()).cloned().unwrap_or(Value::Null);
					let display = self.field_display(field, &value, record, joined, related);
					(value, display)
				}
			};
			cells.push(Cell {
				column: column.name.clone(),
				value,
				display,
			});
		}

		Ok(Row {
			pk,
			change_url: self
				.site
				.reverse(&self.url_name("change"), &[("object_id", &pk_text)])?,
			cells,
		})
	}

	fn field_display(
		&self,
		field: &FieldDef,
		value: &Value,
		record: &Record,
		joined: &[&'a FieldDef],
		related: &HashMap<String, HashMap<i64, String>>,
	) -> DisplayValue {
		if value.is_null() {
			return DisplayValue::text("");
		}
		match &field.kind {
			FieldKind::ForeignKey(target) => {
				if joined.iter().any(|j| j.name == field.name) {
					let prefix = format!("{}{}", field.name, LOOKUP_SEP);
					let related_record: Record = record
						.iter()
						.filter_map(|(key, v)| {
							key.strip_prefix(&prefix).map(|k| (k.to_string(), v.clone()))
						})
						.collect();
					return DisplayValue::text(target.object_repr(&related_record));
				}
				let repr = value
					.as_i64()
					.and_then(|id| related.get(&field.name).and_then(|m| m.get(&id)))
					.cloned()
					.unwrap_or_else(|| value_text(value));
				DisplayValue::text(repr)
			}
			FieldKind::Choice(_) => {
				let stored = value_text(value);
				DisplayValue::text(field.choice_label(&stored).unwrap_or(&stored))
			}
			FieldKind::Boolean => DisplayValue::text(match value {
				Value::Bool(true) => "True",
				Value::Number(n) if n.as_i64() == Some(1) => "True",
				_ => "False",
			}),
			_ => DisplayValue::text(value_text(value)),
		}
	}
}
