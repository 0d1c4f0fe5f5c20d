//! Add, change, detail and delete for one model admin
//!
//! Submissions are JSON objects keyed by field name. Inline rows travel
//! under the inline's prefix (`orderitem_set`) as a list of
//! [`InlineRow`]s. Everything is validated before anything is written;
//! the parent row and its inline rows are then saved in one transaction.

use crate::actions::{ActionContext, NO_SELECTION_MESSAGE};
use crate::forms::{
	FormMode, FormOptions, NON_FIELD_ERRORS, ValidationErrors, clean_form, to_query_value,
};
use crate::inlines::{InlineConfig, InlineRow};
use crate::messages::{Message, MessagesContainer};
use crate::model::{ModelMeta, capfirst};
use crate::options::ModelAdmin;
use crate::site::AdminSite;
use crate::{AdminError, AdminResult};
use sea_query::{Alias, Expr, Order, Query, SelectStatement, SimpleExpr};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use storepify_db::record::get_i64;
use storepify_db::{Database, DbTransaction, Record};

const INVALID_CHOICE: &str =
	"Select a valid choice. That choice is not one of the available choices.";

/// One saved object with its inline rows
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ObjectView {
	pub pk: i64,
	pub repr: String,
	pub values: Record,
	pub readonly_fields: Vec<String>,
	/// Inline prefix → child rows
	pub inlines: BTreeMap<String, Vec<Record>>,
	pub change_url: String,
	pub delete_url: String,
}

/// One row of a list-editable submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditableRow {
	pub id: i64,
	#[serde(default)]
	pub values: serde_json::Map<String, Value>,
}

/// Body of an action submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
	pub action: String,
	#[serde(default)]
	pub selected: Vec<i64>,
}

struct PreparedInline {
	config: InlineConfig,
	deletes: Vec<i64>,
	updates: Vec<(i64, Record)>,
	inserts: Vec<Record>,
}

fn select_object(meta: &ModelMeta, pk: i64) -> SelectStatement {
	let mut select = Query::select();
	select
		.from(Alias::new(&meta.table))
		.and_where(Expr::col(Alias::new(&meta.pk)).eq(pk));
	for field in meta.fields() {
		select.column(Alias::new(field.column()));
	}
	select
}

fn value_exprs(record: &Record) -> Vec<(Alias, SimpleExpr)> {
	record
		.iter()
		.map(|(column, value)| (Alias::new(column), SimpleExpr::Value(to_query_value(value))))
		.collect()
}

async fn insert_record(tx: &mut DbTransaction, meta: &ModelMeta, record: &Record) -> AdminResult<i64> {
	let (columns, values): (Vec<Alias>, Vec<SimpleExpr>) = value_exprs(record).into_iter().unzip();
	let mut insert = Query::insert();
	insert
		.into_table(Alias::new(&meta.table))
		.columns(columns)
		.values(values)
		.map_err(|e| AdminError::ImproperlyConfigured(e.to_string()))?;
	Ok(tx.insert(&insert).await?)
}

/// Form handling for one registered model
pub struct ChangeForm<'a> {
	site: &'a AdminSite,
	admin: &'a dyn ModelAdmin,
	meta: &'a ModelMeta,
}

impl<'a> ChangeForm<'a> {
	pub fn new(site: &'a AdminSite, admin: &'a dyn ModelAdmin) -> Self {
		Self {
			site,
			admin,
			meta: admin.model(),
		}
	}

	fn options(&self) -> FormOptions<'a> {
		FormOptions {
			fields: self.admin.fields(),
			readonly_fields: self.admin.readonly_fields(),
			prepopulated_fields: self.admin.prepopulated_fields(),
			exclude: Vec::new(),
		}
	}

	fn not_found(&self, pk: i64) -> AdminError {
		AdminError::ObjectNotFound {
			model: capfirst(&self.meta.verbose_name),
			id: pk,
		}
	}

	/// Load the stored row
	pub async fn get_object(&self, db: &Database, pk: i64) -> AdminResult<Record> {
		db.fetch_optional(&select_object(self.meta, pk))
			.await?
			.ok_or_else(|| self.not_found(pk))
	}

	/// Row, inline rows and links
	pub async fn detail(&self, db: &Database, pk: i64) -> AdminResult<ObjectView> {
		let values = self.get_object(db, pk).await?;

		let mut inlines = BTreeMap::new();
		for inline in self.admin.inlines() {
			let child = inline.model.as_ref();
			let mut select = Query::select();
			select
				.from(Alias::new(&child.table))
				.and_where(Expr::col(Alias::new(inline.fk_column())).eq(pk))
				.order_by(Alias::new(&child.pk), Order::Asc);
			for field in child.fields() {
				select.column(Alias::new(field.column()));
			}
			inlines.insert(inline.prefix(), db.fetch_all(&select).await?);
		}

		let pk_text = pk.to_string();
		let url = |suffix: &str| {
			self.site.reverse(
				&format!(
					"{}:{}_{}_{}",
					self.site.name, self.meta.app_label, self.meta.model_name, suffix
				),
				&[("object_id", &pk_text)],
			)
		};

		Ok(ObjectView {
			pk,
			repr: self.meta.object_repr(&values),
			values,
			readonly_fields: self
				.admin
				.readonly_fields()
				.into_iter()
				.map(str::to_string)
				.collect(),
			inlines,
			change_url: url("change")?,
			delete_url: url("delete")?,
		})
	}

	/// Create a row (and its inline rows) from `input`
	pub async fn add(
		&self,
		db: &Database,
		input: &serde_json::Map<String, Value>,
		messages: &MessagesContainer,
	) -> AdminResult<ObjectView> {
		let (cleaned, inlines) = self.validate(db, input, None).await?;

		let mut tx = db.begin().await?;
		let pk = insert_record(&mut tx, self.meta, &cleaned).await?;
		self.save_inlines(&mut tx, pk, &inlines).await?;
		tx.commit().await?;

		let view = self.detail(db, pk).await?;
		tracing::info!(model = %self.meta.label(), pk, "object added");
		messages.add(Message::success(format!(
			"The {} \u{201c}{}\u{201d} was added successfully.",
			self.meta.verbose_name, view.repr
		)));
		Ok(view)
	}

	/// Update the fields present in `input` (and submitted inline rows)
	pub async fn change(
		&self,
		db: &Database,
		pk: i64,
		input: &serde_json::Map<String, Value>,
		messages: &MessagesContainer,
	) -> AdminResult<ObjectView> {
		self.get_object(db, pk).await?;
		let (cleaned, inlines) = self.validate(db, input, Some(pk)).await?;

		let mut tx = db.begin().await?;
		if !cleaned.is_empty() {
			let update = Query::update()
				.table(Alias::new(&self.meta.table))
				.values(value_exprs(&cleaned))
				.and_where(Expr::col(Alias::new(&self.meta.pk)).eq(pk))
				.to_owned();
			tx.execute(&update).await?;
		}
		self.save_inlines(&mut tx, pk, &inlines).await?;
		tx.commit().await?;

		let view = self.detail(db, pk).await?;
		tracing::info!(model = %self.meta.label(), pk, "object changed");
		messages.add(Message::success(format!(
			"The {} \u{201c}{}\u{201d} was changed successfully.",
			self.meta.verbose_name, view.repr
		)));
		Ok(view)
	}

	/// Delete one row; protected references surface as database errors
	pub async fn delete(
		&self,
		db: &Database,
		pk: i64,
		messages: &MessagesContainer,
	) -> AdminResult<()> {
		let record = self.get_object(db, pk).await?;
		let delete = Query::delete()
			.from_table(Alias::new(&self.meta.table))
			.and_where(Expr::col(Alias::new(&self.meta.pk)).eq(pk))
			.to_owned();
		db.execute(&delete).await?;

		tracing::info!(model = %self.meta.label(), pk, "object deleted");
		messages.add(Message::success(format!(
			"The {} \u{201c}{}\u{201d} was deleted successfully.",
			self.meta.verbose_name,
			self.meta.object_repr(&record)
		)));
		Ok(())
	}

	/// Save the `list_editable` columns of several rows at once
	pub async fn bulk_edit(
		&self,
		db: &Database,
		rows: &[EditableRow],
		messages: &MessagesContainer,
	) -> AdminResult<u64> {
		let editable = self.admin.list_editable();
		if editable.is_empty() {
			return Err(AdminError::PermissionDenied(format!(
				"{} has no editable columns",
				self.meta.label()
			)));
		}
		let options = FormOptions {
			fields: Some(editable),
			..FormOptions::default()
		};

		let mut errors = ValidationErrors::new();
		let mut updates = Vec::with_capacity(rows.len());
		for (index, row) in rows.iter().enumerate() {
			let prefix = format!("form-{}", index);
			match clean_form(self.meta, &options, &row.values, FormMode::Change) {
				Ok(cleaned) => {
					let mut row_errors = ValidationErrors::new();
					self.check_references(db, self.meta, &cleaned, &mut row_errors)
						.await?;
					self.check_unique(db, self.meta, &cleaned, Some(row.id), &mut row_errors)
						.await?;
					if row_errors.is_empty() {
						updates.push((row.id, cleaned));
					} else {
						errors.extend_prefixed(&prefix, row_errors);
					}
				}
				Err(row_errors) => errors.extend_prefixed(&prefix, row_errors),
			}
		}
		if !errors.is_empty() {
			return Err(AdminError::Validation(errors));
		}

		let mut tx = db.begin().await?;
		let mut changed = 0;
		for (pk, cleaned) in &updates {
			if cleaned.is_empty() {
				continue;
			}
			let update = Query::update()
				.table(Alias::new(&self.meta.table))
				.values(value_exprs(cleaned))
				.and_where(Expr::col(Alias::new(&self.meta.pk)).eq(*pk))
				.to_owned();
			if tx.execute(&update).await? == 0 {
				return Err(self.not_found(*pk));
			}
			changed += 1;
		}
		tx.commit().await?;

		if changed > 0 {
			messages.add(Message::success(format!(
				"{} {} {} changed successfully.",
				changed,
				self.meta.verbose_name_for(changed),
				if changed == 1 { "was" } else { "were" }
			)));
		}
		Ok(changed)
	}

	/// Run a bulk action on the selected primary keys
	pub async fn run_action(
		&self,
		db: &Database,
		request: &ActionRequest,
		messages: &MessagesContainer,
	) -> AdminResult<()> {
		let action = self
			.site
			.actions_for(self.admin)
			.into_iter()
			.find(|action| action.name() == request.action)
			.ok_or_else(|| AdminError::InvalidAction(request.action.clone()))?;

		if request.selected.is_empty() {
			messages.add(Message::warning(NO_SELECTION_MESSAGE));
			return Ok(());
		}

		let ctx = ActionContext {
			db,
			model: self.meta,
			messages,
		};
		tracing::info!(
			model = %self.meta.label(),
			action = %request.action,
			selected = request.selected.len(),
			"running admin action"
		);
		action.run(&ctx, &request.selected).await
	}

	async fn validate(
		&self,
		db: &Database,
		input: &serde_json::Map<String, Value>,
		pk: Option<i64>,
	) -> AdminResult<(Record, Vec<PreparedInline>)> {
		let mode = if pk.is_some() {
			FormMode::Change
		} else {
			FormMode::Add
		};
		let mut errors = ValidationErrors::new();

		let cleaned = match clean_form(self.meta, &self.options(), input, mode) {
			Ok(cleaned) => {
				self.check_references(db, self.meta, &cleaned, &mut errors)
					.await?;
				self.check_unique(db, self.meta, &cleaned, pk, &mut errors)
					.await?;
				cleaned
			}
			Err(form_errors) => {
				errors = form_errors;
				Record::new()
			}
		};

		let mut inlines = Vec::new();
		for config in self.admin.inlines() {
			let prefix = config.prefix();
			let rows: Vec<InlineRow> = match input.get(&prefix) {
				Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
					AdminError::IncorrectLookupParameters(format!("{}: {}", prefix, e))
				})?,
				None if mode == FormMode::Change => continue,
				None => Vec::new(),
			};
			if let Some(prepared) = self
				.validate_inline(db, config, &rows, pk, &mut errors)
				.await?
			{
				inlines.push(prepared);
			}
		}

		if errors.is_empty() {
			Ok((cleaned, inlines))
		} else {
			Err(AdminError::Validation(errors))
		}
	}

	async fn validate_inline(
		&self,
		db: &Database,
		config: InlineConfig,
		rows: &[InlineRow],
		parent: Option<i64>,
		errors: &mut ValidationErrors,
	) -> AdminResult<Option<PreparedInline>> {
		let prefix = config.prefix();
		let child = config.model.as_ref();

		let mut stored = BTreeSet::new();
		if let Some(parent) = parent {
			let mut select = Query::select();
			select
				.column(Alias::new(&child.pk))
				.from(Alias::new(&child.table))
				.and_where(Expr::col(Alias::new(config.fk_column())).eq(parent));
			for record in db.fetch_all(&select).await? {
				stored.insert(get_i64(&record, &child.pk)?);
			}
		}

		// Stored rows left out of the submission stay and still count.
		let mut inline_errors = ValidationErrors::new();
		let mut seen = BTreeSet::new();
		let mut rejected = BTreeSet::new();
		let mut active = stored.len();
		for (index, row) in rows.iter().enumerate() {
			match row.id {
				Some(id) if !stored.contains(&id) || !seen.insert(id) => {
					let mut row_errors = ValidationErrors::new();
					row_errors.add(child.pk.clone(), INVALID_CHOICE);
					inline_errors.extend_prefixed(&index.to_string(), row_errors);
					rejected.insert(index);
				}
				Some(_) if row.delete => active -= 1,
				None if !row.delete => active += 1,
				_ => {}
			}
		}
		if let Err(message) = config.validate_count(active) {
			inline_errors.add(NON_FIELD_ERRORS, message);
		}

		let options = FormOptions {
			exclude: vec![config.fk_field.as_str()],
			..FormOptions::default()
		};
		let mut prepared = PreparedInline {
			config: config.clone(),
			deletes: Vec::new(),
			updates: Vec::new(),
			inserts: Vec::new(),
		};

		for (index, row) in rows.iter().enumerate() {
			if rejected.contains(&index) {
				continue;
			}
			if row.delete {
				if let Some(id) = row.id {
					prepared.deletes.push(id);
				}
				continue;
			}
			let mode = if row.id.is_some() {
				FormMode::Change
			} else {
				FormMode::Add
			};
			match clean_form(child, &options, &row.values, mode) {
				Ok(cleaned) => {
					let mut row_errors = ValidationErrors::new();
					self.check_references(db, child, &cleaned, &mut row_errors)
						.await?;
					if row_errors.is_empty() {
						match row.id {
							Some(id) => prepared.updates.push((id, cleaned)),
							None => prepared.inserts.push(cleaned),
						}
					} else {
						inline_errors.extend_prefixed(&index.to_string(), row_errors);
					}
				}
				Err(row_errors) => inline_errors.extend_prefixed(&index.to_string(), row_errors),
			}
		}

		if inline_errors.is_empty() {
			Ok(Some(prepared))
		} else {
			errors.extend_prefixed(&prefix, inline_errors);
			Ok(None)
		}
	}

	/// Every foreign key value must name an existing row
	async fn check_references(
		&self,
		db: &Database,
		meta: &ModelMeta,
		cleaned: &Record,
		errors: &mut ValidationErrors,
	) -> AdminResult<()> {
		for field in meta.fields() {
			let Some(target) = field.related_model() else {
				continue;
			};
			let Some(id) = cleaned.get(&field.column()).and_then(Value::as_i64) else {
				continue;
			};
			let count = Query::select()
				.expr(Expr::col(Alias::new(&target.pk)).count())
				.from(Alias::new(&target.table))
				.and_where(Expr::col(Alias::new(&target.pk)).eq(id))
				.to_owned();
			if db.fetch_i64(&count).await? == 0 {
				errors.add(field.name.clone(), INVALID_CHOICE);
			}
		}
		Ok(())
	}

	/// Unique fields must not collide with another row
	async fn check_unique(
		&self,
		db: &Database,
		meta: &ModelMeta,
		cleaned: &Record,
		exclude_pk: Option<i64>,
		errors: &mut ValidationErrors,
	) -> AdminResult<()> {
		for field in meta.fields().iter().filter(|f| f.unique) {
			let Some(value) = cleaned.get(&field.column()) else {
				continue;
			};
			if value.is_null() || value.as_str() == Some("") {
				continue;
			}
			let mut count = Query::select();
			count
				.expr(Expr::col(Alias::new(&meta.pk)).count())
				.from(Alias::new(&meta.table))
				.and_where(Expr::col(Alias::new(field.column())).eq(to_query_value(value)));
			if let Some(pk) = exclude_pk {
				count.and_where(Expr::col(Alias::new(&meta.pk)).ne(pk));
			}
			if db.fetch_i64(&count).await? > 0 {
				errors.add(
					field.name.clone(),
					format!(
						"{} with this {} already exists.",
						capfirst(&meta.verbose_name),
						capfirst(&field.verbose_name)
					),
				);
			}
		}
		Ok(())
	}

	async fn save_inlines(
		&self,
		tx: &mut DbTransaction,
		parent: i64,
		inlines: &[PreparedInline],
	) -> AdminResult<()> {
		for inline in inlines {
			let child = inline.config.model.as_ref();
			let fk_column = inline.config.fk_column();
			let belongs = |id: i64| {
				Expr::col(Alias::new(&child.pk))
					.eq(id)
					.and(Expr::col(Alias::new(&fk_column)).eq(parent))
			};

			for id in &inline.deletes {
				let delete = Query::delete()
					.from_table(Alias::new(&child.table))
					.and_where(belongs(*id))
					.to_owned();
				tx.execute(&delete).await?;
			}
			for (id, cleaned) in &inline.updates {
				if cleaned.is_empty() {
					continue;
				}
				let update = Query::update()
					.table(Alias::new(&child.table))
					.values(value_exprs(cleaned))
					.and_where(belongs(*id))
					.to_owned();
				if tx.execute(&update).await? == 0 {
					return Err(AdminError::ObjectNotFound {
						model: capfirst(&child.verbose_name),
						id: *id,
					});
				}
			}
			for cleaned in &inline.inserts {
				let mut record = cleaned.clone();
				record.insert(fk_column.clone(), Value::from(parent));
				insert_record(tx, child, &record).await?;
			}
		}
		Ok(())
	}
}
