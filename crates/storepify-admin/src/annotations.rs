//! Per-row aggregate columns added to the change list query

use crate::model::ModelMeta;
use sea_query::{Alias, Expr, Query, SimpleExpr, SubQueryStatement};

/// Aggregate computed for every listed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
	/// Number of rows in `table` whose `fk_column` references the listed row
	Count {
		alias: String,
		table: String,
		fk_column: String,
	},
}

impl Annotation {
	/// Count rows of `related` pointing back through its `fk_field`
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use storepify_admin::{Annotation, FieldDef, ModelMeta};
	///
	/// let customer = Arc::new(ModelMeta::new("store", "customer").field(FieldDef::auto_id()));
	/// let order = ModelMeta::new("store", "order")
	/// 	.field(FieldDef::auto_id())
	/// 	.field(FieldDef::foreign_key("customer", customer));
	///
	/// let annotation = Annotation::count("orders_count", &order, "customer");
	/// assert_eq!(annotation.alias(), "orders_count");
	/// ```
	pub fn count(alias: impl Into<String>, related: &ModelMeta, fk_field: &str) -> Self {
		let fk_column = related
			.get_field(fk_field)
			.map(|f| f.column())
			.unwrap_or_else(|| format!("{}_id", fk_field));
		Annotation::Count {
			alias: alias.into(),
			table: related.table.clone(),
			fk_column,
		}
	}

	pub fn alias(&self) -> &str {
		match self {
			Annotation::Count { alias, .. } => alias,
		}
	}

	/// Correlated subquery computing the value for rows of `base`
	pub fn expr(&self, base: &ModelMeta) -> SimpleExpr {
		match self {
			Annotation::Count {
				table, fk_column, ..
			} => {
				let subquery = Query::select()
					.expr(Expr::col((Alias::new(table), Alias::new("id"))).count())
					.from(Alias::new(table))
					.and_where(
						Expr::col((Alias::new(table), Alias::new(fk_column)))
							.equals((Alias::new(&base.table), Alias::new(&base.pk))),
					)
					.to_owned();
				SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(subquery)))
			}
		}
	}
}
