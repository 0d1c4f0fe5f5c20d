//! Bulk actions on selected change list rows

use crate::messages::{Message, MessagesContainer};
use crate::model::ModelMeta;
use crate::AdminResult;
use async_trait::async_trait;
use sea_query::{Alias, Expr, Query};
use storepify_db::Database;

/// Warning shown when an action is submitted without a selection
pub const NO_SELECTION_MESSAGE: &str =
	"Items must be selected in order to perform actions on them. No items have been changed.";

/// What an action can touch while running
pub struct ActionContext<'a> {
	pub db: &'a Database,
	pub model: &'a ModelMeta,
	pub messages: &'a MessagesContainer,
}

impl ActionContext<'_> {
	/// Report an outcome to the user
	pub fn message_user(&self, message: Message) {
		self.messages.add(message);
	}
}

/// A bulk action applied to a set of primary keys
#[async_trait]
pub trait AdminAction: Send + Sync {
	/// Identifier submitted by clients
	fn name(&self) -> &str;

	/// Label shown in the action menu
	fn description(&self) -> &str;

	async fn run(&self, ctx: &ActionContext<'_>, selected: &[i64]) -> AdminResult<()>;
}

/// Built-in action deleting the selected rows
pub struct DeleteSelected;

#[async_trait]
impl AdminAction for DeleteSelected {
	fn name(&self) -> &str {
		"delete_selected"
	}

	fn description(&self) -> &str {
		"Delete selected"
	}

	async fn run(&self, ctx: &ActionContext<'_>, selected: &[i64]) -> AdminResult<()> {
		let delete = Query::delete()
			.from_table(Alias::new(&ctx.model.table))
			.and_where(Expr::col(Alias::new(&ctx.model.pk)).is_in(selected.iter().copied()))
			.to_owned();
		let deleted = ctx.db.execute(&delete).await?;

		tracing::info!(model = %ctx.model.label(), deleted, "delete_selected");
		ctx.message_user(Message::success(format!(
			"Successfully deleted {} {}.",
			deleted,
			ctx.model.verbose_name_for(deleted)
		)));
		Ok(())
	}
}
