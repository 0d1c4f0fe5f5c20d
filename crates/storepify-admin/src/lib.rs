//! # storepify-admin
//!
//! Model admin for Storepify.
//!
//! A [`ModelAdmin`] describes how one table is listed and edited: columns,
//! search, filters, bulk actions, inlines and computed columns. Admins are
//! registered with an [`AdminSite`], which serves them as a JSON API
//! through [`handlers::admin_router`].
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use storepify_admin::{AdminSite, FieldDef, ModelAdminConfig, ModelMeta};
//!
//! let collection = Arc::new(
//! 	ModelMeta::new("store", "collection")
//! 		.field(FieldDef::auto_id())
//! 		.field(FieldDef::char("title", 255))
//! 		.str_fields(&["title"]),
//! );
//!
//! let mut site = AdminSite::new("admin");
//! site.register(Arc::new(
//! 	ModelAdminConfig::new(collection).with_search_fields(&["title"]),
//! ))
//! .unwrap();
//!
//! assert!(site.check().is_empty());
//! ```

pub mod actions;
pub mod annotations;
pub mod autocomplete;
pub mod changeform;
pub mod changelist;
pub mod checks;
pub mod display;
pub mod error;
pub mod filters;
pub mod forms;
pub mod handlers;
pub mod inlines;
pub mod lookups;
pub mod messages;
pub mod model;
pub mod options;
pub mod site;
pub mod user;

pub use actions::{ActionContext, AdminAction, DeleteSelected};
pub use annotations::Annotation;
pub use changeform::{ActionRequest, ChangeForm, EditableRow, ObjectView};
pub use changelist::{ChangeList, ChangeListView};
pub use checks::CheckMessage;
pub use display::{ComputedColumn, DisplayValue, format_html};
pub use error::{AdminError, AdminResult};
pub use filters::{FilterSpec, ListFilter, SimpleListFilter};
pub use forms::ValidationErrors;
pub use inlines::{InlineConfig, InlineRow};
pub use messages::{Level, Message, MessagesContainer};
pub use model::{FieldDef, FieldKind, ModelMeta};
pub use options::{ModelAdmin, ModelAdminConfig};
pub use site::AdminSite;
pub use user::AdminUser;
