//! JSON HTTP surface of an admin site
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use storepify_admin::{AdminSite, handlers};
//! use storepify_db::Database;
//! use storepify_http::Router;
//!
//! let db = Database::connect_in_memory().await?;
//! let site = Arc::new(AdminSite::new("admin"));
//! let root = Router::new().include("/admin", handlers::admin_router(site, db));
//! # Ok(())
//! # }
//! ```

use crate::autocomplete::{self, AutocompleteParams};
use crate::changeform::{ActionRequest, ChangeForm, EditableRow};
use crate::changelist::ChangeList;
use crate::messages::MessagesContainer;
use crate::options::ModelAdmin;
use crate::site::AdminSite;
use crate::user::AdminUser;
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use storepify_db::Database;
use storepify_http::{
	Error, Handler, Method, Request, Response, Result, Router, handler_fn,
};

/// Shared state of the admin handlers
pub struct AdminState {
	pub site: Arc<AdminSite>,
	pub db: Database,
}

#[derive(Debug, Deserialize)]
struct EditableSubmission {
	rows: Vec<EditableRow>,
}

fn handler<F, Fut>(state: &Arc<AdminState>, f: F) -> Arc<dyn Handler>
where
	F: Fn(Arc<AdminState>, Request) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Response>> + Send + 'static,
{
	let state = state.clone();
	handler_fn(move |request| f(state.clone(), request))
}

/// Routes of `site`, namespaced by the site name
pub fn admin_router(site: Arc<AdminSite>, db: Database) -> Router {
	let namespace = site.name.clone();
	let state = Arc::new(AdminState { site, db });

	Router::new()
		.with_namespace(namespace)
		.get("/", "index", handler(&state, index))
		.get("/autocomplete/", "autocomplete", handler(&state, autocomplete_view))
		.get("/{app_label}/{model_name}/", "changelist", handler(&state, changelist))
		.post("/{app_label}/{model_name}/add/", "add", handler(&state, add))
		.post("/{app_label}/{model_name}/action/", "action", handler(&state, action))
		.post("/{app_label}/{model_name}/editable/", "editable", handler(&state, editable))
		.route(
			"/{app_label}/{model_name}/{object_id:int}/change/",
			&[Method::GET, Method::HEAD, Method::POST],
			Some("change"),
			handler(&state, change),
		)
		.post(
			"/{app_label}/{model_name}/{object_id:int}/delete/",
			"delete",
			handler(&state, delete),
		)
}

/// User the request acts as; staff is required unless the site waives it
fn current_user(site: &AdminSite, request: &Request) -> Result<AdminUser> {
	if !site.require_staff {
		return Ok(AdminUser::anonymous_staff());
	}
	let user = request
		.extensions
		.get::<AdminUser>()
		.cloned()
		.ok_or_else(|| {
			Error::Authentication("Authentication credentials were not provided.".into())
		})?;
	if !user.can_access_admin() {
		return Err(Error::Authorization(
			"You do not have permission to access the admin.".into(),
		));
	}
	Ok(user)
}

fn model_admin(site: &AdminSite, request: &Request) -> Result<Arc<dyn ModelAdmin>> {
	let app_label = request.path_param("app_label").unwrap_or_default();
	let model_name = request.path_param("model_name").unwrap_or_default();
	Ok(site.get_model_admin(app_label, model_name)?)
}

fn denied(what: &str, admin: &dyn ModelAdmin) -> Error {
	Error::Authorization(format!(
		"You do not have permission to {} {}.",
		what,
		admin.model().verbose_name_plural
	))
}

fn with_messages(mut body: Value, messages: &MessagesContainer) -> Value {
	if let Value::Object(map) = &mut body {
		map.insert("messages".into(), json!(messages.take()));
	}
	body
}

async fn index(state: Arc<AdminState>, request: Request) -> Result<Response> {
	current_user(&state.site, &request)?;
	Response::ok().with_json(&state.site.index())
}

async fn autocomplete_view(state: Arc<AdminState>, request: Request) -> Result<Response> {
	let user = current_user(&state.site, &request)?;
	let params: AutocompleteParams = request.query()?;
	let results = autocomplete::search(&state.site, &state.db, &user, &params).await?;
	Response::ok().with_json(&results)
}

async fn changelist(state: Arc<AdminState>, request: Request) -> Result<Response> {
	let user = current_user(&state.site, &request)?;
	let admin = model_admin(&state.site, &request)?;
	if !admin.has_view_permission(&user).await {
		return Err(denied("view", admin.as_ref()));
	}

	let view = ChangeList::new(&state.site, admin.as_ref(), request.query_pairs()?)
		.view(&state.db)
		.await?;
	Response::ok().with_json(&view)
}

async fn add(state: Arc<AdminState>, request: Request) -> Result<Response> {
	let user = current_user(&state.site, &request)?;
	let admin = model_admin(&state.site, &request)?;
	if !admin.has_add_permission(&user).await {
		return Err(denied("add", admin.as_ref()));
	}

	let input: serde_json::Map<String, Value> = request.json()?;
	let messages = MessagesContainer::new();
	let object = ChangeForm::new(&state.site, admin.as_ref())
		.add(&state.db, &input, &messages)
		.await?;
	Response::created().with_json(&with_messages(json!({ "object": object }), &messages))
}

async fn change(state: Arc<AdminState>, request: Request) -> Result<Response> {
	let user = current_user(&state.site, &request)?;
	let admin = model_admin(&state.site, &request)?;
	let pk: i64 = request.path_param_as("object_id")?;
	let form = ChangeForm::new(&state.site, admin.as_ref());

	if request.method != Method::POST {
		if !admin.has_view_permission(&user).await {
			return Err(denied("view", admin.as_ref()));
		}
		return Response::ok().with_json(&form.detail(&state.db, pk).await?);
	}

	if !admin.has_change_permission(&user).await {
		return Err(denied("change", admin.as_ref()));
	}
	let input: serde_json::Map<String, Value> = request.json()?;
	let messages = MessagesContainer::new();
	let object = form.change(&state.db, pk, &input, &messages).await?;
	Response::ok().with_json(&with_messages(json!({ "object": object }), &messages))
}

async fn delete(state: Arc<AdminState>, request: Request) -> Result<Response> {
	let user = current_user(&state.site, &request)?;
	let admin = model_admin(&state.site, &request)?;
	if !admin.has_delete_permission(&user).await {
		return Err(denied("delete", admin.as_ref()));
	}
	let pk: i64 = request.path_param_as("object_id")?;

	let messages = MessagesContainer::new();
	ChangeForm::new(&state.site, admin.as_ref())
		.delete(&state.db, pk, &messages)
		.await?;
	Response::ok().with_json(&with_messages(json!({ "deleted": pk }), &messages))
}

async fn action(state: Arc<AdminState>, request: Request) -> Result<Response> {
	let user = current_user(&state.site, &request)?;
	let admin = model_admin(&state.site, &request)?;
	let submission: ActionRequest = request.json()?;

	let allowed = if submission.action == "delete_selected" {
		admin.has_delete_permission(&user).await
	} else {
		admin.has_change_permission(&user).await
	};
	if !allowed {
		return Err(denied("change", admin.as_ref()));
	}

	let messages = MessagesContainer::new();
	ChangeForm::new(&state.site, admin.as_ref())
		.run_action(&state.db, &submission, &messages)
		.await?;
	Response::ok().with_json(&with_messages(json!({ "action": submission.action }), &messages))
}

async fn editable(state: Arc<AdminState>, request: Request) -> Result<Response> {
	let user = current_user(&state.site, &request)?;
	let admin = model_admin(&state.site, &request)?;
	if !admin.has_change_permission(&user).await {
		return Err(denied("change", admin.as_ref()));
	}
	let submission: EditableSubmission = request.json()?;

	let messages = MessagesContainer::new();
	let changed = ChangeForm::new(&state.site, admin.as_ref())
		.bulk_edit(&state.db, &submission.rows, &messages)
		.await?;
	Response::ok().with_json(&with_messages(json!({ "changed": changed }), &messages))
}
