//! # Storepify
//!
//! An e-commerce back office: a JSON admin over the store catalog, customers
//! and orders, public read-only store endpoints and JWT authentication.
//!
//! The project is assembled from the workspace crates:
//!
//! - `storepify-http`: requests, responses, routing, middleware and the server
//! - `storepify-db`: the SQLite pool and query capture
//! - `storepify-admin`: the admin site, change lists, actions and forms
//! - `storepify-debug-toolbar`: per-request SQL and timing insight in development
//!
//! ## Routes
//!
//! | Prefix | Mounted |
//! |--------|---------|
//! | `/admin/` | admin site |
//! | `/test/` | playground |
//! | `/store/` | store catalog |
//! | `/auth/` | user registration and JWT tokens |
//! | `/__debug__/` | debug toolbar (debug only) |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! use storepify::config::{settings, urls};
//! use storepify_db::Database;
//!
//! let settings = settings::get_settings()?;
//! let db = Database::connect(&settings.database.url, settings.database.max_connections).await?;
//! db.run_migrations(&storepify::MIGRATOR).await?;
//! let app = urls::build_application(&settings, db)?;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod config;
pub mod error;
pub mod middleware;

use std::future::Future;
use std::sync::Arc;
use storepify_db::Migrator;
use storepify_http::{Handler, Request, Response, Result, handler_fn};

/// Schema migrations under `migrations/`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Bind shared view state to an async view function
pub(crate) fn handler<S, F, Fut>(state: &Arc<S>, f: F) -> Arc<dyn Handler>
where
	S: Send + Sync + 'static,
	F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Response>> + Send + 'static,
{
	let state = state.clone();
	handler_fn(move |request| f(state.clone(), request))
}
