//! # storepify-debug-toolbar
//!
//! Development-time insight into each request, inspired by Django Debug Toolbar.
//!
//! The [`DebugToolbarMiddleware`] records the method, path, status, timing and
//! every SQL statement a request executes through `storepify-db`. Records are
//! kept in a bounded [`ToolbarHistory`] and inspected through the JSON routes
//! of [`handlers::toolbar_router`]:
//!
//! - `GET /__debug__/` lists the recorded requests
//! - `GET /__debug__/{id}/` returns the panel statistics of one request
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use storepify_debug_toolbar::{DebugToolbar, ToolbarConfig};
//! use storepify_http::{MiddlewareChain, Request, Response, Router, handler_fn};
//!
//! let toolbar = Arc::new(DebugToolbar::new(ToolbarConfig {
//! 	enabled: true,
//! 	..Default::default()
//! }));
//!
//! let app = Router::new()
//! 	.get("/", "home", handler_fn(|_req: Request| async { Ok(Response::ok()) }))
//! 	.include("/__debug__", toolbar.router());
//! let chain = MiddlewareChain::new(Arc::new(app)).with_middleware(toolbar.middleware());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod history;
pub mod middleware;
pub mod panels;
pub mod utils;

pub use config::ToolbarConfig;
pub use context::{RequestInfo, ToolbarContext};
pub use error::{ToolbarError, ToolbarResult};
pub use history::ToolbarHistory;
pub use middleware::{DebugToolbarMiddleware, TOOLBAR_ID_HEADER};
pub use panels::{Panel, PanelRegistry, PanelStats};

use std::sync::Arc;
use storepify_http::{Middleware, Router};

/// Configuration, panels and history shared by the middleware and handlers
pub struct DebugToolbar {
	pub config: Arc<ToolbarConfig>,
	pub registry: Arc<PanelRegistry>,
	pub history: Arc<ToolbarHistory>,
}

impl DebugToolbar {
	/// Toolbar with the default panels: request, timing and SQL
	pub fn new(config: ToolbarConfig) -> Self {
		let registry = PanelRegistry::with_defaults(&config);
		Self::with_registry(config, registry)
	}

	pub fn with_registry(config: ToolbarConfig, registry: PanelRegistry) -> Self {
		let history = ToolbarHistory::new(config.history_size);
		Self {
			config: Arc::new(config),
			registry: Arc::new(registry),
			history: Arc::new(history),
		}
	}

	pub fn middleware(&self) -> Arc<dyn Middleware> {
		Arc::new(DebugToolbarMiddleware::new(
			self.config.clone(),
			self.history.clone(),
		))
	}

	/// Routes to mount under `/__debug__`
	pub fn router(&self) -> Router {
		handlers::toolbar_router(self.registry.clone(), self.history.clone())
	}
}
