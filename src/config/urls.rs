//! Root URL configuration and application assembly

use crate::apps::accounts::urls as accounts_urls;
use crate::apps::accounts::views::AccountsState;
use crate::apps::accounts::{JwtAuth, JwtAuthenticationMiddleware};
use crate::apps::playground::{self, PlaygroundState};
use crate::apps::store::urls as store_urls;
use crate::apps::store::views::StoreState;
use crate::apps::store::{StoreModels, admin as store_admin};
use crate::config::settings::Settings;
use crate::error::StartupError;
use crate::middleware::AllowedHostsMiddleware;
use std::sync::Arc;
use storepify_admin::AdminSite;
use storepify_admin::handlers::admin_router;
use storepify_db::Database;
use storepify_debug_toolbar::config::TOOLBAR_PREFIX;
use storepify_debug_toolbar::DebugToolbar;
use storepify_http::{Handler, MiddlewareChain, RequestLoggingMiddleware, Router};

/// The assembled project
pub struct Application {
	pub router: Arc<Router>,
	pub site: Arc<AdminSite>,
	pub toolbar: Option<Arc<DebugToolbar>>,
	pub jwt: Arc<JwtAuth>,
	handler: Arc<dyn Handler>,
}

impl Application {
	/// Router wrapped in the project middleware
	pub fn handler(&self) -> Arc<dyn Handler> {
		self.handler.clone()
	}
}

/// Admin site for `settings`, refusing to start when system checks fail
pub fn build_admin_site(models: &StoreModels, settings: &Settings) -> Result<AdminSite, StartupError> {
	let site = store_admin::admin_site(models, &settings.admin)?;
	let messages = site.check();
	if !messages.is_empty() {
		return Err(StartupError::Checks(messages));
	}
	Ok(site)
}

/// Route table
///
/// `/auth` is included twice: user routes first, then token routes.
/// The debug toolbar is mounted only when `debug` is on.
pub fn urlpatterns(
	db: &Database,
	site: Arc<AdminSite>,
	jwt: Arc<JwtAuth>,
	toolbar: Option<&DebugToolbar>,
) -> Router {
	let accounts = Arc::new(AccountsState {
		db: db.clone(),
		jwt,
	});
	let store = Arc::new(StoreState {
		db: db.clone(),
		models: StoreModels::new(),
	});

	let mut router = Router::new()
		.include("/admin", admin_router(site, db.clone()))
		.include("/test", playground::routes(Arc::new(PlaygroundState { db: db.clone() })))
		.include("/store", store_urls::routes(store))
		.include("/auth", accounts_urls::user_routes(accounts.clone()))
		.include("/auth", accounts_urls::jwt_routes(accounts));
	if let Some(toolbar) = toolbar {
		router = router.include(TOOLBAR_PREFIX, toolbar.router());
	}
	router
}

/// Build the whole application from validated settings
pub fn build_application(settings: &Settings, db: Database) -> Result<Application, StartupError> {
	let models = StoreModels::new();
	let site = Arc::new(build_admin_site(&models, settings)?);
	let jwt = Arc::new(JwtAuth::new(settings.secret_key.as_bytes(), &settings.jwt));
	let toolbar = settings
		.debug
		.then(|| Arc::new(DebugToolbar::new(settings.toolbar_config())));

	let router = Arc::new(urlpatterns(&db, site.clone(), jwt.clone(), toolbar.as_deref()));

	let mut chain = MiddlewareChain::new(router.clone())
		.with_middleware(Arc::new(RequestLoggingMiddleware))
		.with_middleware(Arc::new(AllowedHostsMiddleware::new(
			settings.allowed_hosts.clone(),
			settings.debug,
		)));
	if let Some(toolbar) = &toolbar {
		chain = chain.with_middleware(toolbar.middleware());
	}
	chain = chain.with_middleware(Arc::new(JwtAuthenticationMiddleware::new(jwt.clone(), db)));

	tracing::info!(
		debug = settings.debug,
		models = site.model_admins().count(),
		"application assembled"
	);
	Ok(Application {
		router,
		site,
		toolbar,
		jwt,
		handler: Arc::new(chain),
	})
}
