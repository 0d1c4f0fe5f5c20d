//! Handler and middleware traits for request processing
//!
//! ```rust
//! use storepify_http::{Handler, Middleware, Request, Response, Result};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//! 	async fn handle(&self, _request: Request) -> Result<Response> {
//! 		Ok(Response::ok().with_body("Hello!"))
//! 	}
//! }
//!
//! struct Passthrough;
//!
//! #[async_trait]
//! impl Middleware for Passthrough {
//! 	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
//! 		next.handle(request).await
//! 	}
//! }
//! ```

use crate::{Request, Response, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Core abstraction: turns a request into a response or an error
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Wraps a handler to add cross-cutting behavior
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;

	/// Whether this middleware runs for `request`; skipped middleware pass
	/// the request straight to the next handler.
	fn should_continue(&self, _request: &Request) -> bool {
		true
	}
}

/// Composes middleware around a handler
///
/// Middleware run in the order they were added: the first one added sees
/// the request first and the response last.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}
}

struct Next {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Next {
	async fn handle(&self, request: Request) -> Result<Response> {
		if self.middleware.should_continue(&request) {
			self.middleware.process(request, self.next.clone()).await
		} else {
			self.next.handle(request).await
		}
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		let mut handler = self.handler.clone();
		for middleware in self.middlewares.iter().rev() {
			handler = Arc::new(Next {
				middleware: middleware.clone(),
				next: handler,
			});
		}
		handler.handle(request).await
	}
}

/// Adapter turning an async closure into a [`Handler`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
	F: Fn(Request) -> Fut + Send + Sync,
	Fut: Future<Output = Result<Response>> + Send + 'static,
{
	async fn handle(&self, request: Request) -> Result<Response> {
		(self.0)(request).await
	}
}

/// Wrap an async closure as a shareable handler
///
/// # Examples
///
/// ```
/// use storepify_http::{Request, Response, handler_fn};
///
/// let handler = handler_fn(|_req: Request| async { Ok(Response::no_content()) });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
	F: Fn(Request) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Response>> + Send + 'static,
{
	Arc::new(FnHandler(f))
}

/// Run `handler` and render any error as its JSON error response
pub async fn respond(handler: &dyn Handler, request: Request) -> Response {
	match handler.handle(request).await {
		Ok(response) => response,
		Err(error) => error.into_response(),
	}
}
