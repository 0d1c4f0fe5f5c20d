//! HTTP plumbing for Storepify
//!
//! This crate provides the request/response types, the `Handler` and
//! `Middleware` abstractions, a path router with Django-style `include`
//! and named-route reversal, and a hyper-based HTTP/1 server.
//!
//! ## Example
//!
//! ```rust,no_run
//! use storepify_http::{Request, Response, Router, handler_fn};
//!
//! let router = Router::new().get(
//! 	"/hello/",
//! 	"hello",
//! 	handler_fn(|_req: Request| async { Response::ok().with_json(&"hi") }),
//! );
//! ```

pub mod error;
pub mod logging;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use error::{Error, Result};
pub use logging::RequestLoggingMiddleware;
pub use middleware::{FnHandler, Handler, Middleware, MiddlewareChain, handler_fn, respond};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use router::{PathPattern, Router};
pub use server::{HttpServer, ShutdownCoordinator};

pub use hyper::{Method, StatusCode};
