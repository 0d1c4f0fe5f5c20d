//! Path routing with includes, namespaces and named-route reversal
//!
//! Patterns are `/`-separated segments; `{name}` captures any non-empty
//! segment and `{name:int}` captures an unsigned integer. A trailing slash
//! is significant, and requests for a path missing only its trailing slash
//! are redirected to the slashed path.
//!
//! Routers nest with [`Router::include`]: the prefix is stripped and the
//! remainder is resolved by the included router. Entries are tried in the
//! order they were added, so two routers may share a prefix.

use crate::{Error, Handler, Request, Response, Result};
use async_trait::async_trait;
use hyper::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::HashMap;
use std::sync::Arc;

const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'~');

#[derive(Debug, Clone, PartialEq)]
enum Segment {
	Literal(String),
	Param { name: String, int: bool },
}

/// A parsed route pattern such as `/{app}/{model}/{id:int}/change/`
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
	raw: String,
	segments: Vec<Segment>,
}

impl PathPattern {
	/// Parse a pattern
	///
	/// # Examples
	///
	/// ```
	/// use storepify_http::PathPattern;
	///
	/// let pattern = PathPattern::parse("/products/{id:int}/").unwrap();
	/// let params = pattern.matches("/products/42/").unwrap();
	/// assert_eq!(params.get("id").map(String::as_str), Some("42"));
	/// assert!(pattern.matches("/products/abc/").is_none());
	/// ```
	pub fn parse(pattern: &str) -> Result<Self> {
		if !pattern.starts_with('/') {
			return Err(Error::Internal(format!(
				"route pattern '{}' must start with '/'",
				pattern
			)));
		}

		let mut segments = Vec::new();
		for part in pattern[1..].split('/') {
			if let Some(inner) = part.strip_prefix('{') {
				let inner = inner.strip_suffix('}').ok_or_else(|| {
					Error::Internal(format!("unclosed parameter in pattern '{}'", pattern))
				})?;
				let (name, int) = match inner.split_once(':') {
					Some((name, "int")) => (name, true),
					Some((_, kind)) => {
						return Err(Error::Internal(format!(
							"unknown parameter type '{}' in pattern '{}'",
							kind, pattern
						)));
					}
					None => (inner, false),
				};
				if name.is_empty() {
					return Err(Error::Internal(format!(
						"empty parameter name in pattern '{}'",
						pattern
					)));
				}
				segments.push(Segment::Param {
					name: name.to_string(),
					int,
				});
			} else if part.contains('{') || part.contains('}') {
				return Err(Error::Internal(format!(
					"parameters must span a whole segment in pattern '{}'",
					pattern
				)));
			} else {
				segments.push(Segment::Literal(part.to_string()));
			}
		}

		Ok(Self {
			raw: pattern.to_string(),
			segments,
		})
	}

	/// The pattern as written
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Match `path`, returning captured parameters
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		let parts: Vec<&str> = path.strip_prefix('/')?.split('/').collect();
		if parts.len() != self.segments.len() {
			return None;
		}

		let mut params = HashMap::new();
		for (segment, part) in self.segments.iter().zip(parts) {
			match segment {
				Segment::Literal(literal) => {
					if literal != part {
						return None;
					}
				}
				Segment::Param { name, int } => {
					if part.is_empty() || (*int && !part.bytes().all(|b| b.is_ascii_digit())) {
						return None;
					}
					let value = percent_encoding::percent_decode_str(part)
						.decode_utf8()
						.ok()?
						.into_owned();
					params.insert(name.clone(), value);
				}
			}
		}
		Some(params)
	}

	/// Build a path from parameter values
	pub fn reverse(&self, params: &HashMap<&str, String>) -> Result<String> {
		let mut path = String::new();
		for segment in &self.segments {
			path.push('/');
			match segment {
				Segment::Literal(literal) => path.push_str(literal),
				Segment::Param { name, int } => {
					let value = params.get(name.as_str()).ok_or_else(|| {
						Error::Internal(format!(
							"missing parameter '{}' reversing '{}'",
							name, self.raw
						))
					})?;
					if value.is_empty() || (*int && !value.bytes().all(|b| b.is_ascii_digit())) {
						return Err(Error::Internal(format!(
							"invalid value '{}' for parameter '{}'",
							value, name
						)));
					}
					path.extend(utf8_percent_encode(value, SEGMENT));
				}
			}
		}
		Ok(path)
	}
}

struct Route {
	pattern: PathPattern,
	methods: Vec<Method>,
	name: Option<String>,
	handler: Arc<dyn Handler>,
}

enum Entry {
	Route(Route),
	Include { prefix: String, router: Router },
}

enum Resolution {
	Found {
		handler: Arc<dyn Handler>,
		params: HashMap<String, String>,
	},
	WrongMethod(Vec<Method>),
	Missing,
}

/// Ordered table of routes and included sub-routers
#[derive(Default)]
pub struct Router {
	namespace: Option<String>,
	entries: Vec<Entry>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	/// Namespace used when reversing route names (`namespace:name`)
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	/// Add a route answering the given methods
	///
	/// # Panics
	///
	/// Panics if `pattern` is not a valid route pattern.
	pub fn route(
		mut self,
		pattern: &str,
		methods: &[Method],
		name: Option<&str>,
		handler: Arc<dyn Handler>,
	) -> Self {
		let pattern = PathPattern::parse(pattern)
			.unwrap_or_else(|e| panic!("invalid route pattern: {}", e));
		self.entries.push(Entry::Route(Route {
			pattern,
			methods: methods.to_vec(),
			name: name.map(str::to_string),
			handler,
		}));
		self
	}

	/// Add a named `GET` route
	pub fn get(self, pattern: &str, name: &str, handler: Arc<dyn Handler>) -> Self {
		self.route(pattern, &[Method::GET, Method::HEAD], Some(name), handler)
	}

	/// Add a named `POST` route
	pub fn post(self, pattern: &str, name: &str, handler: Arc<dyn Handler>) -> Self {
		self.route(pattern, &[Method::POST], Some(name), handler)
	}

	/// Mount `router` under `prefix` (for example `/admin`)
	///
	/// # Examples
	///
	/// ```
	/// use storepify_http::{Request, Response, Router, handler_fn};
	///
	/// let store = Router::new().with_namespace("store").get(
	/// 	"/products/",
	/// 	"product_list",
	/// 	handler_fn(|_req: Request| async { Ok(Response::ok()) }),
	/// );
	/// let root = Router::new().include("/store", store);
	///
	/// assert_eq!(root.reverse("store:product_list", &[]).unwrap(), "/store/products/");
	/// ```
	pub fn include(mut self, prefix: &str, router: Router) -> Self {
		self.entries.push(Entry::Include {
			prefix: prefix.trim_end_matches('/').to_string(),
			router,
		});
		self
	}

	fn resolve(&self, method: &Method, path: &str) -> Resolution {
		let mut allowed = Vec::new();

		for entry in &self.entries {
			match entry {
				Entry::Route(route) => {
					if let Some(params) = route.pattern.matches(path) {
						if route.methods.contains(method) {
							return Resolution::Found {
								handler: route.handler.clone(),
								params,
							};
						}
						allowed.extend(route.methods.iter().cloned());
					}
				}
				Entry::Include { prefix, router } => {
					let Some(rest) = path.strip_prefix(prefix.as_str()) else {
						continue;
					};
					if !rest.is_empty() && !rest.starts_with('/') {
						continue;
					}
					let rest = if rest.is_empty() { "/" } else { rest };
					match router.resolve(method, rest) {
						found @ Resolution::Found { .. } => return found,
						Resolution::WrongMethod(methods) => allowed.extend(methods),
						Resolution::Missing => {}
					}
				}
			}
		}

		if allowed.is_empty() {
			Resolution::Missing
		} else {
			Resolution::WrongMethod(allowed)
		}
	}

	/// Build the path of a named route
	///
	/// `name` is the colon-separated namespace path followed by the route
	/// name, e.g. `auth:jwt_create`.
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
		let params: HashMap<&str, String> = params
			.iter()
			.map(|(key, value)| (*key, value.to_string()))
			.collect();
		let wanted: Vec<&str> = name.split(':').collect();

		let (prefix, pattern) = self
			.find_named(&wanted, "")
			.ok_or_else(|| Error::Internal(format!("no route named '{}'", name)))?;
		Ok(format!("{}{}", prefix, pattern.reverse(&params)?))
	}

	fn find_named<'a>(
		&'a self,
		wanted: &[&str],
		prefix: &str,
	) -> Option<(String, &'a PathPattern)> {
		let wanted = match &self.namespace {
			Some(namespace) => match wanted.split_first() {
				Some((first, rest)) if first == namespace => rest,
				_ => return None,
			},
			None => wanted,
		};

		for entry in &self.entries {
			match entry {
				Entry::Route(route) => {
					if let [name] = wanted
						&& route.name.as_deref() == Some(*name)
					{
						return Some((prefix.to_string(), &route.pattern));
					}
				}
				Entry::Include {
					prefix: sub_prefix,
					router,
				} => {
					let nested = format!("{}{}", prefix, sub_prefix);
					if let Some(found) = router.find_named(wanted, &nested) {
						return Some(found);
					}
				}
			}
		}
		None
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let path = request.path().to_string();
		match self.resolve(&request.method, &path) {
			Resolution::Found { handler, params } => {
				for (name, value) in params {
					request.set_path_param(name, value);
				}
				handler.handle(request).await
			}
			Resolution::WrongMethod(allowed) => {
				let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
				Err(Error::MethodNotAllowed(format!(
					"{} {} (allowed: {})",
					request.method,
					path,
					allowed.join(", ")
				)))
			}
			Resolution::Missing => {
				if !path.ends_with('/')
					&& matches!(request.method, Method::GET | Method::HEAD)
					&& !matches!(
						self.resolve(&request.method, &format!("{}/", path)),
						Resolution::Missing
					) {
					let location = match request.query_string() {
						Some(query) => format!("{}/?{}", path, query),
						None => format!("{}/", path),
					};
					return Ok(Response::permanent_redirect(&location));
				}
				Err(Error::NotFound(path))
			}
		}
	}
}
