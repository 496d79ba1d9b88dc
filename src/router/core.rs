use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

use crate::dispatcher::{RequestContext, Reply};
use crate::error::HttpError;

/// Signature shared by every route handler.
///
/// Handlers read path and query parameters from the [`RouteMatch`] and
/// per-request state (parsed body, session, locals) from the
/// [`RequestContext`]. They either produce a [`Reply`] or divert the request to
/// the error handler by returning an [`HttpError`].
pub type Handler = fn(&RouteMatch, &mut RequestContext) -> Result<Reply, HttpError>;

/// Result of successfully matching a request to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Name the route was registered under
    pub handler_name: &'static str,
    /// The handler to invoke
    pub handler: Handler,
    /// Named segments of the pattern, percent-decoded (e.g. `:display` → `"grid"`)
    pub path_params: HashMap<String, String>,
    /// Query string parameters (populated by the dispatcher)
    pub query_params: HashMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

/// A route pattern that could not be compiled.
#[derive(Debug)]
pub enum RouteError {
    /// A `:` segment without a parameter name, or a pattern not starting with `/`.
    InvalidPattern { pattern: String },
    Regex(regex::Error),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPattern { pattern } => {
                write!(f, "invalid route pattern '{pattern}'")
            }
            RouteError::Regex(e) => write!(f, "route pattern did not compile: {e}"),
        }
    }
}

impl std::error::Error for RouteError {}

struct Route {
    method: Method,
    pattern: String,
    regex: Regex,
    param_names: Vec<String>,
    handler_name: &'static str,
    handler: Handler,
}

/// Ordered, immutable routing table.
///
/// Built once at startup through [`Router::builder`]. Matching walks the
/// routes in registration order and the first match wins. Literal segments
/// compare case-insensitively and a single trailing slash is tolerated, so
/// `/About/` reaches the `/about` route. A `GET` route also answers `HEAD`.
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// `METHOD pattern` for every route, in matching order.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| format!("{} {}", r.method, r.pattern))
            .collect()
    }

    /// Find the first route matching `method` and `path` (query already stripped).
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        for route in &self.routes {
            let method_ok =
                route.method == *method || (route.method == Method::GET && *method == Method::HEAD);
            if !method_ok {
                continue;
            }
            if let Some(captures) = route.regex.captures(path) {
                let mut path_params = HashMap::with_capacity(route.param_names.len());
                for (i, name) in route.param_names.iter().enumerate() {
                    if let Some(val) = captures.get(i + 1) {
                        let decoded = urlencoding::decode(val.as_str())
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| val.as_str().to_string());
                        path_params.insert(name.clone(), decoded);
                    }
                }
                debug!(
                    method = %method,
                    path = %path,
                    handler_name = route.handler_name,
                    route_pattern = %route.pattern,
                    "Route matched"
                );
                return Some(RouteMatch {
                    handler_name: route.handler_name,
                    handler: route.handler,
                    path_params,
                    query_params: HashMap::new(),
                });
            }
        }
        debug!(method = %method, path = %path, "No route matched");
        None
    }

    /// Convert a pattern like `/explore/:category/:id` into an anchored regex
    /// plus its ordered parameter names.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPattern {
                pattern: path.to_string(),
            });
        }
        if path == "/" {
            return Ok((Regex::new(r"^/$").map_err(RouteError::Regex)?, Vec::new()));
        }

        let mut pattern = String::with_capacity(path.len() + 16);
        pattern.push_str("(?i)^");
        let mut param_names = Vec::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteError::InvalidPattern {
                        pattern: path.to_string(),
                    });
                }
                pattern.push_str("/([^/]+)");
                param_names.push(name.to_string());
            } else {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push_str("/?$");
        let regex = Regex::new(&pattern).map_err(RouteError::Regex)?;
        Ok((regex, param_names))
    }
}

/// Collects routes in registration order.
#[derive(Default)]
pub struct RouterBuilder {
    pending: Vec<(Method, String, &'static str, Handler)>,
}

impl RouterBuilder {
    #[must_use]
    pub fn get(self, pattern: &str, name: &'static str, handler: Handler) -> Self {
        self.add(Method::GET, pattern, name, handler)
    }

    #[must_use]
    pub fn post(self, pattern: &str, name: &'static str, handler: Handler) -> Self {
        self.add(Method::POST, pattern, name, handler)
    }

    #[must_use]
    pub fn add(mut self, method: Method, pattern: &str, name: &'static str, handler: Handler) -> Self {
        self.pending.push((method, pattern.to_string(), name, handler));
        self
    }

    /// Compile every pattern. Fails on the first pattern that does not compile.
    pub fn build(self) -> Result<Router, RouteError> {
        let routes = self
            .pending
            .into_iter()
            .map(|(method, pattern, handler_name, handler)| {
                let (regex, param_names) = Router::path_to_regex(&pattern)?;
                Ok(Route {
                    method,
                    pattern,
                    regex,
                    param_names,
                    handler_name,
                    handler,
                })
            })
            .collect::<Result<Vec<_>, RouteError>>()?;
        let router = Router { routes };
        info!(
            routes_count = router.routes.len(),
            routes = ?router.describe(),
            "Routing table loaded"
        );
        Ok(router)
    }
}
