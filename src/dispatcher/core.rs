use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::HttpError;
use crate::ids::RequestId;
use crate::middleware::{ErrorHandler, Flow, FlashKind, FlashMessage, Middleware};
use crate::router::{RouteMatch, Router};
use crate::server::ParsedRequest;
use crate::session::Session;
use crate::views::{ViewContext, Views};
use serde_json::Value;

/// What a route handler asks the dispatcher to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Render `template` with `context` layered over the request locals.
    Render {
        template: &'static str,
        context: ViewContext,
    },
    /// Send a `302 Found` to another path.
    Redirect(String),
}

impl Reply {
    pub fn render(template: &'static str, context: ViewContext) -> Self {
        Reply::Render { template, context }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Reply::Redirect(location.into())
    }
}

/// Response produced for a request: status, owned headers and body bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HandlerResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn html(status: u16, body: String) -> Self {
        Self::new(
            status,
            vec![(
                "content-type".to_string(),
                "text/html; charset=utf-8".to_string(),
            )],
            body.into_bytes(),
        )
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::new(
            status,
            vec![(
                "content-type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
            body.as_bytes().to_vec(),
        )
    }

    /// `302 Found` pointing at `location`.
    pub fn redirect(location: &str) -> Self {
        let mut res = Self::text(302, &format!("Found. Redirecting to {location}"));
        res.set_header("location", location);
        res
    }

    /// Get a header by name (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every header called `name` with a single value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Add a header, keeping any existing ones with the same name.
    pub fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or("")
    }
}

/// Typed per-request state threaded through the middleware chain.
///
/// Interceptors fill it in (locals, parsed body, session) and route handlers
/// read or mutate it. Created fresh for every request and dropped with it.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub started: Instant,
    /// View data shared by every template rendered for this request
    pub locals: ViewContext,
    /// Parsed body (JSON value or object of form fields)
    pub body: Option<Value>,
    pub session: Option<Session>,
}

impl RequestContext {
    pub fn new(req: &ParsedRequest) -> Self {
        Self {
            request_id: RequestId::from_header_or_new(req.header("x-request-id")),
            started: Instant::now(),
            locals: ViewContext::new(),
            body: None,
            session: None,
        }
    }

    /// A string field of the parsed body, trimmed; empty values count as absent.
    pub fn body_field(&self, name: &str) -> Option<&str> {
        self.body
            .as_ref()?
            .get(name)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Queue a flash message for the next request.
    ///
    /// Returns `false` when no session is attached to the request.
    pub fn flash(&mut self, kind: FlashKind, message: impl Into<String>) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                FlashMessage::push(session, kind, message.into());
                true
            }
            None => {
                warn!(request_id = %self.request_id, "flash message dropped: no session");
                false
            }
        }
    }
}

/// Runs a request through the middleware chain, the router and, on failure,
/// the error handler.
///
/// ## Flow
///
/// 1. Interceptors run their `before` hook in registration order. A hook may
///    continue, answer the request itself, or return an error.
/// 2. If every hook continued, the first matching route handler runs; no match
///    is a 404 error. Handler panics are caught and become errors.
/// 3. Any error goes to the [`ErrorHandler`] exactly once; remaining `before`
///    hooks and the handler are skipped.
/// 4. The `finish` hooks of the interceptors whose `before` ran are applied in
///    reverse order. The first one to fail on a successful response sends its
///    error to the [`ErrorHandler`], whose page replaces the response.
/// 5. The `after` hooks of the same interceptors are applied to the final
///    response in reverse order.
///
/// The chain and the route table are fixed once the dispatcher is built.
pub struct Dispatcher {
    middlewares: Vec<Arc<dyn Middleware>>,
    router: Router,
    views: Arc<Views>,
    error_handler: ErrorHandler,
}

impl Dispatcher {
    pub fn new(router: Router, views: Arc<Views>, error_handler: ErrorHandler) -> Self {
        Self {
            middlewares: Vec::new(),
            router,
            views,
            error_handler,
        }
    }

    /// Append an interceptor to the chain.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        debug!(middleware = mw.name(), position = self.middlewares.len(), "middleware registered");
        self.middlewares.push(mw);
    }

    /// Names of the interceptors, in execution order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    pub fn dispatch(&self, req: &ParsedRequest) -> HandlerResponse {
        let mut ctx = RequestContext::new(req);
        let mut entered = 0;
        let (mut response, mut failed) = match self.run(req, &mut ctx, &mut entered) {
            Ok(response) => (response, false),
            Err(err) => (self.error_handler.handle(&err, req, &ctx, &self.views), true),
        };
        for mw in self.middlewares[..entered].iter().rev() {
            let Err(err) = mw.finish(req, &mut ctx, &mut response) else {
                continue;
            };
            if failed {
                // The error page is already the response; keep it.
                warn!(
                    request_id = %ctx.request_id,
                    middleware = mw.name(),
                    error = %err,
                    "finish hook failed on an error response"
                );
            } else {
                response = self.error_handler.handle(&err, req, &ctx, &self.views);
                failed = true;
            }
        }
        for mw in self.middlewares[..entered].iter().rev() {
            mw.after(req, &mut ctx, &mut response);
        }
        response
    }

    fn run(
        &self,
        req: &ParsedRequest,
        ctx: &mut RequestContext,
        entered: &mut usize,
    ) -> Result<HandlerResponse, HttpError> {
        for mw in &self.middlewares {
            *entered += 1;
            match mw.before(req, ctx)? {
                Flow::Continue => {}
                Flow::Respond(response) => {
                    debug!(middleware = mw.name(), "request answered by middleware");
                    return Ok(response);
                }
            }
        }

        let mut route_match = self
            .router
            .route(&req.method, &req.path)
            .ok_or_else(|| HttpError::not_found("Not Found"))?;
        route_match.query_params = req.query_params.clone();

        let reply = invoke(&route_match, ctx)?;
        self.respond(reply, ctx)
    }

    fn respond(&self, reply: Reply, ctx: &RequestContext) -> Result<HandlerResponse, HttpError> {
        match reply {
            Reply::Render { template, context } => {
                let mut view = ctx.locals.clone();
                view.merge(context);
                let body = self.views.render(template, &view)?;
                Ok(HandlerResponse::html(200, body))
            }
            Reply::Redirect(location) => Ok(HandlerResponse::redirect(&location)),
        }
    }
}

/// Call the handler, turning a panic into an error without a status.
fn invoke(route_match: &RouteMatch, ctx: &mut RequestContext) -> Result<Reply, HttpError> {
    let handler = route_match.handler;
    match panic::catch_unwind(AssertUnwindSafe(|| handler(route_match, ctx))) {
        Ok(result) => result,
        Err(payload) => {
            warn!(
                handler_name = route_match.handler_name,
                "route handler panicked"
            );
            Err(HttpError::from_panic(payload))
        }
    }
}
