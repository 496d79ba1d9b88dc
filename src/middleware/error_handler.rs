use tracing::error;

use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::HttpError;
use crate::server::ParsedRequest;
use crate::views::{ViewContext, Views};

pub const NOT_FOUND_TEMPLATE: &str = "errors/404";
pub const SERVER_ERROR_TEMPLATE: &str = "errors/500";

/// Terminal stage of the pipeline: turns an [`HttpError`] into an error page.
///
/// Status 404 renders the not-found template; every other status renders the
/// server-error template. The stack trace is always logged but only shown on
/// the page when `expose_stack` is set.
#[derive(Debug, Clone, Copy)]
pub struct ErrorHandler {
    expose_stack: bool,
}

impl ErrorHandler {
    pub fn new(expose_stack: bool) -> Self {
        Self { expose_stack }
    }

    /// Template and page title for a status.
    pub fn page_for(status: u16) -> (&'static str, &'static str) {
        if status == 404 {
            (NOT_FOUND_TEMPLATE, "Page Not Found")
        } else {
            (SERVER_ERROR_TEMPLATE, "Internal Server Error")
        }
    }

    pub fn handle(
        &self,
        err: &HttpError,
        req: &ParsedRequest,
        ctx: &RequestContext,
        views: &Views,
    ) -> HandlerResponse {
        let status = err.status_code();
        error!(
            request_id = %ctx.request_id,
            method = %req.method,
            path = %req.path,
            status,
            message = err.message(),
            stack = err.stack(),
            "request failed"
        );

        let (template, title) = Self::page_for(status);
        let mut view = ctx.locals.clone();
        view.merge(
            ViewContext::new()
                .with("title", title)
                .with("status", status)
                .with("message", err.message())
                .with("stack", if self.expose_stack { err.stack() } else { "" }),
        );

        match views.render(template, &view) {
            Ok(body) => HandlerResponse::html(status, body),
            Err(render_err) => {
                error!(
                    request_id = %ctx.request_id,
                    template,
                    error = %render_err,
                    "error page failed to render"
                );
                HandlerResponse::text(status, &format!("{status} {title}"))
            }
        }
    }
}
