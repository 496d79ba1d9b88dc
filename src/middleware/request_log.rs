use tracing::{info, warn};

use super::{Flow, Middleware};
use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::HttpError;
use crate::server::ParsedRequest;

/// Logs one completion event per request and echoes the request id.
pub struct RequestLogMiddleware;

impl Middleware for RequestLogMiddleware {
    fn name(&self) -> &'static str {
        "request_log"
    }

    fn before(&self, req: &ParsedRequest, ctx: &mut RequestContext) -> Result<Flow, HttpError> {
        tracing::debug!(
            request_id = %ctx.request_id,
            method = %req.method,
            path = %req.path,
            "request started"
        );
        Ok(Flow::Continue)
    }

    fn after(&self, req: &ParsedRequest, ctx: &mut RequestContext, res: &mut HandlerResponse) {
        let request_id = ctx.request_id.to_string();
        res.set_header("x-request-id", &request_id);
        let latency_ms = ctx.started.elapsed().as_millis() as u64;
        if res.status >= 500 {
            warn!(
                request_id = %request_id,
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                "request completed"
            );
        } else {
            info!(
                request_id = %request_id,
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                "request completed"
            );
        }
    }
}
