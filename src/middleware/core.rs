use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::HttpError;
use crate::server::ParsedRequest;

/// Outcome of an interceptor's `before` hook.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next interceptor (or the router).
    Continue,
    /// Answer the request now; nothing further in the chain runs.
    Respond(HandlerResponse),
}

/// A request interceptor.
///
/// `before` runs in registration order and either continues, answers the
/// request, or returns an error that diverts it to the error handler.
///
/// Once a response exists, `finish` and then `after` run in reverse order for
/// every interceptor whose `before` was entered. `finish` may still fail: the
/// error handler then replaces the response. `after` only decorates the final
/// response, including error pages.
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn before(&self, _req: &ParsedRequest, _ctx: &mut RequestContext) -> Result<Flow, HttpError> {
        Ok(Flow::Continue)
    }

    fn finish(
        &self,
        _req: &ParsedRequest,
        _ctx: &mut RequestContext,
        _res: &mut HandlerResponse,
    ) -> Result<(), HttpError> {
        Ok(())
    }

    fn after(&self, _req: &ParsedRequest, _ctx: &mut RequestContext, _res: &mut HandlerResponse) {}
}
