use super::{Flow, Middleware};
use crate::dispatcher::RequestContext;
use crate::error::HttpError;
use crate::server::ParsedRequest;

/// Seeds the per-request view locals shared by every template.
pub struct LocalsMiddleware {
    site_name: String,
    environment: String,
}

impl LocalsMiddleware {
    pub fn new(site_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            environment: environment.into(),
        }
    }
}

impl Middleware for LocalsMiddleware {
    fn name(&self) -> &'static str {
        "locals"
    }

    fn before(&self, req: &ParsedRequest, ctx: &mut RequestContext) -> Result<Flow, HttpError> {
        ctx.locals.insert("site_name", self.site_name.as_str());
        ctx.locals.insert("current_path", req.path.as_str());
        ctx.locals.insert("environment", self.environment.as_str());
        Ok(Flow::Continue)
    }
}
