use http::Method;
use tracing::debug;

use super::{Flow, Middleware};
use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::HttpError;
use crate::server::ParsedRequest;
use crate::static_files::StaticFiles;

/// Serves files from the public directory unmodified.
///
/// Only GET and HEAD are considered. A path that does not name a file passes
/// through to the router, which usually ends in a 404.
pub struct StaticAssetsMiddleware {
    files: StaticFiles,
}

impl StaticAssetsMiddleware {
    pub fn new(files: StaticFiles) -> Self {
        Self { files }
    }
}

impl Middleware for StaticAssetsMiddleware {
    fn name(&self) -> &'static str {
        "static_assets"
    }

    fn before(&self, req: &ParsedRequest, _ctx: &mut RequestContext) -> Result<Flow, HttpError> {
        if req.method != Method::GET && req.method != Method::HEAD {
            return Ok(Flow::Continue);
        }
        match self.files.load(&req.path) {
            Ok((bytes, content_type)) => {
                debug!(path = %req.path, bytes = bytes.len(), "serving static asset");
                let body = if req.method == Method::HEAD {
                    Vec::new()
                } else {
                    bytes
                };
                Ok(Flow::Respond(HandlerResponse::new(
                    200,
                    vec![("content-type".to_string(), content_type.to_string())],
                    body,
                )))
            }
            Err(_) => Ok(Flow::Continue),
        }
    }
}
