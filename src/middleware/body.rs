use serde_json::{Map, Value};
use tracing::debug;

use super::{Flow, Middleware};
use crate::dispatcher::RequestContext;
use crate::error::HttpError;
use crate::server::ParsedRequest;

/// Parses JSON and urlencoded form bodies into [`RequestContext::body`].
///
/// Form bodies become a JSON object of string fields; a repeated field keeps
/// its last value. Other content types are left unparsed.
pub struct BodyParserMiddleware {
    limit: usize,
}

impl BodyParserMiddleware {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Middleware for BodyParserMiddleware {
    fn name(&self) -> &'static str {
        "body_parser"
    }

    fn before(&self, req: &ParsedRequest, ctx: &mut RequestContext) -> Result<Flow, HttpError> {
        if req.body_truncated {
            return Err(HttpError::with_status(
                413,
                format!("request body exceeds {} bytes", self.limit),
            ));
        }
        if req.body.is_empty() {
            return Ok(Flow::Continue);
        }
        let parsed = match req.content_type().as_deref() {
            Some("application/json") => Some(
                serde_json::from_slice::<Value>(&req.body)
                    .map_err(|e| HttpError::bad_request(format!("invalid JSON body: {e}")))?,
            ),
            Some("application/x-www-form-urlencoded") => Some(parse_form(&req.body)),
            _ => None,
        };
        if let Some(value) = parsed {
            debug!(request_id = %ctx.request_id, bytes = req.body.len(), "request body parsed");
            ctx.body = Some(value);
        }
        Ok(Flow::Continue)
    }
}

fn parse_form(body: &[u8]) -> Value {
    let fields: Map<String, Value> = url::form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    Value::Object(fields)
}
