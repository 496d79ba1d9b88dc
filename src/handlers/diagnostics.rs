//! Routes that fail on purpose, for checking the error pages.

use crate::dispatcher::{Reply, RequestContext};
use crate::error::HttpError;
use crate::router::RouteMatch;

/// `GET /error`: a handled failure with an explicit 500.
pub fn manual_error(_: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
    Err(HttpError::internal("This is a test error"))
}

/// `GET /test-error`: an unhandled failure inside the handler.
pub fn unhandled_error(_: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
    panic!("undefinedFunction is not defined");
}
