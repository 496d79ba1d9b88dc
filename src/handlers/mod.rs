//! Route handlers.
//!
//! Each handler is a plain function of the matched route and the request
//! context that returns a [`Reply`](crate::dispatcher::Reply) or an
//! [`HttpError`](crate::error::HttpError).

pub mod diagnostics;
pub mod explore;
pub mod pages;
pub mod products;

#[cfg(test)]
pub(crate) mod tests {
    use crate::dispatcher::{Reply, RequestContext};
    use crate::error::HttpError;
    use crate::router::RouteMatch;
    use std::collections::HashMap;

    fn unused(_: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
        Ok(Reply::redirect("/"))
    }

    /// A match carrying only the given path params.
    pub fn route_match(params: &[(&str, &str)]) -> RouteMatch {
        RouteMatch {
            handler_name: "test",
            handler: unused,
            path_params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            query_params: HashMap::new(),
        }
    }
}
