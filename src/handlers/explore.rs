use crate::dispatcher::{Reply, RequestContext};
use crate::error::HttpError;
use crate::router::RouteMatch;
use crate::views::ViewContext;

pub const DEFAULT_SORT: &str = "default";
pub const DEFAULT_FILTER: &str = "none";

/// `GET /explore/:category/:id` with optional `sort` and `filter` query params.
pub fn explore(route: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
    let category = route.get_path_param("category").unwrap_or_default();
    let id = route.get_path_param("id").unwrap_or_default();
    let sort = route.get_query_param("sort").unwrap_or(DEFAULT_SORT);
    let filter = route.get_query_param("filter").unwrap_or(DEFAULT_FILTER);

    Ok(Reply::render(
        "explore",
        ViewContext::new()
            .with("title", format!("Explore {category}"))
            .with("category", category)
            .with("id", id)
            .with("sort", sort)
            .with("filter", filter),
    ))
}
