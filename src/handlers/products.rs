use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::catalog::{products, Product};
use crate::dispatcher::{Reply, RequestContext};
use crate::error::HttpError;
use crate::router::RouteMatch;
use crate::views::ViewContext;

/// How the products page lays out the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Grid,
    Details,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Grid => "grid",
            DisplayMode::Details => "details",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = HttpError;

    /// Exact, case-sensitive match on `grid` or `details`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(DisplayMode::Grid),
            "details" => Ok(DisplayMode::Details),
            _ => Err(HttpError::not_found(
                r#"Invalid display mode: must be either "grid" or "details"."#,
            )),
        }
    }
}

#[derive(Serialize)]
struct ProductView<'a> {
    #[serde(flatten)]
    product: &'a Product,
    display_price: String,
}

pub fn redirect_to_grid(_: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
    Ok(Reply::redirect("/products/grid"))
}

pub fn list(route: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
    let display: DisplayMode = route.get_path_param("display").unwrap_or("").parse()?;
    let items: Vec<ProductView<'_>> = products()
        .iter()
        .map(|product| ProductView {
            product,
            display_price: product.display_price(),
        })
        .collect();
    let items = serde_json::to_value(items)
        .map_err(|e| HttpError::internal(format!("product list did not serialize: {e}")))?;
    Ok(Reply::render(
        "products",
        ViewContext::new()
            .with("title", "Our Products")
            .with("display", display.as_str())
            .with("products", items),
    ))
}
