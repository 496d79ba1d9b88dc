//! # Router Module
//!
//! Path matching and route resolution.
//!
//! The routing table is an explicit, ordered list of `(method, pattern,
//! handler)` entries built once at startup and never mutated afterwards.
//! Matching is a plain function of that table and the request: routes are
//! tried in registration order and the first one whose method and pattern
//! match wins. When nothing matches, the dispatcher manufactures a 404.
//!
//! ## Patterns
//!
//! Patterns are slash-separated; a segment starting with `:` is a named
//! parameter that matches one non-empty path segment:
//!
//! ```rust,ignore
//! use storefront::router::Router;
//!
//! let router = Router::builder()
//!     .get("/products/:display", "products", handlers::products::list)
//!     .build()?;
//! let m = router.route(&http::Method::GET, "/products/grid").unwrap();
//! assert_eq!(m.get_path_param("display"), Some("grid"));
//! ```
//!
//! Each pattern is compiled into an anchored regex at build time.

mod core;

pub use core::{Handler, RouteError, RouteMatch, Router, RouterBuilder};
