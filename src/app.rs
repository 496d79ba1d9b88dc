//! Application assembly: route table, middleware chain and service.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

use crate::dispatcher::Dispatcher;
use crate::handlers::{diagnostics, explore, pages, products};
use crate::middleware::{
    BodyParserMiddleware, ErrorHandler, FlashMiddleware, LocalsMiddleware, RequestLogMiddleware,
    SessionMiddleware, StaticAssetsMiddleware,
};
use crate::router::{RouteError, Router};
use crate::runtime_config::RuntimeConfig;
use crate::server::AppService;
use crate::session::{CookieSigner, SessionCookie, SessionStore};
use crate::static_files::StaticFiles;
use crate::views::Views;

/// Name shown in page headers and titles.
pub const SITE_NAME: &str = "Storefront";

/// The route table, in match order.
pub fn routes() -> Result<Router, RouteError> {
    Router::builder()
        .get("/", "home", pages::home)
        .get("/about", "about", pages::about)
        .get("/contact", "contact", pages::contact)
        .post("/contact", "contact_submit", pages::submit_contact)
        .get("/products", "products_redirect", products::redirect_to_grid)
        .get("/products/:display", "products", products::list)
        .get("/explore/:category/:id", "explore", explore::explore)
        .get("/error", "manual_error", diagnostics::manual_error)
        .get("/test-error", "unhandled_error", diagnostics::unhandled_error)
        .build()
}

/// Build the dispatcher with the full middleware chain.
pub fn build_dispatcher(
    config: &RuntimeConfig,
    store: Arc<dyn SessionStore>,
    views: Arc<Views>,
) -> Result<Dispatcher> {
    let router = routes().context("route table did not build")?;
    let signer = CookieSigner::new(&config.session_secret)
        .map_err(|e| anyhow!("session secret rejected: {e}"))?;
    let cookie = SessionCookie {
        secure: config.cookie_secure,
        ..SessionCookie::default()
    };
    let error_handler = ErrorHandler::new(config.environment.is_development());

    let mut dispatcher = Dispatcher::new(router, views, error_handler);
    dispatcher.add_middleware(Arc::new(RequestLogMiddleware));
    dispatcher.add_middleware(Arc::new(LocalsMiddleware::new(
        SITE_NAME,
        config.environment.as_str(),
    )));
    dispatcher.add_middleware(Arc::new(StaticAssetsMiddleware::new(StaticFiles::new(
        config.public_dir.clone(),
    ))));
    dispatcher.add_middleware(Arc::new(BodyParserMiddleware::new(config.body_limit)));
    dispatcher.add_middleware(Arc::new(SessionMiddleware::new(store, signer, cookie)));
    dispatcher.add_middleware(Arc::new(FlashMiddleware));
    Ok(dispatcher)
}

pub fn build_service(
    config: &RuntimeConfig,
    store: Arc<dyn SessionStore>,
    views: Arc<Views>,
) -> Result<AppService> {
    let dispatcher = build_dispatcher(config, store, views)?;
    Ok(AppService::new(Arc::new(dispatcher), config.body_limit))
}
