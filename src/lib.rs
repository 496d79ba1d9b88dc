//! # Storefront
//!
//! **Storefront** is a small server-rendered web application: a handful of
//! templated pages (home, about, contact, products, explore), static assets,
//! SQLite-backed sessions and one-time flash messages.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`server`]** - HTTP transport built on `tiny_http`: request parsing, worker pool, shutdown
//! - **[`dispatcher`]** - Runs a request through the middleware chain, the router and the error handler
//! - **[`middleware`]** - Request log, view locals, static assets, body parser, session, flash, error page
//! - **[`router`]** - Ordered route table with `:name` path segments
//! - **[`handlers`]** - Route handlers producing a template render or a redirect
//! - **[`views`]** - Template rendering with `minijinja`
//! - **[`session`]** - Signed session cookie and session stores (SQLite, in-memory)
//! - **[`dev_notifier`]** - Development-only reload notifications on `PORT + 1`
//! - **[`cli`]** / **[`runtime_config`]** / **[`logging`]** - Configuration and diagnostics
//!
//! ### Request Flow
//!
//! ```text
//! tiny_http worker
//!   -> parse_request                  (ParsedRequest)
//!   -> Dispatcher::dispatch
//!        request_log -> locals -> static_assets -> body_parser -> session -> flash
//!        -> Router::route -> handler   (Reply::Render | Reply::Redirect)
//!        -> Views::render
//!      any error -> ErrorHandler      (errors/404 or errors/500)
//!      finish-hooks in reverse order (consume shown flash, persist session)
//!        failure -> ErrorHandler
//!      after-hooks in reverse order  (x-request-id, completion log)
//!   -> response written
//! ```
//!
//! Exactly one of {middleware answer, handler reply, error page} becomes the
//! response to a request.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront::app::build_service;
//! use storefront::runtime_config::RuntimeConfig;
//! use storefront::server::HttpServer;
//! use storefront::session::SqliteSessionStore;
//! use storefront::views::Views;
//!
//! let config = RuntimeConfig::default();
//! let store = SqliteSessionStore::connect(&config.session_db)?;
//! store.verify()?;
//! store.ensure_schema()?;
//! let views = Arc::new(Views::from_dir(&config.views_dir));
//! let service = build_service(&config, Arc::new(store), views)?;
//! let handle = HttpServer(service).start(config.listen_addr(), config.workers)?;
//! handle.join().ok();
//! ```

pub mod app;
pub mod catalog;
pub mod cli;
pub mod dev_notifier;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod session;
pub mod static_files;
pub mod views;

pub use error::HttpError;
