//! # Middleware Module
//!
//! Request interceptors composed by the [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! The application registers them in this order:
//!
//! 1. [`RequestLogMiddleware`] - request id header and completion log
//! 2. [`LocalsMiddleware`] - view locals shared by every template
//! 3. [`StaticAssetsMiddleware`] - files from the public directory
//! 4. [`BodyParserMiddleware`] - JSON and urlencoded form bodies
//! 5. [`SessionMiddleware`] - signed-cookie sessions backed by a [`SessionStore`](crate::session::SessionStore)
//! 6. [`FlashMiddleware`] - one-time messages moved from the session into locals
//!
//! `finish` hooks unwind in reverse, so the flash interceptor drops the
//! messages a page has shown before the session interceptor saves the session.
//!
//! [`ErrorHandler`] is not part of the chain; the dispatcher calls it once
//! for any error raised by an interceptor or a route handler.

mod body;
mod core;
mod error_handler;
mod flash;
mod locals;
mod request_log;
mod session;
mod static_assets;

pub use body::BodyParserMiddleware;
pub use core::{Flow, Middleware};
pub use error_handler::{ErrorHandler, NOT_FOUND_TEMPLATE, SERVER_ERROR_TEMPLATE};
pub use flash::{FlashKind, FlashMessage, FlashMiddleware, FLASH_KEY};
pub use locals::LocalsMiddleware;
pub use request_log::RequestLogMiddleware;
pub use session::SessionMiddleware;
pub use static_assets::StaticAssetsMiddleware;
