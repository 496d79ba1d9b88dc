//! Request-level error value.
//!
//! Every failure that happens while a request is inside the middleware chain or
//! a route handler is represented as an [`HttpError`]. The error is created at
//! the point of failure, travels back to the dispatcher unmodified and is
//! consumed exactly once by the
//! [`ErrorHandler`](crate::middleware::ErrorHandler).

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use crate::session::StoreError;

/// Status used when an error carries no explicit status.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// An error that diverts a request to the error handler.
#[derive(Debug, Clone)]
pub struct HttpError {
    status: Option<u16>,
    message: String,
    stack: String,
}

impl HttpError {
    /// Error without an attached status; rendered as a 500.
    pub fn new(message: impl Into<String>) -> Self {
        Self::build(None, message.into())
    }

    /// Error with an explicit HTTP status.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::build(Some(status), message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(404, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(400, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_status(500, message)
    }

    /// Convert a caught handler panic into an error.
    ///
    /// The panic payload is usually a `&str` or `String`; anything else is
    /// reported with a generic message. No status is attached.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_string()
        };
        Self::new(message)
    }

    fn build(status: Option<u16>, message: String) -> Self {
        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => format!("Error: {message}\n{backtrace}"),
            _ => format!("Error: {message}"),
        };
        Self {
            status,
            message,
            stack,
        }
    }

    /// The attached status, if any.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// The attached status, or [`DEFAULT_ERROR_STATUS`].
    pub fn status_code(&self) -> u16 {
        self.status.unwrap_or(DEFAULT_ERROR_STATUS)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code())
    }
}

impl std::error::Error for HttpError {}

impl From<minijinja::Error> for HttpError {
    fn from(err: minijinja::Error) -> Self {
        HttpError::internal(format!("template error: {err}"))
    }
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        HttpError::internal(err.to_string())
    }
}
