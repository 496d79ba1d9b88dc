//! # Dispatcher Module
//!
//! The request pipeline: middleware chain, route dispatch and error
//! diversion, expressed as plain return values instead of continuation
//! callbacks.
//!
//! ## Types
//!
//! - [`RequestContext`] - typed per-request state (request id, view locals,
//!   parsed body, session) threaded through every interceptor and handler
//! - [`Reply`] - what a route handler wants: render a template or redirect
//! - [`HandlerResponse`] - the final status, headers and body
//! - [`Dispatcher`] - owns the ordered chain, the route table and the error
//!   handler, and runs one request through them
//!
//! ## Guarantees
//!
//! Exactly one of {middleware answer, route handler reply, error page}
//! becomes the response. No interceptor runs twice for a request, and an
//! error skips every interceptor and handler that had not run yet. A failing
//! `finish` hook (such as a session write) still turns a successful reply into
//! an error page.

mod core;

pub use core::{Dispatcher, HandlerResponse, Reply, RequestContext};
