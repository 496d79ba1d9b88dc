use super::request::parse_request;
use super::response::{plain_error, to_wire};
use crate::dispatcher::Dispatcher;
use std::sync::Arc;
use tracing::{debug, warn};

/// Something that can answer one HTTP request.
///
/// Implementations are shared across worker threads, so `call` takes `&self`.
pub trait HttpService: Send + Sync + 'static {
    fn call(&self, req: tiny_http::Request);
}

/// The application service: parses the request, hands it to the
/// [`Dispatcher`] and writes the response back.
#[derive(Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
    pub body_limit: usize,
}

impl AppService {
    pub fn new(dispatcher: Arc<Dispatcher>, body_limit: usize) -> Self {
        Self {
            dispatcher,
            body_limit,
        }
    }
}

impl HttpService for AppService {
    fn call(&self, mut req: tiny_http::Request) {
        let response = match parse_request(&mut req, self.body_limit) {
            Ok(parsed) => to_wire(self.dispatcher.dispatch(&parsed)),
            Err(e) => {
                warn!(error = %e, url = %req.url(), "failed to parse request");
                plain_error(400, "Bad Request")
            }
        };
        if let Err(e) = req.respond(response) {
            // Client went away before the response was written
            debug!(error = %e, "failed to write response");
        }
    }
}
