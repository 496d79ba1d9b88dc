use crate::dispatcher::HandlerResponse;
use std::io::Cursor;
use tiny_http::{Header, Response, StatusCode};
use tracing::warn;

/// Concrete response type written back to `tiny_http`.
pub type WireResponse = Response<Cursor<Vec<u8>>>;

/// Convert a dispatcher response into a `tiny_http` response.
///
/// Headers that are not valid on the wire are dropped with a warning rather
/// than failing the whole response.
pub fn to_wire(response: HandlerResponse) -> WireResponse {
    let HandlerResponse {
        status,
        headers,
        body,
    } = response;
    let mut wire = Response::from_data(body).with_status_code(StatusCode(status));
    for (name, value) in headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => wire.add_header(header),
            Err(()) => warn!(header = %name, "dropping invalid response header"),
        }
    }
    wire
}

/// Plain-text response used when a request cannot even be parsed.
pub fn plain_error(status: u16, message: &str) -> WireResponse {
    to_wire(HandlerResponse::text(status, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_headers_are_carried() {
        let mut res = HandlerResponse::html(404, "<h1>gone</h1>".into());
        res.set_header("x-request-id", "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        let wire = to_wire(res);
        assert_eq!(wire.status_code(), StatusCode(404));
        assert!(wire
            .headers()
            .iter()
            .any(|h| h.field.equiv("x-request-id")));
        assert_eq!(wire.data_length(), Some(13));
    }

    #[test]
    fn test_invalid_header_is_dropped() {
        let mut res = HandlerResponse::text(200, "ok");
        res.append_header("x-note", "café");
        let wire = to_wire(res);
        assert!(!wire.headers().iter().any(|h| h.field.equiv("x-note")));
    }
}
