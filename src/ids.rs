use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Per-request correlation identifier backed by ULID.
///
/// Echoed back to clients in the `x-request-id` response header and attached
/// to every log event emitted for the request.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse an inbound `x-request-id` when it is a valid ULID, otherwise mint one.
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RequestId(ulid::Ulid::from_string(s)?))
    }
}

/// Mint a fresh opaque session identifier.
pub fn new_session_id() -> String {
    ulid::Ulid::new().to_string()
}
