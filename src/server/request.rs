use http::Method;
use std::collections::HashMap;
use std::io::{self, Read};
use tracing::debug;

/// Parsed HTTP request data handed to the dispatcher.
///
/// Everything the middleware chain and route handlers need, extracted once
/// from the transport request: no field is ever added at runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Parsed cookies from the Cookie header
    pub cookies: HashMap<String, String>,
    /// Parsed query string parameters
    pub query_params: HashMap<String, String>,
    /// Raw request body, at most the configured body limit
    pub body: Vec<u8>,
    /// Set when the client sent more than the body limit
    pub body_truncated: bool,
}

impl ParsedRequest {
    /// Convenience constructor for a request without headers or body.
    pub fn new(method: Method, target: &str) -> Self {
        let path = target.split('?').next().unwrap_or("/").to_string();
        Self {
            method,
            path,
            query_params: parse_query_params(target),
            ..Self::default()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Media type of the body without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// Split a `Cookie` header into name/value pairs.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a request target.
///
/// Extracts everything after `?` and form-url-decodes names and values. When
/// a name repeats, the last value wins.
pub fn parse_query_params(target: &str) -> HashMap<String, String> {
    if let Some(pos) = target.find('?') {
        let query_str = &target[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        HashMap::new()
    }
}

/// Extract a [`ParsedRequest`] from a `tiny_http` request.
///
/// Reads at most `body_limit` bytes of body; anything beyond sets
/// `body_truncated` so the body parser can reject the request.
pub fn parse_request(req: &mut tiny_http::Request, body_limit: usize) -> io::Result<ParsedRequest> {
    let method = Method::from_bytes(req.method().to_string().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let target = req.url().to_string();
    let path = target.split('?').next().unwrap_or("/").to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.field.as_str().as_str().to_ascii_lowercase(),
                h.value.as_str().to_string(),
            )
        })
        .collect();
    let cookies = parse_cookies(&headers);
    let query_params = parse_query_params(&target);

    let mut body = Vec::new();
    req.as_reader()
        .take(body_limit as u64 + 1)
        .read_to_end(&mut body)?;
    let body_truncated = body.len() > body_limit;
    if body_truncated {
        body.truncate(body_limit);
    }

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        cookie_count = cookies.len(),
        query_params = ?query_params,
        body_bytes = body.len(),
        body_truncated,
        "HTTP request parsed"
    );

    Ok(ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query_params,
        body,
        body_truncated,
    })
}
