use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Flow, Middleware};
use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::HttpError;
use crate::server::ParsedRequest;
use crate::session::Session;

/// Session key holding queued flash messages.
pub const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

/// A one-time notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

impl FlashMessage {
    /// Queue a message on the session.
    pub fn push(session: &mut Session, kind: FlashKind, message: String) {
        let queued = session.entry_mut(FLASH_KEY);
        if !queued.is_array() {
            *queued = Value::Array(Vec::new());
        }
        if let Value::Array(items) = queued {
            items.push(serde_json::json!({ "kind": kind, "message": message }));
        }
    }

    /// Every queued message, left in place. Malformed entries are skipped.
    pub fn peek_all(session: &Session) -> Vec<FlashMessage> {
        match session.get(FLASH_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Remove and return every queued message. Malformed entries are dropped.
    pub fn take_all(session: &mut Session) -> Vec<FlashMessage> {
        let messages = Self::peek_all(session);
        session.remove(FLASH_KEY);
        messages
    }

    /// Drop the first `shown` messages, keeping any queued after them.
    pub fn discard_shown(session: &mut Session, shown: usize) {
        if shown == 0 {
            return;
        }
        let remaining: Vec<FlashMessage> = Self::take_all(session).into_iter().skip(shown).collect();
        if remaining.is_empty() {
            return;
        }
        if let Ok(value) = serde_json::to_value(remaining) {
            session.insert(FLASH_KEY, value);
        }
    }
}

/// Exposes queued flash messages as the `flash` view local and consumes them
/// once a page has rendered them.
///
/// Redirects, static files and plain-text replies leave the queue alone, so
/// a message survives a post/redirect/get round trip and is removed only by
/// the HTML page that shows it. Messages queued while the page renders stay
/// for the next request.
pub struct FlashMiddleware;

impl FlashMiddleware {
    fn rendered_html(res: &HandlerResponse) -> bool {
        res.get_header("content-type")
            .is_some_and(|ct| ct.starts_with("text/html"))
    }
}

impl Middleware for FlashMiddleware {
    fn name(&self) -> &'static str {
        "flash"
    }

    fn before(&self, _req: &ParsedRequest, ctx: &mut RequestContext) -> Result<Flow, HttpError> {
        let messages = ctx
            .session
            .as_ref()
            .map(FlashMessage::peek_all)
            .unwrap_or_default();
        let value = serde_json::to_value(messages).unwrap_or_else(|_| Value::Array(Vec::new()));
        ctx.locals.insert(FLASH_KEY, value);
        Ok(Flow::Continue)
    }

    fn finish(
        &self,
        _req: &ParsedRequest,
        ctx: &mut RequestContext,
        res: &mut HandlerResponse,
    ) -> Result<(), HttpError> {
        if !Self::rendered_html(res) {
            return Ok(());
        }
        let shown = ctx
            .locals
            .get(FLASH_KEY)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if let Some(session) = ctx.session.as_mut() {
            FlashMessage::discard_shown(session, shown);
        }
        Ok(())
    }
}
