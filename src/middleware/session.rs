use std::sync::Arc;
use tracing::debug;

use super::{Flow, Middleware};
use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::HttpError;
use crate::server::ParsedRequest;
use crate::session::{now_unix, CookieSigner, Session, SessionCookie, SessionStore};

/// Attaches a [`Session`] to every request and persists it afterwards.
///
/// The session id travels in a signed cookie. An unsigned, tampered or
/// unknown id yields a fresh session. At the end of the request:
///
/// - an invalidated session is destroyed and the cookie cleared
/// - a new session that is still empty is dropped without a cookie
/// - a new or modified session is saved and the cookie (re)issued
/// - an untouched existing session only has its expiry pushed forward
///
/// A store failure at that point is a request error: the client gets the
/// error page instead of a reply that pretends the session was kept.
pub struct SessionMiddleware {
    store: Arc<dyn SessionStore>,
    signer: CookieSigner,
    cookie: SessionCookie,
}

impl SessionMiddleware {
    pub fn new(store: Arc<dyn SessionStore>, signer: CookieSigner, cookie: SessionCookie) -> Self {
        Self {
            store,
            signer,
            cookie,
        }
    }

    fn session_id_from(&self, req: &ParsedRequest) -> Option<String> {
        let raw = req.cookie(&self.cookie.name)?;
        let decoded = urlencoding::decode(raw).ok()?;
        match self.signer.unsign(&decoded) {
            Some(id) => Some(id.to_string()),
            None => {
                debug!("session cookie signature rejected");
                None
            }
        }
    }

    fn persist(&self, session: &mut Session, res: &mut HandlerResponse) -> Result<(), HttpError> {
        let now = now_unix();
        if session.is_invalidated() {
            if !session.is_new() {
                self.store.destroy(session.id())?;
            }
            res.append_header("set-cookie", &self.cookie.clear_cookie());
            return Ok(());
        }
        if session.is_new() && session.is_empty() {
            return Ok(());
        }
        session.extend(now);
        if session.is_new() || session.is_modified() {
            self.store.save(&session.to_record())?;
            let signed = self.signer.sign(session.id());
            res.append_header("set-cookie", &self.cookie.set_cookie(&signed));
        } else {
            self.store.touch(session.id(), session.expires_at())?;
        }
        Ok(())
    }
}

impl Middleware for SessionMiddleware {
    fn name(&self) -> &'static str {
        "session"
    }

    fn before(&self, req: &ParsedRequest, ctx: &mut RequestContext) -> Result<Flow, HttpError> {
        let loaded = match self.session_id_from(req) {
            Some(id) => self.store.load(&id, now_unix())?,
            None => None,
        };
        let session = match loaded {
            Some(record) => Session::from_record(record),
            None => Session::fresh(),
        };
        ctx.session = Some(session);
        Ok(Flow::Continue)
    }

    fn finish(
        &self,
        _req: &ParsedRequest,
        ctx: &mut RequestContext,
        res: &mut HandlerResponse,
    ) -> Result<(), HttpError> {
        match ctx.session.take() {
            Some(mut session) => self.persist(&mut session, res),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::ReadOnlyStore;
    use crate::session::MemorySessionStore;
    use http::Method;

    fn setup() -> (Arc<MemorySessionStore>, SessionMiddleware) {
        let store = Arc::new(MemorySessionStore::new());
        let mw = SessionMiddleware::new(
            Arc::clone(&store) as Arc<dyn SessionStore>,
            CookieSigner::new("test secret").unwrap(),
            SessionCookie::default(),
        );
        (store, mw)
    }

    fn cookie_value(set_cookie: &str) -> String {
        set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, v)| v.to_string())
            .unwrap()
    }

    fn run(mw: &SessionMiddleware, req: &ParsedRequest, f: impl FnOnce(&mut Session)) -> HandlerResponse {
        let mut ctx = RequestContext::new(req);
        mw.before(req, &mut ctx).unwrap();
        f(ctx.session.as_mut().unwrap());
        let mut res = HandlerResponse::text(200, "ok");
        mw.finish(req, &mut ctx, &mut res).unwrap();
        res
    }

    #[test]
    fn test_failed_save_is_an_error() {
        let mw = SessionMiddleware::new(
            Arc::new(ReadOnlyStore),
            CookieSigner::new("test secret").unwrap(),
            SessionCookie::default(),
        );
        let req = ParsedRequest::new(Method::POST, "/contact");
        let mut ctx = RequestContext::new(&req);
        mw.before(&req, &mut ctx).unwrap();
        ctx.session.as_mut().unwrap().insert("k", "v");

        let mut res = HandlerResponse::redirect("/contact");
        let err = mw.finish(&req, &mut ctx, &mut res).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.message().contains("session store"));
        assert!(res.get_header("set-cookie").is_none());
    }

    #[test]
    fn test_empty_session_never_reaches_store() {
        let mw = SessionMiddleware::new(
            Arc::new(ReadOnlyStore),
            CookieSigner::new("test secret").unwrap(),
            SessionCookie::default(),
        );
        let req = ParsedRequest::new(Method::GET, "/");
        let mut ctx = RequestContext::new(&req);
        mw.before(&req, &mut ctx).unwrap();
        let mut res = HandlerResponse::text(200, "ok");
        assert!(mw.finish(&req, &mut ctx, &mut res).is_ok());
    }

    #[test]
    fn test_empty_new_session_is_not_persisted() {
        let (store, mw) = setup();
        let req = ParsedRequest::new(Method::GET, "/");
        let res = run(&mw, &req, |_| {});
        assert!(store.is_empty());
        assert!(res.get_header("set-cookie").is_none());
    }

    #[test]
    fn test_written_session_round_trips_through_cookie() {
        let (store, mw) = setup();
        let req = ParsedRequest::new(Method::GET, "/");
        let res = run(&mw, &req, |s| s.insert("visits", 1));
        assert_eq!(store.len(), 1);
        let set_cookie = res.get_header("set-cookie").unwrap();
        assert!(set_cookie.starts_with("sessionId="));
        assert!(set_cookie.contains("HttpOnly"));

        let mut next = ParsedRequest::new(Method::GET, "/");
        next.cookies
            .insert("sessionId".into(), cookie_value(set_cookie));
        let mut ctx = RequestContext::new(&next);
        mw.before(&next, &mut ctx).unwrap();
        let session = ctx.session.as_ref().unwrap();
        assert!(!session.is_new());
        assert_eq!(session.get("visits"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn test_tampered_cookie_gets_fresh_session() {
        let (_store, mw) = setup();
        let mut req = ParsedRequest::new(Method::GET, "/");
        req.cookies
            .insert("sessionId".into(), "someid.AAAA".into());
        let mut ctx = RequestContext::new(&req);
        mw.before(&req, &mut ctx).unwrap();
        assert!(ctx.session.as_ref().unwrap().is_new());
    }

    #[test]
    fn test_unmodified_existing_session_sends_no_cookie() {
        let (store, mw) = setup();
        let first = run(&mw, &ParsedRequest::new(Method::GET, "/"), |s| {
            s.insert("k", "v")
        });
        let mut req = ParsedRequest::new(Method::GET, "/");
        req.cookies.insert(
            "sessionId".into(),
            cookie_value(first.get_header("set-cookie").unwrap()),
        );
        let res = run(&mw, &req, |_| {});
        assert!(res.get_header("set-cookie").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalidate_destroys_and_clears_cookie() {
        let (store, mw) = setup();
        let first = run(&mw, &ParsedRequest::new(Method::GET, "/"), |s| {
            s.insert("k", "v")
        });
        let mut req = ParsedRequest::new(Method::GET, "/");
        req.cookies.insert(
            "sessionId".into(),
            cookie_value(first.get_header("set-cookie").unwrap()),
        );
        let res = run(&mw, &req, Session::invalidate);
        assert!(store.is_empty());
        assert!(res.get_header("set-cookie").unwrap().contains("Max-Age=0"));
    }
}
