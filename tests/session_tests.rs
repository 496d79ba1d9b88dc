//! Integration tests for sessions and flash messages
//!
//! The contact form is the only route that writes to the session: a POST
//! queues a flash message and redirects back to `/contact`, which shows it
//! exactly once.

mod common;

use common::http::{get, get_with_cookie, post_form};
use common::test_server::TestServer;

#[test]
fn test_plain_page_does_not_create_session() {
    let server = TestServer::start();
    let res = get(server.addr(), "/");
    assert_eq!(res.status, 200);
    assert!(res.header("set-cookie").is_none());
}

#[test]
fn test_contact_post_sets_signed_cookie_and_redirects() {
    let server = TestServer::start();
    let res = post_form(
        server.addr(),
        "/contact",
        "name=Ada&email=ada%40example.com&message=Hello+there",
        None,
    );
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/contact"));

    let set_cookie = res.header("set-cookie").expect("session cookie");
    assert!(set_cookie.starts_with("sessionId="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=2592000"));
    assert!(!set_cookie.contains("Secure"));
}

#[test]
fn test_flash_is_shown_once() {
    let server = TestServer::start();
    let res = post_form(
        server.addr(),
        "/contact",
        "name=Ada&message=Hello",
        None,
    );
    let cookie = res.cookie_pair().expect("session cookie");

    let shown = get_with_cookie(server.addr(), "/contact", &cookie);
    assert_eq!(shown.status, 200);
    assert!(shown.body.contains("flash-success"));
    assert!(shown.body.contains("Thanks, Ada!"));

    let again = get_with_cookie(server.addr(), "/contact", &cookie);
    assert_eq!(again.status, 200);
    assert!(!again.body.contains("flash-success"));
}

#[test]
fn test_incomplete_form_flashes_error() {
    let server = TestServer::start();
    let res = post_form(server.addr(), "/contact", "name=&message=", None);
    assert_eq!(res.status, 302);
    let cookie = res.cookie_pair().expect("session cookie");

    let page = get_with_cookie(server.addr(), "/contact", &cookie);
    assert!(page.body.contains("flash-error"));
    assert!(page.body.contains("Please provide your name and a message."));
}

#[test]
fn test_session_is_reused_across_posts() {
    let server = TestServer::start();
    let first = post_form(server.addr(), "/contact", "name=A&message=1", None);
    let cookie = first.cookie_pair().unwrap();

    let second = post_form(server.addr(), "/contact", "name=B&message=2", Some(&cookie));
    assert_eq!(second.cookie_pair().as_deref(), Some(cookie.as_str()));

    let page = get_with_cookie(server.addr(), "/contact", &cookie);
    assert!(page.body.contains("Thanks, A!"));
    assert!(page.body.contains("Thanks, B!"));
}

#[test]
fn test_tampered_cookie_is_ignored() {
    let server = TestServer::start();
    let res = post_form(server.addr(), "/contact", "name=Ada&message=Hi", None);
    let cookie = res.cookie_pair().unwrap();
    let tampered = format!("{cookie}x");

    let page = get_with_cookie(server.addr(), "/contact", &tampered);
    assert_eq!(page.status, 200);
    assert!(!page.body.contains("Thanks, Ada!"));
}

#[test]
fn test_static_assets_do_not_consume_flash() {
    let server = TestServer::start();
    let res = post_form(server.addr(), "/contact", "name=Ada&message=Hi", None);
    let cookie = res.cookie_pair().unwrap();

    // Static assets are answered before the session is loaded.
    let css = get_with_cookie(server.addr(), "/css/styles.css", &cookie);
    assert_eq!(css.status, 200);
    let page = get_with_cookie(server.addr(), "/about", &cookie);
    assert!(page.body.contains("Thanks, Ada!"));
}

#[test]
fn test_redirect_does_not_consume_flash() {
    let server = TestServer::start();
    let res = post_form(server.addr(), "/contact", "name=Ada&message=Hi", None);
    let cookie = res.cookie_pair().unwrap();

    let redirect = get_with_cookie(server.addr(), "/products", &cookie);
    assert_eq!(redirect.status, 302);
    let page = get_with_cookie(server.addr(), "/contact", &cookie);
    assert!(page.body.contains("Thanks, Ada!"));
}
