use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::SESSION_TTL_SECS;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie that carries the signed session id.
pub const SESSION_COOKIE_NAME: &str = "sessionId";

/// Signs and verifies cookie values as `<value>.<base64url(hmac-sha256)>`.
#[derive(Clone)]
pub struct CookieSigner {
    mac: HmacSha256,
}

impl CookieSigner {
    pub fn new(secret: &str) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret.as_bytes())?,
        })
    }

    pub fn sign(&self, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        let tag = mac.finalize().into_bytes();
        format!("{value}.{}", URL_SAFE_NO_PAD.encode(tag))
    }

    /// Return the original value when the signature checks out.
    pub fn unsign<'a>(&self, signed: &'a str) -> Option<&'a str> {
        let (value, tag) = signed.rsplit_once('.')?;
        let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        mac.verify_slice(&tag).ok()?;
        Some(value)
    }
}

/// Attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub max_age_secs: i64,
    pub http_only: bool,
    pub secure: bool,
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_string(),
            max_age_secs: SESSION_TTL_SECS,
            http_only: true,
            secure: false,
        }
    }
}

impl SessionCookie {
    /// `Set-Cookie` value carrying `signed_value`.
    pub fn set_cookie(&self, signed_value: &str) -> String {
        self.render(signed_value, self.max_age_secs)
    }

    /// `Set-Cookie` value that makes the client drop the cookie.
    pub fn clear_cookie(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            self.name,
            urlencoding::encode(value),
            max_age
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_unsign() {
        let signer = CookieSigner::new("secret").unwrap();
        let signed = signer.sign("01HXYZ");
        assert!(signed.starts_with("01HXYZ."));
        assert_eq!(signer.unsign(&signed), Some("01HXYZ"));
    }

    #[test]
    fn test_tampered_value_is_rejected() {
        let signer = CookieSigner::new("secret").unwrap();
        let signed = signer.sign("alice");
        let forged = signed.replacen("alice", "mallory", 1);
        assert_eq!(signer.unsign(&forged), None);
        assert_eq!(signer.unsign("no-signature"), None);
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let signed = CookieSigner::new("one").unwrap().sign("id");
        assert_eq!(CookieSigner::new("two").unwrap().unsign(&signed), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = SessionCookie::default().set_cookie("abc.def");
        assert_eq!(
            cookie,
            "sessionId=abc.def; Path=/; Max-Age=2592000; SameSite=Lax; HttpOnly"
        );
        let secure = SessionCookie {
            secure: true,
            ..SessionCookie::default()
        };
        assert!(secure.clear_cookie().ends_with("Max-Age=0; SameSite=Lax; HttpOnly; Secure"));
    }
}
