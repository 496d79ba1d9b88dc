//! # Runtime Configuration Module
//!
//! The resolved, immutable configuration the server runs with. It is built
//! once from the command line (see [`crate::cli`]), where every flag also
//! has an environment variable fallback, and then shared read-only.
//!
//! ## Environment designation
//!
//! `NODE_ENV` names the deployment environment. Any value containing `dev`
//! (`development`, `dev`, `devel`) enables development behaviour:
//!
//! - the dev-mode notifier listens on `PORT + 1`
//! - error pages include the stack trace
//!
//! Everything else, including the default `production`, is treated as
//! production.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::logging::LogConfig;

/// Cookie-signing key used when none is configured. Never use in production.
pub const PLACEHOLDER_SESSION_SECRET: &str = "insecure-default-session-secret";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Deployment environment designation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring match on `dev`, case-sensitive like the variable itself.
    pub fn is_development(&self) -> bool {
        self.0.contains("dev")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("production")
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runtime configuration for one server process.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    /// SQLite file holding the session table
    pub session_db: PathBuf,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
    pub views_dir: PathBuf,
    pub public_dir: PathBuf,
    /// Worker threads serving requests
    pub workers: usize,
    /// Largest accepted request body in bytes
    pub body_limit: usize,
    pub log: LogConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            session_secret: PLACEHOLDER_SESSION_SECRET.to_string(),
            session_db: PathBuf::from("sessions.db"),
            cookie_secure: false,
            views_dir: PathBuf::from("views"),
            public_dir: PathBuf::from("public"),
            workers: 4,
            body_limit: DEFAULT_BODY_LIMIT,
            log: LogConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// `host:port` for the main listener.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Address of the dev-mode notifier: same host, one port above the main
    /// listener. `None` when the main port is the last one.
    pub fn dev_notifier_addr(&self, bound: SocketAddr) -> Option<SocketAddr> {
        let port = bound.port().checked_add(1)?;
        Some(SocketAddr::new(bound.ip(), port))
    }

    /// Configuration choices that are risky outside development.
    pub fn security_warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.session_secret == PLACEHOLDER_SESSION_SECRET {
            warnings.push("SESSION_SECRET is not set; using the insecure placeholder");
        }
        if !self.environment.is_development() && !self.cookie_secure {
            warnings.push("session cookie is not marked Secure in production; set COOKIE_SECURE=true behind TLS");
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_substring_match() {
        assert!(Environment::new("development").is_development());
        assert!(Environment::new("my-dev-box").is_development());
        assert!(!Environment::new("production").is_development());
        assert!(!Environment::new("DEV").is_development());
        assert!(!Environment::default().is_development());
    }

    #[test]
    fn test_listen_addr() {
        let mut config = RuntimeConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        config.host = "::1".into();
        config.port = 8080;
        assert_eq!(config.listen_addr(), "[::1]:8080");
    }

    #[test]
    fn test_dev_notifier_port_overflow() {
        let config = RuntimeConfig::default();
        let bound: SocketAddr = "127.0.0.1:65535".parse().unwrap();
        assert_eq!(config.dev_notifier_addr(bound), None);
        let bound: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        assert_eq!(
            config.dev_notifier_addr(bound),
            Some("127.0.0.1:4001".parse().unwrap())
        );
    }

    #[test]
    fn test_security_warnings() {
        let config = RuntimeConfig::default();
        assert_eq!(config.security_warnings().len(), 2);

        let config = RuntimeConfig {
            environment: Environment::new("development"),
            session_secret: "a real secret".into(),
            ..RuntimeConfig::default()
        };
        assert!(config.security_warnings().is_empty());

        let config = RuntimeConfig {
            session_secret: "a real secret".into(),
            cookie_secure: true,
            ..RuntimeConfig::default()
        };
        assert!(config.security_warnings().is_empty());
    }
}
