use clap::Parser;
use std::path::PathBuf;

use crate::logging::{LogConfig, LogFormat};
use crate::runtime_config::{Environment, RuntimeConfig, PLACEHOLDER_SESSION_SECRET};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(version, about = "Server-rendered storefront with sessions and flash messages", long_about = None)]
pub struct Cli {
    /// Deployment environment; any value containing "dev" enables development mode
    #[arg(long, env = "NODE_ENV", default_value = "production")]
    pub environment: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Key used to sign the session cookie
    #[arg(long, env = "SESSION_SECRET", default_value = PLACEHOLDER_SESSION_SECRET, hide_env_values = true)]
    pub session_secret: String,

    /// SQLite database file for sessions
    #[arg(long, env = "SESSION_DB", default_value = "sessions.db")]
    pub session_db: PathBuf,

    /// Mark the session cookie Secure (requires TLS in front of the server)
    #[arg(long, env = "COOKIE_SECURE", default_value_t = false)]
    pub cookie_secure: bool,

    #[arg(long, env = "VIEWS_DIR", default_value = "views")]
    pub views_dir: PathBuf,

    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    #[arg(long, env = "WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "BODY_LIMIT", default_value_t = 102_400)]
    pub body_limit: usize,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Resolve the parsed arguments into the runtime configuration.
    pub fn into_config(self) -> RuntimeConfig {
        let non_blocking = self.log_format == LogFormat::Json;
        RuntimeConfig {
            environment: Environment::new(self.environment),
            host: self.host,
            port: self.port,
            session_secret: self.session_secret,
            session_db: self.session_db,
            cookie_secure: self.cookie_secure,
            views_dir: self.views_dir,
            public_dir: self.public_dir,
            workers: self.workers.max(1),
            body_limit: self.body_limit,
            log: LogConfig {
                level: self.log_level,
                format: self.log_format,
                non_blocking,
            },
        }
    }
}
