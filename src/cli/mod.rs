//! # CLI Module
//!
//! Command-line interface of the `storefront` binary.
//!
//! Every option can also be supplied through an environment variable, which
//! is how the server is usually configured in deployment:
//!
//! ```bash
//! NODE_ENV=development PORT=3000 SESSION_SECRET=change-me storefront
//! # equivalent
//! storefront --environment development --port 3000 --session-secret change-me
//! ```
//!
//! | Flag | Env | Default |
//! |---|---|---|
//! | `--environment` | `NODE_ENV` | `production` |
//! | `--host` | `HOST` | `0.0.0.0` |
//! | `--port` | `PORT` | `3000` |
//! | `--session-secret` | `SESSION_SECRET` | insecure placeholder |
//! | `--session-db` | `SESSION_DB` | `sessions.db` |
//! | `--cookie-secure` | `COOKIE_SECURE` | `false` |
//! | `--views-dir` | `VIEWS_DIR` | `views` |
//! | `--public-dir` | `PUBLIC_DIR` | `public` |
//! | `--workers` | `WORKERS` | `4` |
//! | `--body-limit` | `BODY_LIMIT` | `102400` |
//! | `--log-level` | `LOG_LEVEL` | `info` |
//! | `--log-format` | `LOG_FORMAT` | `pretty` |
//!
//! `RUST_LOG`, when set, overrides `--log-level` with a full filter directive.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::Cli;
