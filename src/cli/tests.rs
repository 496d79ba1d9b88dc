//! Unit tests for argument parsing

use crate::cli::Cli;
use crate::logging::LogFormat;
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_explicit_flags_override_everything() {
    let cli = Cli::try_parse_from([
        "storefront",
        "--environment",
        "development",
        "--host",
        "127.0.0.1",
        "--port",
        "4000",
        "--session-secret",
        "s3cret",
        "--session-db",
        "/tmp/s.db",
        "--cookie-secure",
        "--workers",
        "0",
        "--body-limit",
        "10",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ])
    .unwrap();

    let config = cli.into_config();
    assert!(config.environment.is_development());
    assert_eq!(config.listen_addr(), "127.0.0.1:4000");
    assert_eq!(config.session_secret, "s3cret");
    assert_eq!(config.session_db, PathBuf::from("/tmp/s.db"));
    assert!(config.cookie_secure);
    assert_eq!(config.workers, 1);
    assert_eq!(config.body_limit, 10);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.format, LogFormat::Json);
    assert!(config.log.non_blocking);
}

#[test]
fn test_invalid_port_is_rejected() {
    assert!(Cli::try_parse_from(["storefront", "--port", "70000"]).is_err());
    assert!(Cli::try_parse_from(["storefront", "--port", "abc"]).is_err());
}

#[test]
fn test_invalid_log_format_is_rejected() {
    assert!(Cli::try_parse_from(["storefront", "--log-format", "xml"]).is_err());
}
