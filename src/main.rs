use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use storefront::app::build_service;
use storefront::cli::Cli;
use storefront::dev_notifier::DevNotifier;
use storefront::logging::init_logging;
use storefront::runtime_config::RuntimeConfig;
use storefront::server::{HttpServer, ServerHandle};
use storefront::session::{now_unix, SessionStore, SqliteSessionStore};
use storefront::views::Views;

fn main() -> ExitCode {
    let config = Cli::parse().into_config();
    let _log_guard = match init_logging(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("storefront: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "storefront failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &RuntimeConfig) -> Result<()> {
    info!(
        environment = %config.environment,
        session_db = %config.session_db.display(),
        "starting storefront"
    );

    // The database must be reachable and the session table in place before
    // any traffic is accepted.
    let store = SqliteSessionStore::connect(&config.session_db)
        .context("failed to open session database")?;
    store.verify().context("session database is unreachable")?;
    store
        .ensure_schema()
        .context("failed to create session table")?;
    match store.prune_expired(now_unix()) {
        Ok(removed) => info!(removed, "expired sessions pruned"),
        Err(e) => warn!(error = %e, "failed to prune expired sessions"),
    }

    for warning in config.security_warnings() {
        warn!(environment = %config.environment, "{warning}");
    }

    let views = Arc::new(Views::from_dir(config.views_dir.clone()));
    if !views.dir().is_dir() {
        warn!(dir = %views.dir().display(), "views directory not found");
    }
    let service = build_service(config, Arc::new(store), Arc::clone(&views))?;

    let handle = HttpServer(service)
        .start(config.listen_addr(), config.workers)
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    info!(
        addr = %handle.addr(),
        workers = config.workers,
        "Server is running on http://127.0.0.1:{}",
        handle.addr().port()
    );

    let _notifier = if config.environment.is_development() {
        start_dev_notifier(config, &handle, views)
    } else {
        None
    };

    #[cfg(unix)]
    spawn_signal_listener(&handle)?;

    handle
        .join()
        .map_err(|_| anyhow!("a server worker panicked"))
}

/// Start the notifier one port above the server. Any failure is logged and
/// the server keeps running without it.
fn start_dev_notifier(
    config: &RuntimeConfig,
    handle: &ServerHandle,
    views: Arc<Views>,
) -> Option<DevNotifier> {
    let Some(addr) = config.dev_notifier_addr(handle.addr()) else {
        warn!(port = handle.addr().port(), "no port available for the dev notifier");
        return None;
    };
    let watch_dirs = [config.views_dir.clone(), config.public_dir.clone()];
    match DevNotifier::start(addr, views, &watch_dirs) {
        Ok(notifier) => Some(notifier),
        Err(e) => {
            error!(addr = %addr, error = %e, "dev notifier failed to start");
            None
        }
    }
}

#[cfg(unix)]
fn spawn_signal_listener(handle: &ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    let trigger = handle.shutdown_trigger();
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(signal, "shutdown signal received");
                trigger.fire();
            }
        })
        .context("failed to spawn signal thread")?;
    Ok(())
}
