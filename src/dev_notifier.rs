//! # Dev-Mode Notifier
//!
//! A companion TCP listener that only runs in development, one port above
//! the main server. Connected clients (a browser live-reload helper, an
//! editor plugin, `nc localhost 3001`) receive a `reload\n` line whenever a
//! file under the watched directories changes.
//!
//! ## Lifecycle
//!
//! - Bind failure is reported to the caller, which logs it and carries on:
//!   the main server never depends on the notifier.
//! - A background thread accepts clients for the life of the process.
//! - A `notify` watcher observes the views and public directories. On a
//!   change the template cache is dropped so the next render reads the new
//!   files, then every client is told to reload.
//! - Writes to a client give up after [`WRITE_TIMEOUT`], so a client that
//!   stops reading is dropped instead of stalling the others. Clients that
//!   have hung up are forgotten on the next broadcast or the next connection.

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::io::{self, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::views::Views;

/// Message sent to every client on change.
pub const RELOAD_MESSAGE: &[u8] = b"reload\n";

/// Longest a single client write may block.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Clients {
    streams: Mutex<Vec<TcpStream>>,
}

impl Clients {
    /// Track a new client and forget the ones that have hung up.
    fn add(&self, stream: TcpStream) {
        let mut streams = self.streams.lock();
        streams.retain(is_open);
        streams.push(stream);
    }

    fn len(&self) -> usize {
        self.streams.lock().len()
    }

    /// Write `msg` to every client, dropping the ones that fail.
    ///
    /// The list is taken out of the lock while writing so that new clients
    /// can still be accepted.
    fn broadcast(&self, msg: &[u8]) -> usize {
        let pending = std::mem::take(&mut *self.streams.lock());
        let alive: Vec<TcpStream> = pending
            .into_iter()
            .filter_map(|mut s| s.write_all(msg).and_then(|()| s.flush()).ok().map(|()| s))
            .collect();
        let mut streams = self.streams.lock();
        streams.extend(alive);
        streams.len()
    }
}

/// Whether the peer is still connected, checked without blocking.
fn is_open(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut buf = [0u8; 1];
    let open = match stream.peek(&mut buf) {
        Ok(0) => false,
        Ok(_) => true,
        Err(e) => e.kind() == ErrorKind::WouldBlock,
    };
    open && stream.set_nonblocking(false).is_ok()
}

/// Handle to a running notifier. Dropping it stops the file watcher; the
/// accept thread keeps running until the process exits.
pub struct DevNotifier {
    addr: SocketAddr,
    clients: Arc<Clients>,
    views: Arc<Views>,
    _watcher: Option<RecommendedWatcher>,
}

impl DevNotifier {
    /// Bind `addr` and start accepting clients, watching `watch_dirs`.
    ///
    /// # Errors
    ///
    /// Returns the bind error; watcher failures are only logged.
    pub fn start(addr: SocketAddr, views: Arc<Views>, watch_dirs: &[PathBuf]) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        let clients = Arc::new(Clients::default());

        let accept_clients = Arc::clone(&clients);
        thread::Builder::new()
            .name("dev-notifier".to_string())
            .spawn(move || accept_loop(&listener, &accept_clients))?;

        let watcher = match watch(watch_dirs, Arc::clone(&views), Arc::clone(&clients)) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(error = %e, "dev notifier: file watcher unavailable");
                None
            }
        };

        info!(port = addr.port(), "Dev notifier is running on port {}", addr.port());
        Ok(Self {
            addr,
            clients,
            views,
            _watcher: watcher,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Drop cached templates and tell every client to reload. Returns the
    /// number of clients still connected.
    pub fn notify_reload(&self) -> usize {
        reload(&self.views, &self.clients)
    }
}

fn reload(views: &Views, clients: &Clients) -> usize {
    views.reload();
    let delivered = clients.broadcast(RELOAD_MESSAGE);
    debug!(clients = delivered, "dev notifier: reload broadcast");
    delivered
}

fn accept_loop(listener: &TcpListener, clients: &Clients) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let peer = stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_default();
                if let Err(e) = stream.set_write_timeout(Some(WRITE_TIMEOUT)) {
                    warn!(peer = %peer, error = %e, "dev notifier: client rejected");
                    continue;
                }
                debug!(peer = %peer, "dev notifier: client connected");
                clients.add(stream);
            }
            Err(e) => warn!(error = %e, "dev notifier: accept failed"),
        }
    }
}

fn watch(
    dirs: &[PathBuf],
    views: Arc<Views>,
    clients: Arc<Clients>,
) -> notify::Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    debug!(paths = ?event.paths, "dev notifier: change detected");
                    reload(&views, &clients);
                }
            }
            Err(e) => warn!(error = %e, "dev notifier: watch error"),
        },
        Config::default(),
    )?;

    for dir in dirs {
        if dir.is_dir() {
            watcher.watch(dir, RecursiveMode::Recursive)?;
        } else {
            warn!(dir = %dir.display(), "dev notifier: not watching missing directory");
        }
    }
    Ok(watcher)
}
