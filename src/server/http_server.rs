use super::service::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::Server;
use tracing::{debug, info, warn};

/// Wrapper around a `tiny_http` server driven by a fixed pool of worker threads
///
/// Every worker blocks on the shared listener and runs the service for each
/// request it receives.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it gracefully,
/// or joining the worker threads.
pub struct ServerHandle {
    addr: SocketAddr,
    server: Arc<Server>,
    workers: Vec<JoinHandle<()>>,
    stopping: Arc<AtomicBool>,
}

/// Cloneable, thread-safe way to ask a server to stop.
///
/// Used by the signal thread while the main thread sits in [`ServerHandle::join`].
#[derive(Clone)]
pub struct ShutdownTrigger {
    server: Arc<Server>,
    stopping: Arc<AtomicBool>,
    workers: usize,
}

impl ShutdownTrigger {
    /// Stop accepting work and wake every blocked worker.
    pub fn fire(&self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        for _ in 0..self.workers {
            self.server.unblock();
        }
    }
}

impl ServerHandle {
    /// The address the listener is bound to (useful when binding port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// Polls the server address by attempting TCP connections until successful.
    /// Useful in tests to ensure the server is fully started before sending requests.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` error if the server doesn't become ready within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            server: Arc::clone(&self.server),
            stopping: Arc::clone(&self.stopping),
            workers: self.workers.len(),
        }
    }

    /// Stop the server gracefully
    ///
    /// Requests already being handled finish; the workers then exit and are
    /// joined. Consumes the handle.
    pub fn stop(self) {
        self.shutdown_trigger().fire();
        if self.join().is_err() {
            warn!("a server worker panicked during shutdown");
        }
    }

    /// Wait for every worker thread to complete
    ///
    /// Blocks until the server is stopped through a [`ShutdownTrigger`].
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread panicked.
    pub fn join(self) -> thread::Result<()> {
        let mut result = Ok(());
        for worker in self.workers {
            if let Err(e) = worker.join() {
                result = Err(e);
            }
        }
        info!(addr = %self.addr, "server stopped");
        result
    }
}

impl<T: HttpService> HttpServer<T> {
    /// Start the HTTP server on the given address
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to bind to (e.g., `"0.0.0.0:8080"` or `"127.0.0.1:0"`)
    /// * `workers` - Number of worker threads (at least one is started)
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A, workers: usize) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let server = Server::http(addr).map_err(io::Error::other)?;
        let bound = server.server_addr().to_ip().unwrap_or(addr);
        let server = Arc::new(server);
        let service = Arc::new(self.0);
        let stopping = Arc::new(AtomicBool::new(false));

        let worker_count = workers.max(1);
        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let server = Arc::clone(&server);
            let service = Arc::clone(&service);
            let stopping = Arc::clone(&stopping);
            let handle = thread::Builder::new()
                .name(format!("http-worker-{id}"))
                .spawn(move || worker_loop(&server, service.as_ref(), &stopping))?;
            handles.push(handle);
        }
        debug!(addr = %bound, workers = worker_count, "http workers started");

        Ok(ServerHandle {
            addr: bound,
            server,
            workers: handles,
            stopping,
        })
    }
}

fn worker_loop<T: HttpService>(server: &Server, service: &T, stopping: &AtomicBool) {
    loop {
        match server.recv() {
            Ok(request) => service.call(request),
            Err(e) => {
                if stopping.load(Ordering::SeqCst) {
                    break;
                }
                warn!(error = %e, "failed to receive request");
            }
        }
    }
}
