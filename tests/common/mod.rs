#![allow(dead_code)]

pub mod http {
    use std::collections::HashMap;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// A response read back off the wire.
    #[derive(Debug)]
    pub struct TestResponse {
        pub status: u16,
        /// Header names lowercased; repeated headers keep every value
        pub headers: HashMap<String, Vec<String>>,
        pub body: String,
    }

    impl TestResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .get(&name.to_ascii_lowercase())
                .and_then(|v| v.first())
                .map(String::as_str)
        }

        /// `name=value` of the first `Set-Cookie`, ready to send back.
        pub fn cookie_pair(&self) -> Option<String> {
            self.header("set-cookie")
                .and_then(|c| c.split(';').next())
                .map(str::to_string)
        }
    }

    /// Send one request with `Connection: close` and read the full response.
    pub fn send(addr: SocketAddr, method: &str, target: &str, headers: &[(&str, &str)], body: &str) -> TestResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();

        let mut req = format!("{method} {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
        for (name, value) in headers {
            req.push_str(&format!("{name}: {value}\r\n"));
        }
        if !body.is_empty() || method == "POST" {
            req.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        req.push_str("\r\n");
        req.push_str(body);
        stream.write_all(req.as_bytes()).unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).unwrap();
        parse_response(&raw)
    }

    pub fn get(addr: SocketAddr, target: &str) -> TestResponse {
        send(addr, "GET", target, &[], "")
    }

    pub fn get_with_cookie(addr: SocketAddr, target: &str, cookie: &str) -> TestResponse {
        send(addr, "GET", target, &[("Cookie", cookie)], "")
    }

    pub fn post_form(addr: SocketAddr, target: &str, body: &str, cookie: Option<&str>) -> TestResponse {
        let mut headers = vec![("Content-Type", "application/x-www-form-urlencoded")];
        if let Some(cookie) = cookie {
            headers.push(("Cookie", cookie));
        }
        send(addr, "POST", target, &headers, body)
    }

    fn parse_response(raw: &[u8]) -> TestResponse {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has a header terminator");
        let head = String::from_utf8_lossy(&raw[..split]).to_string();
        let mut body = raw[split + 4..].to_vec();

        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap();
        let status = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .expect("status code");

        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers
                    .entry(name.trim().to_ascii_lowercase())
                    .or_default()
                    .push(value.trim().to_string());
            }
        }

        let chunked = headers
            .get("transfer-encoding")
            .is_some_and(|v| v.iter().any(|e| e.eq_ignore_ascii_case("chunked")));
        if chunked {
            body = dechunk(&body);
        }

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        }
    }

    fn dechunk(mut data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let Some(pos) = data.windows(2).position(|w| w == b"\r\n") else {
                break;
            };
            let size_str = String::from_utf8_lossy(&data[..pos]);
            let size = usize::from_str_radix(size_str.split(';').next().unwrap().trim(), 16).unwrap_or(0);
            if size == 0 {
                break;
            }
            let start = pos + 2;
            out.extend_from_slice(&data[start..start + size]);
            data = &data[start + size + 2..];
        }
        out
    }
}

pub mod test_server {
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::sync::Arc;

    use storefront::app::build_service;
    use storefront::runtime_config::{Environment, RuntimeConfig};
    use storefront::server::{HttpServer, ServerHandle};
    use storefront::session::SqliteSessionStore;
    use storefront::views::Views;

    fn project_dir(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(name)
    }

    /// A running server on an ephemeral port with its own session database.
    ///
    /// Stops the server on drop.
    pub struct TestServer {
        handle: Option<ServerHandle>,
        addr: SocketAddr,
        _db_dir: tempfile::TempDir,
    }

    impl TestServer {
        pub fn start() -> Self {
            Self::start_in("production")
        }

        pub fn start_in(environment: &str) -> Self {
            let db_dir = tempfile::tempdir().unwrap();
            let config = RuntimeConfig {
                environment: Environment::new(environment),
                host: "127.0.0.1".into(),
                port: 0,
                session_secret: "integration-test-secret".into(),
                session_db: db_dir.path().join("sessions.db"),
                views_dir: project_dir("views"),
                public_dir: project_dir("public"),
                workers: 2,
                ..RuntimeConfig::default()
            };

            let store = SqliteSessionStore::connect(&config.session_db).unwrap();
            store.verify().unwrap();
            store.ensure_schema().unwrap();
            let views = Arc::new(Views::from_dir(config.views_dir.clone()));
            let service = build_service(&config, Arc::new(store), views).unwrap();

            let handle = HttpServer(service)
                .start(config.listen_addr(), config.workers)
                .unwrap();
            handle.wait_ready().unwrap();
            let addr = handle.addr();

            Self {
                handle: Some(handle),
                addr,
                _db_dir: db_dir,
            }
        }

        pub fn addr(&self) -> SocketAddr {
            self.addr
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }
}

pub mod process {
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::path::Path;
    use std::process::{Child, ChildStdout, Command, Stdio};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// The compiled binary with piped output and JSON logs.
    pub fn storefront() -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_storefront"));
        cmd.current_dir(env!("CARGO_MANIFEST_DIR"))
            .env_remove("RUST_LOG")
            .env("HOST", "127.0.0.1")
            .env("LOG_FORMAT", "json")
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        cmd
    }

    /// A port that was free a moment ago, with the next port free as well.
    pub fn free_port_pair() -> u16 {
        loop {
            let port = TcpListener::bind("127.0.0.1:0")
                .unwrap()
                .local_addr()
                .unwrap()
                .port();
            if port < u16::MAX && TcpListener::bind(("127.0.0.1", port + 1)).is_ok() {
                return port;
            }
        }
    }

    /// Kills the child on drop so a failing assertion never leaks a server.
    pub struct Running {
        child: Child,
        lines: mpsc::Receiver<String>,
    }

    impl Running {
        pub fn spawn(mut cmd: Command, session_dir: &Path) -> Self {
            let mut child = cmd
                .env("SESSION_DB", session_dir.join("sessions.db"))
                .spawn()
                .unwrap();
            let stdout = child.stdout.take().unwrap();
            Self {
                child,
                lines: forward_lines(stdout),
            }
        }

        /// Wait for a log line containing `needle`.
        pub fn wait_for_log(&self, needle: &str) -> Option<String> {
            loop {
                match self.lines.recv_timeout(Duration::from_secs(20)) {
                    Ok(line) if line.contains(needle) => return Some(line),
                    Ok(_) => continue,
                    Err(_) => return None,
                }
            }
        }
    }

    impl Drop for Running {
        fn drop(&mut self) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }

    fn forward_lines(stdout: ChildStdout) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        rx
    }
}
