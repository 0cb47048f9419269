//! Development server fronting the hot-reloaded application.
//!
//! Every request asks the coordinator for the current handler exactly once,
//! so a reload that lands mid-request never mixes two generations.

mod lifecycle;
mod response;

pub use response::GENERATION_HEADER;

use crate::app::UnitApp;
use crate::config::cfg;
use crate::reload::{CoordinatorState, ReloadCoordinator};
use crate::{debug, log};
use anyhow::{Context, Result};
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Number of request worker threads.
const REQUEST_WORKERS: usize = 4;

/// Coordinator type served by the dev server.
pub type AppCoordinator = ReloadCoordinator<UnitApp>;

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    lifecycle::register_server_for_shutdown(Arc::clone(&server));

    log!("serve"; "http://{}", addr);
    Ok(BoundServer { server })
}

impl BoundServer {
    /// Run the request loop until the server is unblocked (blocking).
    pub fn run(self, coordinator: Arc<AppCoordinator>) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_WORKERS)
            .thread_name(|i| format!("warmswap-http-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        for request in self.server.incoming_requests() {
            let coordinator = Arc::clone(&coordinator);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &coordinator) {
                    log!("serve"; "request error: {e}");
                }
            });
        }

        debug!("serve"; "request loop finished");
        Ok(())
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, coordinator: &AppCoordinator) -> Result<()> {
    if crate::core::is_shutdown() || coordinator.state() == CoordinatorState::Stopped {
        return response::respond_unavailable(request);
    }
    if !response::is_read_request(&request) {
        return response::respond_method_not_allowed(request);
    }

    let handler = coordinator.handler();
    match handler.respond(request.url()) {
        Some(body) => response::respond_route(request, body, handler.generation()),
        None => response::respond_not_found(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::Container;
    use crate::unit::UnitName;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_app(dir: &Path, body: &str) {
        let path = dir.join("com/example/App.unit");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!(
                "unit com.example.App\nmethod <init> ()V\n  ldc str \"/hello\"\n  ldc str \"{body}\"\n  \
                 invoke virtual com.example.Router get (Ljava/lang/String;Ljava/lang/String;)V\nend\n"
            ),
        )
        .unwrap();
    }

    fn coordinator(dir: &Path) -> Arc<AppCoordinator> {
        let app = UnitApp::new(dir, UnitName::new("com.example.App"));
        let container = app.boot().unwrap();
        ReloadCoordinator::new(dir, container, app).unwrap()
    }

    /// Serve exactly one request on an ephemeral port and return the raw response.
    fn roundtrip(coordinator: Arc<AppCoordinator>, raw_request: &str) -> String {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();

        let worker = std::thread::spawn(move || {
            let request = server.recv().unwrap();
            handle_request(request, &coordinator).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(raw_request.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        worker.join().unwrap();
        response
    }

    const GET_HELLO: &str = "GET /hello HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";

    #[test]
    fn test_serves_route_from_current_handler() {
        let dir = TempDir::new().unwrap();
        write_app(dir.path(), "v1");

        let response = roundtrip(coordinator(dir.path()), GET_HELLO);
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("X-Warmswap-Generation: 1"));
        assert!(response.ends_with("v1"));
    }

    #[test]
    fn test_serves_reloaded_handler() {
        let dir = TempDir::new().unwrap();
        write_app(dir.path(), "v1");
        let coordinator = coordinator(dir.path());

        write_app(dir.path(), "v2");
        coordinator.on_change(Path::new("com/example/App.unit"));
        assert_eq!(coordinator.container().handler().generation(), 2);

        let response = roundtrip(coordinator, GET_HELLO);
        assert!(response.ends_with("v2"));
    }

    #[test]
    fn test_unknown_route_is_404() {
        let dir = TempDir::new().unwrap();
        write_app(dir.path(), "v1");

        let response = roundtrip(
            coordinator(dir.path()),
            "GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        );
        assert!(response.starts_with("HTTP/1.1 404"));
    }

    #[test]
    fn test_post_is_405() {
        let dir = TempDir::new().unwrap();
        write_app(dir.path(), "v1");

        let response = roundtrip(
            coordinator(dir.path()),
            "POST /hello HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        assert!(response.starts_with("HTTP/1.1 405"));
    }
}
