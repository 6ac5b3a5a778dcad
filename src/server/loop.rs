// Server loop module
// Accepts connections until shutdown is requested

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use super::ServerState;
use crate::logger;

/// Accept connections on `listener` until `shutdown` is notified.
///
/// Connections are served with `spawn_local`, so this must run inside a
/// `LocalSet`. Connections still in flight when the loop returns are not
/// awaited.
pub async fn start_server_loop(listener: TcpListener, state: Arc<ServerState>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.notified() => {
                logger::log_info("Server loop stopped accepting connections");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::RequestHandler;
    use crate::resolver::PathResolver;
    use crate::server::create_reusable_listener;
    use std::fs;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn roundtrip(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream.write_all(request.as_bytes()).await.expect("write request");
        let mut buf = Vec::new();
        // A rejected connection is closed without a response
        let _ = stream.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn state_for(root: &std::path::Path, max_connections: Option<u64>) -> Arc<ServerState> {
        let mut config = Config::defaults().expect("defaults");
        config.logging.access_log = false;
        config.performance.max_connections = max_connections;
        Arc::new(ServerState::new(RequestHandler::new(PathResolver::new(root)), config))
    }

    #[tokio::test]
    async fn test_serves_files_until_shutdown() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("hello.html"), "<p>hi</p>").expect("write file");

        let listener = create_reusable_listener("127.0.0.1:0".parse().expect("addr")).expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let shutdown = Arc::new(Notify::new());
        let state = state_for(dir.path(), None);

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(listener, state, Arc::clone(&shutdown)));

                let ok = roundtrip(addr, "GET /hello HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
                assert!(ok.starts_with("HTTP/1.1 200"), "{ok}");
                assert!(ok.ends_with("<p>hi</p>"), "{ok}");

                let missing = roundtrip(addr, "GET /nope HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
                assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

                shutdown.notify_one();
                server.await.expect("server loop exits");
            })
            .await;
    }

    #[tokio::test]
    async fn test_connection_limit_rejects() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let listener = create_reusable_listener("127.0.0.1:0".parse().expect("addr")).expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let shutdown = Arc::new(Notify::new());
        let state = state_for(dir.path(), Some(0));

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    Arc::clone(&state),
                    Arc::clone(&shutdown),
                ));

                let reply = roundtrip(addr, "GET / HTTP/1.1\r\nHost: test\r\n\r\n").await;
                assert!(reply.is_empty(), "{reply}");
                assert_eq!(state.active_connections.load(std::sync::atomic::Ordering::SeqCst), 0);

                shutdown.notify_one();
                server.await.expect("server loop exits");
            })
            .await;
    }
}
