//! Shared dummy-backend harness for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use steer::Proxy;

/// Start a dummy backend answering every request with `OK from <port>`.
pub async fn start_dummy_backend(port: u16) {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))
        .await
        .unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(respond(socket, 200, format!("OK from {port}")));
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a dummy backend that can be stopped (releasing its port) through
/// the returned handle.
pub async fn start_stoppable_backend(port: u16) -> oneshot::Sender<()> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))
        .await
        .unwrap();
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((socket, _)) => {
                        tokio::spawn(respond(socket, 200, format!("OK from {port}")));
                    }
                    Err(_) => break,
                },
                _ = &mut stop_rx => break,
            }
        }
    });

    stop_tx
}

/// Start a backend that accepts connections (so TCP probes see it alive)
/// but closes them without sending a response.
pub async fn start_closing_backend(port: u16) {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))
        .await
        .unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => drop(socket),
                Err(_) => break,
            }
        }
    });
}

/// Start a programmable backend whose handler picks status, body, and
/// latency per request.
pub async fn start_programmable_backend<F, Fut>(port: u16, handler: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))
        .await
        .unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let (status, body) = handler().await;
                        respond(socket, status, body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

async fn respond(mut socket: TcpStream, status: u16, body: String) {
    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );

    let mut buf = [0u8; 2048];
    let _ = socket.read(&mut buf).await;
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Write a config file under the temp dir and return its path.
pub fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Build a proxy from the config at `path` and serve it in the background.
pub async fn spawn_proxy(path: &Path) -> Proxy {
    let proxy = Proxy::new(path).unwrap();
    let runner = proxy.clone();
    tokio::spawn(async move {
        let _ = runner.start().await;
    });

    // wait for the listeners to come up
    for _ in 0..50 {
        if proxy.is_ready().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    proxy
}

/// A reqwest client that bypasses pools and proxies between tests.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
