//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use swc_relay::config::RelayConfig;
use swc_relay::http::HttpServer;
use swc_relay::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A relay running on a loopback port.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a relay with default config on an ephemeral port.
pub async fn start_relay() -> TestRelay {
    start_relay_with(RelayConfig::default()).await
}

/// Start a relay with the given config on an ephemeral port.
pub async fn start_relay_with(mut config: RelayConfig) -> TestRelay {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    TestRelay {
        addr,
        shutdown,
        client,
    }
}

/// Header value as text, if present.
#[allow(dead_code)]
pub fn header(res: &reqwest::Response, name: &str) -> Option<String> {
    res.headers()
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
}
