//! Shutdown coordination for the relay.
//!
//! `main` triggers the handle from the signal task; integration tests
//! trigger it directly to stop a relay started on a loopback port.

use tokio::sync::broadcast;

/// Broadcast handle that stops `HttpServer::run`.
///
/// Each server takes one receiver via `subscribe`. Triggering makes the
/// server stop accepting, finish in-flight requests and return. Queued
/// messages are not persisted.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscribed server to drain. A no-op when none is running.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
