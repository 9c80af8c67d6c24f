//! Store-and-forward HTTP message relay.

// Core subsystems
pub mod config;
pub mod http;
pub mod relay;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::ChannelRegistry;
