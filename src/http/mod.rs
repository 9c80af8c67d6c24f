//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, endpoint table)
//!     → request.rs (query, client IP, concrete path, request ID span)
//!     → relay::handlers (channel registry operations)
//!     → response.rs (status + channel/prefix/request-ip/params headers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RelayQuery, X_REQUEST_ID};
pub use server::HttpServer;
