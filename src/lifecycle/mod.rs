//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! main.rs:
//!     Load config → Init logging/metrics → Bind listener → HttpServer::run
//!
//! signals.rs:
//!     Ctrl+C / SIGTERM → Shutdown::trigger
//!
//! shutdown.rs:
//!     trigger → server stops accepting → in-flight requests finish → run returns
//! ```
//!
//! # Design Decisions
//! - Queued messages live in memory only and are dropped on exit
//! - Tests drive shutdown through the same broadcast handle as signals

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
