//! Channel relay subsystem.
//!
//! # Data Flow
//! ```text
//! Administrative request (create/remove channel or prefix, list):
//!     → handlers.rs (resolve channel, check key)
//!     → channel.rs (registry / directory mutation + route bind/unbind)
//!     → RelayResponse
//!
//! Concrete request (/channel/{id}/{path}):
//!     → channel.rs (lock channel)
//!     → routing::RouteTable::dispatch (pattern + category)
//!     → prefix.rs (entry lookup) → queue.rs (push / pop)
//!     → RelayResponse
//! ```
//!
//! # Design Decisions
//! - Everything is in memory; nothing survives a restart
//! - Every state transition happens under one channel lock
//! - Handlers return transport-neutral responses; the HTTP layer maps them

pub mod channel;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod prefix;
pub mod queue;

pub use channel::{Channel, ChannelKey, ChannelRegistry, CreateOutcome};
pub use error::{RelayError, RelayResult};
pub use handlers::{IncomingMessage, RelayResponse};
pub use prefix::{Category, PrefixDirectory, PrefixEntry};
pub use queue::{Message, Queue};
