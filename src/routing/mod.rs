//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Prefix created (relay):
//!     pattern string
//!     → matcher.rs (compile into segments)
//!     → router.rs (bind GET + POST, appended in order)
//!
//! Incoming concrete request (/channel/{id}/{path}):
//!     → router.rs (dispatch: first binding whose matcher accepts path)
//!     → Return: RouteMatch {descriptor, params} or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes are mutated at runtime by the relay, only queried by the HTTP layer
//! - No regex in hot path (segment walk)
//! - Deterministic: same table and path always pick the same route
//! - First match wins (ordered by binding time)

pub mod matcher;
pub mod router;

pub use matcher::{Params, PrefixMatcher, WILDCARD_KEY};
pub use router::{RouteDescriptor, RouteMatch, RouteMethod, RouteTable};
