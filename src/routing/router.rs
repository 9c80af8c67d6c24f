//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store bound routes in registration order
//! - Bind/unbind routes as prefixes are created and removed
//! - Look up the first route matching a concrete path
//!
//! # Design Decisions
//! - Ordered list, oldest binding first; first match wins (wildcards overlap)
//! - Routes carry an immutable descriptor instead of captured handler context
//! - Bindings are keyed by (method, channel, category, pattern)
//! - Explicit NoMatch (`None`) rather than a silent default

use axum::http::Method;

use crate::relay::Category;
use crate::routing::matcher::{Params, PrefixMatcher};

/// Methods a prefix route is bound for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
}

impl RouteMethod {
    /// Every prefix is bound once per entry here.
    pub const ALL: [RouteMethod; 2] = [RouteMethod::Get, RouteMethod::Post];

    pub fn from_http(method: &Method) -> Option<Self> {
        if *method == Method::GET {
            Some(RouteMethod::Get)
        } else if *method == Method::POST {
            Some(RouteMethod::Post)
        } else {
            None
        }
    }
}

/// What a bound route resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub channel_id: String,
    pub category: Category,
    pub pattern: String,
}

#[derive(Debug)]
struct RouteEntry {
    method: RouteMethod,
    descriptor: RouteDescriptor,
    matcher: PrefixMatcher,
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub descriptor: RouteDescriptor,
    pub params: Params,
}

/// Ordered collection of active route bindings.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding. It is tried after every existing one.
    pub fn bind(&mut self, method: RouteMethod, descriptor: RouteDescriptor, matcher: PrefixMatcher) {
        tracing::trace!(
            method = ?method,
            channel = %descriptor.channel_id,
            category = %descriptor.category,
            pattern = %descriptor.pattern,
            "Route bound"
        );
        self.entries.push(RouteEntry {
            method,
            descriptor,
            matcher,
        });
    }

    /// Remove every binding for the tuple. Returns how many were removed.
    pub fn unbind(
        &mut self,
        method: RouteMethod,
        channel_id: &str,
        category: Category,
        pattern: &str,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| {
            !(entry.method == method
                && entry.descriptor.channel_id == channel_id
                && entry.descriptor.category == category
                && entry.descriptor.pattern == pattern)
        });
        before - self.entries.len()
    }

    /// Remove every binding belonging to a channel.
    pub fn unbind_channel(&mut self, channel_id: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.descriptor.channel_id != channel_id);
        before - self.entries.len()
    }

    /// Find the oldest binding whose matcher accepts `path`.
    pub fn dispatch(&self, method: RouteMethod, channel_id: &str, path: &str) -> Option<RouteMatch> {
        self.entries
            .iter()
            .filter(|entry| entry.method == method && entry.descriptor.channel_id == channel_id)
            .find_map(|entry| {
                entry.matcher.captures(path).map(|params| RouteMatch {
                    descriptor: entry.descriptor.clone(),
                    params,
                })
            })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
