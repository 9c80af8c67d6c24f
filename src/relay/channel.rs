//! Channels and the process-wide channel registry.
//!
//! # Responsibilities
//! - Own each channel's key, both prefix directories and its route bindings
//! - Create/remove channels with key validation
//! - Serialize every read-then-write on a channel behind its lock
//!
//! # Design Decisions
//! - One mutex per channel covers directories, queues and routes together,
//!   so a route is never observable without its queue (or the reverse)
//! - Registry is a `DashMap`; its shard lock is only ever taken before a
//!   channel lock, never while holding one
//! - A removed channel is marked closed, so requests that looked it up just
//!   before removal resolve as not found
//! - An absent key and an empty key are the same key

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::observability::metrics;
use crate::relay::error::{RelayError, RelayResult};
use crate::relay::prefix::{Category, PrefixDirectory, PrefixEntry};
use crate::relay::queue::Queue;
use crate::routing::{RouteDescriptor, RouteMatch, RouteMethod, RouteTable};

/// Shared secret guarding a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelKey(String);

impl ChannelKey {
    /// Build from an optional query value. Absent becomes the empty key.
    pub fn new(key: Option<&str>) -> Self {
        Self(key.unwrap_or_default().to_string())
    }

    /// Exact string equality against a supplied key.
    pub fn matches(&self, supplied: Option<&str>) -> bool {
        self.0 == supplied.unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named namespace with public and private prefix directories.
#[derive(Debug)]
pub struct Channel {
    id: String,
    key: ChannelKey,
    public: PrefixDirectory,
    private: PrefixDirectory,
    routes: RouteTable,
    closed: bool,
}

impl Channel {
    fn new(id: &str, key: ChannelKey) -> Self {
        Self {
            id: id.to_string(),
            key,
            public: PrefixDirectory::new(Category::Public),
            private: PrefixDirectory::new(Category::Private),
            routes: RouteTable::new(),
            closed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Check a supplied key against the channel key.
    pub fn authorize(&self, key: Option<&str>) -> RelayResult<()> {
        if self.key.matches(key) {
            Ok(())
        } else {
            tracing::warn!(channel = %self.id, "Channel key mismatch");
            Err(RelayError::Forbidden)
        }
    }

    pub fn directory(&self, category: Category) -> &PrefixDirectory {
        match category {
            Category::Public => &self.public,
            Category::Private => &self.private,
        }
    }

    fn directory_mut(&mut self, category: Category) -> &mut PrefixDirectory {
        match category {
            Category::Public => &mut self.public,
            Category::Private => &mut self.private,
        }
    }

    /// (Re)create a prefix with an empty queue and (re)bind its GET/POST routes.
    pub fn create_prefix(&mut self, category: Category, pattern: &str) {
        let matcher = self.directory_mut(category).create(pattern).matcher().clone();
        for method in RouteMethod::ALL {
            self.routes.unbind(method, &self.id, category, pattern);
            self.routes.bind(
                method,
                RouteDescriptor {
                    channel_id: self.id.clone(),
                    category,
                    pattern: pattern.to_string(),
                },
                matcher.clone(),
            );
        }
        tracing::info!(channel = %self.id, category = %category, pattern = %pattern, "Prefix created");
    }

    /// Unbind a prefix's routes and drop its entry and queue.
    pub fn remove_prefix(&mut self, category: Category, pattern: &str) -> RelayResult<()> {
        self.entry(category, pattern)?;
        for method in RouteMethod::ALL {
            self.routes.unbind(method, &self.id, category, pattern);
        }
        self.directory_mut(category).remove(pattern);
        tracing::info!(channel = %self.id, category = %category, pattern = %pattern, "Prefix removed");
        Ok(())
    }

    pub fn entry(&self, category: Category, pattern: &str) -> RelayResult<&PrefixEntry> {
        self.directory(category)
            .get(pattern)
            .ok_or_else(|| RelayError::PrefixNotFound {
                category,
                pattern: pattern.to_string(),
            })
    }

    pub fn queue_mut(&mut self, category: Category, pattern: &str) -> RelayResult<&mut Queue> {
        self.directory_mut(category)
            .get_mut(pattern)
            .map(PrefixEntry::queue_mut)
            .ok_or_else(|| RelayError::PrefixNotFound {
                category,
                pattern: pattern.to_string(),
            })
    }

    /// Dispatch a concrete path through this channel's route bindings.
    pub fn route(&self, method: RouteMethod, path: &str) -> RelayResult<RouteMatch> {
        self.routes
            .dispatch(method, &self.id, path)
            .ok_or_else(|| RelayError::NoRoute(path.to_string()))
    }

    /// Remove every prefix, route and queued message, and close the channel.
    fn teardown(&mut self) {
        let public = self.public.remove_all();
        let private = self.private.remove_all();
        let routes = self.routes.unbind_channel(&self.id);
        self.closed = true;
        tracing::debug!(
            channel = %self.id,
            public = public.len(),
            private = private.len(),
            routes,
            "Channel torn down"
        );
    }
}

/// Whether `ChannelRegistry::create` made a new channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Existing,
}

/// Process-wide mapping from channel id to channel.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: DashMap<String, Arc<Mutex<Channel>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel, or confirm an existing one when the key matches.
    pub fn create(&self, id: &str, key: Option<&str>) -> RelayResult<CreateOutcome> {
        let outcome = match self.channels.entry(id.to_string()) {
            Entry::Occupied(entry) => {
                lock_channel(entry.get()).authorize(key)?;
                CreateOutcome::Existing
            }
            Entry::Vacant(entry) => {
                let key = ChannelKey::new(key);
                tracing::info!(channel = %id, keyed = !key.is_empty(), "Channel created");
                entry.insert(Arc::new(Mutex::new(Channel::new(id, key))));
                CreateOutcome::Created
            }
        };
        metrics::set_channel_count(self.channel_count());
        Ok(outcome)
    }

    /// Validate the key, tear down every prefix, then delete the channel.
    pub fn remove(&self, id: &str, key: Option<&str>) -> RelayResult<()> {
        let Entry::Occupied(entry) = self.channels.entry(id.to_string()) else {
            return Err(RelayError::ChannelNotFound(id.to_string()));
        };
        {
            let mut channel = lock_channel(entry.get());
            channel.authorize(key)?;
            channel.teardown();
        }
        entry.remove();
        metrics::set_channel_count(self.channel_count());
        tracing::info!(channel = %id, "Channel removed");
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> RelayResult<Arc<Mutex<Channel>>> {
        self.channels
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RelayError::ChannelNotFound(id.to_string()))
    }

    /// Run `f` on the channel while holding its lock.
    pub fn with_channel<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Channel) -> RelayResult<T>,
    ) -> RelayResult<T> {
        let channel = self.lookup(id)?;
        let mut guard = lock_channel(&channel);
        if guard.is_closed() {
            return Err(RelayError::ChannelNotFound(id.to_string()));
        }
        f(&mut guard)
    }

    /// Live channels, reported to the gauge and on shutdown.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

fn lock_channel(channel: &Mutex<Channel>) -> MutexGuard<'_, Channel> {
    channel.lock().unwrap_or_else(PoisonError::into_inner)
}
