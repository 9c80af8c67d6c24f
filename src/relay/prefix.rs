//! Prefix categories and the per-channel prefix directory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::relay::queue::Queue;
use crate::routing::PrefixMatcher;

/// Read access class of a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Anyone may read.
    Public,
    /// Reading requires the channel key.
    Private,
}

impl Category {
    pub fn requires_key(self) -> bool {
        self == Category::Private
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Public => "public",
            Category::Private => "private",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Category::Public),
            "private" => Ok(Category::Private),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// A registered prefix: its compiled matcher and its queue.
#[derive(Debug)]
pub struct PrefixEntry {
    matcher: PrefixMatcher,
    queue: Queue,
}

impl PrefixEntry {
    fn new(pattern: &str) -> Self {
        Self {
            matcher: PrefixMatcher::compile(pattern),
            queue: Queue::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn matcher(&self) -> &PrefixMatcher {
        &self.matcher
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Queue {
        &mut self.queue
    }
}

/// Pattern → entry mapping for one (channel, category).
///
/// Keeps registration order; a replaced pattern keeps its position.
#[derive(Debug)]
pub struct PrefixDirectory {
    category: Category,
    entries: Vec<PrefixEntry>,
}

impl PrefixDirectory {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            entries: Vec::new(),
        }
    }

    /// Insert `pattern` with an empty queue, discarding any existing queue for it.
    pub fn create(&mut self, pattern: &str) -> &mut PrefixEntry {
        let entry = PrefixEntry::new(pattern);
        match self.position(pattern) {
            Some(index) => {
                let previous = &self.entries[index].queue;
                if !previous.is_empty() {
                    tracing::debug!(
                        category = %self.category,
                        pattern = %pattern,
                        discarded = previous.len(),
                        "Prefix re-created, pending messages dropped"
                    );
                }
                self.entries[index] = entry;
                &mut self.entries[index]
            }
            None => {
                self.entries.push(entry);
                let last = self.entries.len() - 1;
                &mut self.entries[last]
            }
        }
    }

    /// Remove the entry and its queue. Returns whether it existed.
    pub fn remove(&mut self, pattern: &str) -> bool {
        match self.position(pattern) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, pattern: &str) -> Option<&PrefixEntry> {
        self.entries.iter().find(|e| e.pattern() == pattern)
    }

    pub fn get_mut(&mut self, pattern: &str) -> Option<&mut PrefixEntry> {
        self.entries.iter_mut().find(|e| e.pattern() == pattern)
    }

    /// Drop every entry, returning the removed patterns.
    pub fn remove_all(&mut self) -> Vec<String> {
        self.entries
            .drain(..)
            .map(|e| e.pattern().to_string())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrefixEntry> {
        self.entries.iter()
    }

    fn position(&self, pattern: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.pattern() == pattern)
    }
}
