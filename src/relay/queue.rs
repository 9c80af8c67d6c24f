//! Posted messages and the per-prefix FIFO queue.

use std::collections::VecDeque;

use axum::body::Bytes;

use crate::routing::Params;

/// A message posted against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Concrete path after `/channel/{id}/`, verbatim.
    pub path: String,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub request_ip: String,
    pub params: Params,
}

/// Unbounded FIFO of messages owned by one prefix entry.
///
/// Never blocks: popping an empty queue returns `None` and callers poll.
#[derive(Debug, Default)]
pub struct Queue {
    messages: VecDeque<Message>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail.
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    /// Remove and return the head.
    pub fn pop_front(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Copy of every pending message in FIFO order, without removing any.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
