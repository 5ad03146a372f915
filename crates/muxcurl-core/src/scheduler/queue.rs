//! Pending requests waiting for a free transfer slot.

use std::collections::VecDeque;

use crate::request::Request;

/// LIFO queue of pending requests.
///
/// Both `push` and `pop` work on the back of the deque: the request enqueued
/// last is dispatched first.
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: VecDeque<Request>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Request) {
        self.items.push_back(request);
    }

    pub fn pop(&mut self) -> Option<Request> {
        self.items.pop_back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
