//! Arena of in-flight transfers keyed by scheduler-assigned ids.

use std::collections::HashMap;

use crate::request::Request;
use crate::transport::TransferId;

/// One dispatched request and how many times it has been retried.
#[derive(Debug)]
pub struct ActiveTransfer {
    pub request: Request,
    /// 0 on first dispatch, incremented on each retry.
    pub attempts: u32,
}

/// In-flight transfers. Ids are never reused within one set.
#[derive(Debug, Default)]
pub struct ActiveSet {
    slots: HashMap<TransferId, ActiveTransfer>,
    next_id: u64,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `request` with zero attempts and returns its new id.
    pub fn insert(&mut self, request: Request) -> TransferId {
        let id = TransferId(self.next_id);
        self.next_id += 1;
        self.slots.insert(
            id,
            ActiveTransfer {
                request,
                attempts: 0,
            },
        );
        id
    }

    pub fn get(&self, id: TransferId) -> Option<&ActiveTransfer> {
        self.slots.get(&id)
    }

    pub fn get_mut(&mut self, id: TransferId) -> Option<&mut ActiveTransfer> {
        self.slots.get_mut(&id)
    }

    pub fn remove(&mut self, id: TransferId) -> Option<ActiveTransfer> {
        self.slots.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
