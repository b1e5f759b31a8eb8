//! Bounded in-memory ring of captured exchanges

use crate::models::{ExchangeId, ExchangeRecord, SharedRecord};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of exchanges kept per session
pub const DEFAULT_CAPACITY: usize = 500;

/// Append-only ring buffer that evicts the oldest records past `capacity`.
///
/// Records are stored behind `Arc` so snapshots are cheap point-in-time copies
/// that later appends, evictions or body attachments never affect.
#[derive(Debug)]
pub struct CaptureBuffer {
    ring: VecDeque<SharedRecord>,
    capacity: usize,
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CaptureBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record whose id is already unique, evicting from the head
    /// until the buffer is back within capacity.
    pub fn append(&mut self, record: ExchangeRecord) {
        self.ring.push_back(Arc::new(record));
        while self.ring.len() > self.capacity {
            if let Some(evicted) = self.ring.pop_front() {
                tracing::trace!("Evicted exchange {}", evicted.id);
            }
        }
    }

    /// Attach a late-arriving response body to the record with `id`.
    ///
    /// Returns false when the record has already been evicted or cleared.
    pub fn attach_response_body(&mut self, id: &ExchangeId, body: Option<String>) -> bool {
        match self.ring.iter_mut().rev().find(|r| &r.id == id) {
            Some(slot) => {
                *slot = Arc::new(slot.with_response_body(body));
                true
            }
            None => {
                tracing::debug!("Dropping body for exchange {} no longer in buffer", id);
                false
            }
        }
    }

    pub fn get(&self, id: &ExchangeId) -> Option<SharedRecord> {
        self.ring.iter().find(|r| &r.id == id).cloned()
    }

    /// Consistent ordered view, oldest first
    pub fn snapshot(&self) -> Vec<SharedRecord> {
        self.ring.iter().cloned().collect()
    }

    pub fn clear(&mut self) -> usize {
        let cleared = self.ring.len();
        self.ring.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
