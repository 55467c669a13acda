//! Edges, the only channel between processes.
//!
//! An edge binds one output port instance to one input port instance and
//! carries [`EdgeDatum`]s in FIFO order. The process core only needs the
//! small contract in [`Edge`]; the graph layer is free to supply its own
//! implementation (bounded, instrumented, cross-thread). [`MemoryEdge`] is
//! the unbounded in-memory one.

use crate::pipeline::datum::EdgeDatum;
use crate::pipeline::id::EdgeId;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Contract the process core consumes from an edge.
#[cfg_attr(test, mockall::automock)]
pub trait Edge: Send + Sync {
    fn id(&self) -> EdgeId;

    /// Append a datum at the tail.
    fn push(&self, datum: EdgeDatum);

    /// Remove the head datum, blocking until one is available.
    fn pop(&self) -> EdgeDatum;

    /// Remove the head datum if there is one.
    fn try_pop(&self) -> Option<EdgeDatum>;

    /// Look at the datum `index` positions from the head without removing it.
    fn peek(&self, index: usize) -> Option<EdgeDatum>;

    /// Number of queued datums.
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

/// Shared handle to an edge, as bound to ports.
pub type EdgeRef = Arc<dyn Edge>;

/// Unbounded in-memory FIFO edge.
pub struct MemoryEdge {
    id: EdgeId,
    queue: Mutex<VecDeque<EdgeDatum>>,
    available: Condvar,
}

impl MemoryEdge {
    pub fn new() -> Self {
        Self {
            id: EdgeId::next(),
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Convenience constructor returning the shared handle ports bind to.
    pub fn shared() -> Arc<MemoryEdge> {
        Arc::new(Self::new())
    }

    /// Pop with an upper bound on the wait.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<EdgeDatum> {
        let guard = self.lock();
        let (mut guard, _) = self
            .available
            .wait_timeout_while(guard, timeout, |q| q.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        guard.pop_front()
    }

    /// Drop everything queued. Returns how many datums were discarded.
    pub fn clear(&self) -> usize {
        let mut guard = self.lock();
        let n = guard.len();
        guard.clear();
        n
    }

    // Datums are plain values; a panic while holding the lock leaves the
    // queue consistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, VecDeque<EdgeDatum>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryEdge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEdge")
            .field("id", &self.id)
            .field("size", &self.size())
            .finish()
    }
}

impl Edge for MemoryEdge {
    fn id(&self) -> EdgeId {
        self.id
    }

    fn push(&self, datum: EdgeDatum) {
        self.lock().push_back(datum);
        self.available.notify_one();
    }

    fn pop(&self) -> EdgeDatum {
        let mut guard = self.lock();
        loop {
            if let Some(datum) = guard.pop_front() {
                return datum;
            }
            guard = self
                .available
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn try_pop(&self) -> Option<EdgeDatum> {
        self.lock().pop_front()
    }

    fn peek(&self, index: usize) -> Option<EdgeDatum> {
        self.lock().get(index).cloned()
    }

    fn size(&self) -> usize {
        self.lock().len()
    }
}
