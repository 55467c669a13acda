//! Identity types for the process core.
//!
//! `EdgeId` tags edges for diagnostics; `PortSlot` is a direct index into the
//! type resolver's disjoint-set storage, giving O(1) lookup.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_EDGE_ID: AtomicU32 = AtomicU32::new(0);

/// Unique identifier of an edge within this address space.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        EdgeId(NEXT_EDGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index into `TypeResolver` storage.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PortSlot(pub u32);

impl PortSlot {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PortSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PortSlot({})", self.0)
    }
}
