//! Flow-dependent type resolution.
//!
//! Every declared port gets a slot in a disjoint-set forest. Flow-dependent
//! ports that share a tag are unioned into one equivalence class at
//! declaration time; untagged ones stay singletons. Resolving any member
//! pins the concrete type on the class root, so all members read the same
//! type. Resolution is one-way and permanent: a class never changes type
//! once pinned.

use crate::pipeline::id::PortSlot;
use crate::pipeline::port::PortDirection;
use std::collections::HashMap;

/// Address of a port within one process.
pub type PortKey = (PortDirection, String);

/// Outcome of proposing a concrete type for a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The class was unresolved and is now pinned. Holds every member.
    Resolved(Vec<PortKey>),
    /// The class was already pinned to the proposed type.
    Unchanged,
    /// The class is pinned to a different type.
    Conflict(String),
}

/// Disjoint-set forest over the ports of a process.
#[derive(Debug, Default)]
pub struct TypeResolver {
    parent: Vec<PortSlot>,
    rank: Vec<u8>,
    /// Concrete type, meaningful on roots only.
    resolved: Vec<Option<String>>,
    slots: HashMap<PortKey, PortSlot>,
    /// One representative slot per tag.
    tags: HashMap<String, PortSlot>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `key` a slot, joining the class of `tag` if one is supplied.
    pub fn register(&mut self, key: PortKey, tag: Option<&str>) -> PortSlot {
        let slot = PortSlot(self.parent.len() as u32);
        self.parent.push(slot);
        self.rank.push(0);
        self.resolved.push(None);
        self.slots.insert(key, slot);

        if let Some(tag) = tag {
            match self.tags.get(tag).copied() {
                Some(rep) => self.union(rep, slot),
                None => {
                    self.tags.insert(tag.to_string(), slot);
                }
            }
        }
        slot
    }

    /// Forget `key`. Its class keeps any type it was pinned to.
    pub fn unregister(&mut self, key: &PortKey) {
        self.slots.remove(key);
    }

    pub fn slot(&self, key: &PortKey) -> Option<PortSlot> {
        self.slots.get(key).copied()
    }

    /// Root of the class containing `slot`, compressing the path.
    pub fn find(&mut self, slot: PortSlot) -> PortSlot {
        let mut root = slot;
        while self.parent[root.index()] != root {
            root = self.parent[root.index()];
        }
        let mut cur = slot;
        while self.parent[cur.index()] != root {
            let next = self.parent[cur.index()];
            self.parent[cur.index()] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: PortSlot, b: PortSlot) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (hi, lo) = if self.rank[ra.index()] >= self.rank[rb.index()] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[lo.index()] = hi;
        if self.rank[hi.index()] == self.rank[lo.index()] {
            self.rank[hi.index()] += 1;
        }
        if self.resolved[hi.index()].is_none() {
            self.resolved[hi.index()] = self.resolved[lo.index()].take();
        }
    }

    /// Concrete type pinned on the class of `key`, if any.
    pub fn resolved_type(&mut self, key: &PortKey) -> Option<String> {
        let slot = self.slot(key)?;
        let root = self.find(slot);
        self.resolved[root.index()].clone()
    }

    /// Concrete type pinned on the class of `tag`, if any.
    pub fn tag_type(&mut self, tag: &str) -> Option<String> {
        let rep = self.tags.get(tag).copied()?;
        let root = self.find(rep);
        self.resolved[root.index()].clone()
    }

    /// Every registered port in the same class as `key`.
    pub fn members(&mut self, key: &PortKey) -> Vec<PortKey> {
        let Some(slot) = self.slot(key) else {
            return Vec::new();
        };
        let root = self.find(slot);
        let candidates: Vec<(PortKey, PortSlot)> = self
            .slots
            .iter()
            .map(|(k, s)| (k.clone(), *s))
            .collect();
        let mut members: Vec<PortKey> = candidates
            .into_iter()
            .filter(|(_, s)| self.find(*s) == root)
            .map(|(k, _)| k)
            .collect();
        members.sort();
        members
    }

    /// Pin `concrete` on the class of `key`.
    pub fn resolve(&mut self, key: &PortKey, concrete: &str) -> Resolution {
        let Some(slot) = self.slot(key) else {
            return Resolution::Unchanged;
        };
        let root = self.find(slot);
        match self.resolved[root.index()].clone() {
            Some(existing) if existing == concrete => Resolution::Unchanged,
            Some(existing) => Resolution::Conflict(existing),
            None => {
                self.resolved[root.index()] = Some(concrete.to_string());
                Resolution::Resolved(self.members(key))
            }
        }
    }
}
