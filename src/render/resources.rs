//! Graphics resources shared between view nodes.
//!
//! Several view nodes can draw the same domain object (one mapper under two actors, say). They
//! share one resource keyed by the object's id and each registers itself as a user. The
//! resource is released exactly when its last user unregisters.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::foundation::stamp::ObjectId;
use crate::scene_graph::view_node::ViewNodeId;

/// Identifies one resource: the owning domain object plus a slot name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub owner: ObjectId,
    pub slot: &'static str,
}

impl ResourceKey {
    pub fn new(owner: ObjectId, slot: &'static str) -> Self {
        Self { owner, slot }
    }
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResourceRegistryOpts {
    /// Warn when retained bytes exceed this budget. `None` disables the check.
    pub budget_bytes: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub created: u64,
    pub replaced: u64,
    pub released: u64,
}

struct Entry {
    payload: Rc<dyn Any>,
    hash: u64,
    bytes: usize,
    users: BTreeSet<ViewNodeId>,
}

#[derive(Default)]
pub struct ResourceRegistry {
    opts: ResourceRegistryOpts,
    entries: HashMap<ResourceKey, Entry>,
    stats: ResourceStats,
}

impl ResourceRegistry {
    pub fn new(opts: ResourceRegistryOpts) -> Self {
        Self {
            opts,
            entries: HashMap::new(),
            stats: ResourceStats::default(),
        }
    }

    /// Content hash of the stored resource, used to decide whether to rebuild it.
    pub fn hash(&self, key: ResourceKey) -> Option<u64> {
        self.entries.get(&key).map(|e| e.hash)
    }

    pub fn get<T: Any>(&self, key: ResourceKey) -> Option<Rc<T>> {
        let payload = Rc::clone(&self.entries.get(&key)?.payload);
        payload.downcast::<T>().ok()
    }

    pub fn contains(&self, key: ResourceKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Store or replace the payload for `key` and register `user` on it.
    pub fn set_resource_for_user<T: Any>(
        &mut self,
        key: ResourceKey,
        user: ViewNodeId,
        payload: Rc<T>,
        hash: u64,
        bytes: usize,
    ) {
        let payload: Rc<dyn Any> = payload;
        match self.entries.get_mut(&key) {
            Some(e) => {
                e.payload = payload;
                e.hash = hash;
                e.bytes = bytes;
                e.users.insert(user);
                self.stats.replaced += 1;
            }
            None => {
                self.entries.insert(
                    key,
                    Entry {
                        payload,
                        hash,
                        bytes,
                        users: BTreeSet::from([user]),
                    },
                );
                self.stats.created += 1;
            }
        }
        if let Some(budget) = self.opts.budget_bytes {
            let used = self.memory_usage();
            if used > budget {
                tracing::warn!(used, budget, "graphics resources exceed budget");
            }
        }
    }

    /// Returns `false` when there is no such resource.
    pub fn register_user(&mut self, key: ResourceKey, user: ViewNodeId) -> bool {
        match self.entries.get_mut(&key) {
            Some(e) => {
                e.users.insert(user);
                true
            }
            None => false,
        }
    }

    /// Drop `user` from the resource; release the resource if no user is left.
    ///
    /// Returns `true` when the resource was released.
    pub fn unregister_user(&mut self, key: ResourceKey, user: ViewNodeId) -> bool {
        let Some(e) = self.entries.get_mut(&key) else {
            return false;
        };
        e.users.remove(&user);
        if !e.users.is_empty() {
            return false;
        }
        if let Some(e) = self.entries.remove(&key) {
            tracing::debug!(owner = %key.owner, slot = key.slot, bytes = e.bytes, "resource released");
        }
        self.stats.released += 1;
        true
    }

    pub fn users(&self, key: ResourceKey) -> Vec<ViewNodeId> {
        self.entries
            .get(&key)
            .map(|e| e.users.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.entries.values().map(|e| e.bytes).sum()
    }

    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    /// Release everything regardless of users.
    pub fn release_all(&mut self) {
        let n = self.entries.len() as u64;
        self.entries.clear();
        self.stats.released += n;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/resources.rs"]
mod tests;
