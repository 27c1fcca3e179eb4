//! Behavior plugins for the lock-free list.
//!
//! A plugin observes structural events (insert, remove, update) and
//! announces capabilities through a bitmask; the list changes its own
//! behavior based on the capabilities present (`find` switches to the
//! index, `set_value` moves nodes under LRU). Hooks fire after the
//! structural mutation has committed, in plugin registration order, and
//! must not panic.

use std::fmt;
use std::hash::Hash;
use std::ops::BitOr;

use super::node::NodeRef;
use super::LockFreeList;

/// Capability bitmask announced by plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PluginCaps(u8);

impl PluginCaps {
    /// No capabilities.
    pub const NONE: PluginCaps = PluginCaps(0);
    /// The list may be mutated from multiple threads.
    pub const CONCURRENT_SAFE: PluginCaps = PluginCaps(1 << 0);
    /// A key-to-node index accelerates `find`.
    pub const INDEXED: PluginCaps = PluginCaps(1 << 1);
    /// The list evicts from the tail to hold a capacity bound.
    pub const LRU: PluginCaps = PluginCaps(1 << 2);

    /// Returns whether every capability in `other` is present.
    pub fn contains(self, other: PluginCaps) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PluginCaps {
    type Output = PluginCaps;

    fn bitor(self, rhs: PluginCaps) -> PluginCaps {
        PluginCaps(self.0 | rhs.0)
    }
}

impl fmt::Display for PluginCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(PluginCaps::CONCURRENT_SAFE) {
            names.push("concurrent-safe");
        }
        if self.contains(PluginCaps::INDEXED) {
            names.push("indexed");
        }
        if self.contains(PluginCaps::LRU) {
            names.push("lru");
        }
        write!(f, "{}", names.join("|"))
    }
}

/// A list behavior extension.
///
/// Implementations must be panic-free: hooks run after the structural
/// mutation committed, so a panic would not corrupt the list but would
/// poison the caller.
pub trait ListPlugin<K, V>: Send + Sync
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    /// Called once when the plugin is attached to a list being built.
    fn attach(&self, _list: &LockFreeList<K, V>) {}

    /// Fired after a node is linked in.
    fn on_insert(&self, _list: &LockFreeList<K, V>, _node: &mut NodeRef<K, V>) {}

    /// Fired after a node is unlinked.
    fn on_remove(&self, _list: &LockFreeList<K, V>, _node: &NodeRef<K, V>) {}

    /// Fired after a node's value changed; `old` is the replaced value.
    fn on_update(&self, _list: &LockFreeList<K, V>, _node: &NodeRef<K, V>, _old: &V) {}

    /// The capabilities this plugin grants the list.
    fn capabilities(&self) -> PluginCaps;
}

/// Marker plugin: announces that the list is safe for concurrent use.
#[derive(Debug, Default)]
pub struct ConcurrentPlugin;

impl<K, V> ListPlugin<K, V> for ConcurrentPlugin
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn capabilities(&self) -> PluginCaps {
        PluginCaps::CONCURRENT_SAFE
    }
}

/// Maintains the key-to-node index that accelerates `find`.
#[derive(Debug, Default)]
pub struct IndexPlugin;

impl<K, V> ListPlugin<K, V> for IndexPlugin
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn attach(&self, list: &LockFreeList<K, V>) {
        list.reset_index();
    }

    fn on_insert(&self, list: &LockFreeList<K, V>, node: &mut NodeRef<K, V>) {
        list.index_insert(node);
    }

    fn on_remove(&self, list: &LockFreeList<K, V>, node: &NodeRef<K, V>) {
        list.index_remove(node);
    }

    fn capabilities(&self) -> PluginCaps {
        PluginCaps::INDEXED
    }
}

/// Evicts from the tail once the list exceeds `capacity`.
///
/// Eviction runs in `on_insert`: the inserted node is moved to the front
/// (idempotent when already there), then tail nodes are removed until the
/// length fits. The plugin deliberately does nothing in `on_update`: the
/// list's `set_value` already moves the node under the LRU capability, and
/// moving here would recurse through the update hooks.
#[derive(Debug)]
pub struct LruPlugin {
    capacity: usize,
}

impl LruPlugin {
    /// Creates an LRU plugin holding the list to at most `capacity` nodes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl<K, V> ListPlugin<K, V> for LruPlugin
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn on_insert(&self, list: &LockFreeList<K, V>, node: &mut NodeRef<K, V>) {
        if !node.is_valid() {
            return;
        }
        if list.move_to_front(node).is_err() {
            return;
        }
        if !node.is_valid() {
            return;
        }

        while list.len() > self.capacity {
            let tail = match list.back() {
                Some(tail) if tail.is_valid() => tail,
                _ => break,
            };
            // Never evict the node that triggered this insert.
            if tail.ptr_eq(node) {
                break;
            }
            if list.remove(&tail).is_err() {
                break;
            }
        }
    }

    fn capabilities(&self) -> PluginCaps {
        PluginCaps::LRU
    }
}
