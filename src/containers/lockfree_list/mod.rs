//! Lock-free doubly linked list with a pluggable behavior pipeline.
//!
//! The list links individually heap-allocated elements through atomic
//! address cells mutated by CAS loops; retries are bounded only by
//! contention. Ownership of every linked element belongs to the list
//! through an address-to-element registry: links are upgraded through the
//! registry before use, unlinking deregisters, and external [`NodeRef`]
//! handles keep removed elements alive until dropped. Dropping the list
//! cascades to its elements.
//!
//! Behavior is extended through [`ListPlugin`]s composed by
//! [`ListBuilder`]: a concurrency marker, a key index that makes `find`
//! O(1), and LRU eviction. Hooks fire after the structural mutation has
//! committed, in registration order, followed by user callbacks.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

mod node;
mod plugins;

pub use node::NodeRef;
pub use plugins::{ConcurrentPlugin, IndexPlugin, ListPlugin, LruPlugin, PluginCaps};

use node::Element;

use crate::error::ContainerError;

/// Source of unique, non-zero list identities for the ownership check.
static NEXT_LIST_ID: AtomicUsize = AtomicUsize::new(1);

type InsertCallback<K, V> = Box<dyn Fn(&NodeRef<K, V>) + Send + Sync>;
type RemoveCallback<K, V> = Box<dyn Fn(&NodeRef<K, V>) + Send + Sync>;
type UpdateCallback<K, V> = Box<dyn Fn(&NodeRef<K, V>, &V) + Send + Sync>;

/// A doubly linked list over atomic links, extended by plugins.
///
/// # Examples
///
/// ```
/// use reef::containers::lockfree_list;
///
/// let cache = lockfree_list::lru_cache(2);
/// cache.add_back("a", 1);
/// cache.add_back("b", 2);
/// cache.add_back("c", 3);
///
/// assert!(!cache.contains(&"a"));
/// assert!(cache.contains(&"b"));
/// assert!(cache.contains(&"c"));
/// ```
pub struct LockFreeList<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    id: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    len: AtomicI64,

    /// Keeps every linked element alive and upgrades raw link addresses.
    registry: RwLock<HashMap<usize, Arc<Element<K, V>>>>,

    /// Key-to-element index maintained when an [`IndexPlugin`] is attached.
    index: RwLock<HashMap<K, Arc<Element<K, V>>>>,

    plugins: Vec<Box<dyn ListPlugin<K, V>>>,
    insert_callbacks: Vec<InsertCallback<K, V>>,
    remove_callbacks: Vec<RemoveCallback<K, V>>,
    update_callbacks: Vec<UpdateCallback<K, V>>,
}

/// Chainable configuration for [`LockFreeList`].
pub struct ListBuilder<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    plugins: Vec<Box<dyn ListPlugin<K, V>>>,
}

impl<K, V> ListBuilder<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Adds a plugin; hooks fire in the order plugins were added.
    pub fn with_plugin(mut self, plugin: impl ListPlugin<K, V> + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Attaches the accumulated plugins and produces the list.
    pub fn build(self) -> LockFreeList<K, V> {
        let mut list = LockFreeList::bare();
        for plugin in self.plugins {
            plugin.attach(&list);
            list.plugins.push(plugin);
        }
        list
    }
}

impl<K, V> Default for ListBuilder<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A plain list carrying only the concurrency marker.
pub fn concurrent_list<K, V>() -> LockFreeList<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    ListBuilder::new().with_plugin(ConcurrentPlugin).build()
}

/// A concurrent list with an O(1) key index.
pub fn indexed_list<K, V>() -> LockFreeList<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    ListBuilder::new()
        .with_plugin(ConcurrentPlugin)
        .with_plugin(IndexPlugin)
        .build()
}

/// An indexed, concurrent list that evicts from the tail beyond
/// `capacity`.
pub fn lru_cache<K, V>(capacity: usize) -> LockFreeList<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    ListBuilder::new()
        .with_plugin(ConcurrentPlugin)
        .with_plugin(IndexPlugin)
        .with_plugin(LruPlugin::new(capacity))
        .build()
}

impl<K, V> LockFreeList<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn bare() -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            len: AtomicI64::new(0),
            registry: RwLock::new(HashMap::new()),
            index: RwLock::new(HashMap::new()),
            plugins: Vec::new(),
            insert_callbacks: Vec::new(),
            remove_callbacks: Vec::new(),
            update_callbacks: Vec::new(),
        }
    }

    /// Creates a plugin-free list.
    pub fn new() -> Self {
        ListBuilder::new().build()
    }

    /// Returns whether any attached plugin grants `cap`.
    pub fn has_capability(&self, cap: PluginCaps) -> bool {
        self.plugins
            .iter()
            .any(|plugin| plugin.capabilities().contains(cap))
    }

    /// Upgrades a link address to a live element reference.
    fn lookup(&self, addr: usize) -> Option<Arc<Element<K, V>>> {
        if addr == 0 {
            return None;
        }
        self.registry
            .read()
            .expect("list registry poisoned")
            .get(&addr)
            .cloned()
    }

    fn register(&self, elem: &Arc<Element<K, V>>) {
        self.registry
            .write()
            .expect("list registry poisoned")
            .insert(Element::addr(elem), Arc::clone(elem));
    }

    fn deregister(&self, addr: usize) {
        self.registry
            .write()
            .expect("list registry poisoned")
            .remove(&addr);
    }

    pub(crate) fn reset_index(&self) {
        self.index.write().expect("list index poisoned").clear();
    }

    pub(crate) fn index_insert(&self, node: &NodeRef<K, V>) {
        self.index
            .write()
            .expect("list index poisoned")
            .insert(node.key().clone(), Arc::clone(&node.elem));
    }

    pub(crate) fn index_remove(&self, node: &NodeRef<K, V>) {
        let mut index = self.index.write().expect("list index poisoned");
        // Only drop the entry if it still names this element; the key may
        // have been re-inserted concurrently.
        if let Some(existing) = index.get(node.key()) {
            if Arc::ptr_eq(existing, &node.elem) {
                index.remove(node.key());
            }
        }
    }

    fn fire_insert(&self, node: &mut NodeRef<K, V>) {
        for plugin in &self.plugins {
            plugin.on_insert(self, node);
        }
        for callback in &self.insert_callbacks {
            callback(node);
        }
    }

    fn fire_remove(&self, node: &NodeRef<K, V>) {
        for plugin in &self.plugins {
            plugin.on_remove(self, node);
        }
        for callback in &self.remove_callbacks {
            callback(node);
        }
    }

    /// Links a new node at the head.
    pub fn add_front(&self, key: K, value: V) -> NodeRef<K, V> {
        let elem = Arc::new(Element::new(key, value, self.id));
        let addr = Element::addr(&elem);
        self.register(&elem);

        if self.has_capability(PluginCaps::INDEXED) {
            let node = NodeRef {
                elem: Arc::clone(&elem),
            };
            self.index_insert(&node);
        }

        loop {
            let head = self.head.load(Ordering::Acquire);
            if head == 0 {
                // Empty list: install as head, then fix the tail.
                elem.next.store(0, Ordering::Release);
                if self
                    .head
                    .compare_exchange(0, addr, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    let _ = self
                        .tail
                        .compare_exchange(0, addr, Ordering::AcqRel, Ordering::Acquire);
                    break;
                }
                continue;
            }

            let head_elem = match self.lookup(head) {
                Some(head_elem) if head_elem.owner.load(Ordering::Acquire) == self.id => head_elem,
                // Stale or dying head: reload.
                _ => continue,
            };
            elem.next.store(head, Ordering::Release);
            if head_elem
                .prev
                .compare_exchange(0, addr, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let _ = self
                    .head
                    .compare_exchange(head, addr, Ordering::AcqRel, Ordering::Acquire);
                break;
            }
            // The head pointer lags behind a concurrent front insert; help
            // it forward before retrying.
            let prev = head_elem.prev.load(Ordering::Acquire);
            if prev != 0 {
                let _ = self
                    .head
                    .compare_exchange(head, prev, Ordering::AcqRel, Ordering::Acquire);
            }
        }

        self.len.fetch_add(1, Ordering::SeqCst);
        let mut node = NodeRef { elem };
        self.fire_insert(&mut node);
        node
    }

    /// Links a new node at the tail.
    pub fn add_back(&self, key: K, value: V) -> NodeRef<K, V> {
        let elem = Arc::new(Element::new(key, value, self.id));
        let addr = Element::addr(&elem);
        self.register(&elem);

        if self.has_capability(PluginCaps::INDEXED) {
            let node = NodeRef {
                elem: Arc::clone(&elem),
            };
            self.index_insert(&node);
        }

        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if tail == 0 {
                // Empty list: install as tail, then fix the head.
                elem.prev.store(0, Ordering::Release);
                if self
                    .tail
                    .compare_exchange(0, addr, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    let _ = self
                        .head
                        .compare_exchange(0, addr, Ordering::AcqRel, Ordering::Acquire);
                    break;
                }
                continue;
            }

            let tail_elem = match self.lookup(tail) {
                Some(tail_elem) if tail_elem.owner.load(Ordering::Acquire) == self.id => tail_elem,
                // Stale or dying tail: reload.
                _ => continue,
            };
            elem.prev.store(tail, Ordering::Release);
            if tail_elem
                .next
                .compare_exchange(0, addr, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let _ = self
                    .tail
                    .compare_exchange(tail, addr, Ordering::AcqRel, Ordering::Acquire);
                break;
            }
            // The tail pointer lags behind a concurrent back insert; help
            // it forward before retrying.
            let next = tail_elem.next.load(Ordering::Acquire);
            if next != 0 {
                let _ = self
                    .tail
                    .compare_exchange(tail, next, Ordering::AcqRel, Ordering::Acquire);
            }
        }

        self.len.fetch_add(1, Ordering::SeqCst);
        let mut node = NodeRef { elem };
        self.fire_insert(&mut node);
        node
    }

    /// Unlinks `node` from the list.
    ///
    /// Fails with [`ContainerError::ForeignNode`] when the node belongs to
    /// a different list or was already unlinked (including by a concurrent
    /// remover; the owner tag is claimed exactly once).
    pub fn remove(&self, node: &NodeRef<K, V>) -> Result<(), ContainerError> {
        let elem = &node.elem;
        let addr = node.addr();

        // Claim the unlink; losers observe a dead node.
        if elem
            .owner
            .compare_exchange(self.id, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ContainerError::ForeignNode);
        }

        loop {
            let prev = elem.prev.load(Ordering::Acquire);
            let next = elem.next.load(Ordering::Acquire);

            // Swing the predecessor (or the list head) past this node. A
            // predecessor that is itself mid-removal is waited out: its
            // remover will rewrite our prev link, and the retry picks the
            // live one up.
            let swung = if prev != 0 {
                match self.lookup(prev) {
                    Some(prev_elem) if prev_elem.owner.load(Ordering::Acquire) == self.id => {
                        prev_elem
                            .next
                            .compare_exchange(addr, next, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                    }
                    _ => false,
                }
            } else {
                self.head
                    .compare_exchange(addr, next, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            };
            if !swung {
                std::hint::spin_loop();
                continue;
            }

            // Swing the successor (or the list tail) back past this node.
            if next != 0 {
                if let Some(next_elem) = self.lookup(next) {
                    let _ = next_elem.prev.compare_exchange(
                        addr,
                        prev,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    );
                }
            } else {
                let _ = self
                    .tail
                    .compare_exchange(addr, prev, Ordering::AcqRel, Ordering::Acquire);
            }
            break;
        }

        if self.has_capability(PluginCaps::INDEXED) {
            self.index_remove(node);
        }
        self.deregister(addr);
        self.len.fetch_sub(1, Ordering::SeqCst);

        self.fire_remove(node);
        Ok(())
    }

    /// Moves `node` to the head, rebinding the handle to the re-inserted
    /// element. Idempotent when the node is already the head.
    pub fn move_to_front(&self, node: &mut NodeRef<K, V>) -> Result<(), ContainerError> {
        if node.elem.owner.load(Ordering::Acquire) != self.id {
            return Err(ContainerError::ForeignNode);
        }
        if self.head.load(Ordering::Acquire) == node.addr() {
            return Ok(());
        }

        let key = node.key().clone();
        let value = node.value();
        self.remove(node)?;
        *node = self.add_front(key, value);
        Ok(())
    }

    /// Finds the node bound to `key`.
    ///
    /// With an index plugin attached this is an O(1) lookup plus a
    /// liveness check; otherwise a linear scan from the head.
    pub fn find(&self, key: &K) -> Option<NodeRef<K, V>> {
        if self.has_capability(PluginCaps::INDEXED) {
            let elem = {
                let index = self.index.read().expect("list index poisoned");
                index.get(key).cloned()
            }?;
            if elem.owner.load(Ordering::Acquire) == self.id {
                return Some(NodeRef { elem });
            }
            return None;
        }

        let mut cursor = self.head.load(Ordering::Acquire);
        while let Some(elem) = self.lookup(cursor) {
            if elem.key == *key {
                return Some(NodeRef { elem });
            }
            cursor = elem.next.load(Ordering::Acquire);
        }
        None
    }

    /// Returns whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Visits nodes head-to-tail until the visitor returns `false`.
    ///
    /// Not safe against concurrent mutation: the walk may observe partial
    /// states.
    pub fn traversal<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut cursor = self.head.load(Ordering::Acquire);
        while let Some(elem) = self.lookup(cursor) {
            let keep_going = {
                let value = elem.value.read().expect("node value lock poisoned");
                visitor(&elem.key, &value)
            };
            if !keep_going {
                break;
            }
            cursor = elem.next.load(Ordering::Acquire);
        }
    }

    /// Replaces the node's value, firing update hooks.
    ///
    /// Returns `false` without firing anything when the node is dead or
    /// the value compares equal. When the list advertises the LRU
    /// capability the node is moved to the front as part of the update.
    pub fn set_value(&self, node: &mut NodeRef<K, V>, value: V) -> bool {
        if node.elem.owner.load(Ordering::Acquire) != self.id {
            return false;
        }
        let old = node.value();
        if old == value {
            return false;
        }
        *node.elem.value.write().expect("node value lock poisoned") = value;

        if self.has_capability(PluginCaps::LRU) {
            let _ = self.move_to_front(node);
        }

        for plugin in &self.plugins {
            plugin.on_update(self, node, &old);
        }
        for callback in &self.update_callbacks {
            callback(node, &old);
        }
        true
    }

    /// Returns the head node.
    pub fn front(&self) -> Option<NodeRef<K, V>> {
        let elem = self.lookup(self.head.load(Ordering::Acquire))?;
        Some(NodeRef { elem })
    }

    /// Returns the tail node.
    pub fn back(&self) -> Option<NodeRef<K, V>> {
        let elem = self.lookup(self.tail.load(Ordering::Acquire))?;
        Some(NodeRef { elem })
    }

    /// Returns the node after `node`, if any.
    pub fn next_of(&self, node: &NodeRef<K, V>) -> Option<NodeRef<K, V>> {
        let elem = self.lookup(node.elem.next.load(Ordering::Acquire))?;
        Some(NodeRef { elem })
    }

    /// Returns the node before `node`, if any.
    pub fn prev_of(&self, node: &NodeRef<K, V>) -> Option<NodeRef<K, V>> {
        let elem = self.lookup(node.elem.prev.load(Ordering::Acquire))?;
        Some(NodeRef { elem })
    }

    /// Returns the number of linked nodes. Immediately outdated under
    /// concurrent mutation.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst).max(0) as usize
    }

    /// Returns whether the list holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unlinks every node.
    pub fn clear(&self) {
        while let Some(front) = self.front() {
            if self.remove(&front).is_err() && self.front().map(|n| n.ptr_eq(&front)) == Some(true)
            {
                break;
            }
        }
    }

    /// Registers a callback fired after every insert, following plugin
    /// hooks.
    pub fn on_insert(&mut self, callback: impl Fn(&NodeRef<K, V>) + Send + Sync + 'static) {
        self.insert_callbacks.push(Box::new(callback));
    }

    /// Registers a callback fired after every remove.
    pub fn on_remove(&mut self, callback: impl Fn(&NodeRef<K, V>) + Send + Sync + 'static) {
        self.remove_callbacks.push(Box::new(callback));
    }

    /// Registers a callback fired after every value update, receiving the
    /// replaced value.
    pub fn on_update(&mut self, callback: impl Fn(&NodeRef<K, V>, &V) + Send + Sync + 'static) {
        self.update_callbacks.push(Box::new(callback));
    }
}

impl<K, V> Default for LockFreeList<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Display for LockFreeList<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: Clone + PartialEq + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut first = true;
        let mut result = Ok(());
        self.traversal(|key, value| {
            if !first {
                result = result.and_then(|_| write!(f, ", "));
            }
            first = false;
            result = result.and_then(|_| write!(f, "{key}:{value}"));
            result.is_ok()
        });
        result?;
        write!(f, "]")
    }
}
