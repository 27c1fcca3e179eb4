//! Element storage and external node handles for the lock-free list.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Internal list element.
///
/// Links are element ADDRESSES stored in atomic cells (0 encodes null);
/// they are only ever dereferenced by upgrading through the owning list's
/// registry, so a stale address can at worst miss, never dangle. The
/// `owner` tag carries the id of the list the element is linked into and
/// drops to 0 exactly once at unlink, which doubles as the claim that
/// serializes competing removers.
pub(crate) struct Element<K, V> {
    pub(crate) key: K,
    pub(crate) value: RwLock<V>,
    pub(crate) next: AtomicUsize,
    pub(crate) prev: AtomicUsize,
    pub(crate) owner: AtomicUsize,
}

impl<K, V> Element<K, V> {
    pub(crate) fn new(key: K, value: V, owner: usize) -> Self {
        Self {
            key,
            value: RwLock::new(value),
            next: AtomicUsize::new(0),
            prev: AtomicUsize::new(0),
            owner: AtomicUsize::new(owner),
        }
    }

    /// The element's identity within the registry and the link cells.
    pub(crate) fn addr(this: &Arc<Self>) -> usize {
        Arc::as_ptr(this) as usize
    }
}

/// External handle to a list node.
///
/// A handle keeps its element alive even after the element is unlinked, so
/// reading a just-removed node never dangles; `is_valid` reports whether
/// the node is still linked into some list.
pub struct NodeRef<K, V> {
    pub(crate) elem: Arc<Element<K, V>>,
}

impl<K, V> Clone for NodeRef<K, V> {
    fn clone(&self) -> Self {
        Self {
            elem: Arc::clone(&self.elem),
        }
    }
}

impl<K, V> NodeRef<K, V> {
    /// Returns the node's key.
    pub fn key(&self) -> &K {
        &self.elem.key
    }

    /// Returns a snapshot of the node's value.
    pub fn value(&self) -> V
    where
        V: Clone,
    {
        self.elem.value.read().expect("node value lock poisoned").clone()
    }

    /// Returns whether the node is still linked into a list.
    pub fn is_valid(&self) -> bool {
        self.elem.owner.load(Ordering::Acquire) != 0
    }

    /// Returns whether two handles name the same underlying node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.elem, &other.elem)
    }

    pub(crate) fn addr(&self) -> usize {
        Element::addr(&self.elem)
    }
}

impl<K: std::fmt::Debug, V> std::fmt::Debug for NodeRef<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", &self.elem.key)
            .field("valid", &self.is_valid())
            .finish()
    }
}
