//! In-memory containers for the Reef library.
//!
//! This module contains the concurrent and sequential data structures that
//! form the core of the library:
//! - Read-mostly concurrent map with linearizable per-key atomics
//! - Skip-list backed ordered set with logarithmic rank queries
//! - Lock-free doubly linked list with a pluggable behavior pipeline
//! - B+ tree with linked leaves and borrow/merge rebalancing
//! - Supporting primitives: stack, heap, Bloom filter, indexed list
//!
//! Only `SafeMap`, `ZSet`, `BloomFilter`, and `LockFreeList` are designed
//! for concurrent mutation; the rest require external synchronization when
//! shared.

pub mod bloom_filter;
pub mod bptree;
pub mod heap;
pub mod indexed_list;
pub mod lockfree_list;
pub mod safe_map;
pub mod stack;
pub mod zset;

// Re-export common containers
pub use bloom_filter::{BloomFilter, BloomFilterConfig};
pub use bptree::BpTree;
pub use heap::{heap_sort, Heap, PriorityQueue};
pub use indexed_list::IndexedList;
pub use lockfree_list::{
    ConcurrentPlugin, IndexPlugin, ListBuilder, ListPlugin, LockFreeList, LruPlugin, NodeRef,
    PluginCaps,
};
pub use safe_map::SafeMap;
pub use stack::Stack;
pub use zset::ZSet;
