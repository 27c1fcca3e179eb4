//! Concurrency suite for the lock-free list and its plugin presets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::containers::lockfree_list::{indexed_list, lru_cache, PluginCaps};

/// Concurrent producers at both ends: the chain stays walkable in both
/// directions and the index agrees with the length.
#[test]
fn test_concurrent_two_sided_inserts() {
    let list = Arc::new(indexed_list::<String, usize>());
    // Seed one node so both endpoints are anchored before the two-sided
    // contention starts.
    list.add_back("seed".to_string(), 0);
    let threads = 8;
    let per_thread = 100;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let key = format!("t{t}-{i}");
                    if t % 2 == 0 {
                        list.add_back(key, i);
                    } else {
                        list.add_front(key, i);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(list.len(), threads * per_thread + 1);

    let mut forward = 0;
    let mut cursor = list.front();
    while let Some(node) = cursor {
        forward += 1;
        cursor = list.next_of(&node);
    }
    assert_eq!(forward, list.len());

    let mut backward = 0;
    let mut cursor = list.back();
    while let Some(node) = cursor {
        backward += 1;
        cursor = list.prev_of(&node);
    }
    assert_eq!(backward, list.len());

    for t in 0..threads {
        for i in 0..per_thread {
            assert!(list.contains(&format!("t{t}-{i}")));
        }
    }
}

/// Two threads racing to remove the same nodes: the owner claim admits
/// exactly one winner per node.
#[test]
fn test_competing_removers_single_winner() {
    let list = Arc::new(indexed_list::<usize, usize>());
    let nodes: Vec<_> = (0..500).map(|i| list.add_back(i, i)).collect();
    let nodes = Arc::new(nodes);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let list = Arc::clone(&list);
            let nodes = Arc::clone(&nodes);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut removed = 0usize;
                for node in nodes.iter() {
                    if list.remove(node).is_ok() {
                        removed += 1;
                    }
                }
                removed
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 500, "every node removed exactly once");
    assert!(list.is_empty());
}

/// The LRU preset never exceeds capacity, even with concurrent inserts
/// from several threads.
#[test]
fn test_lru_bound_under_concurrency() {
    let capacity = 64;
    let cache = Arc::new(lru_cache::<usize, usize>(capacity));
    assert!(cache.has_capability(PluginCaps::LRU));

    let threads = 4;
    let per_thread = 200;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    cache.add_back(t * per_thread + i, i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Eviction may lag a concurrent insert by a step, never more.
    assert!(
        cache.len() <= capacity + threads,
        "cache grew to {}",
        cache.len()
    );
}

/// Callbacks observe every structural event exactly once across threads.
#[test]
fn test_callback_counts_under_concurrency() {
    let mut list = indexed_list::<usize, usize>();
    let inserts = Arc::new(AtomicUsize::new(0));
    let removes = Arc::new(AtomicUsize::new(0));
    {
        let inserts = Arc::clone(&inserts);
        list.on_insert(move |_| {
            inserts.fetch_add(1, Ordering::SeqCst);
        });
        let removes = Arc::clone(&removes);
        list.on_remove(move |_| {
            removes.fetch_add(1, Ordering::SeqCst);
        });
    }
    let list = Arc::new(list);

    let threads = 4;
    let per_thread = 100;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                for i in 0..per_thread {
                    let node = list.add_back(t * per_thread + i, i);
                    list.remove(&node).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(inserts.load(Ordering::SeqCst), threads * per_thread);
    assert_eq!(removes.load(Ordering::SeqCst), threads * per_thread);
    assert!(list.is_empty());
}
