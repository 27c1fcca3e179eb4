// Copyright (c) 2025 Reef Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Ordered set with logarithmic rank queries.
//!
//! A `ZSet` pairs a probabilistic skip-list with an element-to-score
//! dictionary: the dictionary answers `score` in O(1) and anchors removal,
//! the skip-list answers rank, reverse rank, and range-by-rank in
//! O(log n). Order is descending by score with a descending tie-break on
//! the element identifier, so rank 0 is always the greatest entry.
//!
//! All mutators hold the writer half of a reader-writer lock over the
//! whole structure; queries share the reader half and observe a consistent
//! snapshot for the duration of one call.

use std::collections::HashMap;
use std::sync::RwLock;

mod skiplist;

use skiplist::SkipList;

struct ZSetInner {
    dict: HashMap<String, f64>,
    list: SkipList,
}

/// A concurrent ordered set of `(element, score)` entries.
///
/// # Examples
///
/// ```
/// use reef::containers::ZSet;
///
/// let zset = ZSet::new();
/// zset.add("alice", 85.5);
/// zset.add("bob", 72.0);
/// zset.add("carol", 92.5);
///
/// assert_eq!(zset.rank("carol"), Some(0));
/// assert_eq!(zset.range(0, 1), vec!["carol:92.50", "alice:85.50"]);
/// ```
pub struct ZSet {
    inner: RwLock<ZSetInner>,
}

impl ZSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ZSetInner {
                dict: HashMap::new(),
                list: SkipList::new(),
            }),
        }
    }

    /// Adds `elem` with `score`, or re-scores it if already present.
    ///
    /// Returns `false` when the element already carries exactly this score
    /// (nothing changed), `true` otherwise.
    pub fn add(&self, elem: &str, score: f64) -> bool {
        let mut inner = self.inner.write().expect("zset lock poisoned");
        if let Some(&old) = inner.dict.get(elem) {
            if old == score {
                return false;
            }
            inner.list.remove(elem, old);
        }
        inner.dict.insert(elem.to_string(), score);
        let mut rng = rand::thread_rng();
        inner.list.insert(elem.to_string(), score, &mut rng);
        true
    }

    /// Removes `elem`, returning whether it was present.
    pub fn remove(&self, elem: &str) -> bool {
        let mut inner = self.inner.write().expect("zset lock poisoned");
        let score = match inner.dict.get(elem) {
            Some(&score) => score,
            None => return false,
        };
        let removed = inner.list.remove(elem, score);
        if removed {
            inner.dict.remove(elem);
        }
        removed
    }

    /// Returns the score bound to `elem`.
    pub fn score(&self, elem: &str) -> Option<f64> {
        let inner = self.inner.read().expect("zset lock poisoned");
        inner.dict.get(elem).copied()
    }

    /// Returns whether `elem` is a member.
    pub fn contains(&self, elem: &str) -> bool {
        self.score(elem).is_some()
    }

    /// Zero-based rank of `elem` in descending order; rank 0 is the
    /// greatest-scoring element.
    pub fn rank(&self, elem: &str) -> Option<usize> {
        let inner = self.inner.read().expect("zset lock poisoned");
        let score = *inner.dict.get(elem)?;
        inner.list.rank_of(elem, score)
    }

    /// Zero-based rank of `elem` in ascending order:
    /// `rev_rank = len - 1 - rank`.
    pub fn rev_rank(&self, elem: &str) -> Option<usize> {
        let inner = self.inner.read().expect("zset lock poisoned");
        let score = *inner.dict.get(elem)?;
        let rank = inner.list.rank_of(elem, score)?;
        Some(inner.list.len() - 1 - rank)
    }

    /// Entries at ranks `start..=stop` in descending order, each formatted
    /// `"{elem}:{score:.2}"`. `stop` is clamped to `len - 1`; an inverted
    /// or out-of-range window yields an empty vector.
    pub fn range(&self, start: usize, stop: usize) -> Vec<String> {
        let inner = self.inner.read().expect("zset lock poisoned");
        let len = inner.list.len();
        if len == 0 || start >= len || start > stop {
            return Vec::new();
        }
        inner.list.collect_range(start, stop.min(len - 1))
    }

    /// Entries at reverse ranks `start..=stop` in ascending order, with
    /// the same clamping rules as [`range`](Self::range).
    pub fn rev_range(&self, start: usize, stop: usize) -> Vec<String> {
        let inner = self.inner.read().expect("zset lock poisoned");
        let len = inner.list.len();
        if len == 0 || start >= len || start > stop {
            return Vec::new();
        }
        inner.list.collect_rev_range(start, stop.min(len - 1))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("zset lock poisoned");
        inner.list.len()
    }

    /// Returns whether the set holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry, leaving the set reusable.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("zset lock poisoned");
        inner.dict.clear();
        inner.list = SkipList::new();
    }

    /// Asserts dictionary/skip-list agreement and the structural
    /// invariants; test support.
    #[cfg(test)]
    fn validate(&self) {
        let inner = self.inner.read().expect("zset lock poisoned");
        assert_eq!(inner.dict.len(), inner.list.len());
        inner.list.validate();
        for (elem, &score) in &inner.dict {
            assert!(
                inner.list.rank_of(elem, score).is_some(),
                "dictionary entry {elem} missing from skip-list"
            );
        }
    }
}

impl Default for ZSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let zset = ZSet::new();
        assert!(zset.is_empty());

        zset.add("alice", 85.5);
        zset.add("bob", 72.0);
        zset.add("carol", 92.5);
        zset.validate();

        assert_eq!(zset.len(), 3);
        assert_eq!(zset.score("alice"), Some(85.5));
        assert_eq!(zset.score("dave"), None);

        assert_eq!(zset.rank("carol"), Some(0));
        assert_eq!(zset.rank("alice"), Some(1));
        assert_eq!(zset.rank("bob"), Some(2));
        assert_eq!(zset.rev_rank("carol"), Some(2));

        assert_eq!(zset.range(0, 1), vec!["carol:92.50", "alice:85.50"]);
        assert_eq!(zset.rev_range(0, 1), vec!["bob:72.00", "alice:85.50"]);

        assert!(zset.remove("bob"));
        zset.validate();
        assert_eq!(zset.len(), 2);
        assert_eq!(zset.score("bob"), None);
        assert!(!zset.remove("bob"));
    }

    #[test]
    fn test_update_score_moves_rank() {
        let zset = ZSet::new();
        zset.add("alice", 85.5);
        zset.add("bob", 72.0);

        assert!(zset.add("bob", 90.0));
        zset.validate();

        assert_eq!(zset.score("bob"), Some(90.0));
        assert_eq!(zset.rank("bob"), Some(0));
        assert_eq!(zset.rank("alice"), Some(1));
        assert_eq!(zset.len(), 2);
    }

    #[test]
    fn test_same_score_readd_is_noop() {
        let zset = ZSet::new();
        assert!(zset.add("a", 1.0));
        assert!(!zset.add("a", 1.0));
        assert_eq!(zset.len(), 1);
    }

    #[test]
    fn test_tie_break_is_descending_by_element() {
        let zset = ZSet::new();
        zset.add("A", 100.0);
        zset.add("B", 100.0);
        zset.add("C", 100.0);
        zset.validate();

        assert_eq!(zset.rank("C"), Some(0));
        assert_eq!(zset.rank("B"), Some(1));
        assert_eq!(zset.rank("A"), Some(2));

        assert_eq!(zset.range(0, 2).len(), 3);
        assert!(zset.range(5, 10).is_empty());
        assert!(zset.range(2, 1).is_empty());
    }

    #[test]
    fn test_range_queries() {
        let zset = ZSet::new();
        for i in 0..10 {
            zset.add(&format!("elem-{i}"), f64::from(i * 10));
        }

        assert_eq!(zset.range(0, 0), vec!["elem-9:90.00"]);
        assert_eq!(
            zset.range(0, 4),
            vec![
                "elem-9:90.00",
                "elem-8:80.00",
                "elem-7:70.00",
                "elem-6:60.00",
                "elem-5:50.00"
            ]
        );
        assert_eq!(
            zset.range(5, 9),
            vec![
                "elem-4:40.00",
                "elem-3:30.00",
                "elem-2:20.00",
                "elem-1:10.00",
                "elem-0:0.00"
            ]
        );

        assert_eq!(zset.rev_range(0, 0), vec!["elem-0:0.00"]);
        assert_eq!(
            zset.rev_range(0, 4),
            vec![
                "elem-0:0.00",
                "elem-1:10.00",
                "elem-2:20.00",
                "elem-3:30.00",
                "elem-4:40.00"
            ]
        );
        // Stop clamps to the last reverse rank.
        assert_eq!(zset.rev_range(8, 12), vec!["elem-8:80.00", "elem-9:90.00"]);
        assert_eq!(zset.rev_range(3, 3), vec!["elem-3:30.00"]);
    }

    #[test]
    fn test_rank_matches_sorted_order() {
        let zset = ZSet::new();
        let mut data: Vec<(String, f64)> = (0..100)
            .map(|i| (format!("item-{i}"), f64::from(i)))
            .collect();

        // Shuffled insertion order must not matter.
        use rand::seq::SliceRandom;
        data.shuffle(&mut rand::thread_rng());
        for (elem, score) in &data {
            zset.add(elem, *score);
        }
        zset.validate();

        data.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap()
                .then_with(|| b.0.cmp(&a.0))
        });

        for (expected_rank, (elem, _)) in data.iter().enumerate() {
            assert_eq!(zset.rank(elem), Some(expected_rank));
            assert_eq!(zset.rev_rank(elem), Some(data.len() - 1 - expected_rank));
            // Cross-check through the range query.
            let at_rank = zset.range(expected_rank, expected_rank);
            assert!(at_rank[0].starts_with(&format!("{elem}:")));
        }
    }

    #[test]
    fn test_clear_leaves_reusable() {
        let zset = ZSet::new();
        zset.add("a", 1.0);
        zset.add("b", 2.0);
        zset.clear();
        assert!(zset.is_empty());
        assert!(!zset.contains("a"));

        zset.add("c", 3.0);
        assert_eq!(zset.rank("c"), Some(0));
    }

    #[test]
    fn test_concurrent_add_and_remove() {
        use std::sync::Arc;
        use std::thread;

        let zset = Arc::new(ZSet::new());
        let workers = 8;
        let ops = 50;

        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let zset = Arc::clone(&zset);
                thread::spawn(move || {
                    for i in 0..ops {
                        zset.add(&format!("worker-{w}-elem-{i}"), f64::from(w * 100 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(zset.len(), (workers * ops) as usize);
        zset.validate();

        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let zset = Arc::clone(&zset);
                thread::spawn(move || {
                    for i in 0..ops {
                        let elem = format!("worker-{w}-elem-{i}");
                        assert_eq!(zset.score(&elem), Some(f64::from(w * 100 + i)));
                        assert!(zset.remove(&elem));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(zset.is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u8, i16),
            Remove(u8),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (any::<u8>(), any::<i16>()).prop_map(|(e, s)| Op::Add(e % 32, s)),
                any::<u8>().prop_map(|e| Op::Remove(e % 32)),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// Span bookkeeping survives arbitrary add/re-score/remove
            /// interleavings, and ranks stay consistent with their
            /// reverses.
            #[test]
            fn prop_span_arithmetic_holds(ops in proptest::collection::vec(op_strategy(), 1..200)) {
                let zset = ZSet::new();
                for op in ops {
                    match op {
                        Op::Add(e, s) => {
                            zset.add(&format!("e{e}"), f64::from(s));
                        }
                        Op::Remove(e) => {
                            zset.remove(&format!("e{e}"));
                        }
                    }
                    zset.validate();
                }

                let len = zset.len();
                for e in 0..32u8 {
                    let elem = format!("e{e}");
                    if let Some(rank) = zset.rank(&elem) {
                        prop_assert_eq!(zset.rev_rank(&elem), Some(len - 1 - rank));
                    }
                }
            }

            /// Range-by-rank agrees with a reference sort of the same
            /// entries.
            #[test]
            fn prop_range_matches_reference(scores in proptest::collection::vec(-1000i32..1000, 1..64)) {
                let zset = ZSet::new();
                let mut reference: Vec<(String, f64)> = Vec::new();
                for (i, s) in scores.iter().enumerate() {
                    let elem = format!("m{i}");
                    let score = f64::from(*s);
                    zset.add(&elem, score);
                    reference.push((elem, score));
                }
                reference.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1).unwrap().then_with(|| b.0.cmp(&a.0))
                });

                let expected: Vec<String> = reference
                    .iter()
                    .map(|(e, s)| format!("{e}:{s:.2}"))
                    .collect();
                prop_assert_eq!(zset.range(0, reference.len() - 1), expected);
            }
        }
    }
}
