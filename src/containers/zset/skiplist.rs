//! Probabilistic skip-list keyed by `(score, element)`.
//!
//! Ordering is descending by score with a descending tie-break on the
//! element, so rank 0 always names the greatest pair. Nodes live in an
//! index-keyed arena with a slot free-list; links are arena indices, which
//! keeps the bidirectional structure free of ownership cycles.
//!
//! Every link carries a `span`: the number of level-0 hops it covers,
//! counting a trailing link as the distance to the virtual end of the
//! list. The sum of spans along any level therefore equals the list
//! length, and rank queries resolve in O(log n) by summing spans on the
//! way down.

use rand::Rng;

/// Maximum number of forward chains a node can participate in.
pub(crate) const MAX_LEVEL: usize = 32;

/// Probability factor of the geometric level distribution.
const PROBABILITY: f64 = 0.25;

/// Arena slot of the header node.
const HEAD: usize = 0;

#[derive(Debug, Clone, Copy)]
struct Link {
    forward: Option<usize>,
    span: usize,
}

#[derive(Debug)]
struct Node {
    elem: String,
    score: f64,
    backward: Option<usize>,
    links: Vec<Link>,
}

impl Node {
    fn new(elem: String, score: f64, level: usize) -> Self {
        Self {
            elem,
            score,
            backward: None,
            links: vec![
                Link {
                    forward: None,
                    span: 0
                };
                level
            ],
        }
    }
}

/// The skip-list proper. Callers are expected to hold their own lock; the
/// structure itself is single-writer.
#[derive(Debug)]
pub(crate) struct SkipList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    /// Highest level currently in use.
    level: usize,
    length: usize,
    tail: Option<usize>,
}

impl SkipList {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::new(String::new(), 0.0, MAX_LEVEL)],
            free: Vec::new(),
            level: 1,
            length: 0,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.length
    }

    /// True when `(score_a, elem_a)` orders strictly before
    /// `(score_b, elem_b)`: higher score first, larger element on ties.
    fn precedes(score_a: f64, elem_a: &str, score_b: f64, elem_b: &str) -> bool {
        score_a > score_b || (score_a == score_b && elem_a > elem_b)
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn random_level<R: Rng>(rng: &mut R) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && rng.gen::<f64>() < PROBABILITY {
            level += 1;
        }
        level
    }

    /// Splices `(elem, score)` into every chain it draws a level for.
    /// The caller guarantees the pair is not already present.
    pub(crate) fn insert<R: Rng>(&mut self, elem: String, score: f64, rng: &mut R) {
        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];

        // Walk top-down recording, per level, the last predecessor and the
        // cumulative span from the header up to it.
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].links[i].forward {
                let n = &self.nodes[next];
                if Self::precedes(n.score, &n.elem, score, &elem) {
                    rank[i] += self.nodes[x].links[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        let new_level = Self::random_level(rng);
        if new_level > self.level {
            for i in self.level..new_level {
                rank[i] = 0;
                update[i] = HEAD;
                // A fresh chain's only link covers the whole list.
                self.nodes[HEAD].links[i].span = self.length;
            }
            self.level = new_level;
        }

        let idx = self.alloc(Node::new(elem, score, new_level));

        for i in 0..new_level {
            let pred = update[i];
            self.nodes[idx].links[i].forward = self.nodes[pred].links[i].forward;
            self.nodes[pred].links[i].forward = Some(idx);

            // Partition the old link's span exactly: the predecessor keeps
            // the hops up to the new node, the new node takes the rest.
            let pred_span = self.nodes[pred].links[i].span;
            self.nodes[idx].links[i].span = pred_span - (rank[0] - rank[i]);
            self.nodes[pred].links[i].span = rank[0] - rank[i] + 1;
        }
        for i in new_level..self.level {
            self.nodes[update[i]].links[i].span += 1;
        }

        self.nodes[idx].backward = if update[0] == HEAD {
            None
        } else {
            Some(update[0])
        };
        if let Some(next) = self.nodes[idx].links[0].forward {
            self.nodes[next].backward = Some(idx);
        } else {
            self.tail = Some(idx);
        }
        self.length += 1;
    }

    /// Unlinks `(elem, score)` if present, returning whether it was.
    pub(crate) fn remove(&mut self, elem: &str, score: f64) -> bool {
        let mut update = [HEAD; MAX_LEVEL];

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                let n = &self.nodes[next];
                if Self::precedes(n.score, &n.elem, score, elem) {
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        let target = match self.nodes[x].links[0].forward {
            Some(next)
                if self.nodes[next].score == score && self.nodes[next].elem == elem =>
            {
                next
            }
            _ => return false,
        };

        for i in 0..self.level {
            let pred = update[i];
            if self.nodes[pred].links[i].forward == Some(target) {
                // Absorb the removed link's hops, minus the node itself.
                // Summed before the subtraction: a trailing link's span can
                // be zero.
                let removed_span = self.nodes[target].links[i].span;
                self.nodes[pred].links[i].span =
                    self.nodes[pred].links[i].span + removed_span - 1;
                self.nodes[pred].links[i].forward = self.nodes[target].links[i].forward;
            } else {
                self.nodes[pred].links[i].span -= 1;
            }
        }

        if let Some(next) = self.nodes[target].links[0].forward {
            self.nodes[next].backward = self.nodes[target].backward;
        } else {
            self.tail = self.nodes[target].backward;
        }

        while self.level > 1 && self.nodes[HEAD].links[self.level - 1].forward.is_none() {
            self.nodes[HEAD].links[self.level - 1].span = 0;
            self.level -= 1;
        }

        self.length -= 1;
        self.free.push(target);
        true
    }

    /// Zero-based rank of `(elem, score)`, summing spans on the way down.
    pub(crate) fn rank_of(&self, elem: &str, score: f64) -> Option<usize> {
        let mut rank = 0usize;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                let n = &self.nodes[next];
                if Self::precedes(n.score, &n.elem, score, elem)
                    || (n.score == score && n.elem == elem)
                {
                    rank += self.nodes[x].links[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            if x != HEAD && self.nodes[x].elem == elem && self.nodes[x].score == score {
                return Some(rank - 1);
            }
        }
        None
    }

    /// Arena slot of the node at zero-based `rank`.
    fn node_at_rank(&self, rank: usize) -> Option<usize> {
        let target = rank + 1;
        let mut traversed = 0usize;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                if traversed + self.nodes[x].links[i].span <= target {
                    traversed += self.nodes[x].links[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            if x != HEAD && traversed == target {
                return Some(x);
            }
        }
        None
    }

    /// Collects `"{elem}:{score:.2}"` for ranks `start..=stop`, walking the
    /// level-0 chain. Bounds are assumed pre-clamped by the caller.
    pub(crate) fn collect_range(&self, start: usize, stop: usize) -> Vec<String> {
        let want = stop - start + 1;
        let mut out = Vec::with_capacity(want);
        let mut cursor = self.node_at_rank(start);
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            out.push(format!("{}:{:.2}", node.elem, node.score));
            if out.len() == want {
                break;
            }
            cursor = node.links[0].forward;
        }
        out
    }

    /// Collects `"{elem}:{score:.2}"` for reverse ranks `start..=stop`,
    /// walking backward pointers from the tail.
    pub(crate) fn collect_rev_range(&self, start: usize, stop: usize) -> Vec<String> {
        let want = stop - start + 1;
        let mut out = Vec::with_capacity(want);
        let mut cursor = self.tail;
        let mut skipped = 0usize;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            if skipped >= start {
                out.push(format!("{}:{:.2}", node.elem, node.score));
                if out.len() == want {
                    break;
                }
            }
            skipped += 1;
            cursor = node.backward;
        }
        out
    }

    /// Asserts the structural invariants; test support.
    #[cfg(test)]
    pub(crate) fn validate(&self) {
        // Per-level span sums equal the list length.
        for i in 0..self.level {
            let mut sum = 0usize;
            let mut x = HEAD;
            loop {
                sum += self.nodes[x].links[i].span;
                match self.nodes[x].links[i].forward {
                    Some(next) => x = next,
                    None => break,
                }
            }
            assert_eq!(sum, self.length, "span sum mismatch at level {i}");
        }

        // Level-0 chain is strictly descending and backward-consistent.
        let mut prev: Option<usize> = None;
        let mut cursor = self.nodes[HEAD].links[0].forward;
        let mut walked = 0usize;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            if let Some(p) = prev {
                let pn = &self.nodes[p];
                assert!(
                    Self::precedes(pn.score, &pn.elem, node.score, &node.elem),
                    "ordering violated between {} and {}",
                    pn.elem,
                    node.elem
                );
                assert_eq!(node.backward, Some(p));
            } else {
                assert_eq!(node.backward, None);
            }
            prev = Some(idx);
            walked += 1;
            cursor = node.links[0].forward;
        }
        assert_eq!(walked, self.length);
        assert_eq!(self.tail, prev);
    }
}
