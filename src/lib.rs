//! A UTF-8 keyed radix tree for prefix-match retrieval.
//!
//! Patterns are indexed per codepoint (never split mid-sequence) into a
//! compressed prefix tree. Every distinct pattern owns one record in an
//! insertion-ordered leaf chain, and each subtree tracks the contiguous
//! chain range it covers, so enumerating all values under a prefix is a
//! linear walk of that range. After bulk loading, [`RadixTree::finish`]
//! can precompute per-subtree top-K lists so that popularity-ranked
//! queries over large subtrees cost O(K) instead of a full walk.
//!
//! ```
//! use radixtree::RadixTree;
//!
//! let mut tree: RadixTree<u32> = RadixTree::new();
//! tree.insert("apple", 1);
//! tree.insert("app", 2);
//! tree.insert("banana", 3);
//!
//! assert_eq!(tree.match_prefix("ap"), vec![1, 2]);
//! assert_eq!(tree.match_top("ap", |a, b| a > b, 1), vec![2]);
//! assert!(tree.match_prefix("c").is_empty());
//! ```

mod chain;
mod heap;
mod node;
mod unicode;

use std::collections::HashSet;
use std::hash::Hash;

use ahash::RandomState;

use chain::{LeafChain, LeafId};
use node::Node;

pub use heap::{heap_insert, sort_heap};

/// Minimum distinct-pattern count for a subtree to get a precomputed
/// top-K list during [`RadixTree::finish`].
const DEFAULT_HEAP_THRESHOLD: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct RadixTreeStats {
  pub nodes: usize,
  pub patterns: usize,
  pub values: usize,
  pub heaps: usize,
  pub max_pattern_values: usize,
}

#[derive(Debug, Clone)]
pub struct RadixTree<V> {
  root: Node<V>,
  chain: LeafChain<V>,
  values: usize,
  heap_threshold: usize,
}

impl<V> Default for RadixTree<V> {
  fn default() -> Self {
    Self {
      root: Node::default(),
      chain: LeafChain::new(),
      values: 0,
      heap_threshold: DEFAULT_HEAP_THRESHOLD,
    }
  }
}

impl<V> RadixTree<V> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a tree with a custom heap-materialization threshold.
  ///
  /// [`RadixTree::finish`] only builds a top-K list for subtrees holding
  /// more than this many distinct patterns. Lower values trade memory and
  /// build time for more cache hits on ranked queries.
  pub fn with_threshold(threshold: usize) -> Self {
    Self {
      heap_threshold: threshold,
      ..Self::default()
    }
  }

  /// Total number of values stored (appends to an existing pattern count).
  pub fn len(&self) -> usize {
    self.values
  }

  pub fn is_empty(&self) -> bool {
    self.values == 0
  }

  /// Drops every pattern and value, keeping the configured threshold.
  pub fn clear(&mut self) {
    self.root = Node::default();
    self.chain.clear();
    self.values = 0;
  }

  /// Indexes `value` under `pattern`.
  ///
  /// Empty patterns and patterns that are not well-formed UTF-8 are
  /// silently ignored. A NUL byte ends the pattern early; inserting the
  /// same pattern again appends to its existing value list.
  pub fn insert<K: AsRef<[u8]>>(&mut self, pattern: K, value: V) {
    let pattern = pattern.as_ref();
    if pattern.is_empty() {
      return;
    }
    let Some(uchars) = unicode::decode(pattern) else {
      return;
    };
    if uchars.is_empty() {
      return;
    }
    // Labels only ever hold decoded bytes; anything past a NUL is dropped.
    let decoded_len: usize = uchars.iter().map(|u| u.len()).sum();
    self
      .root
      .insert_at(&pattern[..decoded_len], &uchars, 0, value, &mut self.chain);
    self.values += 1;
  }

  /// Returns every value stored under a pattern beginning with `key`, in
  /// leaf-chain order. Duplicate values are preserved; an empty or invalid
  /// key yields no results.
  pub fn match_prefix<K: AsRef<[u8]>>(&self, key: K) -> Vec<V>
  where
    V: Clone,
  {
    let mut out = Vec::new();
    let Some(node) = self.lookup(key.as_ref()) else {
      return out;
    };
    let (Some(first), Some(last)) = (node.first, node.last) else {
      return out;
    };

    let mut cursor = first;
    loop {
      out.extend_from_slice(&self.chain.record(cursor).values);
      if cursor == last {
        break;
      }
      match self.chain.record(cursor).next {
        Some(next) => cursor = next,
        None => break,
      }
    }
    out
  }

  /// Returns the top `limit` distinct values under `key`, best first
  /// according to `cmp` (`cmp(a, b)` true means `a` beats `b`).
  ///
  /// Served from the subtree's precomputed list when [`RadixTree::finish`]
  /// built one, otherwise by walking the leaf chain with a bounded heap.
  /// Either way a value stored under several matching patterns appears
  /// once.
  pub fn match_top<K, F>(&self, key: K, cmp: F, limit: usize) -> Vec<V>
  where
    K: AsRef<[u8]>,
    V: Clone + Eq + Hash,
    F: Fn(&V, &V) -> bool,
  {
    let Some(node) = self.lookup(key.as_ref()) else {
      return Vec::new();
    };

    if let Some(cached) = &node.heap {
      return cached[..limit.min(cached.len())].to_vec();
    }

    let mut buf = Vec::new();
    let (Some(first), Some(last)) = (node.first, node.last) else {
      return buf;
    };
    let mut seen: HashSet<V, RandomState> = HashSet::with_hasher(RandomState::new());
    let mut cursor = first;
    loop {
      for item in &self.chain.record(cursor).values {
        if seen.insert(item.clone()) {
          heap_insert(&mut buf, item.clone(), &cmp, limit);
        }
      }
      if cursor == last {
        break;
      }
      match self.chain.record(cursor).next {
        Some(next) => cursor = next,
        None => break,
      }
    }
    sort_heap(&mut buf, &cmp);
    buf
  }

  /// Returns a snapshot cursor over the values under `key`.
  ///
  /// The cursor walks the matched subtree's chain range leaf by leaf and
  /// value by value; [`PrefixIter::reset`] repositions it for paging.
  /// It also implements [`Iterator`], yielding `&V`.
  pub fn match_iter<K: AsRef<[u8]>>(&self, key: K) -> PrefixIter<'_, V> {
    match self.lookup(key.as_ref()) {
      Some(node) => PrefixIter::new(&self.chain, node.first, node.last, node.count),
      None => PrefixIter::new(&self.chain, None, None, 0),
    }
  }

  /// Precomputes top-`limit` lists for every subtree holding more than
  /// the configured threshold of distinct patterns.
  ///
  /// Intended as a single pass after bulk loading, before ranked queries;
  /// lists built by an earlier call are rebuilt. Subtrees are processed
  /// children first so each parent merges its children's lists and only
  /// walks the chain segments no child already covers.
  pub fn finish<F>(&mut self, cmp: F, limit: usize)
  where
    V: Clone + Eq + Hash,
    F: Fn(&V, &V) -> bool,
  {
    if self.root.count < self.heap_threshold {
      return;
    }
    self
      .root
      .build_heaps(&self.chain, &cmp, limit, self.heap_threshold);
  }

  pub fn stats(&self) -> RadixTreeStats {
    let mut stats = RadixTreeStats::default();
    self.root.collect_stats(&mut stats);
    stats.patterns = self.chain.len();
    stats.values = self.values;
    stats.max_pattern_values = self.chain.max_values();
    stats
  }

  // --- LOOKUP ---

  /// Decodes `key` and descends to the covering node. `None` unless every
  /// query codepoint was consumed on the way down.
  fn lookup(&self, key: &[u8]) -> Option<&Node<V>> {
    let uchars = unicode::decode(key)?;
    if uchars.is_empty() {
      return None;
    }
    let (node, _, depth) = self.find_node(&uchars);
    if depth == uchars.len() {
      Some(node)
    } else {
      None
    }
  }

  /// Descends from the root matching query codepoints against edge labels.
  /// Returns the deepest node reached, the bytes matched of its label, and
  /// the codepoints consumed.
  fn find_node<'a>(&'a self, uchars: &[&[u8]]) -> (&'a Node<V>, usize, usize) {
    let mut node = &self.root;
    let mut count = 0;
    let mut depth = 0;
    while depth < uchars.len() {
      let Some(child) = node.children.get(uchars[depth]) else {
        break;
      };
      let (child_count, child_depth) = child.match_edge(uchars, depth);
      node = child;
      count = child_count;
      depth = child_depth;
      if count < node.key.len() {
        break;
      }
    }
    (node, count, depth)
  }
}

// --- RUST TRAITS ---

impl<V> FromIterator<(String, V)> for RadixTree<V> {
  fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
    let mut tree = RadixTree::default();
    for (pattern, value) in iter {
      tree.insert(pattern, value);
    }
    tree
  }
}

impl<V> Extend<(String, V)> for RadixTree<V> {
  fn extend<T: IntoIterator<Item = (String, V)>>(&mut self, iter: T) {
    for (pattern, value) in iter {
      self.insert(pattern, value);
    }
  }
}

// --- SNAPSHOT CURSOR ---

/// A snapshot cursor over one subtree's chain range.
///
/// Positions are `(leaf, value-within-leaf)`; `valid` / `value` /
/// `advance` give manual control for paging, and the [`Iterator`] impl
/// drains whatever remains.
pub struct PrefixIter<'a, V> {
  chain: &'a LeafChain<V>,
  begin: Option<LeafId>,
  end: Option<LeafId>,
  current: Option<LeafId>,
  index: usize,
  cursor: usize,
  count: usize,
}

impl<'a, V> PrefixIter<'a, V> {
  fn new(chain: &'a LeafChain<V>, begin: Option<LeafId>, end: Option<LeafId>, count: usize) -> Self {
    Self {
      chain,
      begin,
      end,
      current: begin,
      index: 0,
      cursor: 0,
      count,
    }
  }

  /// Number of leaves (distinct patterns) in the snapshot.
  pub fn count(&self) -> usize {
    self.count
  }

  /// Skips `start` leaves forward from the snapshot's beginning and caps
  /// the walk at `count` leaves from there.
  pub fn reset(&mut self, start: usize, count: usize) {
    self.cursor = 0;
    self.index = 0;
    self.count = count;
    for _ in 0..start {
      let Some(begin) = self.begin else {
        break;
      };
      if self.begin == self.end {
        break;
      }
      match self.chain.record(begin).next {
        Some(next) => self.begin = Some(next),
        None => break,
      }
    }
    self.current = self.begin;
  }

  pub fn valid(&self) -> bool {
    let Some(current) = self.current else {
      return false;
    };
    if self.cursor >= self.count {
      return false;
    }
    if self.cursor == self.count - 1 || self.current == self.end {
      return self.index < self.chain.record(current).values.len();
    }
    true
  }

  /// Current value.
  ///
  /// # Panics
  ///
  /// Panics if the cursor is not [`valid`](Self::valid).
  pub fn value(&self) -> &'a V {
    let current = self.current.expect("cursor exhausted");
    &self.chain.record(current).values[self.index]
  }

  /// Steps to the next value, moving to the next leaf when the current
  /// leaf's values run out.
  pub fn advance(&mut self) {
    let Some(current) = self.current else {
      return;
    };
    self.index += 1;
    if self.index < self.chain.record(current).values.len() {
      return;
    }
    if self.current != self.end && self.cursor < self.count {
      if let Some(next) = self.chain.record(current).next {
        self.index = 0;
        self.current = Some(next);
        self.cursor += 1;
      }
    }
  }
}

impl<'a, V> Iterator for PrefixIter<'a, V> {
  type Item = &'a V;

  fn next(&mut self) -> Option<Self::Item> {
    if !self.valid() {
      return None;
    }
    let item = self.value();
    self.advance();
    Some(item)
  }
}
