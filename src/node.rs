use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::mem;

use ahash::RandomState;

use crate::chain::{LeafChain, LeafId};
use crate::heap;
use crate::unicode;
use crate::RadixTreeStats;

/// A tree node. The incoming edge from the parent is labeled with `key`
/// (empty only at the root); children are keyed by the first codepoint of
/// their own edge label. A pattern that terminates exactly here has its
/// values in the record `value` points at.
#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
  pub key: Vec<u8>,
  pub children: BTreeMap<Box<[u8]>, Node<V>>,
  pub value: Option<LeafId>,
  pub heap: Option<Vec<V>>,
  pub first: Option<LeafId>,
  pub last: Option<LeafId>,
  pub count: usize,
}

/// What an insertion lower in the tree did to the chain: ancestors bump
/// their subtree count and, when their range ended at `old_last`, extend
/// it to the new record.
pub(crate) struct Splice {
  pub old_last: Option<LeafId>,
  pub new_last: LeafId,
}

impl<V> Default for Node<V> {
  fn default() -> Self {
    Self::with_key(Vec::new())
  }
}

impl<V> Node<V> {
  pub fn with_key(key: Vec<u8>) -> Self {
    Self {
      key,
      children: BTreeMap::new(),
      value: None,
      heap: None,
      first: None,
      last: None,
      count: 0,
    }
  }

  /// Matches query codepoints `uchars[depth..]` against this node's edge
  /// label. Returns `(bytes of the label matched, codepoints consumed)`;
  /// the label was fully consumed iff the byte count equals its length.
  pub fn match_edge(&self, uchars: &[&[u8]], mut depth: usize) -> (usize, usize) {
    let mut count = 0;
    while count < self.key.len() && depth < uchars.len() {
      let uchar = uchars[depth];
      if self.key.len() - count < uchar.len() || &self.key[count..count + uchar.len()] != uchar {
        break;
      }
      count += uchar.len();
      depth += 1;
    }
    (count, depth)
  }

  /// Inserts below a node whose edge label is already fully matched, with
  /// `depth` codepoints of the query consumed. Returns `None` when no new
  /// record was created (append to an existing pattern, or a silently
  /// ignored input).
  pub fn insert_at(
    &mut self,
    pattern: &[u8],
    uchars: &[&[u8]],
    depth: usize,
    value: V,
    chain: &mut LeafChain<V>,
  ) -> Option<Splice> {
    if depth == uchars.len() {
      // The whole query terminates at this node.
      if let Some(id) = self.value {
        chain.append_value(id, value);
        return None;
      }
      let old_last = self.last;
      let id = self.attach_record(value, chain);
      self.value = Some(id);
      return Some(Splice { old_last, new_last: id });
    }

    let uchar = uchars[depth];
    if let Some(child) = self.children.get_mut(uchar) {
      let (count, child_depth) = child.match_edge(uchars, depth);
      let spliced = if count < child.key.len() {
        child.split_insert(count, child_depth, pattern, uchars, value, chain)
      } else {
        child.insert_at(pattern, uchars, child_depth, value, chain)
      };
      if let Some(spliced) = &spliced {
        self.count += 1;
        if self.last == spliced.old_last {
          self.last = Some(spliced.new_last);
        }
      }
      spliced
    } else {
      // No child starts with the next codepoint: the residual pattern
      // becomes a fresh edge below this node.
      let old_last = self.last;
      let id = self.attach_record(value, chain);
      let offset: usize = uchars[..depth].iter().map(|u| u.len()).sum();
      self.attach_child(pattern[offset..].to_vec(), uchar.len(), id);
      Some(Splice { old_last, new_last: id })
    }
  }

  /// Splits this node's edge at byte offset `count` (codepoint-aligned by
  /// construction) and re-hangs the old subtree below the retained prefix.
  /// The inserted value lands either on the prefix node itself or on a new
  /// sibling edge carrying the residual pattern.
  fn split_insert(
    &mut self,
    count: usize,
    depth: usize,
    pattern: &[u8],
    uchars: &[&[u8]],
    value: V,
    chain: &mut LeafChain<V>,
  ) -> Option<Splice> {
    let anchor = self.last?;
    let suffix_first_len = unicode::decode_first(&self.key[count..])?.len();

    let record = chain.alloc(value);
    chain.splice_after(anchor, record);

    let suffix = self.key.split_off(count);
    let suffix_key: Box<[u8]> = suffix[..suffix_first_len].into();
    let inner = Node {
      key: suffix,
      children: mem::take(&mut self.children),
      value: self.value.take(),
      heap: self.heap.take(),
      first: self.first,
      last: self.last,
      count: self.count,
    };
    self.children.insert(suffix_key, inner);

    if depth == uchars.len() {
      self.value = Some(record);
    } else {
      let offset: usize = uchars[..depth].iter().map(|u| u.len()).sum();
      self.attach_child(pattern[offset..].to_vec(), uchars[depth].len(), record);
    }

    self.count += 1;
    self.last = Some(record);
    Some(Splice {
      old_last: Some(anchor),
      new_last: record,
    })
  }

  /// Allocates a record for `value` at the end of this subtree's range.
  fn attach_record(&mut self, value: V, chain: &mut LeafChain<V>) -> LeafId {
    let id = chain.alloc(value);
    if let Some(last) = self.last {
      chain.splice_after(last, id);
    } else {
      self.first = Some(id);
    }
    self.last = Some(id);
    self.count += 1;
    id
  }

  /// Hangs a new single-pattern child edge labeled `label` below this
  /// node; `first_len` is the byte length of the label's first codepoint.
  fn attach_child(&mut self, label: Vec<u8>, first_len: usize, record: LeafId) {
    debug_assert!(first_len <= label.len());
    let map_key: Box<[u8]> = label[..first_len].into();
    debug_assert!(!self.children.contains_key(&map_key));
    let mut child = Node::with_key(label);
    child.value = Some(record);
    child.first = Some(record);
    child.last = Some(record);
    child.count = 1;
    self.children.insert(map_key, child);
  }

  pub fn collect_stats(&self, stats: &mut RadixTreeStats) {
    stats.nodes += 1;
    if self.heap.is_some() {
      stats.heaps += 1;
    }
    for child in self.children.values() {
      child.collect_stats(stats);
    }
  }
}

impl<V: Clone + Eq + Hash> Node<V> {
  /// Materializes this subtree's top-`limit` list, children first. A child
  /// above the threshold already holds its own list, so its items are
  /// merged directly and its chain range is jumped over in the walk; the
  /// dedup set keeps a value reachable through both routes counted once.
  pub fn build_heaps<F>(&mut self, chain: &LeafChain<V>, cmp: &F, limit: usize, threshold: usize)
  where
    F: Fn(&V, &V) -> bool,
  {
    for child in self.children.values_mut() {
      if child.count > threshold {
        child.build_heaps(chain, cmp, limit, threshold);
      }
    }

    let mut buf = Vec::with_capacity(limit.min(self.count));
    let mut seen: HashSet<V, RandomState> = HashSet::with_hasher(RandomState::new());
    let mut skip: HashMap<LeafId, LeafId, RandomState> = HashMap::with_hasher(RandomState::new());

    for child in self.children.values() {
      if let Some(child_heap) = &child.heap {
        for item in child_heap {
          if seen.insert(item.clone()) {
            heap::heap_insert(&mut buf, item.clone(), cmp, limit);
          }
        }
        if let (Some(first), Some(last)) = (child.first, child.last) {
          skip.insert(first, last);
        }
      }
    }

    let mut cursor = self.first;
    while let Some(id) = cursor {
      if let Some(&end) = skip.get(&id) {
        // Range already merged from the child's list.
        if Some(end) == self.last {
          break;
        }
        cursor = chain.record(end).next;
        continue;
      }
      for item in &chain.record(id).values {
        if seen.insert(item.clone()) {
          heap::heap_insert(&mut buf, item.clone(), cmp, limit);
        }
      }
      if Some(id) == self.last {
        break;
      }
      cursor = chain.record(id).next;
    }

    heap::sort_heap(&mut buf, cmp);
    self.heap = Some(buf);
  }
}
