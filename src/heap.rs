//! Bounded binary heap under a caller-supplied comparator.
//!
//! `cmp(a, b) == true` means `a` is strictly preferred over `b` (a strict
//! weak ordering, e.g. `|a, b| a < b` to retain the smallest items). The
//! buffer is kept as a max-heap of the retained items: the root is the
//! weakest survivor, so a candidate only has to beat the root to enter.
//! `std::collections::BinaryHeap` cannot carry a closure ordering, hence
//! the explicit sift routines.

/// Offers `item` to a heap capped at `limit` entries.
///
/// Below capacity the item is pushed unconditionally; at capacity it
/// replaces the root when the comparator prefers it, otherwise it is
/// dropped. Ties are resolved arbitrarily.
pub fn heap_insert<V, F>(buf: &mut Vec<V>, item: V, cmp: F, limit: usize)
where
  F: Fn(&V, &V) -> bool,
{
  if buf.len() < limit {
    buf.push(item);
    let pos = buf.len() - 1;
    sift_up(buf, &cmp, pos);
  } else if !buf.is_empty() && cmp(&item, &buf[0]) {
    buf[0] = item;
    let len = buf.len();
    sift_down(buf, &cmp, 0, len);
  }
}

/// Sorts a heap built by [`heap_insert`] in place, ascending under `cmp`
/// (most-preferred item first).
pub fn sort_heap<V, F>(buf: &mut [V], cmp: F)
where
  F: Fn(&V, &V) -> bool,
{
  for end in (1..buf.len()).rev() {
    buf.swap(0, end);
    sift_down(buf, &cmp, 0, end);
  }
}

fn sift_up<V, F>(buf: &mut [V], cmp: &F, mut pos: usize)
where
  F: Fn(&V, &V) -> bool,
{
  while pos > 0 {
    let parent = (pos - 1) / 2;
    if cmp(&buf[parent], &buf[pos]) {
      buf.swap(parent, pos);
      pos = parent;
    } else {
      break;
    }
  }
}

fn sift_down<V, F>(buf: &mut [V], cmp: &F, mut pos: usize, end: usize)
where
  F: Fn(&V, &V) -> bool,
{
  loop {
    let left = 2 * pos + 1;
    if left >= end {
      break;
    }
    let mut top = pos;
    if cmp(&buf[top], &buf[left]) {
      top = left;
    }
    let right = left + 1;
    if right < end && cmp(&buf[top], &buf[right]) {
      top = right;
    }
    if top == pos {
      break;
    }
    buf.swap(pos, top);
    pos = top;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn less(a: &u32, b: &u32) -> bool {
    a < b
  }

  #[test]
  fn retains_the_best_under_less() {
    let mut heap = Vec::new();
    for v in [50, 3, 99, 1, 42, 7, 7, 0, 88] {
      heap_insert(&mut heap, v, less, 4);
    }
    sort_heap(&mut heap, less);
    assert_eq!(heap, vec![0, 1, 3, 7]);
  }

  #[test]
  fn below_capacity_keeps_everything() {
    let mut heap = Vec::new();
    for v in [9, 2, 5] {
      heap_insert(&mut heap, v, less, 10);
    }
    sort_heap(&mut heap, less);
    assert_eq!(heap, vec![2, 5, 9]);
  }

  #[test]
  fn zero_limit_keeps_nothing() {
    let mut heap: Vec<u32> = Vec::new();
    heap_insert(&mut heap, 1, less, 0);
    assert!(heap.is_empty());
  }

  #[test]
  fn greater_comparator_retains_largest() {
    let mut heap = Vec::new();
    for v in 0..100u32 {
      heap_insert(&mut heap, v, |a, b| a > b, 3);
    }
    sort_heap(&mut heap, |a, b| a > b);
    assert_eq!(heap, vec![99, 98, 97]);
  }

  #[test]
  fn matches_full_sort_on_random_input() {
    // Deterministic pseudo-random stream, no rng dependency needed here.
    let mut state = 0x9E37u32;
    let mut input = Vec::new();
    for _ in 0..500 {
      state = state.wrapping_mul(48271) % 0x7FFF_FFFF;
      input.push(state % 10_000);
    }

    let mut heap = Vec::new();
    for &v in &input {
      heap_insert(&mut heap, v, less, 25);
    }
    sort_heap(&mut heap, less);

    input.sort_unstable();
    input.truncate(25);
    assert_eq!(heap, input);
  }
}
