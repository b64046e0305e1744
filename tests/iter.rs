use radixtree::{PrefixIter, RadixTree};

fn sample_tree() -> RadixTree<u32> {
  let mut tree = RadixTree::new();
  tree.insert("car", 1);
  tree.insert("carpet", 2);
  tree.insert("cart", 3);
  tree.insert("cat", 4);
  tree.insert("car", 5);
  tree
}

#[test]
fn test_iterator_yields_chain_order() {
  let tree = sample_tree();

  let got: Vec<u32> = tree.match_iter("ca").copied().collect();
  assert_eq!(got, tree.match_prefix("ca"));

  let got: Vec<u32> = tree.match_iter("car").copied().collect();
  assert_eq!(got, vec![1, 5, 2, 3]);
}

#[test]
fn test_manual_cursor_protocol() {
  let tree = sample_tree();

  let mut iter = tree.match_iter("car");
  assert_eq!(PrefixIter::count(&iter), 3); // car, carpet, cart

  let mut got = Vec::new();
  while iter.valid() {
    got.push(*iter.value());
    iter.advance();
  }
  assert_eq!(got, vec![1, 5, 2, 3]);
  assert!(!iter.valid());
}

#[test]
fn test_no_match_yields_invalid_cursor() {
  let tree = sample_tree();

  let mut iter = tree.match_iter("dog");
  assert!(!iter.valid());
  assert_eq!(PrefixIter::count(&iter), 0);
  assert_eq!(iter.next(), None);

  let mut iter = tree.match_iter("");
  assert!(!iter.valid());
}

#[test]
fn test_reset_pages_through_leaves() {
  let mut tree = RadixTree::new();
  for (i, key) in ["m1", "m2", "m3", "m4", "m5"].iter().enumerate() {
    tree.insert(key, i as u32);
  }

  // Page of two leaves starting after the first two.
  let mut iter = tree.match_iter("m");
  iter.reset(2, 2);
  let got: Vec<u32> = iter.copied().collect();
  assert_eq!(got, vec![2, 3]);

  // Restart from the front, capped at one leaf.
  let mut iter = tree.match_iter("m");
  iter.reset(0, 1);
  let got: Vec<u32> = iter.copied().collect();
  assert_eq!(got, vec![0]);
}

#[test]
fn test_reset_skipping_past_the_end() {
  let mut tree = RadixTree::new();
  tree.insert("k1", 1);
  tree.insert("k2", 2);

  let mut iter = tree.match_iter("k");
  iter.reset(10, 5);
  // The skip clamps at the final leaf.
  let got: Vec<u32> = iter.copied().collect();
  assert_eq!(got, vec![2]);
}

#[test]
fn test_reset_mid_walk_rewinds_value_index() {
  let mut tree = RadixTree::new();
  tree.insert("q", 1);
  tree.insert("q", 2);
  tree.insert("qr", 3);

  let mut iter = tree.match_iter("q");
  iter.next();
  iter.next();
  iter.reset(0, PrefixIter::count(&iter));
  let got: Vec<u32> = iter.copied().collect();
  assert_eq!(got, vec![1, 2, 3]);
}

#[test]
fn test_multivalue_leaves_enumerate_fully() {
  let mut tree = RadixTree::new();
  tree.insert("x", 1);
  tree.insert("x", 2);
  tree.insert("x", 3);
  tree.insert("xy", 4);

  let got: Vec<u32> = tree.match_iter("x").copied().collect();
  assert_eq!(got, vec![1, 2, 3, 4]);

  let got: Vec<u32> = tree.match_iter("xy").copied().collect();
  assert_eq!(got, vec![4]);
}

#[test]
fn test_snapshot_count_matches_distinct_patterns() {
  let tree = sample_tree();

  assert_eq!(PrefixIter::count(&tree.match_iter("ca")), 4);
  assert_eq!(PrefixIter::count(&tree.match_iter("cat")), 1);
  assert_eq!(PrefixIter::count(&tree.match_iter("nope")), 0);
}
