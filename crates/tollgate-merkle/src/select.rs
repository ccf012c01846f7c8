//! Leaf selection from a root digest.

use std::collections::BTreeSet;

use tollgate_hash::Digest;

use crate::index::node_count;
use crate::rng::SelectionRng;

/// Pick `count` distinct leaf positions of a tree with the given depth,
/// deterministically from a root digest.
///
/// The seed is the first 8 digest bytes read big-endian and cast to a
/// signed value; the cast is part of the wire contract. Draws are reduced
/// modulo the leaf count and collected until `count` distinct positions
/// exist, so the result is a set, not a sequence.
///
/// Callers must ensure `depth >= 2` and `count` no larger than the leaf
/// count; both are enforced where trees are built and witnesses verified.
pub fn select_leaves(root: &Digest, depth: u32, count: usize) -> BTreeSet<usize> {
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&root.as_bytes()[..8]);
    let seed = u64::from_be_bytes(seed_bytes) as i64;
    let mut rng = SelectionRng::new(seed);

    let internal_count = node_count(depth - 1);
    let leaf_count = node_count(depth) - internal_count;
    debug_assert!(count <= leaf_count, "selection larger than the leaf set");

    let mut selected = BTreeSet::new();
    while selected.len() < count {
        let draw = rng.int63() as usize % leaf_count;
        selected.insert(draw + internal_count);
    }
    selected
}

#[cfg(test)]
mod tests {
    use tollgate_hash::HashAlgo;

    use super::*;
    use crate::index::is_leaf;

    #[test]
    fn test_selection_is_stable() {
        let root = HashAlgo::Md5.hash(b"To be, or not to be, that is the question:");
        let original = select_leaves(&root, 10, 15);
        assert_eq!(original.len(), 15);
        for &num in &original {
            assert!(is_leaf(num, 10), "selected node {num} is not a leaf");
        }
        for _ in 0..10 {
            assert_eq!(select_leaves(&root, 10, 15), original);
        }
    }

    #[test]
    fn test_selection_indices_are_pinned() {
        // Golden vector: the exact leaf set deployed verifiers re-derive
        // for this root. Any drift in the generator, its seeding table or
        // the seed extraction breaks interoperability, not just this test.
        let root = HashAlgo::Md5.hash(b"To be, or not to be, that is the question:");
        let expected: BTreeSet<usize> = [
            531, 559, 567, 730, 746, 788, 812, 827, 851, 923, 932, 939, 956, 1005, 1021,
        ]
        .into_iter()
        .collect();
        assert_eq!(select_leaves(&root, 10, 15), expected);
    }

    #[test]
    fn test_different_roots_select_differently() {
        let first = HashAlgo::Md5.hash(b"To be, or not to be, that is the question:");
        let second = HashAlgo::Md5.hash(b"Whether 'tis nobler in the mind to suffer");
        assert_ne!(
            select_leaves(&first, 10, 15),
            select_leaves(&second, 10, 15)
        );
    }

    #[test]
    fn test_full_leaf_range_is_reachable() {
        // depth 2 has two leaves; asking for both must terminate.
        let root = HashAlgo::Md5.hash(b"tiny");
        let selected = select_leaves(&root, 2, 2);
        assert_eq!(selected, BTreeSet::from([1, 2]));
    }
}
