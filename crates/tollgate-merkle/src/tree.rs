//! Tree construction and witness generation (the prover side).

use std::collections::BTreeSet;

use tollgate_hash::{Digest, HashAlgo, SeededHasher};

use crate::index::{children, node_count, parent};
use crate::select::select_leaves;
use crate::witness::{NodeStat, Witness};
use crate::{MerkleError, Result, MAX_TREE_DEPTH};

/// A fully built complete binary hash tree.
///
/// Nodes are stored as a dense array; parent/child navigation is arithmetic
/// on positions (see [`crate::index`]), which is what keeps a depth-25 tree
/// affordable. A tree only lives long enough to emit one witness.
#[derive(Debug)]
pub struct MerkleTree {
    algo: HashAlgo,
    depth: u32,
    proof_leaves_num: usize,
    description: String,
    nodes: Vec<Digest>,
}

/// The seeded hasher shared by construction and verification. Folding the
/// tree parameters into the seed stops a prover from reusing one tree under
/// altered parameters.
pub(crate) fn tree_hasher(
    algo: HashAlgo,
    description: &str,
    depth: u32,
    proof_leaves_num: usize,
) -> SeededHasher {
    SeededHasher::new(algo, &[&description, &depth, &proof_leaves_num])
}

impl MerkleTree {
    /// Build the full tree.
    ///
    /// `depth` drives the prover's CPU and memory cost, `proof_leaves_num`
    /// the witness size, and `description` varies the node values between
    /// trees (the admission layer passes an access token here).
    pub fn build(
        hash_name: &str,
        depth: u32,
        proof_leaves_num: usize,
        description: &str,
    ) -> Result<Self> {
        // The single-node tree is not viable and only brings edge cases.
        if depth < 2 {
            return Err(MerkleError::DepthTooShallow(depth));
        }
        if depth > MAX_TREE_DEPTH {
            return Err(MerkleError::DepthTooDeep(depth));
        }
        let algo = HashAlgo::from_name(hash_name)?;

        let total = node_count(depth);
        let internal_count = node_count(depth - 1);
        let leaf_count = total - internal_count;
        if proof_leaves_num > leaf_count / 2 {
            return Err(MerkleError::TooManyProofLeaves {
                requested: proof_leaves_num,
                depth,
                max: leaf_count / 2,
            });
        }

        let hasher = tree_hasher(algo, description, depth, proof_leaves_num);
        let mut nodes = vec![algo.zero(); total];

        for num in internal_count..total {
            nodes[num] = hasher.hash(&(num as u64).to_le_bytes());
        }
        // Internal nodes bottom-up; children always carry final values.
        for num in (0..internal_count).rev() {
            let (left, right) = children(num, depth);
            nodes[num] = hasher.hash(nodes[left].xor(&nodes[right]).as_bytes());
        }

        Ok(Self {
            algo,
            depth,
            proof_leaves_num,
            description: description.to_string(),
            nodes,
        })
    }

    /// Tree depth.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The root digest.
    pub fn root(&self) -> &Digest {
        &self.nodes[0]
    }

    /// Recompute every node and compare against the stored values.
    ///
    /// Construction already guarantees consistency; this is a debugging and
    /// test aid for code that manipulates trees.
    pub fn self_check(&self) -> Result<()> {
        let total = node_count(self.depth);
        let internal_count = node_count(self.depth - 1);
        let hasher = tree_hasher(
            self.algo,
            &self.description,
            self.depth,
            self.proof_leaves_num,
        );
        for num in internal_count..total {
            if self.nodes[num] != hasher.hash(&(num as u64).to_le_bytes()) {
                return Err(MerkleError::NodeMismatch { num });
            }
        }
        for num in (0..internal_count).rev() {
            let (left, right) = children(num, self.depth);
            let expected = hasher.hash(self.nodes[left].xor(&self.nodes[right]).as_bytes());
            if self.nodes[num] != expected {
                return Err(MerkleError::NodeMismatch { num });
            }
        }
        Ok(())
    }

    /// Emit the witness: let the root pick the leaves, then cover them.
    pub fn witness(&self) -> Witness {
        let leaves = select_leaves(self.root(), self.depth, self.proof_leaves_num);
        self.witness_for_leaves(&leaves)
    }

    /// Build a witness covering the given leaf set: the leaves themselves
    /// plus, level by level, the siblings the root recomputation will need.
    pub(crate) fn witness_for_leaves(&self, leaves: &BTreeSet<usize>) -> Witness {
        let mut needed: Vec<usize> = leaves.iter().copied().collect();
        let mut current = leaves.clone();

        for _ in 0..self.depth - 1 {
            let parents: BTreeSet<usize> = current.iter().map(|&num| parent(num)).collect();
            for &parent_num in &parents {
                let (left, right) = children(parent_num, self.depth);
                if !current.contains(&left) {
                    needed.push(left);
                }
                if !current.contains(&right) {
                    needed.push(right);
                }
            }
            current = parents;
        }

        needed.sort_unstable();
        let node_stats = needed
            .iter()
            .map(|&num| NodeStat {
                num,
                value: self.nodes[num].to_base64(),
                selected: leaves.contains(&num),
            })
            .collect();

        Witness {
            node_stats,
            hash_name: self.algo.name().to_string(),
            description: self.description.clone(),
            depth: self.depth,
            proof_leaves_num: self.proof_leaves_num,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built_tree(depth: u32, proof_leaves_num: usize, description: &str) -> MerkleTree {
        let tree =
            MerkleTree::build("md5", depth, proof_leaves_num, description).expect("build tree");
        tree.self_check().expect("fresh tree must self-check");
        tree
    }

    #[test]
    fn test_plain_tree() {
        built_tree(4, 2, "Mors sua, vita nostra");
    }

    #[test]
    fn test_too_shallow_depth_is_rejected() {
        let err = MerkleTree::build("md5", 1, 1, "x").unwrap_err();
        assert!(matches!(err, MerkleError::DepthTooShallow(1)));
    }

    #[test]
    fn test_unknown_hash_is_rejected() {
        let err = MerkleTree::build("crc32", 4, 2, "x").unwrap_err();
        assert!(matches!(err, MerkleError::Hash(_)));
    }

    #[test]
    fn test_proof_leaves_budget_boundary() {
        // depth 5: 16 leaves, so up to 8 proof leaves are allowed.
        assert!(MerkleTree::build("md5", 5, 8, "x").is_ok());
        let err = MerkleTree::build("md5", 5, 9, "x").unwrap_err();
        assert!(matches!(
            err,
            MerkleError::TooManyProofLeaves { requested: 9, max: 8, .. }
        ));
    }

    #[test]
    fn test_witness_for_single_leaf() {
        // Tree enumeration at depth 5:
        //                                  0
        //                    1                          *2
        //            *3             4            5               6
        //         7       8     9     *10    11     12      13       14
        //       15 16   17 18 19*20* 21 22  23 24  25 26   27 28    29 30
        // node 20 is selected; starred nodes complete the cover.
        let tree = built_tree(5, 2, "Per aspera ad astra");
        let witness = tree.witness_for_leaves(&BTreeSet::from([20]));

        assert_eq!(witness.description, "Per aspera ad astra");
        assert_eq!(witness.depth, 5);
        let nums: Vec<usize> = witness.node_stats.iter().map(|stat| stat.num).collect();
        let selected: Vec<bool> = witness.node_stats.iter().map(|stat| stat.selected).collect();
        assert_eq!(nums, vec![2, 3, 10, 19, 20]);
        assert_eq!(selected, vec![false, false, false, false, true]);
    }

    #[test]
    fn test_witness_for_four_leaves() {
        // Same enumeration; leaves 18, 21, 23 and 28 are selected.
        let tree = built_tree(5, 2, "No hablo espanol, senior");
        let witness = tree.witness_for_leaves(&BTreeSet::from([18, 21, 23, 28]));

        let nums: Vec<usize> = witness.node_stats.iter().map(|stat| stat.num).collect();
        assert_eq!(nums, vec![7, 9, 12, 14, 17, 18, 21, 22, 23, 24, 27, 28]);

        let selected: Vec<usize> = witness
            .node_stats
            .iter()
            .enumerate()
            .filter(|(_, stat)| stat.selected)
            .map(|(pos, _)| pos)
            .collect();
        assert_eq!(selected, vec![5, 6, 8, 11]);
        assert_eq!(witness.node_stats.len(), 12);
    }

    #[test]
    fn test_witness_nodes_are_sorted_and_unique() {
        let tree = built_tree(8, 10, "ordering check");
        let witness = tree.witness();
        let nums: Vec<usize> = witness.node_stats.iter().map(|stat| stat.num).collect();
        let mut sorted = nums.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(nums, sorted);
        let selected = witness.node_stats.iter().filter(|stat| stat.selected).count();
        assert_eq!(selected, 10);
    }

    #[test]
    fn test_node_values_are_pinned() {
        // Golden values for a depth-4 md5 tree with description "golden"
        // and a two-leaf proof budget; deployed provers emit exactly these
        // bytes, so the seeded-hash pipeline must never drift.
        let tree = built_tree(4, 2, "golden");
        assert_eq!(tree.root().to_base64(), "dq6A/yKGcKocy3u9tG5ntw==");

        let witness = tree.witness_for_leaves(&BTreeSet::from([9, 13]));
        let rendered: Vec<(usize, &str)> = witness
            .node_stats
            .iter()
            .map(|stat| (stat.num, stat.value.as_str()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                (3, "k7zI0gcDHUkCnY5cVAo3vQ=="),
                (5, "B/lzOseigh92DWANRvNiJA=="),
                (9, "L/Mj6LqcUImhywBKiz/gpg=="),
                (10, "qOI3ZBPqoygGOpqA3rsPmw=="),
                (13, "O937tEUQnwiuAOMvXuY//A=="),
                (14, "I6D1kK1lwjf69j4i8fkZUw=="),
            ]
        );
    }

    #[test]
    fn test_self_check_catches_corruption() {
        let mut tree = built_tree(4, 2, "to be corrupted");
        tree.nodes[3] = HashAlgo::Md5.hash(b"wrong");
        let err = tree.self_check().unwrap_err();
        assert!(matches!(err, MerkleError::NodeMismatch { .. }));
    }
}
