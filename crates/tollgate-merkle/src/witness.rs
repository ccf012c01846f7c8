//! The wire witness document and its verification (the verifier side).
//!
//! The JSON field names below are the wire contract; existing provers emit
//! them byte-for-byte. The selection flag is serialized under the key
//! `bool` and omitted entirely when false.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tollgate_hash::{Digest, HashAlgo, SeededHasher};

use crate::index::{children, is_leaf, node_count};
use crate::select::select_leaves;
use crate::tree::tree_hasher;
use crate::{MerkleError, Result, MAX_TREE_DEPTH};

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// One covered node: position, base64 value, selection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStat {
    /// Position in the dense tree array.
    pub num: usize,
    /// The node digest, standard base64.
    pub value: String,
    /// True only on the pseudo-randomly selected leaves.
    #[serde(rename = "bool", default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

/// The compact proof of work carried in one HTTP header.
///
/// Holds the selected leaves plus every sibling needed to recompute the
/// root, and the four tree parameters the seeded hasher is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// Covering node set, ascending by `num`.
    pub node_stats: Vec<NodeStat>,
    /// Wire name of the hash algorithm.
    pub hash_name: String,
    /// Free-form tree description; the admission layer stores the access
    /// token here, which welds request freshness to tree identity.
    pub description: String,
    /// Tree depth.
    pub depth: u32,
    /// How many leaves the selection must contain.
    pub proof_leaves_num: usize,
}

impl Witness {
    /// Decode a witness from its single-line JSON wire form.
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Encode to the single-line JSON wire form.
    pub fn to_json(&self) -> String {
        // Serialization of a field-named struct cannot fail.
        serde_json::to_string(self).expect("witness serializes to JSON")
    }

    /// The access token this witness was built around (its description).
    pub fn access_token(&self) -> &str {
        &self.description
    }

    /// Tree depth the prover claims to have built.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Claimed selection size.
    pub fn proof_leaves_num(&self) -> usize {
        self.proof_leaves_num
    }

    /// Verify that a full tree was built and this witness was taken from it.
    ///
    /// Recomputes the root from the covered nodes, consuming each provided
    /// value exactly once, then re-derives the expected leaf selection from
    /// the recomputed root and compares it with the declared one. Parameters
    /// are validated before anything tree-sized is allocated.
    pub fn verify(&self) -> Result<()> {
        let algo = HashAlgo::from_name(&self.hash_name)?;
        if self.depth < 2 {
            return Err(MerkleError::DepthTooShallow(self.depth));
        }
        if self.depth > MAX_TREE_DEPTH {
            return Err(MerkleError::DepthTooDeep(self.depth));
        }
        let leaf_count = node_count(self.depth) - node_count(self.depth - 1);
        if self.proof_leaves_num > leaf_count / 2 {
            return Err(MerkleError::TooManyProofLeaves {
                requested: self.proof_leaves_num,
                depth: self.depth,
                max: leaf_count / 2,
            });
        }

        let hasher = tree_hasher(algo, &self.description, self.depth, self.proof_leaves_num);

        let mut provided: HashMap<usize, Digest> = HashMap::with_capacity(self.node_stats.len());
        for stat in &self.node_stats {
            provided.insert(stat.num, algo.digest_from_base64(&stat.value)?);
        }

        let root = recompute(&hasher, 0, self.depth, &mut provided)?;
        if !provided.is_empty() {
            return Err(MerkleError::UnusedNodes {
                count: provided.len(),
            });
        }

        let declared: BTreeSet<usize> = self
            .node_stats
            .iter()
            .filter(|stat| stat.selected)
            .map(|stat| stat.num)
            .collect();
        // The re-derived set always has exactly `proof_leaves_num` members,
        // so a count mismatch can fail before the selection is derived.
        if declared.len() != self.proof_leaves_num {
            return Err(MerkleError::SelectedCountMismatch {
                expected: self.proof_leaves_num,
                actual: declared.len(),
            });
        }

        let expected = select_leaves(&root, self.depth, self.proof_leaves_num);
        for &num in &expected {
            if !declared.contains(&num) {
                return Err(MerkleError::SelectionMismatch { num });
            }
        }
        Ok(())
    }
}

/// Recompute the digest of `num`, consuming provided values exactly once.
fn recompute(
    hasher: &SeededHasher,
    num: usize,
    depth: u32,
    provided: &mut HashMap<usize, Digest>,
) -> Result<Digest> {
    if let Some(value) = provided.remove(&num) {
        return Ok(value);
    }
    if is_leaf(num, depth) {
        // A gap: recomputation reached a leaf the witness does not cover.
        return Err(MerkleError::MissingNode { num });
    }
    let (left_num, right_num) = children(num, depth);
    let left = recompute(hasher, left_num, depth, provided)?;
    let right = recompute(hasher, right_num, depth, provided)?;
    Ok(hasher.hash(left.xor(&right).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let witness = Witness {
            node_stats: vec![
                NodeStat {
                    num: 42,
                    value: "King_Arthur".to_string(),
                    selected: true,
                },
                NodeStat {
                    num: 31415926535,
                    value: "Merlin".to_string(),
                    selected: false,
                },
            ],
            hash_name: "md5".to_string(),
            description: "Excalibur".to_string(),
            depth: 999,
            proof_leaves_num: 1,
        };

        let json = witness.to_json();
        let restored = Witness::from_json(&json).expect("restore witness");
        assert_eq!(witness, restored);
    }

    #[test]
    fn test_selected_flag_is_omitted_when_false() {
        let witness = Witness {
            node_stats: vec![NodeStat {
                num: 7,
                value: "dGVzdA==".to_string(),
                selected: false,
            }],
            hash_name: "md5".to_string(),
            description: "flags".to_string(),
            depth: 4,
            proof_leaves_num: 1,
        };
        let json = witness.to_json();
        assert!(!json.contains("\"bool\""));

        let selected = Witness {
            node_stats: vec![NodeStat {
                selected: true,
                ..witness.node_stats[0].clone()
            }],
            ..witness
        };
        assert!(selected.to_json().contains("\"bool\":true"));
    }

    #[test]
    fn test_wire_field_names() {
        let witness = Witness {
            node_stats: vec![NodeStat {
                num: 1,
                value: "dGVzdA==".to_string(),
                selected: true,
            }],
            hash_name: "sha256".to_string(),
            description: "names".to_string(),
            depth: 3,
            proof_leaves_num: 1,
        };
        let json = witness.to_json();
        for key in [
            "\"node_stats\"",
            "\"num\"",
            "\"value\"",
            "\"bool\"",
            "\"hash_name\"",
            "\"description\"",
            "\"depth\"",
            "\"proof_leaves_num\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(
            Witness::from_json("{\"node_stats\":"),
            Err(MerkleError::WitnessJson(_))
        ));
    }

    #[test]
    fn test_unknown_hash_rejected_before_work() {
        let witness = Witness {
            node_stats: vec![],
            hash_name: "whirlpool".to_string(),
            description: "x".to_string(),
            depth: 30,
            proof_leaves_num: 5,
        };
        assert!(matches!(witness.verify(), Err(MerkleError::Hash(_))));
    }

    #[test]
    fn test_hostile_parameters_rejected_before_allocation() {
        let witness = Witness {
            node_stats: vec![],
            hash_name: "md5".to_string(),
            description: "x".to_string(),
            depth: 1_000_000,
            proof_leaves_num: 5,
        };
        assert!(matches!(
            witness.verify(),
            Err(MerkleError::DepthTooDeep(1_000_000))
        ));

        let witness = Witness {
            depth: 10,
            proof_leaves_num: usize::MAX,
            ..witness
        };
        assert!(matches!(
            witness.verify(),
            Err(MerkleError::TooManyProofLeaves { .. })
        ));
    }
}
