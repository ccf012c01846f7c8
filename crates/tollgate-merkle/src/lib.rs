//! # tollgate-merkle
//!
//! The Merkle-tree proof-of-work engine.
//!
//! A prover builds a complete binary hash tree whose leaves and internal
//! nodes are produced by a seeded hasher, lets the root hash pseudo-randomly
//! pick a handful of leaves, and ships the selected leaves plus the sibling
//! hashes needed to recompute the root as a compact [`Witness`]. A verifier
//! recomputes the root from the witness alone and re-derives the leaf
//! selection from the recomputed root; the self-referential selection check
//! is what forces the prover to build the whole tree.
//!
//! ## Modules
//!
//! - [`index`] — dense-array navigation for complete binary trees
//! - [`rng`] — the pinned leaf-selection generator (wire contract)
//! - [`select`] — leaf selection from a root digest
//! - [`tree`] — tree construction and witness generation
//! - [`witness`] — the wire witness document and its verification

pub mod index;
pub mod rng;
mod rng_table;
pub mod select;
pub mod tree;
pub mod witness;

pub use select::select_leaves;
pub use tree::MerkleTree;
pub use witness::{NodeStat, Witness};

use tollgate_hash::HashError;

/// Deepest tree the index arithmetic supports. The admission layer enforces
/// a much smaller operational ceiling; this bound only keeps the shift
/// arithmetic sound for hostile witness parameters.
pub const MAX_TREE_DEPTH: u32 = 63;

/// Error types for tree construction and witness verification.
#[derive(Debug, thiserror::Error)]
pub enum MerkleError {
    /// Depth below the minimum viable tree.
    #[error("too shallow depth {0}, expected to be at least 2")]
    DepthTooShallow(u32),

    /// Depth beyond what the index arithmetic supports.
    #[error("depth {0} exceeds the supported maximum {MAX_TREE_DEPTH}")]
    DepthTooDeep(u32),

    /// More proof leaves requested than the tree can honestly cover.
    #[error("too many proof leaves ({requested}) required for a tree with depth {depth}, max allowed: {max}")]
    TooManyProofLeaves {
        /// Requested selection size.
        requested: usize,
        /// Tree depth.
        depth: u32,
        /// Half the leaf count, the allowed maximum.
        max: usize,
    },

    /// A digest failed to decode, or the hash name is outside the registry.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// The witness document is not valid JSON of the expected shape.
    #[error("failed to decode witness document: {0}")]
    WitnessJson(#[from] serde_json::Error),

    /// Root recomputation reached a leaf the witness does not cover.
    #[error("no witness value covers node {num}")]
    MissingNode {
        /// The uncovered node position.
        num: usize,
    },

    /// Witness values were left over after the root was recomputed.
    #[error("{count} witness values were never used to recompute the root")]
    UnusedNodes {
        /// How many values went unused.
        count: usize,
    },

    /// The declared selection size differs from the re-derived one.
    #[error("expected {expected} selected leaves, witness declares {actual}")]
    SelectedCountMismatch {
        /// Re-derived selection size.
        expected: usize,
        /// Declared selection size.
        actual: usize,
    },

    /// A re-derived leaf is missing from the declared selection.
    #[error("node {num} is expected to be selected, but it is not")]
    SelectionMismatch {
        /// The leaf position that should have been selected.
        num: usize,
    },

    /// A stored node disagrees with its recomputed value (self check).
    #[error("node {num} has an incorrect hash value")]
    NodeMismatch {
        /// The disagreeing node position.
        num: usize,
    },
}

/// Convenience result type for Merkle operations.
pub type Result<T> = std::result::Result<T, MerkleError>;
