//! The XOR-seeded hasher used for per-tree domain separation.
//!
//! A seeded hasher binds a base algorithm to a constant seed digest:
//! `seeded(x) = base(x) XOR base(join("_", parts))`. Builder and verifier
//! must derive the identical seed, so the part rendering (plain display
//! forms joined by underscores) is part of the wire contract. This is
//! domain separation, not a MAC; do not upgrade it to HMAC.

use std::fmt::Display;

use crate::digest::{Digest, HashAlgo};

/// A hash algorithm shifted by a precomputed seed digest.
#[derive(Clone, Debug)]
pub struct SeededHasher {
    algo: HashAlgo,
    seed: Option<Digest>,
}

impl SeededHasher {
    /// Build a seeded hasher whose seed is `algo(join("_", parts))`.
    ///
    /// With no parts the hasher degenerates to the plain algorithm.
    pub fn new(algo: HashAlgo, parts: &[&dyn Display]) -> Self {
        if parts.is_empty() {
            return Self { algo, seed: None };
        }
        let joined = parts
            .iter()
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
            .join("_");
        Self {
            algo,
            seed: Some(algo.hash(joined.as_bytes())),
        }
    }

    /// The underlying algorithm.
    pub fn algo(&self) -> HashAlgo {
        self.algo
    }

    /// Hash a byte buffer through the seeded function.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let raw = self.algo.hash(data);
        match &self.seed {
            Some(seed) => raw.xor(seed),
            None => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_hash_of_joined_parts() {
        let algo = HashAlgo::Md5;
        let hasher = SeededHasher::new(algo, &[&"greeting", &5u32, &2usize]);
        let expected = algo.hash(b"payload").xor(&algo.hash(b"greeting_5_2"));
        assert_eq!(hasher.hash(b"payload"), expected);
    }

    #[test]
    fn test_no_parts_means_plain_hash() {
        let algo = HashAlgo::Sha256;
        let hasher = SeededHasher::new(algo, &[]);
        assert_eq!(hasher.hash(b"payload"), algo.hash(b"payload"));
    }

    #[test]
    fn test_different_parts_give_different_streams() {
        let algo = HashAlgo::Md5;
        let first = SeededHasher::new(algo, &[&"a", &4u32, &1usize]);
        let second = SeededHasher::new(algo, &[&"a", &4u32, &2usize]);
        assert_ne!(first.hash(b"x"), second.hash(b"x"));
    }
}
