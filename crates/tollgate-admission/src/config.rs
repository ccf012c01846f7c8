//! Admission bounds and their defaults.

use std::time::Duration;

/// Options governing how much prover work the gate accepts.
///
/// The depth range bounds the prover's CPU/memory spend (and, through the
/// maximum, the verifier's own tree arithmetic); the proof-leaves range
/// bounds the witness size on the wire. The builder-style setters normalize
/// inverted ranges by swapping the endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Capacity of the replay cache.
    pub access_token_cache_size: usize,
    /// How long a minted token stays acceptable.
    pub access_token_life_time: Duration,
    /// Smallest admissible tree depth.
    pub min_allowed_depth: u32,
    /// Largest admissible tree depth.
    pub max_allowed_depth: u32,
    /// Smallest admissible selection size.
    pub min_allowed_proof_leaves_num: usize,
    /// Largest admissible selection size.
    pub max_allowed_proof_leaves_num: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            access_token_cache_size: 1000,
            access_token_life_time: Duration::from_secs(5),
            min_allowed_depth: 10,
            max_allowed_depth: 25,
            min_allowed_proof_leaves_num: 3,
            max_allowed_proof_leaves_num: 10,
        }
    }
}

impl GateConfig {
    /// Set the replay cache capacity.
    pub fn with_access_token_cache_size(mut self, size: usize) -> Self {
        self.access_token_cache_size = size;
        self
    }

    /// Set how long access tokens stay acceptable after minting.
    pub fn with_access_token_life_time(mut self, life_time: Duration) -> Self {
        self.access_token_life_time = life_time;
        self
    }

    /// Set the admissible tree depth range.
    pub fn with_allowed_depth_range(mut self, min_depth: u32, max_depth: u32) -> Self {
        let (min_depth, max_depth) = if min_depth > max_depth {
            (max_depth, min_depth)
        } else {
            (min_depth, max_depth)
        };
        self.min_allowed_depth = min_depth;
        self.max_allowed_depth = max_depth;
        self
    }

    /// Set the admissible selection size range.
    pub fn with_allowed_proof_leaves_range(mut self, min_num: usize, max_num: usize) -> Self {
        let (min_num, max_num) = if min_num > max_num {
            (max_num, min_num)
        } else {
            (min_num, max_num)
        };
        self.min_allowed_proof_leaves_num = min_num;
        self.max_allowed_proof_leaves_num = max_num;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GateConfig::default();
        assert_eq!(cfg.access_token_cache_size, 1000);
        assert_eq!(cfg.access_token_life_time, Duration::from_secs(5));
        assert_eq!((cfg.min_allowed_depth, cfg.max_allowed_depth), (10, 25));
        assert_eq!(
            (
                cfg.min_allowed_proof_leaves_num,
                cfg.max_allowed_proof_leaves_num
            ),
            (3, 10)
        );
    }

    #[test]
    fn test_builders_and_range_normalization() {
        let cfg = GateConfig::default()
            .with_access_token_cache_size(42)
            .with_access_token_life_time(Duration::from_secs(600))
            .with_allowed_depth_range(3, 33)
            .with_allowed_proof_leaves_range(77, 7);

        assert_eq!(
            cfg,
            GateConfig {
                access_token_cache_size: 42,
                access_token_life_time: Duration::from_secs(600),
                min_allowed_depth: 3,
                max_allowed_depth: 33,
                min_allowed_proof_leaves_num: 7,
                max_allowed_proof_leaves_num: 77,
            }
        );
    }
}
