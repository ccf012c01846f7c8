//! The ordered admission pipeline and prover-side header generation.

use std::time::Duration;

use tracing::debug;

use tollgate_merkle::{MerkleError, MerkleTree, Witness};

use crate::cache::ReplayCache;
use crate::config::GateConfig;
use crate::token::{now_micros, AccessToken};
use crate::{AdmissionError, Result};

/// Name of the header that carries the proof of work.
pub const MERKLE_CHECK_HEADER: &str = "Merkle-Check";

/// How long a spent token is remembered. Deliberately longer than any sane
/// token lifetime, so a replayed token hits the cache before it can go
/// stale out of it.
const REPLAY_TTL: Duration = Duration::from_secs(60);

/// The verifier-side admission gate; one instance per listener.
pub struct Gate {
    cfg: GateConfig,
    cache: ReplayCache,
}

impl Gate {
    /// Build a gate with its own replay cache.
    pub fn new(cfg: GateConfig) -> Self {
        let cache = ReplayCache::new(cfg.access_token_cache_size, REPLAY_TTL);
        Self { cfg, cache }
    }

    /// Run the admission pipeline over the `Merkle-Check` values of one
    /// request, failing fast on the first violated check:
    ///
    /// 1. exactly one header value,
    /// 2. the value decodes into a witness,
    /// 3. the token parses and has never been seen (it is marked used now),
    /// 4. the declared work volume is inside the configured bounds,
    /// 5. the token age is inside `[0, access_token_life_time]`,
    /// 6. the witness verifies.
    pub fn check(&self, header_values: &[String]) -> Result<()> {
        self.check_at(header_values, now_micros())
    }

    fn check_at(&self, header_values: &[String], now_micros: i64) -> Result<()> {
        if header_values.len() != 1 {
            return Err(AdmissionError::HeaderCount(header_values.len()));
        }

        let witness =
            Witness::from_json(&header_values[0]).map_err(AdmissionError::MalformedHeader)?;

        let token_str = witness.access_token();
        let token = AccessToken::parse(token_str).map_err(AdmissionError::MalformedToken)?;
        // Marking the token used before the expensive checks means a lost
        // request can burn its own token, never someone else's.
        if !self.cache.insert_if_absent(token_str) {
            return Err(AdmissionError::Replay(token_str.to_string()));
        }

        let depth = witness.depth();
        let leaves = witness.proof_leaves_num();
        if depth < self.cfg.min_allowed_depth || leaves < self.cfg.min_allowed_proof_leaves_num {
            return Err(AdmissionError::WorkTooSmall);
        }
        if depth > self.cfg.max_allowed_depth || leaves > self.cfg.max_allowed_proof_leaves_num {
            return Err(AdmissionError::WorkTooLarge);
        }

        let age_micros = now_micros - token.timestamp_micros();
        if age_micros < 0 {
            return Err(AdmissionError::FutureToken);
        }
        if age_micros > self.cfg.access_token_life_time.as_micros() as i64 {
            return Err(AdmissionError::StaleToken);
        }

        witness.verify().map_err(AdmissionError::Verification)?;

        debug!(token = token_str, depth, leaves, "proof of work admitted");
        Ok(())
    }
}

/// Mint a token, build a tree around it, and serialize the witness into a
/// value for the [`MERKLE_CHECK_HEADER`] header. This is the prover half of
/// the protocol; build failures propagate to the caller.
pub fn generate_header(
    hash_name: &str,
    depth: u32,
    proof_leaves_num: usize,
) -> std::result::Result<String, MerkleError> {
    let token = AccessToken::mint();
    let tree = MerkleTree::build(hash_name, depth, proof_leaves_num, &token.to_string())?;
    Ok(tree.witness().to_json())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> Gate {
        Gate::new(GateConfig::default())
    }

    /// A witness that parses fine but was never honestly built; good enough
    /// for every check before verification.
    fn unverifiable_header(token: &str, depth: u32, leaves: usize) -> Vec<String> {
        let witness = Witness {
            node_stats: vec![],
            hash_name: "md5".to_string(),
            description: token.to_string(),
            depth,
            proof_leaves_num: leaves,
        };
        vec![witness.to_json()]
    }

    fn fresh_token() -> String {
        AccessToken::mint().to_string()
    }

    #[test]
    fn test_valid_header_admits_then_replays() {
        let header = generate_header("md5", 10, 3).expect("generate header");
        let gate = gate();
        gate.check(&[header.clone()]).expect("fresh header admits");
        assert!(matches!(
            gate.check(&[header]),
            Err(AdmissionError::Replay(_))
        ));
    }

    #[test]
    fn test_header_count_is_enforced() {
        let gate = gate();
        assert!(matches!(
            gate.check(&[]),
            Err(AdmissionError::HeaderCount(0))
        ));
        let header = generate_header("md5", 10, 3).expect("generate header");
        assert!(matches!(
            gate.check(&[header.clone(), header]),
            Err(AdmissionError::HeaderCount(2))
        ));
    }

    #[test]
    fn test_garbage_header_is_malformed() {
        assert!(matches!(
            gate().check(&["not json at all".to_string()]),
            Err(AdmissionError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_description_must_be_a_token() {
        let header = unverifiable_header("no separator here", 10, 3);
        assert!(matches!(
            gate().check(&header),
            Err(AdmissionError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_work_bounds() {
        let gate = gate();
        assert!(matches!(
            gate.check(&unverifiable_header(&fresh_token(), 9, 3)),
            Err(AdmissionError::WorkTooSmall)
        ));
        assert!(matches!(
            gate.check(&unverifiable_header(&fresh_token(), 10, 2)),
            Err(AdmissionError::WorkTooSmall)
        ));
        assert!(matches!(
            gate.check(&unverifiable_header(&fresh_token(), 26, 3)),
            Err(AdmissionError::WorkTooLarge)
        ));
        assert!(matches!(
            gate.check(&unverifiable_header(&fresh_token(), 10, 11)),
            Err(AdmissionError::WorkTooLarge)
        ));
    }

    #[test]
    fn test_freshness_bounds_are_inclusive() {
        let gate = gate();
        let life_time = gate.cfg.access_token_life_time.as_micros() as i64;
        let minted_at = 1_700_000_000_000_000i64;
        let token = format!(
            "{minted_at}_{}",
            tollgate_hash::HashAlgo::Md5.hash(b"marker").to_base64()
        );

        // Age exactly at the lifetime passes freshness; the empty witness
        // then dies in verification, which proves the order of checks.
        assert!(matches!(
            gate.check_at(&unverifiable_header(&token, 10, 3), minted_at + life_time),
            Err(AdmissionError::Verification(_))
        ));

        // One microsecond over is stale; fresh token string to dodge replay.
        let other = format!(
            "{minted_at}_{}",
            tollgate_hash::HashAlgo::Md5.hash(b"marker-two").to_base64()
        );
        assert!(matches!(
            gate.check_at(
                &unverifiable_header(&other, 10, 3),
                minted_at + life_time + 1
            ),
            Err(AdmissionError::StaleToken)
        ));

        // A mint time after "now" is rejected outright.
        let future = format!(
            "{minted_at}_{}",
            tollgate_hash::HashAlgo::Md5.hash(b"marker-three").to_base64()
        );
        assert!(matches!(
            gate.check_at(&unverifiable_header(&future, 10, 3), minted_at - 1),
            Err(AdmissionError::FutureToken)
        ));
    }

    #[test]
    fn test_racing_one_token_admits_once() {
        let gate = gate();
        let header = vec![generate_header("md5", 10, 3).expect("generate header")];
        let admitted = std::sync::atomic::AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    if gate.check(&header).is_ok() {
                        admitted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(admitted.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tampered_witness_is_rejected() {
        let header = generate_header("md5", 10, 3).expect("generate header");
        let mut witness = Witness::from_json(&header).expect("decode own header");
        witness.node_stats[0].value =
            tollgate_hash::HashAlgo::Md5.hash(b"forged").to_base64();
        assert!(matches!(
            gate().check(&[witness.to_json()]),
            Err(AdmissionError::Verification(_))
        ));
    }
}
