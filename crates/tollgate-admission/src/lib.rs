//! # tollgate-admission
//!
//! Proof-of-work admission control for an HTTP service.
//!
//! A prover mints an [`AccessToken`], builds a Merkle tree seeded by it and
//! ships the resulting witness in the `Merkle-Check` header. The [`Gate`]
//! validates that header on every request: exactly one value, a decodable
//! witness, a fresh and never-before-seen token, a work volume inside the
//! configured bounds, and a witness that actually verifies. Any failure is
//! reported as a single typed error the host maps to one uniform rejection
//! response; failure details stay on the server.
//!
//! ## Modules
//!
//! - [`token`] — access token mint/parse
//! - [`cache`] — the bounded, expiring replay guard
//! - [`config`] — admission bounds and their defaults
//! - [`gate`] — the ordered admission pipeline and header generation

pub mod cache;
pub mod config;
pub mod gate;
pub mod token;

pub use cache::ReplayCache;
pub use config::GateConfig;
pub use gate::{generate_header, Gate, MERKLE_CHECK_HEADER};
pub use token::{AccessToken, TokenError};

use tollgate_merkle::MerkleError;

/// Why a request was refused admission.
///
/// The variants exist for server-side logging and tests; clients only ever
/// see one uniform rejection status.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// The proof-of-work header is missing or duplicated.
    #[error("expected exactly one proof-of-work header value, got {0}")]
    HeaderCount(usize),

    /// The header value does not decode into a witness.
    #[error("unreadable proof-of-work header: {0}")]
    MalformedHeader(#[source] MerkleError),

    /// The witness description is not an access token.
    #[error("malformed access token: {0}")]
    MalformedToken(#[source] TokenError),

    /// The access token was already spent.
    #[error("access token {0:?} was already used")]
    Replay(String),

    /// Declared work volume below the accepted minimum.
    #[error("prover work volume is too small")]
    WorkTooSmall,

    /// Declared work volume above what the verifier takes on.
    #[error("prover work volume is too large")]
    WorkTooLarge,

    /// Token minted in the future.
    #[error("prover timestamp is in the future")]
    FutureToken,

    /// Token older than the configured lifetime.
    #[error("prover timestamp is dated")]
    StaleToken,

    /// The witness failed verification.
    #[error("proof of work verification failed: {0}")]
    Verification(#[source] MerkleError),
}

/// Convenience result type for admission checks.
pub type Result<T> = std::result::Result<T, AdmissionError>;
