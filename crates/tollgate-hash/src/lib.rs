//! # tollgate-hash
//!
//! Digest types and hashing for the Tollgate admission protocol.
//!
//! The wire contract fixes the digest set: MD5 (16 bytes) and SHA-256
//! (32 bytes). No algorithm negotiation is permitted — a hash name outside
//! this set is rejected before any other work happens. Digests compare and
//! XOR bytewise and render as standard padded base64.
//!
//! ## Modules
//!
//! - [`digest`] — digest values, the algorithm registry, the base64 text form
//! - [`seeded`] — the XOR-seeded hasher used for per-tree domain separation

pub mod digest;
pub mod seeded;

pub use digest::{Digest, HashAlgo};
pub use seeded::SeededHasher;

/// Error types for digest handling.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The textual digest is not valid base64.
    #[error("invalid base64 digest {input:?}: {source}")]
    Base64 {
        /// The offending input string.
        input: String,
        /// The underlying decode error.
        #[source]
        source: base64::DecodeError,
    },

    /// The decoded digest has the wrong length for the algorithm.
    #[error("digest {input:?} decodes to {actual} bytes, expected {expected}")]
    DigestLength {
        /// The offending input string.
        input: String,
        /// Digest size of the expected algorithm.
        expected: usize,
        /// Decoded byte count.
        actual: usize,
    },

    /// The hash name is not part of the wire contract.
    #[error("unknown hash name {0:?}")]
    UnknownHashName(String),
}

/// Convenience result type for digest operations.
pub type Result<T> = std::result::Result<T, HashError>;
