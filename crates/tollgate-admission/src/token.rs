//! Access tokens: per-request freshness markers.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use tollgate_hash::{Digest, HashAlgo, HashError};

/// Why an access token failed to parse.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No `_` between timestamp and marker.
    #[error("access token has no '_' separator")]
    MissingSeparator,

    /// The timestamp half is not a decimal integer.
    #[error("access token timestamp is not an integer: {0}")]
    BadTimestamp(#[from] std::num::ParseIntError),

    /// The marker half is not a well-formed MD5 digest.
    #[error("access token marker is invalid: {0}")]
    BadMarker(#[from] HashError),
}

/// A freshness token: mint time in microseconds plus a random MD5 marker.
///
/// The string form `"<micros>_<base64-md5>"` doubles as the description of
/// the tree a witness is built from, which welds request freshness to tree
/// identity: a stolen witness cannot be replayed under a newer timestamp
/// without rebuilding the whole tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    timestamp_micros: i64,
    marker: Digest,
}

impl AccessToken {
    /// Mint a fresh token from the current clock and 8 random bytes.
    pub fn mint() -> Self {
        let mut seed = [0u8; 8];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut seed);
        Self {
            timestamp_micros: now_micros(),
            marker: HashAlgo::Md5.hash(&seed),
        }
    }

    /// Parse the wire form, splitting at the first `_`.
    pub fn parse(data: &str) -> std::result::Result<Self, TokenError> {
        let (stamp, marker) = data.split_once('_').ok_or(TokenError::MissingSeparator)?;
        Ok(Self {
            timestamp_micros: stamp.parse()?,
            marker: HashAlgo::Md5.digest_from_base64(marker)?,
        })
    }

    /// Mint time, microseconds since the Unix epoch.
    pub fn timestamp_micros(&self) -> i64 {
        self.timestamp_micros
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.timestamp_micros, self.marker)
    }
}

/// Microseconds since the Unix epoch.
pub(crate) fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let token = AccessToken::mint();
        let parsed = AccessToken::parse(&token.to_string()).expect("parse minted token");
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_minted_tokens_are_unique() {
        assert_ne!(AccessToken::mint().to_string(), AccessToken::mint().to_string());
    }

    #[test]
    fn test_rejects_missing_separator() {
        assert!(matches!(
            AccessToken::parse("1700000000000000"),
            Err(TokenError::MissingSeparator)
        ));
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        assert!(matches!(
            AccessToken::parse("yesterday_C68UZChA4SK3gRZeClcKzg=="),
            Err(TokenError::BadTimestamp(_))
        ));
    }

    #[test]
    fn test_rejects_bad_marker() {
        assert!(matches!(
            AccessToken::parse("1700000000000000_????"),
            Err(TokenError::BadMarker(_))
        ));
        // Valid base64, but not 16 bytes wide.
        assert!(matches!(
            AccessToken::parse("1700000000000000_aGVsbG8="),
            Err(TokenError::BadMarker(_))
        ));
    }

    #[test]
    fn test_splits_at_first_separator() {
        let token = AccessToken::mint();
        let wire = token.to_string();
        let parsed = AccessToken::parse(&wire).expect("parse");
        assert_eq!(parsed.timestamp_micros(), token.timestamp_micros());
    }
}
