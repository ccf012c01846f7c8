//! Digest values, the algorithm registry, and the base64 text form.

use std::fmt;

use base64::engine::general_purpose::STANDARD;

use crate::{HashError, Result};

/// Wire name of the MD5 algorithm.
pub const MD5_NAME: &str = "md5";

/// Wire name of the SHA-256 algorithm.
pub const SHA256_NAME: &str = "sha256";

/// The closed set of hash algorithms admitted by the wire contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlgo {
    /// MD5, kept for compatibility with existing clients.
    Md5,
    /// SHA-256.
    Sha256,
}

impl HashAlgo {
    /// Resolve a wire hash name. Anything outside the registry is rejected.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            MD5_NAME => Ok(Self::Md5),
            SHA256_NAME => Ok(Self::Sha256),
            other => Err(HashError::UnknownHashName(other.to_string())),
        }
    }

    /// The wire name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => MD5_NAME,
            Self::Sha256 => SHA256_NAME,
        }
    }

    /// Digest width in bytes.
    pub fn digest_size(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha256 => 32,
        }
    }

    /// The all-zero digest of this algorithm's width, for pre-filling
    /// node storage before real values land.
    pub fn zero(&self) -> Digest {
        match self {
            Self::Md5 => Digest::Md5([0u8; 16]),
            Self::Sha256 => Digest::Sha256([0u8; 32]),
        }
    }

    /// Hash a byte buffer.
    pub fn hash(&self, data: &[u8]) -> Digest {
        match self {
            Self::Md5 => {
                use md5::Digest as _;
                Digest::Md5(md5::Md5::digest(data).into())
            }
            Self::Sha256 => {
                use sha2::Digest as _;
                Digest::Sha256(sha2::Sha256::digest(data).into())
            }
        }
    }

    /// Decode a base64 digest string, checking both the alphabet and the
    /// exact width of this algorithm.
    pub fn digest_from_base64(&self, data: &str) -> Result<Digest> {
        let bytes =
            base64::Engine::decode(&STANDARD, data).map_err(|source| HashError::Base64 {
                input: data.to_string(),
                source,
            })?;
        if bytes.len() != self.digest_size() {
            return Err(HashError::DigestLength {
                input: data.to_string(),
                expected: self.digest_size(),
                actual: bytes.len(),
            });
        }
        Ok(match self {
            Self::Md5 => {
                let mut out = [0u8; 16];
                out.copy_from_slice(&bytes);
                Digest::Md5(out)
            }
            Self::Sha256 => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&bytes);
                Digest::Sha256(out)
            }
        })
    }
}

/// A fixed-size digest. The variant records the producing algorithm.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    /// 16-byte MD5 output.
    Md5([u8; 16]),
    /// 32-byte SHA-256 output.
    Sha256([u8; 32]),
}

impl Digest {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Md5(bytes) => bytes,
            Self::Sha256(bytes) => bytes,
        }
    }

    /// The algorithm that produced this digest.
    pub fn algo(&self) -> HashAlgo {
        match self {
            Self::Md5(_) => HashAlgo::Md5,
            Self::Sha256(_) => HashAlgo::Sha256,
        }
    }

    /// Bytewise XOR of two digests.
    ///
    /// # Panics
    ///
    /// Panics when the widths differ; mixing algorithms inside one tree is
    /// a programming error, not an input error.
    pub fn xor(&self, other: &Digest) -> Digest {
        match (self, other) {
            (Self::Md5(left), Self::Md5(right)) => {
                let mut out = [0u8; 16];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = left[i] ^ right[i];
                }
                Self::Md5(out)
            }
            (Self::Sha256(left), Self::Sha256(right)) => {
                let mut out = [0u8; 32];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = left[i] ^ right[i];
                }
                Self::Sha256(out)
            }
            _ => panic!("digest width mismatch in xor"),
        }
    }

    /// Standard padded base64 rendering, the wire text form.
    pub fn to_base64(&self) -> String {
        base64::Engine::encode(&STANDARD, self.as_bytes())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.algo().name(), self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_known_value() {
        let digest = HashAlgo::Md5.hash(b"To be or not to");
        assert_eq!(digest.to_base64(), "C68UZChA4SK3gRZeClcKzg==");
    }

    #[test]
    fn test_base64_round_trip() {
        let digest = HashAlgo::Md5.hash(b"pish pish ololo");
        let encoded = digest.to_base64();
        let decoded = HashAlgo::Md5
            .digest_from_base64(&encoded)
            .expect("decode back");
        assert_eq!(digest, decoded);
    }

    #[test]
    fn test_sha256_width() {
        let digest = HashAlgo::Sha256.hash(b"anything");
        assert_eq!(digest.as_bytes().len(), 32);
        assert_eq!(digest.algo(), HashAlgo::Sha256);
    }

    #[test]
    fn test_rejects_bad_base64() {
        let err = HashAlgo::Md5
            .digest_from_base64("not/valid/base64!!!")
            .unwrap_err();
        assert!(matches!(err, HashError::Base64 { .. }));
    }

    #[test]
    fn test_rejects_wrong_length() {
        // Valid base64, but 5 bytes instead of 16.
        let err = HashAlgo::Md5.digest_from_base64("aGVsbG8=").unwrap_err();
        assert!(matches!(
            err,
            HashError::DigestLength {
                expected: 16,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_hash_name() {
        let err = HashAlgo::from_name("blake3").unwrap_err();
        assert!(matches!(err, HashError::UnknownHashName(_)));
    }

    #[test]
    fn test_xor_is_involutive() {
        let left = HashAlgo::Md5.hash(b"left");
        let right = HashAlgo::Md5.hash(b"right");
        let mixed = left.xor(&right);
        assert_ne!(mixed, left);
        assert_eq!(mixed.xor(&right), left);
        assert_eq!(mixed.xor(&left), right);
    }

    #[test]
    #[should_panic(expected = "digest width mismatch")]
    fn test_xor_width_mismatch_panics() {
        let md5 = HashAlgo::Md5.hash(b"a");
        let sha = HashAlgo::Sha256.hash(b"a");
        let _ = md5.xor(&sha);
    }
}
