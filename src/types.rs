//! Core identity types

use crate::error::DigestParseError;
use crate::tree::hasher::{Blake3, DigestAlgorithm};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Output width of the digest algorithm, in bytes
pub const DIGEST_LEN: usize = 32;

/// Fixed-width identity value derived from a byte string
///
/// A `Digest` is either empty (never produced by hashing) or holds exactly
/// [`DIGEST_LEN`] bytes. Equality, hashing and ordering look at the byte
/// buffer only; the buffer of an empty digest is all zeroes.
#[derive(Clone, Copy)]
pub struct Digest {
    bytes: [u8; DIGEST_LEN],
    empty: bool,
}

impl Digest {
    /// The empty sentinel
    pub const fn empty() -> Self {
        Self {
            bytes: [0u8; DIGEST_LEN],
            empty: true,
        }
    }

    /// Hash `input` with the default algorithm (BLAKE3)
    pub fn make(input: impl AsRef<[u8]>) -> Self {
        Self::make_with::<Blake3>(input)
    }

    /// Hash `input` with an injected algorithm
    pub fn make_with<A: DigestAlgorithm>(input: impl AsRef<[u8]>) -> Self {
        Self {
            bytes: A::hash(input.as_ref()),
            empty: false,
        }
    }

    /// Overwrite this digest with the hash of `input`
    pub fn rehash(&mut self, input: impl AsRef<[u8]>) {
        self.rehash_with::<Blake3>(input);
    }

    /// Overwrite this digest with the hash of `input` under algorithm `A`
    ///
    /// The result is never empty, even for empty `input`.
    pub fn rehash_with<A: DigestAlgorithm>(&mut self, input: impl AsRef<[u8]>) {
        self.bytes = A::hash(input.as_ref());
        self.empty = false;
    }

    /// Wrap externally supplied bytes verbatim, without hashing
    pub const fn raw(bytes: [u8; DIGEST_LEN]) -> Self {
        Self {
            bytes,
            empty: false,
        }
    }

    /// Wrap a byte slice that must be exactly [`DIGEST_LEN`] long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DigestParseError> {
        let bytes: [u8; DIGEST_LEN] =
            bytes
                .try_into()
                .map_err(|_| DigestParseError::InvalidLength {
                    expected: DIGEST_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self::raw(bytes))
    }

    /// Parse the text form produced by [`Digest::to_hex`]
    ///
    /// The empty string parses back to the empty digest.
    pub fn from_hex(text: &str) -> Result<Self, DigestParseError> {
        if text.is_empty() {
            return Ok(Self::empty());
        }
        let bytes = hex::decode(text)?;
        Self::from_slice(&bytes)
    }

    pub fn bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Lower-case hex, two characters per byte; empty for the empty digest
    pub fn to_hex(&self) -> String {
        if self.empty {
            String::new()
        } else {
            hex::encode(self.bytes)
        }
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Digest {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Digest {}

impl Hash for Digest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl PartialOrd for Digest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Digest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = DigestParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.empty {
            f.write_str("Digest(empty)")
        } else {
            write!(f, "Digest({})", self.to_hex())
        }
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Digest::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
