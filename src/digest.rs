//! Phrase wrapping and UID derivation.
//!
//! A bind phrase is never hashed raw: it is embedded in the fixed compile
//! flag template first, then MD5-hashed, and only the first 6 digest bytes
//! survive as the UID. Table construction and the brute-force workers both
//! go through the entry points here, so the two paths derive bit-identical
//! UIDs for the same phrase.

use std::fmt;

use md5::{Digest, Md5};

use crate::error::SearchError;

/// Template wrapped around every phrase before hashing.
/// Changing either half invalidates every precomputed table entry.
pub const WRAP_PREFIX: &str = "-DMY_BINDING_PHRASE=\"";
pub const WRAP_SUFFIX: &str = "\"";

/// UID length in bytes (MD5 digest truncation).
pub const UID_LEN: usize = 6;

/// 6-byte truncated digest identifying a wrapped phrase.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uid([u8; UID_LEN]);

impl Uid {
    pub const fn from_bytes(bytes: [u8; UID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; UID_LEN] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Parse the user-facing form: exactly 6 comma-separated decimals, each
    /// 0..=255, e.g. `9,143,107,205,70,33`. Wrong arity or an out-of-range
    /// value is rejected outright, never clamped or truncated.
    pub fn parse(input: &str) -> Result<Self, SearchError> {
        let mut bytes = [0u8; UID_LEN];
        let mut count = 0usize;

        for part in input.split(',') {
            let part = part.trim();
            if count == UID_LEN {
                return Err(SearchError::MalformedUid(format!(
                    "expected {} bytes, got more",
                    UID_LEN
                )));
            }
            bytes[count] = part.parse::<u8>().map_err(|_| {
                SearchError::MalformedUid(format!("'{}' is not a number in 0-255", part))
            })?;
            count += 1;
        }

        if count != UID_LEN {
            return Err(SearchError::MalformedUid(format!(
                "expected {} bytes, got {}",
                UID_LEN, count
            )));
        }

        Ok(Self(bytes))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; UID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for b in self.0 {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", b)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.to_hex())
    }
}

/// MD5 of an already-wrapped byte string, truncated to [`UID_LEN`] bytes.
#[inline]
pub fn uid_of_wrapped(wrapped: &[u8]) -> Uid {
    let digest = Md5::digest(wrapped);
    let mut uid = [0u8; UID_LEN];
    uid.copy_from_slice(&digest[..UID_LEN]);
    Uid(uid)
}

/// Wrap a phrase in the template and digest it.
pub fn phrase_uid(phrase: &str) -> Uid {
    let mut wrapped =
        String::with_capacity(WRAP_PREFIX.len() + phrase.len() + WRAP_SUFFIX.len());
    wrapped.push_str(WRAP_PREFIX);
    wrapped.push_str(phrase);
    wrapped.push_str(WRAP_SUFFIX);
    uid_of_wrapped(wrapped.as_bytes())
}
