//! Wallet address: the 20-byte account identifier that identifies a
//! participant. Comparisons and map keys always operate on the raw bytes —
//! the checksummed hex form is a display-only convenience and must never be
//! used for equality (per the "unambiguous byte-wise comparison, not a
//! case-insensitive or normalized form" requirement on deterministic
//! invitation ordering).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::CryptoError;

/// 20-byte account identifier, ordered by its raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress([u8; 20]);

impl WalletAddress {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse from hex, with or without a leading `0x`, with or without a
    /// checksum. The checksum is never verified on parse — only raw bytes
    /// are meaningful; callers who need to confirm a checksummed string
    /// matches the canonical rendering should compare against `to_checksum`.
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)?;
        if bytes.len() != 20 {
            return Err(CryptoError::InvalidWalletAddress(format!(
                "expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Render as a checksummed hex string: lowercase-hex the address, hash
    /// that string with Keccak-256, and uppercase each hex digit whose
    /// corresponding nibble in the hash is >= 8.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            if c.is_ascii_alphabetic() {
                let nibble = if i % 2 == 0 {
                    hash[i / 2] >> 4
                } else {
                    hash[i / 2] & 0x0f
                };
                if nibble >= 8 {
                    out.push(c.to_ascii_uppercase());
                    continue;
                }
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Debug for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletAddress({})", self.to_checksum())
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = CryptoError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> String {
        addr.to_checksum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_roundtrip() {
        let addr = WalletAddress::from_bytes([0x11; 20]);
        let checksum = addr.to_checksum();
        let parsed = WalletAddress::parse(&checksum).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn parse_accepts_lowercase_and_uppercase() {
        let addr = WalletAddress::from_bytes([0xab; 20]);
        let checksum = addr.to_checksum();
        let lower = checksum.to_ascii_lowercase();
        assert_eq!(WalletAddress::parse(&lower).unwrap(), addr);
        assert_eq!(WalletAddress::parse(&checksum).unwrap(), addr);
    }

    #[test]
    fn ordering_is_byte_wise() {
        let a = WalletAddress::from_bytes([0x01; 20]);
        let b = WalletAddress::from_bytes([0x02; 20]);
        assert!(a < b);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(WalletAddress::parse("0x1234").is_err());
    }
}
