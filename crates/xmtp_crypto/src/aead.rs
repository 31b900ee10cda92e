//! Authenticated Encryption with Associated Data.
//!
//! Construction: AES-256-GCM with an HKDF-SHA256-derived per-message key.
//! Every seal generates a fresh 32-byte HKDF salt and a fresh 12-byte GCM
//! nonce, derives a one-time 32-byte AES key via `HKDF-SHA256(ikm=secret,
//! salt=salt, info=∅, L=32)`, and encrypts with the tag appended. Because
//! the AEAD key is freshly derived per message, nonce reuse across messages
//! under the same long-lived `secret` is harmless as long as the salt
//! differs, which it always does.
//!
//! Wire format of a `Ciphertext`: `[ salt: 32 ][ nonce: 12 ][ payload+tag ]`.

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::kdf::hkdf_32;

pub const SALT_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

/// A sealed payload: HKDF salt, GCM nonce, and the tagged ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub hkdf_salt: [u8; SALT_LEN],
    pub gcm_nonce: [u8; NONCE_LEN],
    pub payload: Vec<u8>,
}

impl Ciphertext {
    /// Flatten to the wire byte layout `salt || nonce || payload`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.payload.len());
        out.extend_from_slice(&self.hkdf_salt);
        out.extend_from_slice(&self.gcm_nonce);
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < SALT_LEN + NONCE_LEN {
            return Err(CryptoError::InvalidKey("ciphertext too short".into()));
        }
        let mut hkdf_salt = [0u8; SALT_LEN];
        hkdf_salt.copy_from_slice(&bytes[..SALT_LEN]);
        let mut gcm_nonce = [0u8; NONCE_LEN];
        gcm_nonce.copy_from_slice(&bytes[SALT_LEN..SALT_LEN + NONCE_LEN]);
        let payload = bytes[SALT_LEN + NONCE_LEN..].to_vec();
        Ok(Self {
            hkdf_salt,
            gcm_nonce,
            payload,
        })
    }
}

fn derive_message_key(secret: &[u8], salt: &[u8; SALT_LEN]) -> Result<[u8; 32], CryptoError> {
    hkdf_32(secret, Some(salt), &[])
}

/// Seal `plaintext` under `secret`, authenticating `aad`.
pub fn seal(secret: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Ciphertext, CryptoError> {
    let mut hkdf_salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut hkdf_salt);
    let mut gcm_nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut gcm_nonce);

    let mut key_bytes = derive_message_key(secret, &hkdf_salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    key_bytes.zeroize();
    let nonce = Nonce::from_slice(&gcm_nonce);

    let payload = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::AeadEncrypt)?;

    Ok(Ciphertext {
        hkdf_salt,
        gcm_nonce,
        payload,
    })
}

/// Open a `Ciphertext` sealed under `secret`, authenticating `aad`.
///
/// Tag-mismatch and any other decryption failure are both reported as
/// `CryptoError::AeadDecrypt` — the cause is never distinguished to the
/// caller.
pub fn open(secret: &[u8], ct: &Ciphertext, aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut key_bytes = derive_message_key(secret, &ct.hkdf_salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    key_bytes.zeroize();
    let nonce = Nonce::from_slice(&ct.gcm_nonce);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &ct.payload,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadDecrypt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let secret = b"session-secret-material-32-byte";
        let ct = seal(secret, b"hello", b"header").unwrap();
        let pt = open(secret, &ct, b"header").unwrap();
        assert_eq!(pt, b"hello");
    }

    #[test]
    fn wrong_aad_fails() {
        let secret = b"session-secret-material-32-byte";
        let ct = seal(secret, b"hello", b"header").unwrap();
        assert!(open(secret, &ct, b"other-header").is_err());
    }

    #[test]
    fn tampered_payload_fails() {
        let secret = b"session-secret-material-32-byte";
        let mut ct = seal(secret, b"hello", b"header").unwrap();
        ct.payload[0] ^= 0xff;
        assert!(open(secret, &ct, b"header").is_err());
    }

    #[test]
    fn wire_roundtrip() {
        let secret = b"session-secret-material-32-byte";
        let ct = seal(secret, b"payload", b"aad").unwrap();
        let bytes = ct.to_bytes();
        let parsed = Ciphertext::from_bytes(&bytes).unwrap();
        assert_eq!(ct, parsed);
        assert_eq!(open(secret, &parsed, b"aad").unwrap(), b"payload");
    }

    #[test]
    fn distinct_salts_per_seal() {
        let secret = b"session-secret-material-32-byte";
        let a = seal(secret, b"same", b"aad").unwrap();
        let b = seal(secret, b"same", b"aad").unwrap();
        assert_ne!(a.hkdf_salt, b.hkdf_salt);
        assert_ne!(a.gcm_nonce, b.gcm_nonce);
    }
}
