//! Key derivation functions
//!
//! `hkdf_expand` / `hkdf_32` — HKDF-SHA256, used for per-message AEAD keys
//!   and deterministic invitation key material.
//! `hmac_sha256` — used for sender HMACs on `MessageV2` headers and for
//!   deterministic topic derivation.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CryptoError;

/// Expand `ikm` + `info` into `output.len()` bytes of key material.
/// `salt` may be empty (HKDF will use a zeroed salt).
pub fn hkdf_expand(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    hk.expand(info, output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
}

/// Derive exactly 32 bytes via HKDF-SHA256.
pub fn hkdf_32(ikm: &[u8], salt: Option<&[u8]>, info: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut out = [0u8; 32];
    hkdf_expand(ikm, salt, info, &mut out)?;
    Ok(out)
}

/// HMAC-SHA256(key, data), 32 bytes.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Verify an HMAC-SHA256 tag in constant time.
pub fn hmac_sha256_verify(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}
