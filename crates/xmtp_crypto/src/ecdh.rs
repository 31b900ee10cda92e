//! secp256k1 Diffie-Hellman, used both for identity/pre-key agreement
//! (§4.2, §4.3) and for the pre-key-based shared secrets that invitations
//! derive topics and key material from.

use k256::ecdh::diffie_hellman;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};

use crate::error::CryptoError;

/// Decode a SEC1 public key (compressed or uncompressed).
pub fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    PublicKey::from_sec1_bytes(bytes)
        .map_err(|e| CryptoError::InvalidKey(format!("bad public key: {e}")))
}

/// Decode a 32-byte scalar as a secp256k1 secret key.
pub fn secret_key_from_bytes(bytes: &[u8; 32]) -> Result<SecretKey, CryptoError> {
    SecretKey::from_bytes(bytes.into())
        .map_err(|e| CryptoError::InvalidKey(format!("bad secret key: {e}")))
}

/// Encode a public key in uncompressed SEC1 form (0x04 || X || Y, 65 bytes).
pub fn public_key_to_uncompressed(pk: &PublicKey) -> Vec<u8> {
    pk.to_encoded_point(false).as_bytes().to_vec()
}

/// ECDH shared secret: the X coordinate of `private * public`, 32 bytes.
pub fn ecdh(private: &SecretKey, public: &PublicKey) -> [u8; 32] {
    let shared = diffie_hellman(private.to_nonzero_scalar(), public.as_affine());
    let mut out = [0u8; 32];
    out.copy_from_slice(shared.raw_secret_bytes().as_slice());
    out
}
