//! Identity keys and pre-keys.
//!
//! A participant's long-term identity is a secp256k1 key pair. Binding that
//! identity key to the participant's wallet address is an external concern
//! (the wallet signs the identity key's public bytes; this crate only
//! generates, signs pre-keys with, and verifies with the identity key — it
//! never produces or checks a wallet signature itself).
//!
//! A pre-key is a medium-term secp256k1 key pair signed by the identity key
//! so that a remote party can authenticate it out of a published bundle
//! without the owner being online (§4.2, §4.3).

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::{PublicKey, SecretKey};
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Long-term identity key pair.
#[derive(Clone)]
pub struct IdentityKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl IdentityKeyPair {
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_bytes(bytes.into())
            .map_err(|e| CryptoError::InvalidKey(format!("bad identity secret: {e}")))?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from(&self.secret)
    }

    /// Sign `message` (typically a pre-key's encoded public bytes) with the
    /// identity key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key().sign(message)
    }

    /// Generate and sign a new pre-key bound to this identity.
    pub fn generate_prekey(&self, id: u32) -> PreKeyPair {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        let encoded = crate::ecdh::public_key_to_uncompressed(&public);
        let signature = self.sign(&encoded);
        PreKeyPair {
            id,
            secret,
            public,
            signature,
        }
    }
}

/// Verify that `signature` over `message` was produced by `identity_public`.
pub fn verify(
    identity_public: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), CryptoError> {
    let verifying = VerifyingKey::from(identity_public);
    verifying
        .verify(message, signature)
        .map_err(|_| CryptoError::SignatureVerification)
}

/// A medium-term key pair signed by the owning identity key, published in a
/// key bundle so a remote peer can authenticate it without the owner being
/// online.
#[derive(Clone)]
pub struct PreKeyPair {
    pub id: u32,
    secret: SecretKey,
    public: PublicKey,
    pub signature: Signature,
}

impl PreKeyPair {
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Verify this pre-key's signature against the claimed owning identity.
    pub fn verify_against(&self, identity_public: &PublicKey) -> Result<(), CryptoError> {
        let encoded = crate::ecdh::public_key_to_uncompressed(&self.public);
        verify(identity_public, &encoded, &self.signature)
    }
}
