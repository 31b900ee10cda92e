//! Public and private key bundles: the (identity, pre-key) pairs exchanged
//! between participants and retained locally.

use k256::ecdsa::Signature;
use k256::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use xmtp_crypto::ecdh::{public_key_from_bytes, public_key_to_uncompressed};
use xmtp_crypto::WalletAddress;

/// Raw uncompressed public keys plus their wallet-rooted signatures.
/// `identity_key` is the wallet-signed identity public key; `prekey` is the
/// identity-signed pre-key public key. Signatures are stored as compact
/// (r || s) bytes rather than the `k256` signature type, so the wire type
/// carries no dependency on a particular signature library's own encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyBundleV1 {
    pub wallet_address: WalletAddress,
    #[serde(with = "hex_bytes")]
    pub identity_key: Vec<u8>,
    /// Signature over `identity_key` produced by the external wallet signer.
    #[serde(with = "hex_bytes")]
    pub wallet_signature: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub prekey: Vec<u8>,
    /// Signature over `prekey` produced by the identity key.
    #[serde(with = "hex_bytes")]
    pub prekey_signature: Vec<u8>,
}

/// The same keys wrapped as structured "signed public keys" carrying a
/// creation timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedPublicKey {
    #[serde(with = "hex_bytes")]
    pub key_bytes: Vec<u8>,
    pub created_ns: u64,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyBundleV2 {
    pub wallet_address: WalletAddress,
    pub identity_key: SignedPublicKey,
    /// Signature over `identity_key.key_bytes` produced by the external wallet signer.
    #[serde(with = "hex_bytes")]
    pub wallet_signature: Vec<u8>,
    pub prekey: SignedPublicKey,
}

impl PublicKeyBundleV2 {
    pub fn identity_public_key(&self) -> Result<PublicKey, xmtp_crypto::CryptoError> {
        public_key_from_bytes(&self.identity_key.key_bytes)
    }

    pub fn prekey_public_key(&self) -> Result<PublicKey, xmtp_crypto::CryptoError> {
        public_key_from_bytes(&self.prekey.key_bytes)
    }

    pub fn prekey_signature(&self) -> Result<Signature, xmtp_crypto::CryptoError> {
        Signature::from_slice(&self.prekey.signature)
            .map_err(|e| xmtp_crypto::CryptoError::InvalidKey(format!("bad signature: {e}")))
    }
}

impl PublicKeyBundleV1 {
    pub fn identity_public_key(&self) -> Result<PublicKey, xmtp_crypto::CryptoError> {
        public_key_from_bytes(&self.identity_key)
    }

    pub fn prekey_public_key(&self) -> Result<PublicKey, xmtp_crypto::CryptoError> {
        public_key_from_bytes(&self.prekey)
    }

    pub fn prekey_signature(&self) -> Result<Signature, xmtp_crypto::CryptoError> {
        Signature::from_slice(&self.prekey_signature)
            .map_err(|e| xmtp_crypto::CryptoError::InvalidKey(format!("bad signature: {e}")))
    }
}

/// The owning side: both private keys, retained locally and never serialized
/// onto the wire. `k256::SecretKey` zeroizes its scalar on drop, so no
/// explicit zeroization is needed here.
pub struct PrivateKeyBundle {
    pub wallet_address: WalletAddress,
    pub identity_secret: SecretKey,
    pub prekey_secret: SecretKey,
}

impl PrivateKeyBundle {
    pub fn to_public_v1(
        &self,
        wallet_signature: Vec<u8>,
        prekey_signature: Signature,
    ) -> PublicKeyBundleV1 {
        PublicKeyBundleV1 {
            wallet_address: self.wallet_address,
            identity_key: public_key_to_uncompressed(&self.identity_secret.public_key()),
            wallet_signature,
            prekey: public_key_to_uncompressed(&self.prekey_secret.public_key()),
            prekey_signature: prekey_signature.to_bytes().to_vec(),
        }
    }

    pub fn to_public_v2(
        &self,
        wallet_signature: Vec<u8>,
        prekey_signature: Signature,
        identity_created_ns: u64,
        prekey_created_ns: u64,
    ) -> PublicKeyBundleV2 {
        PublicKeyBundleV2 {
            wallet_address: self.wallet_address,
            identity_key: SignedPublicKey {
                key_bytes: public_key_to_uncompressed(&self.identity_secret.public_key()),
                created_ns: identity_created_ns,
                signature: wallet_signature.clone(),
            },
            wallet_signature,
            prekey: SignedPublicKey {
                key_bytes: public_key_to_uncompressed(&self.prekey_secret.public_key()),
                created_ns: prekey_created_ns,
                signature: prekey_signature.to_bytes().to_vec(),
            },
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
