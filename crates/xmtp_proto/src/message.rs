//! MessageV1 and MessageV2: the sealed payloads carried inside an envelope,
//! once a session has been used to seal them. The sealing/unsealing logic
//! itself lives upstream of this crate (it needs private key material);
//! this module defines only the wire shapes and their deterministic header
//! serialization.

use serde::{Deserialize, Serialize};
use xmtp_crypto::aead::Ciphertext;

use crate::bundle::{PublicKeyBundleV1, PublicKeyBundleV2};

/// Header authenticated as AAD for a `MessageV1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageV1Header {
    pub sender: PublicKeyBundleV1,
    pub recipient: PublicKeyBundleV1,
    pub timestamp_ns: u64,
}

impl MessageV1Header {
    /// Deterministic byte serialization used as AEAD associated data.
    pub fn to_aad_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("header serialization cannot fail")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageV1 {
    pub header: MessageV1Header,
    pub ciphertext: Ciphertext,
}

/// Header authenticated as AAD for a `MessageV2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageV2Header {
    pub sender: PublicKeyBundleV2,
    pub parent_message_id: Option<String>,
    pub timestamp_ns: u64,
}

impl MessageV2Header {
    pub fn to_aad_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("header serialization cannot fail")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageV2 {
    pub header: MessageV2Header,
    pub ciphertext: Ciphertext,
    /// HMAC-SHA256(derive(key_material, "hmac"), header_bytes).
    #[serde(with = "hex_bytes")]
    pub sender_hmac: Vec<u8>,
    pub should_push: bool,
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
