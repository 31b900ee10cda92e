//! v2 session bootstrap: an `InvitationV1` carries the topic and key
//! material for a deterministic or explicit v2 conversation; a
//! `SealedInvitationV1` is how it travels over the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xmtp_crypto::aead::Ciphertext;

use crate::bundle::PublicKeyBundleV2;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvitationContext {
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationV1 {
    pub topic: String,
    pub context: InvitationContext,
    /// 32 bytes of AES-256-GCM/HKDF-SHA256 key material shared by the session.
    #[serde(with = "hex_bytes")]
    pub key_material: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedInvitationHeaderV1 {
    pub sender: PublicKeyBundleV2,
    pub recipient: PublicKeyBundleV2,
    pub created_ns: u64,
}

impl SealedInvitationHeaderV1 {
    pub fn to_aad_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("header serialization cannot fail")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedInvitationV1 {
    pub header: SealedInvitationHeaderV1,
    pub ciphertext: Ciphertext,
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
