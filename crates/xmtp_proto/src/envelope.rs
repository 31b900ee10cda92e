//! The atomic unit exchanged with the relay.
//!
//! The relay is a dumb pub/sub layer: it sees a topic string, a timestamp,
//! and opaque message bytes. It has no notion of sender, recipient, or
//! plaintext — those live inside whatever `message` decodes to (a
//! `MessageV1`, `MessageV2`, or `SealedInvitationV1`), which this crate
//! never inspects on the relay's behalf.

use serde::{Deserialize, Serialize};

/// On-wire envelope — sent to and received from the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub content_topic: String,
    pub timestamp_ns: u64,
    #[serde(with = "base64_bytes")]
    pub message: Vec<u8>,
}

impl Envelope {
    pub fn new(content_topic: impl Into<String>, timestamp_ns: u64, message: Vec<u8>) -> Self {
        Self {
            content_topic: content_topic.into(),
            timestamp_ns,
            message,
        }
    }
}

/// A page of envelopes plus an opaque cursor for continuing the query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
