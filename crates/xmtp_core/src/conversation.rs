//! The session model: a tagged union of the two conversation variants.
//!
//! Both variants expose the same conceptual surface (`topic`,
//! `peer_address`, `created_at`). They differ in state: v1 has no shared
//! secret and re-derives one per message, while v2 carries a persistent
//! `key_material`. The variants are dispatched at the registry boundary
//! rather than through a trait object, so the registry owns all crypto and
//! transport collaborators and a `Conversation` is a plain, cheaply cloned
//! value.

use xmtp_crypto::WalletAddress;
use xmtp_proto::invitation::{InvitationContext, SealedInvitationHeaderV1};
use zeroize::Zeroize;

#[derive(Debug, Clone)]
pub struct ConversationV1 {
    pub peer_address: WalletAddress,
    pub created_at_ns: u64,
}

#[derive(Debug, Clone)]
pub struct ConversationV2 {
    pub peer_address: WalletAddress,
    pub topic: String,
    pub key_material: Vec<u8>,
    pub context: InvitationContext,
    pub created_ns: u64,
    pub header: SealedInvitationHeaderV1,
}

impl Drop for ConversationV2 {
    fn drop(&mut self) {
        self.key_material.zeroize();
    }
}

#[derive(Debug, Clone)]
pub enum Conversation {
    V1(ConversationV1),
    V2(ConversationV2),
}

impl Conversation {
    pub fn topic(&self, self_address: &WalletAddress) -> String {
        match self {
            Conversation::V1(v1) => xmtp_proto::topic::dm_topic(self_address, &v1.peer_address),
            Conversation::V2(v2) => v2.topic.clone(),
        }
    }

    pub fn peer_address(&self) -> WalletAddress {
        match self {
            Conversation::V1(v1) => v1.peer_address,
            Conversation::V2(v2) => v2.peer_address,
        }
    }

    pub fn created_at_ns(&self) -> u64 {
        match self {
            Conversation::V1(v1) => v1.created_at_ns,
            Conversation::V2(v2) => v2.created_ns,
        }
    }

    pub fn context(&self) -> Option<&InvitationContext> {
        match self {
            Conversation::V1(_) => None,
            Conversation::V2(v2) => Some(&v2.context),
        }
    }

    pub fn is_v2(&self) -> bool {
        matches!(self, Conversation::V2(_))
    }
}
