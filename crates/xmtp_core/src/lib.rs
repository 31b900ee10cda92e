//! xmtp_core — session establishment, message sealing, and the conversation
//! registry that ties the wire types in `xmtp_proto` to a transport.
//!
//! # Modules
//! - `error`        — `CoreError`, the aggregate error surface
//! - `config`        — `ClientConfig` tunables
//! - `client`        — `RelayClient` / `ContactDirectory` collaborator traits, codec registry
//! - `seal`          — sealing/opening MessageV1, invitations, MessageV2
//! - `conversation`  — the `Conversation` session value
//! - `registry`       — `Conversations`: the topic→session map and send/receive/discovery operations

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod registry;
pub mod seal;

pub use client::{CodecRegistry, ContactDirectory, ContentCodec, EnvelopeStream, RelayClient};
pub use config::ClientConfig;
pub use conversation::{Conversation, ConversationV1, ConversationV2};
pub use error::CoreError;
pub use registry::{
    ConversationEvent, Conversations, DecodedMessage, DecryptedMessage, PersistedInvitation,
    PersistedSessionRecord,
};
