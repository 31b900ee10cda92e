//! xmtp_proto — wire types, topic grammar, and framing for the messaging core.
//!
//! All on-wire types are serialised to JSON and versioned to allow future
//! format changes without breaking compatibility.
//!
//! # Modules
//! - `envelope`   — (topic, timestamp, bytes) unit exchanged with the relay
//! - `bundle`     — public/private key bundles (v1 raw, v2 structured)
//! - `message`    — MessageV1 / MessageV2 headers and sealed shapes
//! - `invitation` — InvitationV1 / SealedInvitationV1 for v2 bootstrap
//! - `topic`      — topic grammar builders and parser
//! - `codec`      — content-type framing and compression

pub mod bundle;
pub mod codec;
pub mod envelope;
pub mod invitation;
pub mod message;
pub mod topic;

pub use bundle::{PrivateKeyBundle, PublicKeyBundleV1, PublicKeyBundleV2, SignedPublicKey};
pub use codec::{CompressionMode, ContentTypeId, EncodedContent};
pub use envelope::{Envelope, PagingInfo};
pub use invitation::{InvitationContext, InvitationV1, SealedInvitationHeaderV1, SealedInvitationV1};
pub use message::{MessageV1, MessageV1Header, MessageV2, MessageV2Header};
