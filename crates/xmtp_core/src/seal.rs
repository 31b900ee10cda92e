//! Sealing and opening MessageV1, invitations, and MessageV2 — the
//! cryptographic core of session establishment and per-message encryption.

use base64::Engine;
use xmtp_crypto::ecdh::ecdh;
use xmtp_crypto::kdf::{hkdf_32, hmac_sha256, hmac_sha256_verify};
use xmtp_crypto::{aead, identity};
use xmtp_proto::bundle::{PrivateKeyBundle, PublicKeyBundleV1, PublicKeyBundleV2};
use xmtp_proto::invitation::{
    InvitationContext, InvitationV1, SealedInvitationHeaderV1, SealedInvitationV1,
};
use xmtp_proto::message::{MessageV1, MessageV1Header, MessageV2, MessageV2Header};

use crate::error::CoreError;

pub fn verify_bundle_v1(bundle: &PublicKeyBundleV1) -> Result<(), CoreError> {
    let identity_pub = bundle.identity_public_key()?;
    let prekey_bytes = xmtp_crypto::ecdh::public_key_to_uncompressed(&bundle.prekey_public_key()?);
    identity::verify(&identity_pub, &prekey_bytes, &bundle.prekey_signature()?)?;
    Ok(())
}

pub fn verify_bundle_v2(bundle: &PublicKeyBundleV2) -> Result<(), CoreError> {
    let identity_pub = bundle.identity_public_key()?;
    let prekey_bytes = xmtp_crypto::ecdh::public_key_to_uncompressed(&bundle.prekey_public_key()?);
    identity::verify(&identity_pub, &prekey_bytes, &bundle.prekey_signature()?)?;
    Ok(())
}

/// The four-way combined secret used for MessageV1: both sides derive the
/// same bytes by pairing opposite key kinds.
fn combined_v1_secret(own: &PrivateKeyBundle, peer: &PublicKeyBundleV1) -> Result<Vec<u8>, CoreError> {
    let peer_identity = peer.identity_public_key()?;
    let peer_prekey = peer.prekey_public_key()?;

    let dh1 = ecdh(&own.identity_secret, &peer_prekey);
    let dh2 = ecdh(&own.prekey_secret, &peer_identity);
    let dh3 = ecdh(&own.prekey_secret, &peer_prekey);

    let mut secret = Vec::with_capacity(96);
    secret.extend_from_slice(&dh1);
    secret.extend_from_slice(&dh2);
    secret.extend_from_slice(&dh3);
    Ok(secret)
}

/// Seal a `MessageV1` from `sender` (the local participant) to `recipient`.
pub fn seal_message_v1(
    sender_private: &PrivateKeyBundle,
    sender_public: PublicKeyBundleV1,
    recipient_public: PublicKeyBundleV1,
    plaintext: &[u8],
    timestamp_ns: u64,
) -> Result<MessageV1, CoreError> {
    let header = MessageV1Header {
        sender: sender_public,
        recipient: recipient_public.clone(),
        timestamp_ns,
    };
    let aad = header.to_aad_bytes();
    let secret = combined_v1_secret(sender_private, &recipient_public)?;
    let ciphertext = aead::seal(&secret, plaintext, &aad)?;
    Ok(MessageV1 { header, ciphertext })
}

/// Open a `MessageV1` as its declared recipient. Rejects if the header's
/// claimed bundles don't verify, or if the local wallet isn't the declared
/// recipient.
pub fn open_message_v1(
    recipient_private: &PrivateKeyBundle,
    message: &MessageV1,
) -> Result<Vec<u8>, CoreError> {
    if message.header.recipient.wallet_address != recipient_private.wallet_address {
        return Err(CoreError::AuthFailure);
    }
    verify_bundle_v1(&message.header.sender)?;
    verify_bundle_v1(&message.header.recipient)?;

    let aad = message.header.to_aad_bytes();
    // Mirror the sender's pairing: recipient's (identity, prekey) against
    // sender's (prekey, identity), producing the identical concatenation.
    let sender = &message.header.sender;
    let sender_identity = sender.identity_public_key()?;
    let sender_prekey = sender.prekey_public_key()?;

    let dh1 = ecdh(&recipient_private.prekey_secret, &sender_identity);
    let dh2 = ecdh(&recipient_private.identity_secret, &sender_prekey);
    let dh3 = ecdh(&recipient_private.prekey_secret, &sender_prekey);

    let mut secret = Vec::with_capacity(96);
    secret.extend_from_slice(&dh1);
    secret.extend_from_slice(&dh2);
    secret.extend_from_slice(&dh3);

    aead::open(&secret, &message.ciphertext, &aad).map_err(CoreError::from)
}

/// Derive the deterministic (topic, key_material) pair for a v2 session.
/// `k = ECDH(own.prekey, peer.prekey)` is already symmetric regardless of
/// which side calls it, so both peers reach identical output from the same
/// context without needing to agree on a sort order for this computation.
/// Canonical ordering of the two bundles (`sort_bundles_v2`) is applied
/// separately, when the invitation is sealed, to decide the sender/
/// recipient roles in the wire header.
pub fn derive_deterministic_invitation(
    own_prekey_secret: &k256::SecretKey,
    peer: &PublicKeyBundleV2,
    context: InvitationContext,
) -> Result<InvitationV1, CoreError> {
    let peer_prekey = peer.prekey_public_key()?;
    let k = ecdh(own_prekey_secret, &peer_prekey);

    let msg = match &context.conversation_id {
        Some(id) => format!("0{id}"),
        None => "0".to_string(),
    };
    let topic_seed = hmac_sha256(&k, msg.as_bytes());
    let qualifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(topic_seed);
    let topic = xmtp_proto::topic::v2_topic(&qualifier);
    let key_material = hkdf_32(&k, Some(&topic_seed), b"xmtp/v2/keyMaterial")?;

    Ok(InvitationV1 {
        topic,
        context,
        key_material: key_material.to_vec(),
    })
}

/// Given two bundles in arbitrary order, return (lower, higher) sorted by
/// raw wallet-address bytes ascending — the canonical order the wire
/// protocol requires for sender/recipient roles in a sealed invitation.
pub fn sort_bundles_v2<'a>(
    a: &'a PublicKeyBundleV2,
    b: &'a PublicKeyBundleV2,
) -> (&'a PublicKeyBundleV2, &'a PublicKeyBundleV2) {
    if a.wallet_address <= b.wallet_address {
        (a, b)
    } else {
        (b, a)
    }
}

/// Generate an explicit (non-deterministic) invitation with a random topic
/// and random key material.
pub fn explicit_invitation(context: InvitationContext) -> InvitationV1 {
    use rand::RngCore;
    let mut topic_bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut topic_bytes);
    let mut key_material = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key_material);
    InvitationV1 {
        topic: xmtp_proto::topic::v2_topic(&hex::encode(topic_bytes)),
        context,
        key_material: key_material.to_vec(),
    }
}

/// Seal an `InvitationV1` from the local participant (`local_private`/
/// `local_public`) to `peer_public`. The header's sender/recipient roles are
/// assigned by canonical wallet-address order (`sort_bundles_v2`), not by
/// who is calling — `k_inv` is symmetric in that order, so this does not
/// change which secret is used, only which bundle is labelled which way on
/// the wire.
pub fn seal_invitation(
    local_private: &PrivateKeyBundle,
    local_public: PublicKeyBundleV2,
    peer_public: PublicKeyBundleV2,
    invitation: &InvitationV1,
    created_ns: u64,
) -> Result<SealedInvitationV1, CoreError> {
    let (low, high) = sort_bundles_v2(&local_public, &peer_public);
    let header = SealedInvitationHeaderV1 {
        sender: low.clone(),
        recipient: high.clone(),
        created_ns,
    };
    let aad = header.to_aad_bytes();
    let peer_prekey = peer_public.prekey_public_key()?;
    let k_inv = ecdh(&local_private.prekey_secret, &peer_prekey);

    let plaintext = serde_json::to_vec(invitation)?;
    let ciphertext = aead::seal(&k_inv, &plaintext, &aad)?;
    Ok(SealedInvitationV1 { header, ciphertext })
}

/// Open a `SealedInvitationV1` as `recipient_private`'s owner, verifying the
/// peer's wallet→identity→prekey signature chain. The peer bundle is
/// whichever of the header's sender/recipient fields is not the local
/// wallet address, since `seal_invitation` assigns those fields by
/// canonical order rather than by who created the invitation.
pub fn open_invitation(
    recipient_private: &PrivateKeyBundle,
    sealed: &SealedInvitationV1,
) -> Result<InvitationV1, CoreError> {
    let peer_bundle = if sealed.header.sender.wallet_address == recipient_private.wallet_address {
        &sealed.header.recipient
    } else {
        &sealed.header.sender
    };
    verify_bundle_v2(peer_bundle)?;

    let peer_prekey = peer_bundle.prekey_public_key()?;
    let k_inv = ecdh(&recipient_private.prekey_secret, &peer_prekey);
    let aad = sealed.header.to_aad_bytes();
    let plaintext = aead::open(&k_inv, &sealed.ciphertext, &aad)?;
    serde_json::from_slice(&plaintext).map_err(CoreError::from)
}

/// Seal a `MessageV2` under a session's shared `key_material`.
pub fn seal_message_v2(
    key_material: &[u8],
    sender_public: PublicKeyBundleV2,
    parent_message_id: Option<String>,
    plaintext: &[u8],
    timestamp_ns: u64,
    should_push: bool,
) -> Result<MessageV2, CoreError> {
    let header = MessageV2Header {
        sender: sender_public,
        parent_message_id,
        timestamp_ns,
    };
    let aad = header.to_aad_bytes();
    let ciphertext = aead::seal(key_material, plaintext, &aad)?;
    let hmac_key = hkdf_32(key_material, None, b"hmac")?;
    let sender_hmac = hmac_sha256(&hmac_key, &aad).to_vec();
    Ok(MessageV2 {
        header,
        ciphertext,
        sender_hmac,
        should_push,
    })
}

/// Open a `MessageV2` under a session's shared `key_material`.
pub fn open_message_v2(key_material: &[u8], message: &MessageV2) -> Result<Vec<u8>, CoreError> {
    let aad = message.header.to_aad_bytes();
    let hmac_key = hkdf_32(key_material, None, b"hmac")?;
    if !hmac_sha256_verify(&hmac_key, &aad, &message.sender_hmac) {
        return Err(CoreError::AuthFailure);
    }
    aead::open(key_material, &message.ciphertext, &aad).map_err(CoreError::from)
}
