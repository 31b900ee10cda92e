//! The conversations registry: the in-memory topic→session map and the
//! send/receive/discovery operations that dispatch across it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_core::Stream;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use xmtp_crypto::WalletAddress;
use xmtp_proto::bundle::{PrivateKeyBundle, PublicKeyBundleV1, PublicKeyBundleV2};
use xmtp_proto::codec::{CompressionMode, EncodedContent};
use xmtp_proto::invitation::{InvitationContext, SealedInvitationHeaderV1, SealedInvitationV1};
use xmtp_proto::message::{MessageV1, MessageV2};
use xmtp_proto::topic::{self, TopicKind};
use xmtp_proto::{Envelope, PagingInfo};

use crate::client::{ContactDirectory, ContentCodec, QueryRequest, RelayClient};
use crate::config::ClientConfig;
use crate::conversation::{Conversation, ConversationV1, ConversationV2};
use crate::error::CoreError;
use crate::seal;

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_nanos() as u64
}

/// One-byte compression tag prefixed to a sealed payload so the opener
/// knows which decompression to apply without consulting local config.
fn frame_payload(mode: CompressionMode, payload: &[u8]) -> Result<Vec<u8>, CoreError> {
    let compressed = xmtp_proto::codec::compress(mode, payload)?;
    let tag: u8 = match mode {
        CompressionMode::None => 0,
        CompressionMode::Deflate => 1,
        CompressionMode::Gzip => 2,
    };
    let mut out = Vec::with_capacity(1 + compressed.len());
    out.push(tag);
    out.extend_from_slice(&compressed);
    Ok(out)
}

fn unframe_payload(framed: &[u8]) -> Result<Vec<u8>, CoreError> {
    let (tag, rest) = framed
        .split_first()
        .ok_or_else(|| CoreError::InvalidArgument("empty framed payload".into()))?;
    let mode = match tag {
        0 => CompressionMode::None,
        1 => CompressionMode::Deflate,
        2 => CompressionMode::Gzip,
        other => return Err(CoreError::InvalidArgument(format!("unknown compression tag {other}"))),
    };
    xmtp_proto::codec::decompress(mode, rest).map_err(CoreError::from)
}

/// A persisted session record for import/export; presence of `invitation`
/// distinguishes v2 from v1.
#[derive(Debug, Clone)]
pub struct PersistedSessionRecord {
    pub peer_address: WalletAddress,
    pub created_ns: u64,
    pub invitation: Option<PersistedInvitation>,
}

#[derive(Debug, Clone)]
pub struct PersistedInvitation {
    pub topic: String,
    pub key_material: Vec<u8>,
    pub context: InvitationContext,
    pub header: SealedInvitationHeaderV1,
}

#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub topic: String,
    pub sender: WalletAddress,
    pub timestamp_ns: u64,
    pub content: EncodedContent,
}

#[derive(Debug, Clone)]
pub struct DecryptedMessage {
    pub topic: String,
    pub sender: WalletAddress,
    pub timestamp_ns: u64,
    pub plaintext: Vec<u8>,
}

pub enum ConversationEvent<M> {
    Discovered(Conversation),
    Message(M),
}

/// The per-participant conversations registry. Owns the private key
/// material, the relay and directory collaborators, and all mutable
/// session state.
pub struct Conversations {
    self_address: WalletAddress,
    private_bundle: PrivateKeyBundle,
    public_bundle_v1: PublicKeyBundleV1,
    public_bundle_v2: PublicKeyBundleV2,
    relay: Arc<dyn RelayClient>,
    directory: Arc<dyn ContactDirectory>,
    config: ClientConfig,
    sessions: RwLock<HashMap<String, Conversation>>,
    has_introduced: RwLock<HashSet<WalletAddress>>,
}

impl Conversations {
    pub fn new(
        private_bundle: PrivateKeyBundle,
        public_bundle_v1: PublicKeyBundleV1,
        public_bundle_v2: PublicKeyBundleV2,
        relay: Arc<dyn RelayClient>,
        directory: Arc<dyn ContactDirectory>,
        config: ClientConfig,
    ) -> Self {
        Self {
            self_address: private_bundle.wallet_address,
            private_bundle,
            public_bundle_v1,
            public_bundle_v2,
            relay,
            directory,
            config,
            sessions: RwLock::new(HashMap::new()),
            has_introduced: RwLock::new(HashSet::new()),
        }
    }

    pub fn self_address(&self) -> WalletAddress {
        self.self_address
    }

    /// Synchronous constructor: parse an envelope observed on the local
    /// `intro` channel into a v1 session. Does no network I/O.
    pub fn from_intro(&self, envelope: &Envelope) -> Result<Conversation, CoreError> {
        let message: MessageV1 = serde_json::from_slice(&envelope.message)?;
        let peer_address = if message.header.sender.wallet_address == self.self_address {
            message.header.recipient.wallet_address
        } else {
            message.header.sender.wallet_address
        };
        Ok(Conversation::V1(ConversationV1 {
            peer_address,
            created_at_ns: envelope.timestamp_ns,
        }))
    }

    /// Synchronous constructor: parse and open a sealed invitation observed
    /// on the local `invite` channel into a v2 session. Does no network I/O
    /// beyond the ECDH/AEAD already local to this participant.
    pub fn from_invite(&self, envelope: &Envelope) -> Result<Conversation, CoreError> {
        let sealed: SealedInvitationV1 = serde_json::from_slice(&envelope.message)?;
        let invitation = seal::open_invitation(&self.private_bundle, &sealed)?;
        let peer_address = if sealed.header.sender.wallet_address == self.self_address {
            sealed.header.recipient.wallet_address
        } else {
            sealed.header.sender.wallet_address
        };
        Ok(Conversation::V2(ConversationV2 {
            peer_address,
            topic: invitation.topic,
            key_material: invitation.key_material,
            context: invitation.context,
            created_ns: sealed.header.created_ns,
            header: sealed.header.clone(),
        }))
    }

    /// Reconstruct a session from previously persisted state. No network I/O.
    pub fn import_topic_data(&self, record: PersistedSessionRecord) -> Conversation {
        match record.invitation {
            Some(inv) => Conversation::V2(ConversationV2 {
                peer_address: record.peer_address,
                topic: inv.topic,
                key_material: inv.key_material,
                context: inv.context,
                created_ns: record.created_ns,
                header: inv.header,
            }),
            None => Conversation::V1(ConversationV1 {
                peer_address: record.peer_address,
                created_at_ns: record.created_ns,
            }),
        }
    }

    async fn discover_from_intro(&self) -> Result<Vec<Conversation>, CoreError> {
        let resp = self
            .relay
            .query(QueryRequest {
                topics: vec![topic::intro_topic(&self.self_address)],
                paging_info: None,
            })
            .await?;
        Ok(resp
            .envelopes
            .iter()
            .filter_map(|env| self.from_intro(env).ok())
            .collect())
    }

    async fn discover_from_invite(&self) -> Result<Vec<Conversation>, CoreError> {
        let resp = self
            .relay
            .query(QueryRequest {
                topics: vec![topic::invite_topic(&self.self_address)],
                paging_info: None,
            })
            .await?;
        Ok(resp
            .envelopes
            .iter()
            .filter_map(|env| self.from_invite(env).ok())
            .collect())
    }

    /// Merge (a) the in-memory map, (b) peers discovered via the local
    /// intro channel, and (c) sessions derivable from sealed invitations on
    /// the local invite channel. Never replaces an existing entry at the
    /// same topic. Sorted by `created_at` strictly descending, ties broken
    /// by topic ascending.
    pub async fn list(&self) -> Result<Vec<Conversation>, CoreError> {
        let discovered_intro = self.discover_from_intro().await?;
        let discovered_invite = self.discover_from_invite().await?;

        let mut sessions = self.sessions.write().await;
        for convo in discovered_intro.into_iter().chain(discovered_invite) {
            let topic = convo.topic(&self.self_address);
            sessions.entry(topic).or_insert(convo);
        }

        let mut list: Vec<Conversation> = sessions.values().cloned().collect();
        drop(sessions);

        list.sort_by(|a, b| {
            b.created_at_ns()
                .cmp(&a.created_at_ns())
                .then_with(|| a.topic(&self.self_address).cmp(&b.topic(&self.self_address)))
        });
        Ok(list)
    }

    /// Resolve an existing session for `(peer, context)`, or establish one.
    /// v1 is used when the peer only publishes a v1 bundle and no context
    /// is given; otherwise a v2 session is found or deterministically
    /// created and its invitation published to both parties' invite
    /// channels.
    pub async fn new_conversation(
        &self,
        peer: WalletAddress,
        context: Option<InvitationContext>,
    ) -> Result<Conversation, CoreError> {
        if peer == self.self_address {
            return Err(CoreError::InvalidArgument("cannot converse with self".into()));
        }

        {
            let sessions = self.sessions.read().await;
            if let Some(existing) = sessions.values().find(|c| {
                c.peer_address() == peer
                    && match (c.context(), &context) {
                        (Some(a), Some(b)) => a.conversation_id == b.conversation_id,
                        (None, None) => true,
                        _ => false,
                    }
            }) {
                return Ok(existing.clone());
            }
        }

        let peer_v2 = self.directory.bundle_v2(&peer).await?;
        if context.is_none() && peer_v2.is_none() {
            let peer_v1 = self
                .directory
                .bundle_v1(&peer)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("no published bundle for {peer}")))?;
            seal::verify_bundle_v1(&peer_v1)?;
            let convo = Conversation::V1(ConversationV1 {
                peer_address: peer,
                created_at_ns: now_ns(),
            });
            let t = convo.topic(&self.self_address);
            self.sessions.write().await.insert(t, convo.clone());
            return Ok(convo);
        }

        let peer_v2 = peer_v2.ok_or_else(|| CoreError::NotFound(format!("no published bundle for {peer}")))?;
        seal::verify_bundle_v2(&peer_v2)?;

        for convo in self.discover_from_invite().await? {
            if convo.peer_address() == peer
                && convo.context().and_then(|c| c.conversation_id.clone())
                    == context.as_ref().and_then(|c| c.conversation_id.clone())
            {
                let t = convo.topic(&self.self_address);
                self.sessions.write().await.entry(t).or_insert_with(|| convo.clone());
                return Ok(convo);
            }
        }

        let ctx = context.unwrap_or_default();
        let invitation = seal::derive_deterministic_invitation(
            &self.private_bundle.prekey_secret,
            &peer_v2,
            ctx.clone(),
        )?;

        let (sender, recipient) = (self.public_bundle_v2.clone(), peer_v2.clone());
        let created_ns = now_ns();
        let sealed = seal::seal_invitation(&self.private_bundle, sender, recipient, &invitation, created_ns)?;

        let sealed_bytes = serde_json::to_vec(&sealed)?;
        let peer_invite_envelope = Envelope::new(topic::invite_topic(&peer), created_ns, sealed_bytes.clone());
        let self_invite_envelope = Envelope::new(
            topic::invite_topic(&self.self_address),
            created_ns,
            sealed_bytes,
        );
        self.relay
            .publish(vec![peer_invite_envelope, self_invite_envelope])
            .await?;

        let convo = Conversation::V2(ConversationV2 {
            peer_address: peer,
            topic: invitation.topic,
            key_material: invitation.key_material,
            context: ctx,
            created_ns,
            header: sealed.header,
        });
        let t = convo.topic(&self.self_address);
        self.sessions.write().await.insert(t, convo.clone());
        Ok(convo)
    }

    /// v1 send: encode, optionally compress, seal, publish on the dm topic,
    /// and (on first contact) duplicate onto both parties' intro channels.
    pub async fn send_v1<T: Send + Sync + 'static>(
        &self,
        peer: WalletAddress,
        codec: &Arc<dyn ContentCodec<T>>,
        value: &T,
        compression: CompressionMode,
    ) -> Result<(), CoreError> {
        let peer_bundle = self
            .directory
            .bundle_v1(&peer)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no published bundle for {peer}")))?;
        seal::verify_bundle_v1(&peer_bundle)?;

        let encoded = codec.encode(value)?;
        let payload = serde_json::to_vec(&encoded)?;
        let framed = frame_payload(compression, &payload)?;

        let timestamp_ns = now_ns();
        let message = seal::seal_message_v1(
            &self.private_bundle,
            self.public_bundle_v1.clone(),
            peer_bundle,
            &framed,
            timestamp_ns,
        )?;
        let message_bytes = serde_json::to_vec(&message)?;

        let dm_topic = topic::dm_topic(&self.self_address, &peer);
        let mut envelopes = vec![Envelope::new(dm_topic, timestamp_ns, message_bytes.clone())];

        let mut introduced = self.has_introduced.write().await;
        if !introduced.contains(&peer) {
            envelopes.push(Envelope::new(
                topic::intro_topic(&self.self_address),
                timestamp_ns,
                message_bytes.clone(),
            ));
            envelopes.push(Envelope::new(
                topic::intro_topic(&peer),
                timestamp_ns,
                message_bytes,
            ));
            introduced.insert(peer);
        }
        drop(introduced);

        self.relay.publish(envelopes).await
    }

    /// v1 receive: query the dm topic, unseal, decompress, decode.
    /// `paging` forwards a limit/cursor to the relay query, mirroring the v2
    /// path, so a long-lived direct conversation can be paged instead of
    /// always returning its full history.
    pub async fn messages_v1<T: Send + Sync + 'static>(
        &self,
        peer: WalletAddress,
        codec: &Arc<dyn ContentCodec<T>>,
    ) -> Result<Vec<T>, CoreError> {
        self.messages_v1_paged(peer, codec, None).await
    }

    pub async fn messages_v1_paged<T: Send + Sync + 'static>(
        &self,
        peer: WalletAddress,
        codec: &Arc<dyn ContentCodec<T>>,
        paging: Option<PagingInfo>,
    ) -> Result<Vec<T>, CoreError> {
        let dm_topic = topic::dm_topic(&self.self_address, &peer);
        let resp = self
            .relay
            .query(QueryRequest {
                topics: vec![dm_topic],
                paging_info: paging,
            })
            .await?;

        let mut out = Vec::with_capacity(resp.envelopes.len());
        for envelope in &resp.envelopes {
            match self.decode_message_v1(envelope, codec).await {
                Ok(value) => out.push(value),
                Err(err) => debug!(topic = %envelope.content_topic, %err, "skipping undecodable v1 envelope"),
            }
        }
        Ok(out)
    }

    async fn decode_message_v1<T: Send + Sync + 'static>(
        &self,
        envelope: &Envelope,
        codec: &Arc<dyn ContentCodec<T>>,
    ) -> Result<T, CoreError> {
        let message: MessageV1 = serde_json::from_slice(&envelope.message)?;
        let framed = seal::open_message_v1(&self.private_bundle, &message)?;
        let payload = unframe_payload(&framed)?;
        let encoded: EncodedContent = serde_json::from_slice(&payload)?;
        codec.decode(&encoded)
    }

    /// v2 send: encode, compress, seal with the session's key material,
    /// publish on the session topic.
    pub async fn send_v2<T: Send + Sync + 'static>(
        &self,
        session: &ConversationV2,
        codec: &Arc<dyn ContentCodec<T>>,
        value: &T,
        compression: CompressionMode,
        parent_message_id: Option<String>,
        should_push: bool,
    ) -> Result<(), CoreError> {
        let encoded = codec.encode(value)?;
        let payload = serde_json::to_vec(&encoded)?;
        let framed = frame_payload(compression, &payload)?;

        let timestamp_ns = now_ns();
        let message = seal::seal_message_v2(
            &session.key_material,
            self.public_bundle_v2.clone(),
            parent_message_id,
            &framed,
            timestamp_ns,
            should_push,
        )?;
        let envelope = Envelope::new(session.topic.clone(), timestamp_ns, serde_json::to_vec(&message)?);
        self.relay.publish(vec![envelope]).await
    }

    /// v2 receive: query the session topic, unseal, decompress, decode.
    pub async fn messages_v2<T: Send + Sync + 'static>(
        &self,
        session: &ConversationV2,
        codec: &Arc<dyn ContentCodec<T>>,
    ) -> Result<Vec<T>, CoreError> {
        self.messages_v2_paged(session, codec, None).await
    }

    pub async fn messages_v2_paged<T: Send + Sync + 'static>(
        &self,
        session: &ConversationV2,
        codec: &Arc<dyn ContentCodec<T>>,
        paging: Option<PagingInfo>,
    ) -> Result<Vec<T>, CoreError> {
        let resp = self
            .relay
            .query(QueryRequest {
                topics: vec![session.topic.clone()],
                paging_info: paging,
            })
            .await?;

        let mut out = Vec::with_capacity(resp.envelopes.len());
        for envelope in &resp.envelopes {
            match self.decode_message_v2(session, envelope, codec).await {
                Ok(value) => out.push(value),
                Err(err) => debug!(topic = %envelope.content_topic, %err, "skipping undecodable v2 envelope"),
            }
        }
        Ok(out)
    }

    async fn decode_message_v2<T: Send + Sync + 'static>(
        &self,
        session: &ConversationV2,
        envelope: &Envelope,
        codec: &Arc<dyn ContentCodec<T>>,
    ) -> Result<T, CoreError> {
        let message: MessageV2 = serde_json::from_slice(&envelope.message)?;
        let framed = seal::open_message_v2(&session.key_material, &message)?;
        let payload = unframe_payload(&framed)?;
        let encoded: EncodedContent = serde_json::from_slice(&payload)?;
        codec.decode(&encoded)
    }

    /// Chunk `topics` into groups of at most `config.batch_chunk_size` and
    /// dispatch each chunk as one multiplexed relay call. Envelopes whose
    /// topic is not in the known-session map are discarded with a debug log.
    pub async fn list_batch_decrypted_messages(
        &self,
        topics: Vec<String>,
    ) -> Result<Vec<DecryptedMessage>, CoreError> {
        let sessions = self.sessions.read().await;
        let mut out = Vec::new();

        for chunk in topics.chunks(self.config.batch_chunk_size.max(1)) {
            let response = self
                .relay
                .batch_query(vec![QueryRequest {
                    topics: chunk.to_vec(),
                    paging_info: None,
                }])
                .await?;
            for batch in response.responses {
                for envelope in batch.envelopes {
                    let Some(session) = sessions.get(&envelope.content_topic) else {
                        debug!(topic = %envelope.content_topic, "dropping envelope for unknown session");
                        continue;
                    };
                    match self.open_raw(session, &envelope) {
                        Ok(plaintext) => out.push(DecryptedMessage {
                            topic: envelope.content_topic.clone(),
                            sender: session.peer_address(),
                            timestamp_ns: envelope.timestamp_ns,
                            plaintext,
                        }),
                        Err(err) => warn!(topic = %envelope.content_topic, %err, "failed to open batched envelope"),
                    }
                }
            }
        }
        Ok(out)
    }

    /// As `list_batch_decrypted_messages`, additionally decompressing and
    /// parsing the opened payload as `EncodedContent`.
    pub async fn list_batch_messages(&self, topics: Vec<String>) -> Result<Vec<DecodedMessage>, CoreError> {
        let decrypted = self.list_batch_decrypted_messages(topics).await?;
        let mut out = Vec::with_capacity(decrypted.len());
        for item in decrypted {
            let payload = unframe_payload(&item.plaintext)?;
            let content: EncodedContent = serde_json::from_slice(&payload)?;
            out.push(DecodedMessage {
                topic: item.topic,
                sender: item.sender,
                timestamp_ns: item.timestamp_ns,
                content,
            });
        }
        Ok(out)
    }

    fn open_raw(&self, session: &Conversation, envelope: &Envelope) -> Result<Vec<u8>, CoreError> {
        match session {
            Conversation::V1(_) => {
                let message: MessageV1 = serde_json::from_slice(&envelope.message)?;
                seal::open_message_v1(&self.private_bundle, &message)
            }
            Conversation::V2(v2) => {
                let message: MessageV2 = serde_json::from_slice(&envelope.message)?;
                seal::open_message_v2(&v2.key_material, &message)
            }
        }
    }

    /// Subscribe to `userIntro(self)` and `userInvite(self)`; de-duplicate
    /// by topic; emit each newly discovered session exactly once.
    pub async fn stream(self: Arc<Self>) -> Result<impl Stream<Item = Conversation> + Send, CoreError> {
        let topics = vec![
            topic::intro_topic(&self.self_address),
            topic::invite_topic(&self.self_address),
        ];
        let mut inner = self.relay.subscribe(topics).await?;
        let (tx, rx) = mpsc::channel(64);
        let this = self;

        tokio::spawn(async move {
            let mut seen = HashSet::new();
            while let Some(envelope) = inner.next().await {
                let parsed = match topic::parse(&envelope.content_topic) {
                    Some(TopicKind::Intro { .. }) => this.from_intro(&envelope),
                    Some(TopicKind::Invite { .. }) => this.from_invite(&envelope),
                    _ => continue,
                };
                let Ok(convo) = parsed else { continue };
                let t = convo.topic(&this.self_address);
                if !seen.insert(t.clone()) {
                    continue;
                }
                this.sessions.write().await.entry(t).or_insert_with(|| convo.clone());
                if tx.send(convo).await.is_err() {
                    break;
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Subscribe to introductions, invitations, and every currently known
    /// conversation topic. On a new invite/intro, construct the session,
    /// add its topic to the subscription set, and re-establish the
    /// subscription (cancel + resubscribe fallback). Envelopes routed to
    /// existing sessions are decrypted and emitted.
    pub async fn stream_all_decrypted_messages(
        self: Arc<Self>,
    ) -> Result<impl Stream<Item = ConversationEvent<DecryptedMessage>> + Send, CoreError> {
        let (tx, rx) = mpsc::channel(64);
        let this = self;

        tokio::spawn(async move {
            let mut topics: Vec<String> = vec![
                topic::intro_topic(&this.self_address),
                topic::invite_topic(&this.self_address),
            ];
            {
                let sessions = this.sessions.read().await;
                topics.extend(sessions.keys().cloned());
            }

            let Ok(mut inner) = this.relay.subscribe(topics.clone()).await else {
                return;
            };

            loop {
                let Some(envelope) = inner.next().await else { break };
                let kind = topic::parse(&envelope.content_topic);
                match kind {
                    Some(TopicKind::Intro { .. }) | Some(TopicKind::Invite { .. }) => {
                        let parsed = match kind.unwrap() {
                            TopicKind::Intro { .. } => this.from_intro(&envelope),
                            _ => this.from_invite(&envelope),
                        };
                        let Ok(convo) = parsed else { continue };
                        let t = convo.topic(&this.self_address);
                        let is_new = {
                            let mut sessions = this.sessions.write().await;
                            if sessions.contains_key(&t) {
                                false
                            } else {
                                sessions.insert(t.clone(), convo.clone());
                                true
                            }
                        };
                        if is_new {
                            topics.push(t);
                            match this.relay.resubscribe(topics.clone()).await {
                                Ok(new_inner) => inner = new_inner,
                                Err(err) => {
                                    warn!(%err, "resubscribe failed, retrying with current topic set");
                                    continue;
                                }
                            }
                            if tx.send(ConversationEvent::Discovered(convo)).await.is_err() {
                                break;
                            }
                        }
                    }
                    _ => {
                        let session = {
                            let sessions = this.sessions.read().await;
                            sessions.get(&envelope.content_topic).cloned()
                        };
                        let Some(session) = session else {
                            debug!(topic = %envelope.content_topic, "dropping envelope for unknown session");
                            continue;
                        };
                        match this.open_raw(&session, &envelope) {
                            Ok(plaintext) => {
                                let item = DecryptedMessage {
                                    topic: envelope.content_topic.clone(),
                                    sender: session.peer_address(),
                                    timestamp_ns: envelope.timestamp_ns,
                                    plaintext,
                                };
                                if tx.send(ConversationEvent::Message(item)).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                debug!(topic = %envelope.content_topic, %err, "tamper or decode failure, skipping envelope");
                            }
                        }
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }

    /// As `stream_all_decrypted_messages`, additionally decoding the opened
    /// payload as `EncodedContent`.
    pub async fn stream_all_messages(
        self: Arc<Self>,
    ) -> Result<impl Stream<Item = ConversationEvent<DecodedMessage>> + Send, CoreError> {
        let inner = self.stream_all_decrypted_messages().await?;
        Ok(inner.filter_map(|event| match event {
            ConversationEvent::Discovered(c) => Some(ConversationEvent::Discovered(c)),
            ConversationEvent::Message(m) => {
                let payload = unframe_payload(&m.plaintext).ok()?;
                let content: EncodedContent = serde_json::from_slice(&payload).ok()?;
                Some(ConversationEvent::Message(DecodedMessage {
                    topic: m.topic,
                    sender: m.sender,
                    timestamp_ns: m.timestamp_ns,
                    content,
                }))
            }
        }))
    }
}
