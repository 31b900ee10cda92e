//! External collaborators the core is built against: the relay transport
//! and the pluggable content codec registry.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;
use tokio::sync::RwLock;
use xmtp_crypto::WalletAddress;
use xmtp_proto::bundle::{PublicKeyBundleV1, PublicKeyBundleV2};
use xmtp_proto::{ContentTypeId, EncodedContent, Envelope, PagingInfo};

use crate::error::CoreError;

pub type EnvelopeStream = Pin<Box<dyn Stream<Item = Envelope> + Send>>;

#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub topics: Vec<String>,
    pub paging_info: Option<PagingInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub envelopes: Vec<Envelope>,
    pub paging_info: Option<PagingInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchQueryResponse {
    pub responses: Vec<QueryResponse>,
}

/// The transport the core is driven against. Implementations talk to the
/// real relay network; tests substitute an in-memory one.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, CoreError>;

    /// Callers are responsible for chunking `requests` into reasonably
    /// sized groups before calling this; see `ClientConfig::batch_chunk_size`.
    async fn batch_query(&self, requests: Vec<QueryRequest>) -> Result<BatchQueryResponse, CoreError>;

    async fn subscribe(&self, topics: Vec<String>) -> Result<EnvelopeStream, CoreError>;

    /// Re-scope a running subscription to a new topic set. The default
    /// implementation falls back to cancelling (the caller drops the old
    /// stream) and resubscribing, which is the documented fallback for
    /// transports without a native dynamic-topic-set primitive.
    async fn resubscribe(&self, topics: Vec<String>) -> Result<EnvelopeStream, CoreError> {
        self.subscribe(topics).await
    }

    async fn publish(&self, envelopes: Vec<Envelope>) -> Result<(), CoreError>;
}

/// Resolves a wallet address to its published key bundle, required by
/// `new_conversation`'s peer-bundle lookup step. Implementations typically
/// derive this from envelopes observed on a peer's `intro`/`invite` topics
/// or from an out-of-band directory service.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn bundle_v1(&self, address: &WalletAddress) -> Result<Option<PublicKeyBundleV1>, CoreError>;
    async fn bundle_v2(&self, address: &WalletAddress) -> Result<Option<PublicKeyBundleV2>, CoreError>;
}

/// A pluggable codec between a concrete Rust type and `EncodedContent`.
/// Implementations are registered process-wide, keyed by `content_type`.
pub trait ContentCodec<T>: Send + Sync {
    fn content_type(&self) -> ContentTypeId;
    fn encode(&self, value: &T) -> Result<EncodedContent, CoreError>;
    fn decode(&self, encoded: &EncodedContent) -> Result<T, CoreError>;
    fn fallback(&self, _value: &T) -> Option<String> {
        None
    }
}

/// Type-erased codec so a single registry can hold codecs for unrelated `T`.
trait ErasedCodec: Send + Sync {
    fn content_type(&self) -> ContentTypeId;
    fn decode_to_fallback(&self, encoded: &EncodedContent) -> Result<String, CoreError>;
}

struct CodecSlot<T> {
    inner: Arc<dyn ContentCodec<T>>,
}

impl<T: Send + Sync> ErasedCodec for CodecSlot<T> {
    fn content_type(&self) -> ContentTypeId {
        self.inner.content_type()
    }

    fn decode_to_fallback(&self, encoded: &EncodedContent) -> Result<String, CoreError> {
        let value = self.inner.decode(encoded)?;
        Ok(self
            .inner
            .fallback(&value)
            .unwrap_or_else(|| encoded.fallback.clone().unwrap_or_default()))
    }
}

/// A process-wide mapping from `ContentTypeId` to registered codec.
/// Initialization order relative to participant construction is
/// unspecified; treat the registry as eagerly populated before any
/// send/receive operation.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: RwLock<HashMap<ContentTypeId, Arc<dyn ErasedCodec>>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register<T: Send + Sync + 'static>(&self, codec: Arc<dyn ContentCodec<T>>) {
        let content_type = codec.content_type();
        let slot: Arc<dyn ErasedCodec> = Arc::new(CodecSlot { inner: codec });
        self.codecs.write().await.insert(content_type, slot);
    }

    pub async fn is_registered(&self, content_type: &ContentTypeId) -> bool {
        self.codecs.read().await.contains_key(content_type)
    }

    /// Render an `EncodedContent` for out-of-band display using whichever
    /// registered codec claims its content type.
    pub async fn fallback_text(&self, encoded: &EncodedContent) -> Result<String, CoreError> {
        let codecs = self.codecs.read().await;
        match codecs.get(&encoded.content_type) {
            Some(codec) => codec.decode_to_fallback(encoded),
            None => Err(CoreError::InvalidArgument(format!(
                "unknown content-type codec: {:?}",
                encoded.content_type
            ))),
        }
    }
}
