//! In-memory `RelayClient` / `ContactDirectory` fixtures shared by the
//! end-to-end tests. Not a mock of the wire protocol — a real topic-keyed
//! store plus a fan-out subscriber list, just without a network underneath.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use xmtp_core::client::{BatchQueryResponse, ContactDirectory, EnvelopeStream, QueryRequest, QueryResponse, RelayClient};
use xmtp_core::error::CoreError;
use xmtp_crypto::identity::IdentityKeyPair;
use xmtp_crypto::WalletAddress;
use xmtp_proto::bundle::{PrivateKeyBundle, PublicKeyBundleV1, PublicKeyBundleV2};
use xmtp_proto::Envelope;

pub struct InMemoryRelay {
    store: Mutex<HashMap<String, Vec<Envelope>>>,
    subscribers: Mutex<Vec<(Vec<String>, mpsc::UnboundedSender<Envelope>)>>,
    batch_query_calls: Mutex<usize>,
}

impl InMemoryRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
            batch_query_calls: Mutex::new(0),
        })
    }

    pub fn batch_query_call_count(&self) -> usize {
        *self.batch_query_calls.lock().unwrap()
    }

    pub fn envelopes_on(&self, topic: &str) -> Vec<Envelope> {
        self.store.lock().unwrap().get(topic).cloned().unwrap_or_default()
    }

    pub fn total_envelopes(&self) -> usize {
        self.store.lock().unwrap().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl RelayClient for InMemoryRelay {
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, CoreError> {
        let store = self.store.lock().unwrap();
        let mut envelopes = Vec::new();
        for topic in &request.topics {
            if let Some(list) = store.get(topic) {
                envelopes.extend(list.iter().cloned());
            }
        }
        Ok(QueryResponse { envelopes, paging_info: None })
    }

    async fn batch_query(&self, requests: Vec<QueryRequest>) -> Result<BatchQueryResponse, CoreError> {
        *self.batch_query_calls.lock().unwrap() += 1;
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            responses.push(self.query(request).await?);
        }
        Ok(BatchQueryResponse { responses })
    }

    async fn subscribe(&self, topics: Vec<String>) -> Result<EnvelopeStream, CoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push((topics, tx));
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn publish(&self, envelopes: Vec<Envelope>) -> Result<(), CoreError> {
        let mut store = self.store.lock().unwrap();
        let subscribers = self.subscribers.lock().unwrap();
        for envelope in envelopes {
            store
                .entry(envelope.content_topic.clone())
                .or_default()
                .push(envelope.clone());
            for (topics, tx) in subscribers.iter() {
                if topics.contains(&envelope.content_topic) {
                    let _ = tx.send(envelope.clone());
                }
            }
        }
        Ok(())
    }
}

pub struct InMemoryDirectory {
    v1: Mutex<HashMap<WalletAddress, PublicKeyBundleV1>>,
    v2: Mutex<HashMap<WalletAddress, PublicKeyBundleV2>>,
}

impl InMemoryDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            v1: Mutex::new(HashMap::new()),
            v2: Mutex::new(HashMap::new()),
        })
    }

    pub fn publish(&self, participant: &Participant) {
        self.v1.lock().unwrap().insert(participant.address, participant.public_v1.clone());
        self.v2.lock().unwrap().insert(participant.address, participant.public_v2.clone());
    }
}

#[async_trait]
impl ContactDirectory for InMemoryDirectory {
    async fn bundle_v1(&self, address: &WalletAddress) -> Result<Option<PublicKeyBundleV1>, CoreError> {
        Ok(self.v1.lock().unwrap().get(address).cloned())
    }

    async fn bundle_v2(&self, address: &WalletAddress) -> Result<Option<PublicKeyBundleV2>, CoreError> {
        Ok(self.v2.lock().unwrap().get(address).cloned())
    }
}

pub struct Participant {
    pub address: WalletAddress,
    pub private: PrivateKeyBundle,
    pub public_v1: PublicKeyBundleV1,
    pub public_v2: PublicKeyBundleV2,
}

/// Build a fully formed participant: a fresh identity/pre-key pair, a
/// fabricated wallet signature (no external wallet is involved in these
/// tests — only the identity→pre-key signature chain is ever verified by
/// this crate), and both bundle shapes ready to publish to a directory.
pub fn make_participant(address_byte: u8) -> Participant {
    let identity = IdentityKeyPair::generate();
    let prekey = identity.generate_prekey(1);
    let address = WalletAddress::from_bytes([address_byte; 20]);

    let private = PrivateKeyBundle {
        wallet_address: address,
        identity_secret: identity.secret_key().clone(),
        prekey_secret: prekey.secret_key().clone(),
    };
    let public_v1 = private.to_public_v1(vec![0xaa], prekey.signature.clone());
    let public_v2 = private.to_public_v2(vec![0xaa], prekey.signature.clone(), 0, 0);

    Participant {
        address,
        private,
        public_v1,
        public_v2,
    }
}
