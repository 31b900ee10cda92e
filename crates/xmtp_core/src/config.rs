//! Client-wide configuration.

use xmtp_proto::codec::CompressionMode;

/// Tunables that affect how the registry talks to the relay, independent
/// of any single conversation.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum topics per underlying batch-query request. Defaults to 50;
    /// exposed here so tests can exercise chunking with a smaller number
    /// without waiting on 50 fixtures.
    pub batch_chunk_size: usize,
    /// Compression applied to outgoing message content unless a send call
    /// overrides it.
    pub default_compression: CompressionMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            batch_chunk_size: 50,
            default_compression: CompressionMode::None,
        }
    }
}
