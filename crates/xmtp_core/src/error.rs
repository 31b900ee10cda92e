//! Error taxonomy for the messaging core.
//!
//! `CoreError` aggregates the two leaf crates' errors and adds the
//! higher-level categories a caller reasons about: authentication failure,
//! not-found, bad argument, transport, and programmer-error invariants.

use thiserror::Error;
use xmtp_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum CoreError {
    /// AEAD tag mismatch, signature mismatch, or wallet-address mismatch.
    /// The specific cause is never distinguished to the caller.
    #[error("could not decrypt or verify")]
    AuthFailure,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// Programmer error: e.g. a private key bundle was required but absent.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("codec error: {0}")]
    Codec(#[from] xmtp_proto::codec::CodecError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Crypto failures never surface their specific cause — AEAD tag mismatch,
/// bad signature, and malformed key material all collapse to `AuthFailure`
/// except the ones that indicate a genuine caller mistake (malformed input
/// bytes), which become `InvalidArgument`.
impl From<CryptoError> for CoreError {
    fn from(source: CryptoError) -> Self {
        match source {
            CryptoError::AeadDecrypt | CryptoError::SignatureVerification => CoreError::AuthFailure,
            CryptoError::InvalidWalletAddress(msg) | CryptoError::InvalidKey(msg) => {
                CoreError::InvalidArgument(msg)
            }
            other => CoreError::Invariant(other.to_string()),
        }
    }
}
