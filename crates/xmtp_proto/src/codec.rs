//! Content-type framing and compression.
//!
//! `ContentTypeId` + `EncodedContent` are the wire shapes of the pluggable
//! content codec contract; the `ContentCodec` trait that turns a concrete
//! Rust type into `EncodedContent` (and back) lives in the core crate,
//! since it is a behavioral registry rather than a wire type.
//!
//! `CompressionMode` is additive framing applied to an already-encoded
//! payload before it is sealed, and removed after it is opened, mirroring
//! how padding/batching sat outside the encryption boundary.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use serde::{Deserialize, Serialize};

/// Identifies a content type: the same tuple XMTP clients use to look up a
/// registered codec.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentTypeId {
    pub authority_id: String,
    pub type_id: String,
    pub version_major: u32,
    pub version_minor: u32,
}

impl ContentTypeId {
    pub fn new(
        authority_id: impl Into<String>,
        type_id: impl Into<String>,
        version_major: u32,
        version_minor: u32,
    ) -> Self {
        Self {
            authority_id: authority_id.into(),
            type_id: type_id.into(),
            version_major,
            version_minor,
        }
    }
}

/// The result of encoding a typed value: a tagged byte payload plus
/// optional parameters and a fallback string for out-of-band display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedContent {
    #[serde(rename = "type")]
    pub content_type: ContentTypeId,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    pub content: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// Compression applied to an `EncodedContent` serialization before sealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMode {
    #[default]
    None,
    Deflate,
    Gzip,
}

pub fn compress(mode: CompressionMode, data: &[u8]) -> Result<Vec<u8>, CodecError> {
    match mode {
        CompressionMode::None => Ok(data.to_vec()),
        CompressionMode::Deflate => {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
            enc.write_all(data)
                .map_err(|e| CodecError::Compression(e.to_string()))?;
            enc.finish().map_err(|e| CodecError::Compression(e.to_string()))
        }
        CompressionMode::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(data)
                .map_err(|e| CodecError::Compression(e.to_string()))?;
            enc.finish().map_err(|e| CodecError::Compression(e.to_string()))
        }
    }
}

pub fn decompress(mode: CompressionMode, data: &[u8]) -> Result<Vec<u8>, CodecError> {
    match mode {
        CompressionMode::None => Ok(data.to_vec()),
        CompressionMode::Deflate => {
            let mut dec = DeflateDecoder::new(data);
            let mut out = Vec::new();
            dec.read_to_end(&mut out)
                .map_err(|e| CodecError::Compression(e.to_string()))?;
            Ok(out)
        }
        CompressionMode::Gzip => {
            let mut dec = GzDecoder::new(data);
            let mut out = Vec::new();
            dec.read_to_end(&mut out)
                .map_err(|e| CodecError::Compression(e.to_string()))?;
            Ok(out)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unknown content-type codec: {0:?}")]
    UnknownContentType(ContentTypeId),
    #[error("compression error: {0}")]
    Compression(String),
    #[error("content decode error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_roundtrip() {
        let data = b"hello world, this is a compressible payload payload payload";
        let compressed = compress(CompressionMode::Deflate, data).unwrap();
        let restored = decompress(CompressionMode::Deflate, &compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn gzip_roundtrip() {
        let data = b"hello world, this is a compressible payload payload payload";
        let compressed = compress(CompressionMode::Gzip, data).unwrap();
        let restored = decompress(CompressionMode::Gzip, &compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn none_is_identity() {
        let data = b"raw bytes";
        let compressed = compress(CompressionMode::None, data).unwrap();
        assert_eq!(compressed, data);
        assert_eq!(decompress(CompressionMode::None, &compressed).unwrap(), data);
    }
}
