//! xmtp_crypto — cryptographic primitives for the messaging core
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Secret material is zeroized once it's no longer needed: identity and
//!   pre-key secrets rely on `k256`'s own zeroize-on-drop for `SecretKey`;
//!   ephemeral per-message AEAD keys derived in `aead` are wiped explicitly
//!   right after the cipher is built from them.
//! - All public APIs return opaque newtypes to prevent accidental misuse.
//!
//! # Module layout
//! - `wallet`   — 20-byte wallet address, checksummed hex rendering
//! - `identity` — secp256k1 identity key + pre-key, ECDSA sign/verify
//! - `ecdh`     — secp256k1 Diffie-Hellman
//! - `aead`     — AES-256-GCM with per-message HKDF-derived key
//! - `kdf`      — HKDF-SHA256 / HMAC-SHA256
//! - `error`    — unified error type

pub mod aead;
pub mod ecdh;
pub mod error;
pub mod identity;
pub mod kdf;
pub mod wallet;

pub use error::CryptoError;
pub use wallet::WalletAddress;
