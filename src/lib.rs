//! # Bastion Envelope
//!
//! Client-side envelope encryption producing a self-describing, framed,
//! authenticated message format with key commitment and optional trailing
//! signatures.
//!
//! ## Quick Start
//!
//! ```rust
//! use bastion_envelope::{Bastion, EncryptionContext, RawAesMasterKey, RawAesMasterKeyProvider};
//!
//! let key = RawAesMasterKey::new("app-keys", "key-1", &[0u8; 32]);
//! let provider = RawAesMasterKeyProvider::new("app-keys", vec![key]).unwrap();
//! let client = Bastion::new(provider);
//!
//! let mut ctx = EncryptionContext::new();
//! ctx.insert("purpose".into(), "docs".into());
//!
//! let (message, _header) = client.encrypt(b"secret", &ctx).unwrap();
//! let (plaintext, header) = client.decrypt(&message).unwrap();
//!
//! assert_eq!(plaintext, b"secret");
//! assert_eq!(header.encryption_context.get("purpose").map(String::as_str), Some("docs"));
//! ```
//!
//! ## Security Properties
//!
//! - **Key commitment**: a ciphertext decrypts under exactly one data key
//! - **Tamper evidence**: every header byte, frame byte, and (for signing
//!   suites) the whole wire message is authenticated
//! - **Context binding**: the encryption context is authenticated data in
//!   the header and the wrap AAD of raw master keys
//! - **Single-use pipelines**: encrypter and decrypter instances are linear
//!   state machines and refuse reuse
//!
//! ## What's NOT Provided
//!
//! - Long-term key management
//! - Streaming I/O (the pipeline consumes and produces byte buffers)
//! - Non-framed message bodies

#![deny(unsafe_code)]

// ---------------------------------------------------------------------------
// Internal modules
// ---------------------------------------------------------------------------

mod aead;
mod client;
mod decrypt;
mod encrypt;
mod error;
mod signature;

// Codec is exposed for the fuzz targets but is not stable API.
#[doc(hidden)]
pub mod codec;

// ---------------------------------------------------------------------------
// Public modules
// ---------------------------------------------------------------------------

pub mod bodyaad;
pub mod config;
pub mod format;
pub mod kdf;
pub mod keys;
pub mod materials;
pub mod policy;
pub mod suite;

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

pub use client::{inspect, Bastion, MessageInfo};
pub use config::ClientConfig;
pub use decrypt::Decrypter;
pub use encrypt::Encrypter;
pub use error::Error;
pub use format::{EncryptedDataKey, MessageHeader};
pub use keys::{
    DataKey, KeyMeta, MasterKey, MasterKeyProvider, RawAesMasterKey, RawAesMasterKeyProvider,
};
pub use materials::{
    DecryptionMaterials, DecryptionMaterialsRequest, DefaultMaterialsManager,
    EncryptionMaterials, EncryptionMaterialsRequest, MaterialsManager,
    RESERVED_ENCRYPTION_CONTEXT_KEY,
};
pub use policy::CommitmentPolicy;
pub use suite::{AlgorithmSuite, EncryptionContext};
