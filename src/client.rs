//! Public client surface.
//!
//! This module defines the stable interface for the crate:
//! - `Bastion` — configured client over a materials manager
//! - `inspect` / `MessageInfo` — header metadata without any keys
//!
//! Everything else (`codec`, `aead` internals) may change without notice.

use core::fmt;
use std::sync::Arc;

use crate::codec::FieldReader;
use crate::config::ClientConfig;
use crate::decrypt::Decrypter;
use crate::encrypt::Encrypter;
use crate::error::Error;
use crate::format::header::{deserialize_header, MessageHeader};
use crate::keys::MasterKeyProvider;
use crate::materials::{DefaultMaterialsManager, MaterialsManager};
use crate::suite::EncryptionContext;

/// Envelope-encryption client.
///
/// A `Bastion` is cheap to share: every call drives a fresh single-use
/// encrypter or decrypter, so distinct calls are independent and may run in
/// parallel.
pub struct Bastion {
    config: ClientConfig,
    cmm: Arc<dyn MaterialsManager>,
}

impl Bastion {
    /// Client over a master-key provider with the default configuration.
    pub fn new<P: MasterKeyProvider + 'static>(provider: P) -> Self {
        Self::with_config(provider, ClientConfig::default())
    }

    /// Client over a master-key provider with an explicit configuration.
    pub fn with_config<P: MasterKeyProvider + 'static>(provider: P, config: ClientConfig) -> Self {
        Self {
            config,
            cmm: Arc::new(DefaultMaterialsManager::new(provider)),
        }
    }

    /// Client over a custom materials manager.
    pub fn from_materials_manager(cmm: Arc<dyn MaterialsManager>, config: ClientConfig) -> Self {
        Self { config, cmm }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Encrypt plaintext under an encryption context, returning the opaque
    /// message and its header.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        encryption_context: &EncryptionContext,
    ) -> Result<(Vec<u8>, MessageHeader), Error> {
        Encrypter::new(&self.config, self.cmm.as_ref()).encrypt(plaintext, encryption_context)
    }

    /// Decrypt a message, returning the plaintext and the parsed header.
    /// Tampering anywhere in the message fails the call.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<(Vec<u8>, MessageHeader), Error> {
        Decrypter::new(&self.config, self.cmm.as_ref()).decrypt(ciphertext)
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Header metadata extracted without decrypting. Reveals no secrets.
#[derive(Debug, Clone)]
pub struct MessageInfo {
    pub algorithm: &'static str,
    pub algorithm_id: u16,
    pub is_signing: bool,
    pub frame_length: u32,
    pub encrypted_data_key_count: usize,
    pub encryption_context: EncryptionContext,
    pub total_bytes: usize,
}

impl fmt::Display for MessageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (0x{:04x}) | {} edk(s) | frame {} | {} bytes",
            self.algorithm,
            self.algorithm_id,
            self.encrypted_data_key_count,
            self.frame_length,
            self.total_bytes
        )
    }
}

/// Parse message metadata for logging and operational tooling.
pub fn inspect(ciphertext: &[u8]) -> Result<MessageInfo, Error> {
    let mut reader = FieldReader::new(ciphertext);
    let (header, _auth) = deserialize_header(&mut reader, u16::MAX as usize)?;
    Ok(MessageInfo {
        algorithm: header.algorithm_suite.name(),
        algorithm_id: header.algorithm_suite.id,
        is_signing: header.algorithm_suite.is_signing(),
        frame_length: header.frame_length,
        encrypted_data_key_count: header.encrypted_data_keys.len(),
        encryption_context: header.encryption_context,
        total_bytes: ciphertext.len(),
    })
}
