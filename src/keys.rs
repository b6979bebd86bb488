//! Master keys.
//!
//! A master key wraps and unwraps per-message data keys; a provider
//! enumerates candidate master keys for a decryption attempt. Cloud KMS
//! integrations implement these same traits out of tree; `RawAesMasterKey`
//! is the in-tree implementation backed by a locally held AES-256 key.

use core::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::aead;
use crate::error::Error;
use crate::format::header::serialize_encryption_context;
use crate::format::EncryptedDataKey;
use crate::suite::{AlgorithmSuite, EncryptionContext};

// ---------------------------------------------------------------------------
// Key identity
// ---------------------------------------------------------------------------

/// Identity of a master key: provider namespace plus key name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyMeta {
    pub provider_id: String,
    pub key_id: String,
}

impl KeyMeta {
    pub fn new(provider_id: impl Into<String>, key_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            key_id: key_id.into(),
        }
    }
}

impl fmt::Display for KeyMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}", self.provider_id, self.key_id)
    }
}

// ---------------------------------------------------------------------------
// Data key
// ---------------------------------------------------------------------------

/// A plaintext per-message data key and the identity of the master key that
/// generated it. The plaintext never leaves the encrypt/decrypt invocation
/// and zeroizes on drop.
pub struct DataKey {
    pub key_provider: KeyMeta,
    plaintext: Zeroizing<Vec<u8>>,
}

impl DataKey {
    pub fn new(key_provider: KeyMeta, plaintext: Zeroizing<Vec<u8>>) -> Self {
        Self {
            key_provider,
            plaintext,
        }
    }

    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// One master key with the full wrap/unwrap capability set.
pub trait MasterKey: Send + Sync {
    fn key_id(&self) -> &str;
    fn metadata(&self) -> &KeyMeta;
    /// Whether this key produced the given encrypted data key.
    fn owns_data_key(&self, edk: &EncryptedDataKey) -> bool;
    fn generate_data_key(
        &self,
        alg: &'static AlgorithmSuite,
        encryption_context: &EncryptionContext,
    ) -> Result<DataKey, Error>;
    fn encrypt_data_key(
        &self,
        data_key: &DataKey,
        alg: &'static AlgorithmSuite,
        encryption_context: &EncryptionContext,
    ) -> Result<EncryptedDataKey, Error>;
    fn decrypt_data_key(
        &self,
        edk: &EncryptedDataKey,
        alg: &'static AlgorithmSuite,
        encryption_context: &EncryptionContext,
    ) -> Result<DataKey, Error>;
}

/// A set of master keys: one primary generator plus additional members that
/// each receive a wrapped copy of the data key.
pub trait MasterKeyProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// `(primary, members)` where members includes the primary.
    fn master_keys_for_encryption(
        &self,
        encryption_context: &EncryptionContext,
    ) -> Result<(&dyn MasterKey, Vec<&dyn MasterKey>), Error>;

    /// Candidate keys that may be able to unwrap the given EDK.
    fn master_keys_for_decryption(&self, edk: &EncryptedDataKey) -> Vec<&dyn MasterKey>;

    /// Try every (EDK, owning key) pair until one unwraps.
    fn decrypt_data_key(
        &self,
        edks: &[EncryptedDataKey],
        alg: &'static AlgorithmSuite,
        encryption_context: &EncryptionContext,
    ) -> Result<DataKey, Error> {
        for edk in edks {
            for key in self.master_keys_for_decryption(edk) {
                if let Ok(data_key) = key.decrypt_data_key(edk, alg, encryption_context) {
                    return Ok(data_key);
                }
            }
        }
        Err(Error::Materials(
            "no master key could decrypt any encrypted data key".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Raw AES master key
// ---------------------------------------------------------------------------

const WRAP_KEY_LEN: usize = 32;

/// Master key backed by a locally held AES-256 wrapping key.
///
/// EDK ciphertext layout: iv[12] || wrapped_key || tag[16]. The canonical
/// encryption-context bytes are the wrap AAD, so an EDK cannot be moved to a
/// message with a different context.
pub struct RawAesMasterKey {
    meta: KeyMeta,
    wrapping_key: Zeroizing<Vec<u8>>,
}

impl RawAesMasterKey {
    pub fn new(
        provider_id: impl Into<String>,
        key_id: impl Into<String>,
        wrapping_key: &[u8; WRAP_KEY_LEN],
    ) -> Self {
        Self {
            meta: KeyMeta::new(provider_id, key_id),
            wrapping_key: Zeroizing::new(wrapping_key.to_vec()),
        }
    }
}

impl MasterKey for RawAesMasterKey {
    fn key_id(&self) -> &str {
        &self.meta.key_id
    }

    fn metadata(&self) -> &KeyMeta {
        &self.meta
    }

    fn owns_data_key(&self, edk: &EncryptedDataKey) -> bool {
        edk.provider_id == self.meta.provider_id
            && edk.provider_info == self.meta.key_id.as_bytes()
    }

    fn generate_data_key(
        &self,
        alg: &'static AlgorithmSuite,
        _encryption_context: &EncryptionContext,
    ) -> Result<DataKey, Error> {
        let mut plaintext = Zeroizing::new(vec![0u8; alg.encryption.data_key_len]);
        getrandom::getrandom(&mut plaintext)
            .map_err(|_| Error::Materials("entropy source unavailable".into()))?;
        Ok(DataKey::new(self.meta.clone(), plaintext))
    }

    fn encrypt_data_key(
        &self,
        data_key: &DataKey,
        _alg: &'static AlgorithmSuite,
        encryption_context: &EncryptionContext,
    ) -> Result<EncryptedDataKey, Error> {
        let mut iv = [0u8; aead::IV_LEN];
        getrandom::getrandom(&mut iv)
            .map_err(|_| Error::Materials("entropy source unavailable".into()))?;
        let aad = serialize_encryption_context(encryption_context)?;
        let (wrapped, tag) = aead::encrypt_frame(&self.wrapping_key, &iv, data_key.plaintext(), &aad)
            .map_err(|_| Error::Materials("unable to encrypt data key".into()))?;

        let mut ciphertext = Vec::with_capacity(iv.len() + wrapped.len() + tag.len());
        ciphertext.extend_from_slice(&iv);
        ciphertext.extend_from_slice(&wrapped);
        ciphertext.extend_from_slice(&tag);
        Ok(EncryptedDataKey::new(
            self.meta.provider_id.clone(),
            self.meta.key_id.as_bytes().to_vec(),
            ciphertext,
        ))
    }

    fn decrypt_data_key(
        &self,
        edk: &EncryptedDataKey,
        alg: &'static AlgorithmSuite,
        encryption_context: &EncryptionContext,
    ) -> Result<DataKey, Error> {
        if !self.owns_data_key(edk) {
            return Err(Error::Materials("encrypted data key not owned".into()));
        }
        if edk.ciphertext.len() < aead::IV_LEN + aead::TAG_LEN {
            return Err(Error::Materials("encrypted data key too short".into()));
        }
        let (iv, rest) = edk.ciphertext.split_at(aead::IV_LEN);
        let (wrapped, tag) = rest.split_at(rest.len() - aead::TAG_LEN);
        let aad = serialize_encryption_context(encryption_context)?;
        let plaintext = aead::decrypt_frame(&self.wrapping_key, iv, wrapped, tag, &aad)
            .map_err(|_| Error::Materials("unable to decrypt data key".into()))?;
        if plaintext.len() != alg.encryption.data_key_len {
            return Err(Error::Materials("unwrapped data key length".into()));
        }
        Ok(DataKey::new(self.meta.clone(), Zeroizing::new(plaintext)))
    }
}

// ---------------------------------------------------------------------------
// Raw provider
// ---------------------------------------------------------------------------

/// Provider over a fixed set of raw AES master keys. The first key is the
/// primary (it generates the data key); every key receives a wrapped copy.
pub struct RawAesMasterKeyProvider {
    provider_id: String,
    keys: Vec<RawAesMasterKey>,
}

impl RawAesMasterKeyProvider {
    pub fn new(
        provider_id: impl Into<String>,
        keys: Vec<RawAesMasterKey>,
    ) -> Result<Self, Error> {
        if keys.is_empty() {
            return Err(Error::Materials("provider requires at least one key".into()));
        }
        Ok(Self {
            provider_id: provider_id.into(),
            keys,
        })
    }
}

impl MasterKeyProvider for RawAesMasterKeyProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn master_keys_for_encryption(
        &self,
        _encryption_context: &EncryptionContext,
    ) -> Result<(&dyn MasterKey, Vec<&dyn MasterKey>), Error> {
        let members: Vec<&dyn MasterKey> =
            self.keys.iter().map(|k| k as &dyn MasterKey).collect();
        Ok((&self.keys[0], members))
    }

    fn master_keys_for_decryption(&self, edk: &EncryptedDataKey) -> Vec<&dyn MasterKey> {
        self.keys
            .iter()
            .filter(|k| k.owns_data_key(edk))
            .map(|k| k as &dyn MasterKey)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::AES_256_GCM_HKDF_SHA512_COMMIT_KEY;

    fn context() -> EncryptionContext {
        let mut ec = EncryptionContext::new();
        ec.insert("tenant".into(), "acme".into());
        ec
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let alg = &AES_256_GCM_HKDF_SHA512_COMMIT_KEY;
        let key = RawAesMasterKey::new("raw-aes", "key-1", &[0x10; 32]);
        let ec = context();

        let data_key = key.generate_data_key(alg, &ec).unwrap();
        assert_eq!(data_key.plaintext().len(), 32);

        let edk = key.encrypt_data_key(&data_key, alg, &ec).unwrap();
        assert!(key.owns_data_key(&edk));

        let unwrapped = key.decrypt_data_key(&edk, alg, &ec).unwrap();
        assert_eq!(unwrapped.plaintext(), data_key.plaintext());
    }

    #[test]
    fn context_binds_the_wrap() {
        let alg = &AES_256_GCM_HKDF_SHA512_COMMIT_KEY;
        let key = RawAesMasterKey::new("raw-aes", "key-1", &[0x10; 32]);
        let ec = context();

        let data_key = key.generate_data_key(alg, &ec).unwrap();
        let edk = key.encrypt_data_key(&data_key, alg, &ec).unwrap();

        let mut other = ec.clone();
        other.insert("extra".into(), "entry".into());
        assert!(matches!(
            key.decrypt_data_key(&edk, alg, &other),
            Err(Error::Materials(_))
        ));
    }

    #[test]
    fn foreign_edk_not_owned() {
        let alg = &AES_256_GCM_HKDF_SHA512_COMMIT_KEY;
        let key1 = RawAesMasterKey::new("raw-aes", "key-1", &[0x10; 32]);
        let key2 = RawAesMasterKey::new("raw-aes", "key-2", &[0x20; 32]);
        let ec = context();

        let data_key = key1.generate_data_key(alg, &ec).unwrap();
        let edk = key1.encrypt_data_key(&data_key, alg, &ec).unwrap();
        assert!(!key2.owns_data_key(&edk));
        assert!(key2.decrypt_data_key(&edk, alg, &ec).is_err());
    }

    #[test]
    fn provider_tries_every_candidate() {
        let alg = &AES_256_GCM_HKDF_SHA512_COMMIT_KEY;
        let ec = context();
        let provider = RawAesMasterKeyProvider::new(
            "raw-aes",
            vec![
                RawAesMasterKey::new("raw-aes", "key-1", &[0x10; 32]),
                RawAesMasterKey::new("raw-aes", "key-2", &[0x20; 32]),
            ],
        )
        .unwrap();

        let (primary, members) = provider.master_keys_for_encryption(&ec).unwrap();
        assert_eq!(members.len(), 2);
        let data_key = primary.generate_data_key(alg, &ec).unwrap();
        let edks: Vec<_> = members
            .iter()
            .map(|k| k.encrypt_data_key(&data_key, alg, &ec).unwrap())
            .collect();

        // A provider holding only the second key still decrypts.
        let second_only = RawAesMasterKeyProvider::new(
            "raw-aes",
            vec![RawAesMasterKey::new("raw-aes", "key-2", &[0x20; 32])],
        )
        .unwrap();
        let unwrapped = second_only.decrypt_data_key(&edks, alg, &ec).unwrap();
        assert_eq!(unwrapped.plaintext(), data_key.plaintext());
    }
}
