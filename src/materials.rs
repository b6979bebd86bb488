//! Cryptographic materials manager.
//!
//! The pipeline talks to exactly one collaborator: a `MaterialsManager` that
//! assembles materials (data key, wrapped copies, signing key) on encrypt
//! and recovers them on decrypt. `DefaultMaterialsManager` is the strategy
//! layer over a `MasterKeyProvider`.

use p384::ecdsa::SigningKey;
use rand_core::OsRng;

use crate::error::Error;
use crate::format::EncryptedDataKey;
use crate::keys::{DataKey, MasterKeyProvider};
use crate::signature::{decode_verification_key, encode_verification_key};
use crate::suite::{AlgorithmSuite, EncryptionContext};

/// Encryption-context key reserved for the signing public key. Callers may
/// not supply it; signing suites add it, and decryption reads it back.
pub const RESERVED_ENCRYPTION_CONTEXT_KEY: &str = "aws-crypto-public-key";

// ---------------------------------------------------------------------------
// Requests and materials
// ---------------------------------------------------------------------------

pub struct EncryptionMaterialsRequest<'a> {
    pub algorithm: &'static AlgorithmSuite,
    pub encryption_context: &'a EncryptionContext,
    /// Advisory plaintext length, when known up front.
    pub plaintext_len: Option<usize>,
}

pub struct EncryptionMaterials {
    pub algorithm: &'static AlgorithmSuite,
    pub data_key: DataKey,
    pub encrypted_data_keys: Vec<EncryptedDataKey>,
    /// Caller context, augmented with the reserved public-key entry for
    /// signing suites.
    pub encryption_context: EncryptionContext,
    pub signing_key: Option<SigningKey>,
}

pub struct DecryptionMaterialsRequest<'a> {
    pub algorithm: &'static AlgorithmSuite,
    pub encrypted_data_keys: &'a [EncryptedDataKey],
    pub encryption_context: &'a EncryptionContext,
}

pub struct DecryptionMaterials {
    pub data_key: DataKey,
    /// SEC1-encoded verification key for signing suites.
    pub verification_key: Option<Vec<u8>>,
}

/// The single contract between the pipeline and key management.
pub trait MaterialsManager: Send + Sync {
    fn get_encryption_materials(
        &self,
        request: EncryptionMaterialsRequest<'_>,
    ) -> Result<EncryptionMaterials, Error>;

    fn decrypt_materials(
        &self,
        request: DecryptionMaterialsRequest<'_>,
    ) -> Result<DecryptionMaterials, Error>;
}

// ---------------------------------------------------------------------------
// Default implementation
// ---------------------------------------------------------------------------

/// Materials manager over a master-key provider: the primary key generates
/// the data key, every member key wraps a copy, and signing suites get a
/// fresh P-384 key pair per message.
pub struct DefaultMaterialsManager<P: MasterKeyProvider> {
    provider: P,
}

impl<P: MasterKeyProvider> DefaultMaterialsManager<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: MasterKeyProvider> MaterialsManager for DefaultMaterialsManager<P> {
    fn get_encryption_materials(
        &self,
        request: EncryptionMaterialsRequest<'_>,
    ) -> Result<EncryptionMaterials, Error> {
        if request
            .encryption_context
            .contains_key(RESERVED_ENCRYPTION_CONTEXT_KEY)
        {
            return Err(Error::Materials(format!(
                "encryption context key {} is reserved",
                RESERVED_ENCRYPTION_CONTEXT_KEY
            )));
        }

        let alg = request.algorithm;
        let mut encryption_context = request.encryption_context.clone();
        let signing_key = if alg.is_signing() {
            let key = SigningKey::random(&mut OsRng);
            encryption_context.insert(
                RESERVED_ENCRYPTION_CONTEXT_KEY.to_string(),
                encode_verification_key(key.verifying_key()),
            );
            Some(key)
        } else {
            None
        };

        let (primary, members) = self
            .provider
            .master_keys_for_encryption(&encryption_context)?;
        let data_key = primary.generate_data_key(alg, &encryption_context)?;

        let mut encrypted_data_keys = Vec::with_capacity(members.len());
        for key in members {
            encrypted_data_keys.push(key.encrypt_data_key(&data_key, alg, &encryption_context)?);
        }

        Ok(EncryptionMaterials {
            algorithm: alg,
            data_key,
            encrypted_data_keys,
            encryption_context,
            signing_key,
        })
    }

    fn decrypt_materials(
        &self,
        request: DecryptionMaterialsRequest<'_>,
    ) -> Result<DecryptionMaterials, Error> {
        let alg = request.algorithm;
        let verification_key = if alg.is_signing() {
            let encoded = request
                .encryption_context
                .get(RESERVED_ENCRYPTION_CONTEXT_KEY)
                .ok_or_else(|| {
                    Error::Materials(
                        "signing suite message is missing its verification key".into(),
                    )
                })?;
            Some(decode_verification_key(encoded)?)
        } else {
            if request
                .encryption_context
                .contains_key(RESERVED_ENCRYPTION_CONTEXT_KEY)
            {
                return Err(Error::Materials(
                    "non-signing suite message carries a verification key".into(),
                ));
            }
            None
        };

        let data_key = self.provider.decrypt_data_key(
            request.encrypted_data_keys,
            alg,
            request.encryption_context,
        )?;

        Ok(DecryptionMaterials {
            data_key,
            verification_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{RawAesMasterKey, RawAesMasterKeyProvider};
    use crate::suite::{
        AES_256_GCM_HKDF_SHA512_COMMIT_KEY, AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384,
    };

    fn manager() -> DefaultMaterialsManager<RawAesMasterKeyProvider> {
        let provider = RawAesMasterKeyProvider::new(
            "raw-aes",
            vec![
                RawAesMasterKey::new("raw-aes", "key-1", &[0x10; 32]),
                RawAesMasterKey::new("raw-aes", "key-2", &[0x20; 32]),
            ],
        )
        .unwrap();
        DefaultMaterialsManager::new(provider)
    }

    #[test]
    fn signing_suite_adds_reserved_entry_and_key() {
        let cmm = manager();
        let ec = EncryptionContext::new();
        let materials = cmm
            .get_encryption_materials(EncryptionMaterialsRequest {
                algorithm: &AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384,
                encryption_context: &ec,
                plaintext_len: None,
            })
            .unwrap();
        assert!(materials.signing_key.is_some());
        assert!(materials
            .encryption_context
            .contains_key(RESERVED_ENCRYPTION_CONTEXT_KEY));
        assert_eq!(materials.encrypted_data_keys.len(), 2);
    }

    #[test]
    fn non_signing_suite_leaves_context_alone() {
        let cmm = manager();
        let ec = EncryptionContext::new();
        let materials = cmm
            .get_encryption_materials(EncryptionMaterialsRequest {
                algorithm: &AES_256_GCM_HKDF_SHA512_COMMIT_KEY,
                encryption_context: &ec,
                plaintext_len: None,
            })
            .unwrap();
        assert!(materials.signing_key.is_none());
        assert!(materials.encryption_context.is_empty());
    }

    #[test]
    fn reserved_key_in_caller_context_rejected() {
        let cmm = manager();
        let mut ec = EncryptionContext::new();
        ec.insert(RESERVED_ENCRYPTION_CONTEXT_KEY.into(), "bogus".into());
        assert!(matches!(
            cmm.get_encryption_materials(EncryptionMaterialsRequest {
                algorithm: &AES_256_GCM_HKDF_SHA512_COMMIT_KEY,
                encryption_context: &ec,
                plaintext_len: None,
            }),
            Err(Error::Materials(_))
        ));
    }

    #[test]
    fn decrypt_materials_recovers_data_key() {
        let cmm = manager();
        let ec = EncryptionContext::new();
        let alg = &AES_256_GCM_HKDF_SHA512_COMMIT_KEY;
        let materials = cmm
            .get_encryption_materials(EncryptionMaterialsRequest {
                algorithm: alg,
                encryption_context: &ec,
                plaintext_len: None,
            })
            .unwrap();

        let recovered = cmm
            .decrypt_materials(DecryptionMaterialsRequest {
                algorithm: alg,
                encrypted_data_keys: &materials.encrypted_data_keys,
                encryption_context: &materials.encryption_context,
            })
            .unwrap();
        assert_eq!(recovered.data_key.plaintext(), materials.data_key.plaintext());
        assert!(recovered.verification_key.is_none());
    }
}
