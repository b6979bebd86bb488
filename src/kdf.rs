//! Message key derivation.
//!
//! Two deterministic derivations from (data_key, suite, message_id):
//!
//!   data-encryption key:  info = suite_id_be[2] || b"DERIVEKEY"  (11 bytes)
//!   commitment key:       info = b"COMMITKEY"                    (9 bytes)
//!
//! Both run the suite's KDF salted by the message ID. Suites without a KDF
//! use the data key directly.

use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::error::Error;
use crate::suite::{AlgorithmSuite, HashFunction, KeyDerivationAlgorithm};

const DERIVE_KEY_LABEL: &[u8] = b"DERIVEKEY";
const COMMIT_KEY_LABEL: &[u8] = b"COMMITKEY";

/// Commitment keys are always 32 bytes, independent of the data key length.
pub const COMMITMENT_KEY_LEN: usize = 32;

/// Derive the per-message data-encryption key.
pub fn derive_data_encryption_key(
    data_key: &[u8],
    suite: &'static AlgorithmSuite,
    message_id: &[u8],
) -> Result<Zeroizing<Vec<u8>>, Error> {
    validate_inputs(data_key, suite)?;
    let mut info = Vec::with_capacity(2 + DERIVE_KEY_LABEL.len());
    info.extend_from_slice(&suite.id_bytes());
    info.extend_from_slice(DERIVE_KEY_LABEL);
    expand(suite, data_key, message_id, &info, suite.encryption.data_key_len)
}

/// Derive the 32-byte commitment key. Only meaningful for committing suites.
pub fn calculate_commitment_key(
    data_key: &[u8],
    suite: &'static AlgorithmSuite,
    message_id: &[u8],
) -> Result<Zeroizing<Vec<u8>>, Error> {
    validate_inputs(data_key, suite)?;
    expand(suite, data_key, message_id, COMMIT_KEY_LABEL, COMMITMENT_KEY_LEN)
}

fn validate_inputs(data_key: &[u8], suite: &AlgorithmSuite) -> Result<(), Error> {
    if data_key.is_empty() {
        return Err(Error::KeyDerivation("data key is empty".into()));
    }
    if suite.encryption.data_key_len == 0 {
        return Err(Error::KeyDerivation("data key length is invalid".into()));
    }
    Ok(())
}

fn expand(
    suite: &AlgorithmSuite,
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    len: usize,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    match suite.kdf.kdf {
        KeyDerivationAlgorithm::Identity => {
            if ikm.len() != len {
                return Err(Error::KeyDerivation(
                    "data key length does not match the suite".into(),
                ));
            }
            Ok(Zeroizing::new(ikm.to_vec()))
        }
        KeyDerivationAlgorithm::Hkdf => {
            let mut okm = Zeroizing::new(vec![0u8; len]);
            let expanded = match suite.kdf.hash {
                HashFunction::Sha256 => Hkdf::<Sha256>::new(Some(salt), ikm).expand(info, &mut okm),
                HashFunction::Sha384 => Hkdf::<Sha384>::new(Some(salt), ikm).expand(info, &mut okm),
                HashFunction::Sha512 => Hkdf::<Sha512>::new(Some(salt), ikm).expand(info, &mut okm),
            };
            expanded.map_err(|_| Error::KeyDerivation("hkdf expand".into()))?;
            Ok(okm)
        }
    }
}
