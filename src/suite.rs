//! Algorithm suite registry.
//!
//! A closed, process-wide immutable table of supported suites keyed by the
//! 2-byte on-wire suite ID. Lookup by an unregistered ID fails; there is no
//! way to extend the table at runtime.
//!
//! Registered suites:
//!   0x0478  AES-256-GCM, HKDF-SHA-512, key commitment, no signature
//!   0x0578  AES-256-GCM, HKDF-SHA-512, key commitment, ECDSA P-384

use core::fmt;
use std::collections::BTreeMap;

use crate::error::Error;

/// Authenticated mapping carried in the message header.
///
/// `BTreeMap` iteration order is ascending by key, which for UTF-8 strings
/// is byte-wise ascending order. The canonical serialization relies on this.
pub type EncryptionContext = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Suite components
// ---------------------------------------------------------------------------

/// Hash function selector for KDF and signature suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunction {
    Sha256,
    Sha384,
    Sha512,
}

/// Key derivation function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDerivationAlgorithm {
    /// HKDF-Expand over the suite hash, salted by the message ID.
    Hkdf,
    /// No derivation: the data key is used directly.
    Identity,
}

/// AEAD parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionSuite {
    pub algorithm: &'static str,
    pub mode: &'static str,
    pub data_key_len: usize,
    pub iv_len: usize,
    pub auth_tag_len: usize,
}

pub const AES_256_GCM_IV12_TAG16: EncryptionSuite = EncryptionSuite {
    algorithm: "AES",
    mode: "GCM",
    data_key_len: 32,
    iv_len: 12,
    auth_tag_len: 16,
};

/// KDF parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfSuite {
    pub kdf: KeyDerivationAlgorithm,
    pub hash: HashFunction,
}

pub const HKDF_SHA512: KdfSuite = KdfSuite {
    kdf: KeyDerivationAlgorithm::Hkdf,
    hash: HashFunction::Sha512,
};

/// Signature algorithm: curve and digest chosen jointly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    None,
    EcdsaP256Sha256,
    EcdsaP384Sha384,
}

/// Footer signature parameters.
///
/// `signature_len` is the maximum DER-encoded signature length for the
/// curve; actual signatures may be a byte or two shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticationSuite {
    pub algorithm: SignatureAlgorithm,
    pub signature_len: usize,
}

pub const AUTH_NONE: AuthenticationSuite = AuthenticationSuite {
    algorithm: SignatureAlgorithm::None,
    signature_len: 0,
};

pub const AUTH_ECDSA_P256_SHA256: AuthenticationSuite = AuthenticationSuite {
    algorithm: SignatureAlgorithm::EcdsaP256Sha256,
    signature_len: 71,
};

pub const AUTH_ECDSA_P384_SHA384: AuthenticationSuite = AuthenticationSuite {
    algorithm: SignatureAlgorithm::EcdsaP384Sha384,
    signature_len: 103,
};

// ---------------------------------------------------------------------------
// Content type
// ---------------------------------------------------------------------------

/// Body content type byte. Only framed content is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    NonFramed = 0x01,
    Framed = 0x02,
}

// ---------------------------------------------------------------------------
// Algorithm suite
// ---------------------------------------------------------------------------

/// Static descriptor of one algorithm suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmSuite {
    pub id: u16,
    name: &'static str,
    pub encryption: EncryptionSuite,
    pub kdf: KdfSuite,
    pub authentication: AuthenticationSuite,
    /// Length of the algorithm-suite-data header field. Non-zero means the
    /// suite commits to its data key.
    pub algorithm_suite_data_len: usize,
}

impl AlgorithmSuite {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Suite carries a trailing ECDSA signature footer.
    pub fn is_signing(&self) -> bool {
        self.authentication.algorithm != SignatureAlgorithm::None
    }

    /// Suite binds the ciphertext to exactly one data key.
    pub fn is_committing(&self) -> bool {
        self.algorithm_suite_data_len > 0
    }

    /// Message ID length: 32 bytes for committing suites, 16 otherwise.
    pub fn message_id_len(&self) -> usize {
        if self.is_committing() {
            32
        } else {
            16
        }
    }

    /// Suite ID as the two big-endian bytes it occupies on the wire.
    pub fn id_bytes(&self) -> [u8; 2] {
        self.id.to_be_bytes()
    }
}

impl fmt::Display for AlgorithmSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AlgID 0x{:04X}: {}", self.id, self.name)
    }
}

pub static AES_256_GCM_HKDF_SHA512_COMMIT_KEY: AlgorithmSuite = AlgorithmSuite {
    id: 0x0478,
    name: "AES_256_GCM_HKDF_SHA512_COMMIT_KEY",
    encryption: AES_256_GCM_IV12_TAG16,
    kdf: HKDF_SHA512,
    authentication: AUTH_NONE,
    algorithm_suite_data_len: 32,
};

pub static AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384: AlgorithmSuite = AlgorithmSuite {
    id: 0x0578,
    name: "AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384",
    encryption: AES_256_GCM_IV12_TAG16,
    kdf: HKDF_SHA512,
    authentication: AUTH_ECDSA_P384_SHA384,
    algorithm_suite_data_len: 32,
};

/// Look up a suite by its 16-bit ID.
pub fn by_id(id: u16) -> Result<&'static AlgorithmSuite, Error> {
    match id {
        0x0478 => Ok(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY),
        0x0578 => Ok(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384),
        other => Err(Error::UnsupportedAlgorithm(other)),
    }
}

/// Decode a suite from its two big-endian wire bytes.
pub fn from_bytes(b: &[u8]) -> Result<&'static AlgorithmSuite, Error> {
    if b.len() != 2 {
        return Err(Error::InvalidMessage(
            "algorithm suite id must be 2 bytes".into(),
        ));
    }
    by_id(u16::from_be_bytes([b[0], b[1]]))
}
