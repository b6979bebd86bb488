//! Commitment policy gate.
//!
//! Couples algorithm selection to runtime configuration: whether the caller
//! may produce or consume messages whose suite does (not) commit to the
//! data key.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::suite::AlgorithmSuite;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitmentPolicy {
    /// Encrypt only with non-committing suites; decrypt only non-committing
    /// messages.
    ForbidEncryptAllowDecrypt,
    /// Encrypt only with committing suites; decrypt anything.
    RequireEncryptAllowDecrypt,
    /// Encrypt only with committing suites; decrypt only committing messages.
    RequireEncryptRequireDecrypt,
}

impl Default for CommitmentPolicy {
    fn default() -> Self {
        Self::RequireEncryptRequireDecrypt
    }
}

impl fmt::Display for CommitmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ForbidEncryptAllowDecrypt => "FORBID_ENCRYPT_ALLOW_DECRYPT",
            Self::RequireEncryptAllowDecrypt => "REQUIRE_ENCRYPT_ALLOW_DECRYPT",
            Self::RequireEncryptRequireDecrypt => "REQUIRE_ENCRYPT_REQUIRE_DECRYPT",
        };
        write!(f, "{}", s)
    }
}

/// Gate the suite chosen for encryption.
pub fn validate_on_encrypt(policy: CommitmentPolicy, alg: &AlgorithmSuite) -> Result<(), Error> {
    match policy {
        CommitmentPolicy::ForbidEncryptAllowDecrypt => {
            if alg.is_committing() {
                return Err(Error::PolicyViolation(format!(
                    "{} forbids encrypting with committing suite {}",
                    policy, alg
                )));
            }
        }
        CommitmentPolicy::RequireEncryptAllowDecrypt
        | CommitmentPolicy::RequireEncryptRequireDecrypt => {
            if !alg.is_committing() {
                return Err(Error::PolicyViolation(format!(
                    "{} requires a committing suite, got {}",
                    policy, alg
                )));
            }
        }
    }
    Ok(())
}

/// Gate the suite parsed from an incoming message.
pub fn validate_on_decrypt(policy: CommitmentPolicy, alg: &AlgorithmSuite) -> Result<(), Error> {
    match policy {
        CommitmentPolicy::ForbidEncryptAllowDecrypt => {
            if alg.is_committing() {
                return Err(Error::PolicyViolation(format!(
                    "{} rejects messages with committing suite {}",
                    policy, alg
                )));
            }
        }
        CommitmentPolicy::RequireEncryptAllowDecrypt => {}
        CommitmentPolicy::RequireEncryptRequireDecrypt => {
            if !alg.is_committing() {
                return Err(Error::PolicyViolation(format!(
                    "{} rejects messages without key commitment, got {}",
                    policy, alg
                )));
            }
        }
    }
    Ok(())
}
