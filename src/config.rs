//! Client configuration.

use crate::error::Error;
use crate::format::MAX_FRAME_LENGTH;
use crate::policy::CommitmentPolicy;
use crate::suite::AlgorithmSuite;

pub const DEFAULT_FRAME_LENGTH: u32 = 4096;
pub const DEFAULT_MAX_ENCRYPTED_DATA_KEYS: usize = 10;
pub const MAX_MAX_ENCRYPTED_DATA_KEYS: usize = u16::MAX as usize;

/// Knobs shared by every encrypt/decrypt invocation of a client.
///
/// Values are validated at construction, so a config that exists is a config
/// the pipeline will accept.
#[derive(Clone, Copy, Debug)]
pub struct ClientConfig {
    /// Suite used when the caller does not specify one. `None` selects the
    /// committing, signing default at encrypt time.
    pub algorithm: Option<&'static AlgorithmSuite>,
    /// Plaintext bytes per non-final frame.
    pub frame_length: u32,
    pub commitment_policy: CommitmentPolicy,
    /// Hard cap on EDK list length, both produced and accepted.
    pub max_encrypted_data_keys: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            algorithm: None,
            frame_length: DEFAULT_FRAME_LENGTH,
            commitment_policy: CommitmentPolicy::default(),
            max_encrypted_data_keys: DEFAULT_MAX_ENCRYPTED_DATA_KEYS,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, alg: &'static AlgorithmSuite) -> Self {
        self.algorithm = Some(alg);
        self
    }

    pub fn with_commitment_policy(mut self, policy: CommitmentPolicy) -> Self {
        self.commitment_policy = policy;
        self
    }

    pub fn with_frame_length(mut self, frame_length: u32) -> Result<Self, Error> {
        if frame_length == 0 || frame_length > MAX_FRAME_LENGTH {
            return Err(Error::LimitExceeded(format!(
                "frame length must be between 1 and {}",
                MAX_FRAME_LENGTH
            )));
        }
        self.frame_length = frame_length;
        Ok(self)
    }

    pub fn with_max_encrypted_data_keys(mut self, max: usize) -> Result<Self, Error> {
        if max == 0 || max > MAX_MAX_ENCRYPTED_DATA_KEYS {
            return Err(Error::LimitExceeded(format!(
                "max encrypted data keys must be between 1 and {}",
                MAX_MAX_ENCRYPTED_DATA_KEYS
            )));
        }
        self.max_encrypted_data_keys = max;
        Ok(self)
    }
}
