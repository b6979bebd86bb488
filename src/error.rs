//! Unified error categories for the message pipeline.
//!
//! Every failure in an encrypt or decrypt invocation surfaces as one of
//! these categories. Messages never carry key material or plaintext, and
//! decode sub-errors normalize into the parse categories so the error
//! surface does not leak where inside a frame a tag check failed.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Structurally invalid message: bad first byte, non-zero reserved
    /// bytes, malformed field, or a body that does not add up.
    InvalidMessage(String),
    /// Algorithm suite ID not present in the registry.
    UnsupportedAlgorithm(u16),
    /// Content type other than framed.
    UnsupportedContentType(u8),
    /// Commitment policy rejects the algorithm suite.
    PolicyViolation(String),
    /// HKDF failure or invalid derivation inputs.
    KeyDerivation(String),
    /// Commitment key mismatch on decrypt.
    KeyCommitmentFailed,
    /// Header authentication tag did not validate.
    HeaderAuthFailed,
    /// Body frame authentication tag did not validate.
    FrameAuthFailed,
    /// Footer signature did not verify.
    SignatureInvalid,
    /// The materials manager or a master key could not produce materials.
    Materials(String),
    /// EDK count, frame length, or context size over its cap.
    LimitExceeded(String),
    /// Parser ran out of bytes while reading the named field.
    IncompleteBuffer(&'static str),
    /// Trailing bytes after the final frame of a non-signing message.
    UnexpectedFooter,
    /// A single-use encrypter or decrypter was invoked again.
    InvalidState(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMessage(msg) => write!(f, "invalid message: {}", msg),
            Self::UnsupportedAlgorithm(id) => {
                write!(f, "unsupported algorithm suite: 0x{:04x}", id)
            }
            Self::UnsupportedContentType(b) => {
                write!(f, "unsupported content type: 0x{:02x}", b)
            }
            Self::PolicyViolation(msg) => write!(f, "commitment policy violation: {}", msg),
            Self::KeyDerivation(msg) => write!(f, "key derivation error: {}", msg),
            Self::KeyCommitmentFailed => write!(
                f,
                "key commitment validation failed: key identity does not match the identity asserted in the message"
            ),
            Self::HeaderAuthFailed => write!(f, "header authentication failed"),
            Self::FrameAuthFailed => write!(f, "frame authentication failed"),
            Self::SignatureInvalid => write!(f, "footer signature verification failed"),
            Self::Materials(msg) => write!(f, "materials error: {}", msg),
            Self::LimitExceeded(msg) => write!(f, "limit exceeded: {}", msg),
            Self::IncompleteBuffer(field) => write!(f, "incomplete buffer: {}", field),
            Self::UnexpectedFooter => {
                write!(f, "unexpected trailing bytes after non-signed message body")
            }
            Self::InvalidState(msg) => write!(f, "invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
