//! Message wire format: header, header auth, body frames, footer.
//!
//! All integers big-endian. Deserialization is strict: every length and
//! count is validated against its cap and against the remaining buffer, and
//! unknown or reserved values fail instead of being skipped.

pub mod body;
pub mod edk;
pub mod footer;
pub mod header;

pub use body::{deserialize_body, Frame, FINAL_FRAME_SENTINEL};
pub use edk::EncryptedDataKey;
pub use footer::MessageFooter;
pub use header::{
    deserialize_header, serialize_encryption_context, HeaderAuth, MessageHeader,
};

/// First byte of every supported message.
pub const MESSAGE_FORMAT_VERSION: u8 = 0x02;

/// Upper bound on the frame-length field: 2^31 - 1.
pub const MAX_FRAME_LENGTH: u32 = i32::MAX as u32;
