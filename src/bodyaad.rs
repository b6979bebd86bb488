//! Per-frame additional authenticated data.
//!
//! AAD = message_id || content_string || seq_num_be[4] || length_be[8]
//!
//! where `length` is the plaintext length of the frame. The content string
//! distinguishes regular frames from the final frame, so a final frame can
//! never be replayed as a regular one.

use crate::error::Error;
use crate::suite::ContentType;

pub const CONTENT_AAD_FRAME: &[u8] = b"AWSKMSEncryptionClient Frame";
pub const CONTENT_AAD_FINAL_FRAME: &[u8] = b"AWSKMSEncryptionClient Final Frame";

/// Select the content string for a frame. Only framed content is supported.
pub fn content_string(content_type: ContentType, final_frame: bool) -> Result<&'static [u8], Error> {
    match content_type {
        ContentType::Framed => Ok(if final_frame {
            CONTENT_AAD_FINAL_FRAME
        } else {
            CONTENT_AAD_FRAME
        }),
        other => Err(Error::UnsupportedContentType(other as u8)),
    }
}

/// Build the deterministic AAD blob for one frame.
pub fn content_aad_bytes(
    message_id: &[u8],
    content_string: &[u8],
    seq_num: u32,
    length: usize,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(message_id.len() + content_string.len() + 4 + 8);
    buf.extend_from_slice(message_id);
    buf.extend_from_slice(content_string);
    buf.extend_from_slice(&seq_num.to_be_bytes());
    buf.extend_from_slice(&(length as u64).to_be_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let aad = content_aad_bytes(&[0xAB; 32], CONTENT_AAD_FRAME, 7, 4096);
        assert_eq!(aad.len(), 32 + CONTENT_AAD_FRAME.len() + 4 + 8);
        assert_eq!(&aad[..32], &[0xAB; 32]);
        assert_eq!(&aad[aad.len() - 12..aad.len() - 8], &7u32.to_be_bytes());
        assert_eq!(&aad[aad.len() - 8..], &4096u64.to_be_bytes());
    }

    #[test]
    fn final_frame_uses_distinct_content_string() {
        let regular = content_string(ContentType::Framed, false).unwrap();
        let fin = content_string(ContentType::Framed, true).unwrap();
        assert_ne!(regular, fin);
    }

    #[test]
    fn non_framed_rejected() {
        assert_eq!(
            content_string(ContentType::NonFramed, false),
            Err(Error::UnsupportedContentType(0x01))
        );
    }
}
