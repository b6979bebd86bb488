//! Body frames.
//!
//! Regular frame:  seq[4] || iv[12] || ct[frame_length] || tag[16]
//! Final frame:    0xFFFFFFFF || seq[4] || iv[12] || ct_len[4] || ct || tag[16]
//!
//! Sequence numbers start at 1 and increase by exactly one. The final frame
//! terminates the body and may carry 0..=frame_length bytes.

use crate::codec::{put_u32, FieldReader};
use crate::error::Error;
use crate::suite::AlgorithmSuite;

/// Marker distinguishing the final frame from a regular sequence number.
pub const FINAL_FRAME_SENTINEL: u32 = 0xFFFF_FFFF;

/// One parsed (or freshly serialized) body frame.
///
/// `as_bytes` returns the exact on-wire bytes; the trailing signature hashes
/// them verbatim.
#[derive(Debug, Clone)]
pub struct Frame {
    is_final: bool,
    sequence_number: u32,
    iv: Vec<u8>,
    encrypted_content: Vec<u8>,
    auth_tag: Vec<u8>,
    bytes: Vec<u8>,
}

impl Frame {
    pub fn regular(sequence_number: u32, iv: Vec<u8>, encrypted_content: Vec<u8>, auth_tag: Vec<u8>) -> Self {
        let mut bytes =
            Vec::with_capacity(4 + iv.len() + encrypted_content.len() + auth_tag.len());
        put_u32(&mut bytes, sequence_number);
        bytes.extend_from_slice(&iv);
        bytes.extend_from_slice(&encrypted_content);
        bytes.extend_from_slice(&auth_tag);
        Self {
            is_final: false,
            sequence_number,
            iv,
            encrypted_content,
            auth_tag,
            bytes,
        }
    }

    pub fn final_frame(sequence_number: u32, iv: Vec<u8>, encrypted_content: Vec<u8>, auth_tag: Vec<u8>) -> Self {
        let mut bytes =
            Vec::with_capacity(4 + 4 + iv.len() + 4 + encrypted_content.len() + auth_tag.len());
        put_u32(&mut bytes, FINAL_FRAME_SENTINEL);
        put_u32(&mut bytes, sequence_number);
        bytes.extend_from_slice(&iv);
        put_u32(&mut bytes, encrypted_content.len() as u32);
        bytes.extend_from_slice(&encrypted_content);
        bytes.extend_from_slice(&auth_tag);
        Self {
            is_final: true,
            sequence_number,
            iv,
            encrypted_content,
            auth_tag,
            bytes,
        }
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn encrypted_content(&self) -> &[u8] {
        &self.encrypted_content
    }

    pub fn auth_tag(&self) -> &[u8] {
        &self.auth_tag
    }

    /// Exact wire bytes of this frame.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Parse all body frames, enforcing sequence monotonicity. Iteration stops
/// after the final frame; the reader is left positioned at the footer (or at
/// the end of the buffer for non-signing suites).
pub fn deserialize_body(
    r: &mut FieldReader<'_>,
    alg: &AlgorithmSuite,
    frame_length: u32,
) -> Result<Vec<Frame>, Error> {
    let mut frames = Vec::new();
    let mut expected_seq: u32 = 1;

    loop {
        let next = r.peek_u32().ok_or(Error::IncompleteBuffer("frame"))?;
        let frame = if next == FINAL_FRAME_SENTINEL {
            deserialize_final_frame(r, alg, frame_length)?
        } else {
            deserialize_regular_frame(r, alg, frame_length)?
        };

        if frame.sequence_number() != expected_seq {
            return Err(Error::InvalidMessage(format!(
                "frame sequence number {} out of order, expected {}",
                frame.sequence_number(),
                expected_seq
            )));
        }

        let is_final = frame.is_final();
        frames.push(frame);
        if is_final {
            return Ok(frames);
        }

        if expected_seq as u64 + 1 >= FINAL_FRAME_SENTINEL as u64 {
            return Err(Error::LimitExceeded("frame count".into()));
        }
        expected_seq += 1;
    }
}

fn deserialize_regular_frame(
    r: &mut FieldReader<'_>,
    alg: &AlgorithmSuite,
    frame_length: u32,
) -> Result<Frame, Error> {
    let seq = r.read_u32("frame sequence number")?;
    let iv = r.read_bytes(alg.encryption.iv_len, "frame iv")?.to_vec();
    let content = r
        .read_bytes(frame_length as usize, "frame content")?
        .to_vec();
    let tag = r
        .read_bytes(alg.encryption.auth_tag_len, "frame auth tag")?
        .to_vec();
    Ok(Frame::regular(seq, iv, content, tag))
}

fn deserialize_final_frame(
    r: &mut FieldReader<'_>,
    alg: &AlgorithmSuite,
    frame_length: u32,
) -> Result<Frame, Error> {
    r.read_u32("final frame sentinel")?;
    let seq = r.read_u32("final frame sequence number")?;
    let iv = r.read_bytes(alg.encryption.iv_len, "final frame iv")?.to_vec();
    let content_len = r.read_u32("final frame content length")?;
    if content_len > frame_length {
        return Err(Error::InvalidMessage(
            "final frame content exceeds frame length".into(),
        ));
    }
    let content = r
        .read_bytes(content_len as usize, "final frame content")?
        .to_vec();
    let tag = r
        .read_bytes(alg.encryption.auth_tag_len, "final frame auth tag")?
        .to_vec();
    Ok(Frame::final_frame(seq, iv, content, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::AES_256_GCM_HKDF_SHA512_COMMIT_KEY;

    static ALG: &AlgorithmSuite = &AES_256_GCM_HKDF_SHA512_COMMIT_KEY;

    fn wire(frames: &[Frame]) -> Vec<u8> {
        frames.iter().flat_map(|f| f.as_bytes().to_vec()).collect()
    }

    #[test]
    fn parses_regular_then_final() {
        let f1 = Frame::regular(1, vec![0; 12], vec![0xAA; 8], vec![0xBB; 16]);
        let f2 = Frame::final_frame(2, vec![0; 12], vec![0xCC; 3], vec![0xDD; 16]);
        let buf = wire(&[f1, f2]);

        let mut r = FieldReader::new(&buf);
        let frames = deserialize_body(&mut r, ALG, 8).unwrap();
        assert!(r.is_empty());
        assert_eq!(frames.len(), 2);
        assert!(!frames[0].is_final());
        assert!(frames[1].is_final());
        assert_eq!(frames[1].encrypted_content(), &[0xCC; 3]);
    }

    #[test]
    fn first_frame_must_be_sequence_one() {
        let f = Frame::final_frame(2, vec![0; 12], vec![], vec![0xDD; 16]);
        let mut r = FieldReader::new(f.as_bytes());
        assert!(matches!(
            deserialize_body(&mut r, ALG, 8),
            Err(Error::InvalidMessage(_))
        ));
    }

    #[test]
    fn gap_in_sequence_rejected() {
        let f1 = Frame::regular(1, vec![0; 12], vec![0xAA; 8], vec![0xBB; 16]);
        let f3 = Frame::final_frame(3, vec![0; 12], vec![], vec![0xDD; 16]);
        let buf = wire(&[f1, f3]);
        let mut r = FieldReader::new(&buf);
        assert!(matches!(
            deserialize_body(&mut r, ALG, 8),
            Err(Error::InvalidMessage(_))
        ));
    }

    #[test]
    fn missing_final_frame_is_incomplete() {
        let f1 = Frame::regular(1, vec![0; 12], vec![0xAA; 8], vec![0xBB; 16]);
        let mut r = FieldReader::new(f1.as_bytes());
        assert_eq!(
            deserialize_body(&mut r, ALG, 8).unwrap_err(),
            Error::IncompleteBuffer("frame")
        );
    }

    #[test]
    fn oversized_final_content_rejected() {
        let f = Frame::final_frame(1, vec![0; 12], vec![0xAA; 9], vec![0xBB; 16]);
        let mut r = FieldReader::new(f.as_bytes());
        assert!(matches!(
            deserialize_body(&mut r, ALG, 8),
            Err(Error::InvalidMessage(_))
        ));
    }
}
