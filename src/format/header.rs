//! Message header and header authentication.
//!
//! Header layout (big-endian):
//!
//!   version[1]=0x02 || suite_id[2] || message_id[16|32]
//!   || aad_len[2] [aad_count[2] aad_entry*]
//!   || edk_count[2] edk_entry{count}
//!   || content_type[1]=0x02 || reserved[4]=0 || iv_len[1]=12
//!   || frame_length[4] || algorithm_suite_data[32]      (committing only)
//!
//! Immediately followed by the header auth: iv[12]=0 || tag[16].

use crate::codec::{put_u16, put_u32, FieldReader};
use crate::error::Error;
use crate::format::edk::{deserialize_edks, serialize_edks, EncryptedDataKey};
use crate::format::{MAX_FRAME_LENGTH, MESSAGE_FORMAT_VERSION};
use crate::suite::{self, AlgorithmSuite, ContentType, EncryptionContext};

const RESERVED_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Encryption context codec
// ---------------------------------------------------------------------------

/// Canonical serialization of an encryption context.
///
/// A 16-bit total length, then (when non-empty) a 16-bit entry count and the
/// entries in byte-wise ascending key order, each key and value 16-bit
/// length-prefixed. The same bytes serve as wrap AAD for raw master keys.
pub fn serialize_encryption_context(ec: &EncryptionContext) -> Result<Vec<u8>, Error> {
    if ec.is_empty() {
        return Ok(vec![0x00, 0x00]);
    }
    if ec.len() > u16::MAX as usize {
        return Err(Error::LimitExceeded("encryption context entry count".into()));
    }

    let mut body = Vec::new();
    put_u16(&mut body, ec.len() as u16);
    for (key, value) in ec {
        for bytes in [key.as_bytes(), value.as_bytes()] {
            if bytes.len() > u16::MAX as usize {
                return Err(Error::LimitExceeded("encryption context entry".into()));
            }
            put_u16(&mut body, bytes.len() as u16);
            body.extend_from_slice(bytes);
        }
    }
    if body.len() > u16::MAX as usize {
        return Err(Error::LimitExceeded("encryption context".into()));
    }

    let mut out = Vec::with_capacity(2 + body.len());
    put_u16(&mut out, body.len() as u16);
    out.extend_from_slice(&body);
    Ok(out)
}

fn deserialize_encryption_context(r: &mut FieldReader<'_>) -> Result<EncryptionContext, Error> {
    let total = r.read_u16("encryption context length")? as usize;
    let mut ec = EncryptionContext::new();
    if total == 0 {
        return Ok(ec);
    }

    let block = r.read_bytes(total, "encryption context")?;
    let mut sub = FieldReader::new(block);
    let count = sub.read_u16("encryption context count")?;
    if count == 0 {
        return Err(Error::InvalidMessage(
            "encryption context count is zero with non-zero length".into(),
        ));
    }
    for _ in 0..count {
        let key = utf8_field(&mut sub, "encryption context key")?;
        let value = utf8_field(&mut sub, "encryption context value")?;
        if ec.insert(key, value).is_some() {
            return Err(Error::InvalidMessage(
                "duplicate encryption context key".into(),
            ));
        }
    }
    if !sub.is_empty() {
        return Err(Error::InvalidMessage(
            "encryption context length does not match its entries".into(),
        ));
    }
    Ok(ec)
}

fn utf8_field(r: &mut FieldReader<'_>, field: &'static str) -> Result<String, Error> {
    let bytes = r.read_len_prefixed(field)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::InvalidMessage(format!("{} is not UTF-8", field)))
}

// ---------------------------------------------------------------------------
// Message header
// ---------------------------------------------------------------------------

/// Parsed (or freshly serialized) message header.
///
/// `as_bytes` returns the exact on-wire bytes; they are the AAD of the
/// header auth and the first input to the trailing signature.
#[derive(Debug, Clone)]
pub struct MessageHeader {
    pub algorithm_suite: &'static AlgorithmSuite,
    pub message_id: Vec<u8>,
    pub encryption_context: EncryptionContext,
    pub encrypted_data_keys: Vec<EncryptedDataKey>,
    pub content_type: ContentType,
    pub frame_length: u32,
    pub algorithm_suite_data: Vec<u8>,
    bytes: Vec<u8>,
}

impl MessageHeader {
    pub fn new(
        algorithm_suite: &'static AlgorithmSuite,
        message_id: Vec<u8>,
        encryption_context: EncryptionContext,
        encrypted_data_keys: Vec<EncryptedDataKey>,
        frame_length: u32,
        algorithm_suite_data: Vec<u8>,
    ) -> Result<Self, Error> {
        if message_id.len() != algorithm_suite.message_id_len() {
            return Err(Error::InvalidMessage("message id length".into()));
        }
        if algorithm_suite_data.len() != algorithm_suite.algorithm_suite_data_len {
            return Err(Error::InvalidMessage("algorithm suite data length".into()));
        }
        if frame_length == 0 {
            return Err(Error::InvalidMessage(
                "frame length must be greater than zero".into(),
            ));
        }
        if frame_length > MAX_FRAME_LENGTH {
            return Err(Error::LimitExceeded("frame length".into()));
        }

        let mut header = Self {
            algorithm_suite,
            message_id,
            encryption_context,
            encrypted_data_keys,
            content_type: ContentType::Framed,
            frame_length,
            algorithm_suite_data,
            bytes: Vec::new(),
        };
        header.bytes = header.serialize()?;
        Ok(header)
    }

    /// Exact serialized header bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn serialize(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::with_capacity(64 + self.message_id.len());
        buf.push(MESSAGE_FORMAT_VERSION);
        buf.extend_from_slice(&self.algorithm_suite.id_bytes());
        buf.extend_from_slice(&self.message_id);
        buf.extend_from_slice(&serialize_encryption_context(&self.encryption_context)?);
        serialize_edks(&mut buf, &self.encrypted_data_keys)?;
        buf.push(self.content_type as u8);
        buf.extend_from_slice(&[0u8; RESERVED_LEN]);
        buf.push(self.algorithm_suite.encryption.iv_len as u8);
        put_u32(&mut buf, self.frame_length);
        buf.extend_from_slice(&self.algorithm_suite_data);
        Ok(buf)
    }
}

/// Strictly parse a header plus the header auth that follows it.
pub fn deserialize_header(
    r: &mut FieldReader<'_>,
    max_encrypted_data_keys: usize,
) -> Result<(MessageHeader, HeaderAuth), Error> {
    let start = r.position();

    let version = r.read_u8("message version")?;
    if version != MESSAGE_FORMAT_VERSION {
        return Err(Error::InvalidMessage("unsupported message version".into()));
    }

    let suite_bytes = r.read_bytes(2, "algorithm suite id")?;
    let algorithm_suite = suite::from_bytes(suite_bytes)?;

    let message_id = r
        .read_bytes(algorithm_suite.message_id_len(), "message id")?
        .to_vec();

    let encryption_context = deserialize_encryption_context(r)?;
    let encrypted_data_keys = deserialize_edks(r, max_encrypted_data_keys)?;

    let content_type = match r.read_u8("content type")? {
        0x02 => ContentType::Framed,
        other => return Err(Error::UnsupportedContentType(other)),
    };

    let reserved = r.read_bytes(RESERVED_LEN, "reserved")?;
    if reserved != [0u8; RESERVED_LEN] {
        return Err(Error::InvalidMessage("reserved bytes must be zero".into()));
    }

    let iv_len = r.read_u8("iv length")? as usize;
    if iv_len != algorithm_suite.encryption.iv_len {
        return Err(Error::InvalidMessage("iv length does not match suite".into()));
    }

    let frame_length = r.read_u32("frame length")?;
    if frame_length == 0 {
        return Err(Error::InvalidMessage(
            "frame length must be greater than zero".into(),
        ));
    }
    if frame_length > MAX_FRAME_LENGTH {
        return Err(Error::LimitExceeded("frame length".into()));
    }

    let algorithm_suite_data = r
        .read_bytes(
            algorithm_suite.algorithm_suite_data_len,
            "algorithm suite data",
        )?
        .to_vec();

    let bytes = r.slice_from(start).to_vec();
    let header = MessageHeader {
        algorithm_suite,
        message_id,
        encryption_context,
        encrypted_data_keys,
        content_type,
        frame_length,
        algorithm_suite_data,
        bytes,
    };

    let header_auth = HeaderAuth::deserialize(r, algorithm_suite)?;
    Ok((header, header_auth))
}

// ---------------------------------------------------------------------------
// Header auth
// ---------------------------------------------------------------------------

/// AEAD authentication of the serialized header: a zero IV and the GCM tag
/// computed over empty plaintext with the header bytes as AAD.
#[derive(Debug, Clone)]
pub struct HeaderAuth {
    iv: Vec<u8>,
    tag: Vec<u8>,
}

impl HeaderAuth {
    pub fn new(iv: Vec<u8>, tag: Vec<u8>) -> Self {
        Self { iv, tag }
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.iv.len() + self.tag.len());
        buf.extend_from_slice(&self.iv);
        buf.extend_from_slice(&self.tag);
        buf
    }

    fn deserialize(r: &mut FieldReader<'_>, alg: &AlgorithmSuite) -> Result<Self, Error> {
        let iv = r.read_bytes(alg.encryption.iv_len, "header auth iv")?.to_vec();
        let tag = r
            .read_bytes(alg.encryption.auth_tag_len, "header auth tag")?
            .to_vec();
        Ok(Self { iv, tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::AES_256_GCM_HKDF_SHA512_COMMIT_KEY;

    fn sample_header() -> MessageHeader {
        let mut ec = EncryptionContext::new();
        ec.insert("department".into(), "billing".into());
        ec.insert("aaa".into(), "first".into());
        MessageHeader::new(
            &AES_256_GCM_HKDF_SHA512_COMMIT_KEY,
            vec![0x11; 32],
            ec,
            vec![EncryptedDataKey::new("raw-aes", b"key-1".to_vec(), vec![0x22; 60])],
            4096,
            vec![0x33; 32],
        )
        .unwrap()
    }

    #[test]
    fn serialize_parse_roundtrip() {
        let header = sample_header();
        let mut wire = header.as_bytes().to_vec();
        wire.extend_from_slice(&[0u8; 12]);
        wire.extend_from_slice(&[0x44; 16]);

        let mut r = FieldReader::new(&wire);
        let (parsed, auth) = deserialize_header(&mut r, 10).unwrap();
        assert!(r.is_empty());
        assert_eq!(parsed.as_bytes(), header.as_bytes());
        assert_eq!(parsed.message_id, header.message_id);
        assert_eq!(parsed.encryption_context, header.encryption_context);
        assert_eq!(parsed.encrypted_data_keys, header.encrypted_data_keys);
        assert_eq!(parsed.frame_length, 4096);
        assert_eq!(auth.iv(), &[0u8; 12]);
        assert_eq!(auth.tag(), &[0x44; 16]);
    }

    #[test]
    fn context_entries_are_key_ordered() {
        let header = sample_header();
        let bytes = header.as_bytes();
        let aaa = bytes.windows(3).position(|w| w == b"aaa").unwrap();
        let dept = bytes.windows(10).position(|w| w == b"department").unwrap();
        assert!(aaa < dept);
    }

    #[test]
    fn nonzero_reserved_rejected() {
        let header = sample_header();
        let mut wire = header.as_bytes().to_vec();
        // reserved sits 10 bytes before the end: reserved[4] iv_len[1]
        // frame_length[4] precede the 32-byte suite data
        let reserved_at = wire.len() - 32 - 4 - 1 - 4;
        wire[reserved_at] = 0x01;
        wire.extend_from_slice(&[0u8; 28]);

        let mut r = FieldReader::new(&wire);
        assert!(matches!(
            deserialize_header(&mut r, 10),
            Err(Error::InvalidMessage(_))
        ));
    }

    #[test]
    fn unknown_suite_rejected() {
        let header = sample_header();
        let mut wire = header.as_bytes().to_vec();
        wire[1] = 0x03;
        wire[2] = 0x01;
        let mut r = FieldReader::new(&wire);
        assert_eq!(
            deserialize_header(&mut r, 10).unwrap_err(),
            Error::UnsupportedAlgorithm(0x0301)
        );
    }

    #[test]
    fn truncated_header_is_incomplete() {
        let header = sample_header();
        let wire = &header.as_bytes()[..10];
        let mut r = FieldReader::new(wire);
        assert!(matches!(
            deserialize_header(&mut r, 10),
            Err(Error::IncompleteBuffer(_))
        ));
    }

    #[test]
    fn empty_context_serializes_to_zero_length() {
        assert_eq!(
            serialize_encryption_context(&EncryptionContext::new()).unwrap(),
            vec![0x00, 0x00]
        );
    }
}
