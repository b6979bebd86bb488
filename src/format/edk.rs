//! Encrypted data key entries.
//!
//! Wire layout per entry, each field 16-bit length-prefixed:
//!
//!   provider_id_len[2] provider_id || provider_info_len[2] provider_info
//!   || ciphertext_len[2] ciphertext

use crate::codec::{put_u16, FieldReader};
use crate::error::Error;

/// One wrapped copy of the per-message data key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedDataKey {
    pub provider_id: String,
    pub provider_info: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedDataKey {
    pub fn new(
        provider_id: impl Into<String>,
        provider_info: impl Into<Vec<u8>>,
        ciphertext: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_info: provider_info.into(),
            ciphertext: ciphertext.into(),
        }
    }

    pub(crate) fn serialize(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        for (field, bytes) in [
            ("provider id", self.provider_id.as_bytes()),
            ("provider info", self.provider_info.as_slice()),
            ("encrypted data key ciphertext", self.ciphertext.as_slice()),
        ] {
            if bytes.len() > u16::MAX as usize {
                return Err(Error::LimitExceeded(format!(
                    "encrypted data key {} too long",
                    field
                )));
            }
            put_u16(buf, bytes.len() as u16);
            buf.extend_from_slice(bytes);
        }
        Ok(())
    }

    pub(crate) fn deserialize(r: &mut FieldReader<'_>) -> Result<Self, Error> {
        let provider_id = r.read_len_prefixed("encrypted data key provider id")?;
        let provider_id = String::from_utf8(provider_id.to_vec())
            .map_err(|_| Error::InvalidMessage("encrypted data key provider id is not UTF-8".into()))?;
        let provider_info = r.read_len_prefixed("encrypted data key provider info")?;
        let ciphertext = r.read_len_prefixed("encrypted data key ciphertext")?;
        Ok(Self {
            provider_id,
            provider_info: provider_info.to_vec(),
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Serialize the EDK list as a 16-bit count followed by the entries.
pub(crate) fn serialize_edks(buf: &mut Vec<u8>, edks: &[EncryptedDataKey]) -> Result<(), Error> {
    if edks.is_empty() {
        return Err(Error::InvalidMessage("no encrypted data keys".into()));
    }
    if edks.len() > u16::MAX as usize {
        return Err(Error::LimitExceeded("encrypted data key count".into()));
    }
    put_u16(buf, edks.len() as u16);
    for edk in edks {
        edk.serialize(buf)?;
    }
    Ok(())
}

/// Read the EDK list, enforcing `1 <= count <= max`.
pub(crate) fn deserialize_edks(
    r: &mut FieldReader<'_>,
    max: usize,
) -> Result<Vec<EncryptedDataKey>, Error> {
    let count = r.read_u16("encrypted data key count")? as usize;
    if count == 0 {
        return Err(Error::InvalidMessage(
            "encrypted data keys not found in message header".into(),
        ));
    }
    if count > max {
        return Err(Error::LimitExceeded(format!(
            "message carries {} encrypted data keys, maximum is {}",
            count, max
        )));
    }
    let mut edks = Vec::with_capacity(count);
    for _ in 0..count {
        edks.push(EncryptedDataKey::deserialize(r)?);
    }
    Ok(edks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let edk = EncryptedDataKey::new("raw-aes", b"key-1".to_vec(), vec![0x42; 60]);
        let mut buf = Vec::new();
        serialize_edks(&mut buf, std::slice::from_ref(&edk)).unwrap();

        let mut r = FieldReader::new(&buf);
        let parsed = deserialize_edks(&mut r, 10).unwrap();
        assert_eq!(parsed, vec![edk]);
        assert!(r.is_empty());
    }

    #[test]
    fn zero_count_rejected() {
        let mut r = FieldReader::new(&[0x00, 0x00]);
        assert!(matches!(
            deserialize_edks(&mut r, 10),
            Err(Error::InvalidMessage(_))
        ));
    }

    #[test]
    fn over_cap_rejected() {
        let mut buf = Vec::new();
        let edks: Vec<_> = (0..3)
            .map(|i| EncryptedDataKey::new("raw-aes", vec![i], vec![0x01]))
            .collect();
        serialize_edks(&mut buf, &edks).unwrap();
        let mut r = FieldReader::new(&buf);
        assert!(matches!(
            deserialize_edks(&mut r, 2),
            Err(Error::LimitExceeded(_))
        ));
    }
}
