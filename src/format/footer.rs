//! Signature footer: sig_len[2] || sig. Present only for signing suites and
//! must end exactly at the end of the message.

use crate::codec::{put_u16, FieldReader};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFooter {
    pub signature: Vec<u8>,
}

impl MessageFooter {
    pub fn new(signature: Vec<u8>) -> Self {
        Self { signature }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + self.signature.len());
        put_u16(&mut buf, self.signature.len() as u16);
        buf.extend_from_slice(&self.signature);
        buf
    }

    pub fn deserialize(r: &mut FieldReader<'_>) -> Result<Self, Error> {
        let signature = r.read_len_prefixed("footer signature")?.to_vec();
        if signature.is_empty() {
            return Err(Error::InvalidMessage("footer signature is empty".into()));
        }
        if !r.is_empty() {
            return Err(Error::InvalidMessage(
                "trailing bytes after footer signature".into(),
            ));
        }
        Ok(Self { signature })
    }
}
