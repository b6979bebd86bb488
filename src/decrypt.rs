//! Decrypter: single-use driver of the decrypt pipeline.
//!
//! header -> policy gate -> materials -> key derivation -> commitment check
//! -> header auth -> frames -> footer. Any failure poisons the instance;
//! it can never be invoked again.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::aead;
use crate::bodyaad;
use crate::codec::FieldReader;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::format::footer::MessageFooter;
use crate::format::header::{deserialize_header, MessageHeader};
use crate::format::{deserialize_body, MESSAGE_FORMAT_VERSION};
use crate::kdf;
use crate::materials::{DecryptionMaterialsRequest, MaterialsManager};
use crate::policy;
use crate::signature::MessageVerifier;

/// Single-use decrypter. One instance consumes exactly one message; a
/// second call fails with `InvalidState`.
pub struct Decrypter<'a> {
    config: &'a ClientConfig,
    cmm: &'a dyn MaterialsManager,
    verifier: Option<MessageVerifier>,
    header: Option<MessageHeader>,
    derived_data_key: Option<Zeroizing<Vec<u8>>>,
    used: bool,
}

impl<'a> Decrypter<'a> {
    pub fn new(config: &'a ClientConfig, cmm: &'a dyn MaterialsManager) -> Self {
        Self {
            config,
            cmm,
            verifier: None,
            header: None,
            derived_data_key: None,
            used: false,
        }
    }

    /// Decrypt a complete message, returning the plaintext and the parsed
    /// header.
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<(Vec<u8>, MessageHeader), Error> {
        if self.used || self.header.is_some() || self.derived_data_key.is_some() {
            return Err(Error::InvalidState("decrypter already used"));
        }
        self.used = true;

        if ciphertext.is_empty() {
            return Err(Error::InvalidMessage("empty ciphertext".into()));
        }
        // reject before any parsing, so base64 or truncated garbage fails fast
        if ciphertext[0] != MESSAGE_FORMAT_VERSION {
            return Err(Error::InvalidMessage(
                "first byte does not contain a supported message version".into(),
            ));
        }

        let mut reader = FieldReader::new(ciphertext);
        self.decrypt_header(&mut reader)?;
        let plaintext = self.decrypt_body(&mut reader)?;

        if let Some(verifier) = self.verifier.take() {
            let footer = MessageFooter::deserialize(&mut reader)?;
            verifier.verify(&footer.signature)?;
        } else if !reader.is_empty() {
            return Err(Error::UnexpectedFooter);
        }

        let header = self
            .header
            .clone()
            .ok_or(Error::InvalidState("header missing after parse"))?;
        Ok((plaintext, header))
    }

    fn decrypt_header(&mut self, reader: &mut FieldReader<'_>) -> Result<(), Error> {
        let (header, header_auth) =
            deserialize_header(reader, self.config.max_encrypted_data_keys)?;
        let alg = header.algorithm_suite;

        policy::validate_on_decrypt(self.config.commitment_policy, alg)?;

        if alg.is_signing() {
            let mut verifier = MessageVerifier::new(alg)?;
            verifier.update(header.as_bytes());
            verifier.update(&header_auth.serialize());
            self.verifier = Some(verifier);
        }

        let materials = self.cmm.decrypt_materials(DecryptionMaterialsRequest {
            algorithm: alg,
            encrypted_data_keys: &header.encrypted_data_keys,
            encryption_context: &header.encryption_context,
        })?;

        if let Some(verifier) = self.verifier.as_mut() {
            let sec1 = materials
                .verification_key
                .as_deref()
                .ok_or(Error::SignatureInvalid)?;
            verifier.load_verification_key(sec1)?;
        }

        let derived_key = kdf::derive_data_encryption_key(
            materials.data_key.plaintext(),
            alg,
            &header.message_id,
        )?;

        if alg.is_committing() {
            let expected = kdf::calculate_commitment_key(
                materials.data_key.plaintext(),
                alg,
                &header.message_id,
            )?;
            if !bool::from(expected.as_slice().ct_eq(&header.algorithm_suite_data)) {
                return Err(Error::KeyCommitmentFailed);
            }
        }

        aead::validate_header_auth(
            &derived_key,
            header_auth.iv(),
            header_auth.tag(),
            header.as_bytes(),
        )?;

        if self.derived_data_key.is_some() {
            return Err(Error::InvalidState("derived data key already populated"));
        }
        self.derived_data_key = Some(derived_key);

        if self.header.is_some() {
            return Err(Error::InvalidState("header already populated"));
        }
        self.header = Some(header);

        Ok(())
    }

    fn decrypt_body(&mut self, reader: &mut FieldReader<'_>) -> Result<Vec<u8>, Error> {
        let header = self
            .header
            .as_ref()
            .ok_or(Error::InvalidState("header not parsed"))?;
        let derived_key = self
            .derived_data_key
            .as_ref()
            .ok_or(Error::InvalidState("derived data key not populated"))?;

        let frames = deserialize_body(reader, header.algorithm_suite, header.frame_length)?;

        let mut plaintext = Vec::new();
        for frame in &frames {
            let content_string =
                bodyaad::content_string(header.content_type, frame.is_final())?;
            let aad = bodyaad::content_aad_bytes(
                &header.message_id,
                content_string,
                frame.sequence_number(),
                frame.encrypted_content().len(),
            );
            let chunk = aead::decrypt_frame(
                derived_key,
                frame.iv(),
                frame.encrypted_content(),
                frame.auth_tag(),
                &aad,
            )?;
            plaintext.extend_from_slice(&chunk);

            if let Some(verifier) = self.verifier.as_mut() {
                verifier.update(frame.as_bytes());
            }
        }
        Ok(plaintext)
    }
}
