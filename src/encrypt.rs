//! Encrypter: single-use driver of the encrypt pipeline.
//!
//! materials -> key derivation -> header + header auth -> frames -> footer.
//! Frames are emitted in strictly ascending sequence order; the body always
//! ends with a final frame, which may carry zero bytes.

use zeroize::Zeroizing;

use crate::aead;
use crate::bodyaad;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::format::body::{Frame, FINAL_FRAME_SENTINEL};
use crate::format::footer::MessageFooter;
use crate::format::header::{HeaderAuth, MessageHeader};
use crate::kdf;
use crate::materials::{EncryptionMaterialsRequest, MaterialsManager};
use crate::policy;
use crate::signature::MessageSigner;
use crate::suite::{self, ContentType, EncryptionContext};

/// Single-use encrypter. One instance drives exactly one message; a second
/// call fails with `InvalidState`.
pub struct Encrypter<'a> {
    config: &'a ClientConfig,
    cmm: &'a dyn MaterialsManager,
    signer: Option<MessageSigner>,
    used: bool,
}

impl<'a> Encrypter<'a> {
    pub fn new(config: &'a ClientConfig, cmm: &'a dyn MaterialsManager) -> Self {
        Self {
            config,
            cmm,
            signer: None,
            used: false,
        }
    }

    /// Encrypt `plaintext` under the caller's encryption context, returning
    /// the complete message and its header.
    pub fn encrypt(
        &mut self,
        plaintext: &[u8],
        encryption_context: &EncryptionContext,
    ) -> Result<(Vec<u8>, MessageHeader), Error> {
        if self.used {
            return Err(Error::InvalidState("encrypter already used"));
        }
        self.used = true;

        let alg = self
            .config
            .algorithm
            .unwrap_or(&suite::AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384);
        policy::validate_on_encrypt(self.config.commitment_policy, alg)?;

        let materials = self.cmm.get_encryption_materials(EncryptionMaterialsRequest {
            algorithm: alg,
            encryption_context,
            plaintext_len: Some(plaintext.len()),
        })?;
        if materials.encrypted_data_keys.is_empty() {
            return Err(Error::Materials("materials carry no encrypted data keys".into()));
        }
        if materials.encrypted_data_keys.len() > self.config.max_encrypted_data_keys {
            return Err(Error::LimitExceeded(format!(
                "materials carry {} encrypted data keys, maximum is {}",
                materials.encrypted_data_keys.len(),
                self.config.max_encrypted_data_keys
            )));
        }

        let mut message_id = vec![0u8; alg.message_id_len()];
        getrandom::getrandom(&mut message_id)
            .map_err(|_| Error::Materials("entropy source unavailable".into()))?;

        let derived_key =
            kdf::derive_data_encryption_key(materials.data_key.plaintext(), alg, &message_id)?;
        let algorithm_suite_data = if alg.is_committing() {
            kdf::calculate_commitment_key(materials.data_key.plaintext(), alg, &message_id)?
                .to_vec()
        } else {
            Vec::new()
        };

        let header = MessageHeader::new(
            alg,
            message_id,
            materials.encryption_context,
            materials.encrypted_data_keys,
            self.config.frame_length,
            algorithm_suite_data,
        )?;

        let header_auth_tag = aead::compute_header_auth(&derived_key, header.as_bytes())?;
        let header_auth = HeaderAuth::new(
            aead::header_auth_iv().to_vec(),
            header_auth_tag.to_vec(),
        );
        let header_auth_bytes = header_auth.serialize();

        if alg.is_signing() {
            let key = materials
                .signing_key
                .ok_or_else(|| Error::Materials("materials missing signing key".into()))?;
            let mut signer = MessageSigner::new(alg, key)?;
            signer.update(header.as_bytes());
            signer.update(&header_auth_bytes);
            self.signer = Some(signer);
        }

        let mut message = Vec::with_capacity(
            header.as_bytes().len() + header_auth_bytes.len() + plaintext.len() + 256,
        );
        message.extend_from_slice(header.as_bytes());
        message.extend_from_slice(&header_auth_bytes);

        self.encrypt_body(&mut message, &header, &derived_key, plaintext)?;

        if let Some(signer) = self.signer.take() {
            let signature = signer.sign()?;
            message.extend_from_slice(&MessageFooter::new(signature).serialize());
        }

        Ok((message, header))
    }

    fn encrypt_body(
        &mut self,
        message: &mut Vec<u8>,
        header: &MessageHeader,
        derived_key: &Zeroizing<Vec<u8>>,
        plaintext: &[u8],
    ) -> Result<(), Error> {
        let frame_length = header.frame_length as usize;
        let full_frames = plaintext.len() / frame_length;
        // the final frame takes sequence number full_frames + 1
        if full_frames as u64 + 1 >= FINAL_FRAME_SENTINEL as u64 {
            return Err(Error::LimitExceeded("frame count".into()));
        }

        let mut seq: u32 = 1;
        for chunk in plaintext.chunks(frame_length) {
            if chunk.len() == frame_length {
                let frame = self.encrypt_frame(header, derived_key, seq, chunk, false)?;
                message.extend_from_slice(frame.as_bytes());
                seq += 1;
            }
        }
        let tail = &plaintext[full_frames * frame_length..];
        let frame = self.encrypt_frame(header, derived_key, seq, tail, true)?;
        message.extend_from_slice(frame.as_bytes());
        Ok(())
    }

    fn encrypt_frame(
        &mut self,
        header: &MessageHeader,
        derived_key: &Zeroizing<Vec<u8>>,
        seq: u32,
        chunk: &[u8],
        is_final: bool,
    ) -> Result<Frame, Error> {
        let content_string = bodyaad::content_string(ContentType::Framed, is_final)?;
        let aad = bodyaad::content_aad_bytes(&header.message_id, content_string, seq, chunk.len());
        let iv = aead::frame_iv(seq);
        let (ciphertext, tag) = aead::encrypt_frame(derived_key, &iv, chunk, &aad)?;

        let frame = if is_final {
            Frame::final_frame(seq, iv.to_vec(), ciphertext, tag)
        } else {
            Frame::regular(seq, iv.to_vec(), ciphertext, tag)
        };
        if let Some(signer) = self.signer.as_mut() {
            signer.update(frame.as_bytes());
        }
        Ok(frame)
    }
}
