//! Trailing message signature.
//!
//! Both sides feed identical bytes, in wire order, into a running hash:
//! header bytes, header-auth bytes, then every raw serialized frame. The
//! encrypter signs the final digest (ECDSA, DER-encoded); the decrypter
//! verifies the footer signature against the public key carried in the
//! encryption context.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use p384::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p384::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha384};

use crate::error::Error;
use crate::suite::{AlgorithmSuite, SignatureAlgorithm};

/// Running hash plus private key on the encrypt side.
pub struct MessageSigner {
    digest: Sha384,
    key: SigningKey,
}

impl MessageSigner {
    pub fn new(alg: &AlgorithmSuite, key: SigningKey) -> Result<Self, Error> {
        match alg.authentication.algorithm {
            SignatureAlgorithm::EcdsaP384Sha384 => Ok(Self {
                digest: Sha384::new(),
                key,
            }),
            _ => Err(Error::UnsupportedAlgorithm(alg.id)),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    /// Finalize the hash and produce the DER-encoded signature.
    pub fn sign(self) -> Result<Vec<u8>, Error> {
        let digest = self.digest.finalize();
        let signature: Signature = self
            .key
            .sign_prehash(digest.as_slice())
            .map_err(|_| Error::SignatureInvalid)?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

/// Running hash plus public key on the decrypt side. The key arrives only
/// with the decryption materials, after the header has already been fed.
pub struct MessageVerifier {
    digest: Sha384,
    key: Option<VerifyingKey>,
}

impl MessageVerifier {
    pub fn new(alg: &AlgorithmSuite) -> Result<Self, Error> {
        match alg.authentication.algorithm {
            SignatureAlgorithm::EcdsaP384Sha384 => Ok(Self {
                digest: Sha384::new(),
                key: None,
            }),
            _ => Err(Error::UnsupportedAlgorithm(alg.id)),
        }
    }

    /// Load the SEC1-encoded verification key from the materials.
    pub fn load_verification_key(&mut self, sec1: &[u8]) -> Result<(), Error> {
        let key = VerifyingKey::from_sec1_bytes(sec1).map_err(|_| Error::SignatureInvalid)?;
        self.key = Some(key);
        Ok(())
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    pub fn verify(self, der_signature: &[u8]) -> Result<(), Error> {
        let key = self.key.ok_or(Error::SignatureInvalid)?;
        let signature =
            Signature::from_der(der_signature).map_err(|_| Error::SignatureInvalid)?;
        let digest = self.digest.finalize();
        key.verify_prehash(digest.as_slice(), &signature)
            .map_err(|_| Error::SignatureInvalid)
    }
}

/// Compressed SEC1 point, base64, as stored in the encryption context.
pub fn encode_verification_key(key: &VerifyingKey) -> String {
    BASE64.encode(key.to_encoded_point(true).as_bytes())
}

/// Decode the encryption-context entry back into raw SEC1 bytes.
pub fn decode_verification_key(encoded: &str) -> Result<Vec<u8>, Error> {
    BASE64.decode(encoded).map_err(|_| Error::SignatureInvalid)
}
