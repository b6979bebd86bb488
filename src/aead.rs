//! AES-256-GCM engine for header authentication and body frames.
//!
//! Tags are detached because the wire format carries ciphertext and tag as
//! separate fields. The header auth IV is all zeros; frame IVs are the
//! sequence number as a big-endian 96-bit integer, so every (IV, AAD) pair
//! within a message is distinct.

use aes_gcm::{aead::KeyInit, AeadInPlace, Aes256Gcm, Nonce, Tag};

use crate::error::Error;

pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// IV for body frame `seq_num`: u96_be(seq_num).
pub fn frame_iv(seq_num: u32) -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    iv[IV_LEN - 4..].copy_from_slice(&seq_num.to_be_bytes());
    iv
}

/// IV for the header auth: twelve zero bytes.
pub fn header_auth_iv() -> [u8; IV_LEN] {
    [0u8; IV_LEN]
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm, Error> {
    Aes256Gcm::new_from_slice(key)
        .map_err(|_| Error::KeyDerivation("derived key has invalid length".into()))
}

/// GCM tag over empty plaintext with the header bytes as AAD.
pub fn compute_header_auth(key: &[u8], header_bytes: &[u8]) -> Result<[u8; TAG_LEN], Error> {
    let c = cipher(key)?;
    let mut empty: [u8; 0] = [];
    let tag = c
        .encrypt_in_place_detached(Nonce::from_slice(&header_auth_iv()), header_bytes, &mut empty)
        .map_err(|_| Error::HeaderAuthFailed)?;
    let mut out = [0u8; TAG_LEN];
    out.copy_from_slice(tag.as_slice());
    Ok(out)
}

/// Check the header tag: GCM decrypt of empty ciphertext, AAD = header bytes.
pub fn validate_header_auth(
    key: &[u8],
    iv: &[u8],
    tag: &[u8],
    header_bytes: &[u8],
) -> Result<(), Error> {
    if iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(Error::HeaderAuthFailed);
    }
    let c = cipher(key)?;
    let mut empty: [u8; 0] = [];
    c.decrypt_in_place_detached(
        Nonce::from_slice(iv),
        header_bytes,
        &mut empty,
        Tag::from_slice(tag),
    )
    .map_err(|_| Error::HeaderAuthFailed)
}

pub fn encrypt_frame(
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), Error> {
    if iv.len() != IV_LEN {
        return Err(Error::FrameAuthFailed);
    }
    let c = cipher(key)?;
    let mut buf = plaintext.to_vec();
    let tag = c
        .encrypt_in_place_detached(Nonce::from_slice(iv), aad, &mut buf)
        .map_err(|_| Error::FrameAuthFailed)?;
    Ok((buf, tag.as_slice().to_vec()))
}

pub fn decrypt_frame(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, Error> {
    if iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(Error::FrameAuthFailed);
    }
    let c = cipher(key)?;
    let mut buf = ciphertext.to_vec();
    c.decrypt_in_place_detached(Nonce::from_slice(iv), aad, &mut buf, Tag::from_slice(tag))
        .map_err(|_| Error::FrameAuthFailed)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x42; 32];

    #[test]
    fn frame_iv_is_big_endian_sequence_number() {
        assert_eq!(frame_iv(1), [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            frame_iv(0x0102_0304),
            [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn frame_roundtrip() {
        let iv = frame_iv(1);
        let (ct, tag) = encrypt_frame(&KEY, &iv, b"payload", b"aad").unwrap();
        assert_eq!(ct.len(), 7);
        assert_eq!(tag.len(), TAG_LEN);
        let pt = decrypt_frame(&KEY, &iv, &ct, &tag, b"aad").unwrap();
        assert_eq!(pt, b"payload");
    }

    #[test]
    fn wrong_aad_fails() {
        let iv = frame_iv(1);
        let (ct, tag) = encrypt_frame(&KEY, &iv, b"payload", b"aad").unwrap();
        assert_eq!(
            decrypt_frame(&KEY, &iv, &ct, &tag, b"other"),
            Err(Error::FrameAuthFailed)
        );
    }

    #[test]
    fn header_auth_roundtrip() {
        let header = b"serialized header bytes";
        let tag = compute_header_auth(&KEY, header).unwrap();
        validate_header_auth(&KEY, &header_auth_iv(), &tag, header).unwrap();
        assert_eq!(
            validate_header_auth(&KEY, &header_auth_iv(), &tag, b"tampered"),
            Err(Error::HeaderAuthFailed)
        );
    }
}
