//! Round-trip behavior across suites, sizes, and contexts.

use bastion_envelope::suite::{
    AES_256_GCM_HKDF_SHA512_COMMIT_KEY, AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384,
    AlgorithmSuite,
};
use bastion_envelope::{
    inspect, Bastion, ClientConfig, EncryptionContext, Error, RawAesMasterKey,
    RawAesMasterKeyProvider, RESERVED_ENCRYPTION_CONTEXT_KEY,
};

const FRAME_LENGTH: u32 = 64;

fn provider(keys: &[(&str, [u8; 32])]) -> RawAesMasterKeyProvider {
    RawAesMasterKeyProvider::new(
        "raw-aes",
        keys.iter()
            .map(|(id, key)| RawAesMasterKey::new("raw-aes", *id, key))
            .collect(),
    )
    .unwrap()
}

fn client(alg: &'static AlgorithmSuite) -> Bastion {
    let config = ClientConfig::new()
        .with_algorithm(alg)
        .with_frame_length(FRAME_LENGTH)
        .unwrap();
    Bastion::with_config(provider(&[("key-1", [0x10; 32])]), config)
}

fn context() -> EncryptionContext {
    let mut ec = EncryptionContext::new();
    ec.insert("department".into(), "billing".into());
    ec.insert("year".into(), "2024".into());
    ec
}

#[test]
fn roundtrip_all_suites_and_sizes() {
    let fl = FRAME_LENGTH as usize;
    let sizes = [
        0,
        1,
        fl - 1,
        fl,
        fl + 1,
        2 * fl,
        3 * fl + 7,
        10 * fl,
    ];

    for alg in [
        &AES_256_GCM_HKDF_SHA512_COMMIT_KEY,
        &AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384,
    ] {
        let client = client(alg);
        let ec = context();
        for size in sizes {
            let plaintext: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
            let (message, _) = client.encrypt(&plaintext, &ec).unwrap();
            let (decrypted, header) = client.decrypt(&message).unwrap();
            assert_eq!(decrypted, plaintext, "suite {} size {}", alg, size);
            assert_eq!(header.algorithm_suite.id, alg.id);
            assert_eq!(header.frame_length, FRAME_LENGTH);
        }
    }
}

#[test]
fn header_context_matches_after_stripping_reserved_entry() {
    let client = client(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384);
    let ec = context();
    let (message, _) = client.encrypt(b"context check", &ec).unwrap();
    let (_, header) = client.decrypt(&message).unwrap();

    let mut parsed = header.encryption_context.clone();
    assert!(parsed.remove(RESERVED_ENCRYPTION_CONTEXT_KEY).is_some());
    assert_eq!(parsed, ec);
}

#[test]
fn non_signing_suite_carries_context_verbatim() {
    let client = client(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY);
    let ec = context();
    let (message, _) = client.encrypt(b"context check", &ec).unwrap();
    let (_, header) = client.decrypt(&message).unwrap();
    assert_eq!(header.encryption_context, ec);
}

#[test]
fn empty_context_roundtrip() {
    let client = client(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY);
    let ec = EncryptionContext::new();
    let (message, _) = client.encrypt(b"no context", &ec).unwrap();
    let (decrypted, header) = client.decrypt(&message).unwrap();
    assert_eq!(decrypted, b"no context");
    assert!(header.encryption_context.is_empty());
}

#[test]
fn any_member_key_can_decrypt() {
    let config = ClientConfig::new().with_frame_length(FRAME_LENGTH).unwrap();
    let sender = Bastion::with_config(
        provider(&[("key-1", [0x10; 32]), ("key-2", [0x20; 32])]),
        config,
    );
    let ec = context();
    let (message, header) = sender.encrypt(b"two recipients", &ec).unwrap();
    assert_eq!(header.encrypted_data_keys.len(), 2);

    let second_only = Bastion::with_config(provider(&[("key-2", [0x20; 32])]), config);
    let (decrypted, _) = second_only.decrypt(&message).unwrap();
    assert_eq!(decrypted, b"two recipients");
}

#[test]
fn wrong_key_cannot_decrypt() {
    let config = ClientConfig::new().with_frame_length(FRAME_LENGTH).unwrap();
    let sender = Bastion::with_config(provider(&[("key-1", [0x10; 32])]), config);
    let stranger = Bastion::with_config(provider(&[("key-1", [0x99; 32])]), config);

    let (message, _) = sender.encrypt(b"secret", &context()).unwrap();
    assert!(matches!(
        stranger.decrypt(&message).unwrap_err(),
        Error::Materials(_)
    ));
}

#[test]
fn messages_are_unique_per_invocation() {
    let client = client(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY);
    let ec = context();
    let (a, header_a) = client.encrypt(b"same plaintext", &ec).unwrap();
    let (b, header_b) = client.encrypt(b"same plaintext", &ec).unwrap();
    assert_ne!(header_a.message_id, header_b.message_id);
    assert_ne!(a, b);
}

#[test]
fn inspect_reads_metadata_without_keys() {
    let client = client(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384);
    let (message, _) = client.encrypt(b"inspect me", &context()).unwrap();

    let info = inspect(&message).unwrap();
    assert_eq!(info.algorithm_id, 0x0578);
    assert!(info.is_signing);
    assert_eq!(info.frame_length, FRAME_LENGTH);
    assert_eq!(info.encrypted_data_key_count, 1);
    assert_eq!(info.total_bytes, message.len());
    assert_eq!(
        info.encryption_context.get("department").map(String::as_str),
        Some("billing")
    );
}

#[test]
fn signing_suite_emits_footer_and_non_signing_does_not() {
    let ec = EncryptionContext::new();

    let signing = client(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY_ECDSA_P384);
    let (signed, signed_header) = signing.encrypt(b"x", &ec).unwrap();

    let plain = client(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY);
    let (unsigned, unsigned_header) = plain.encrypt(b"x", &ec).unwrap();

    // same body shape; the signed message must carry extra trailing bytes
    // (larger header context + footer)
    assert!(signed.len() > unsigned.len());
    assert!(signed_header.algorithm_suite.is_signing());
    assert!(!unsigned_header.algorithm_suite.is_signing());
}

#[test]
fn exact_multiple_of_frame_length_ends_with_empty_final_frame() {
    let client = client(&AES_256_GCM_HKDF_SHA512_COMMIT_KEY);
    let ec = EncryptionContext::new();
    let plaintext = vec![0x55u8; 2 * FRAME_LENGTH as usize];

    let (message, header) = client.encrypt(&plaintext, &ec).unwrap();
    let header_len = header.as_bytes().len();
    let header_auth_len = 12 + 16;
    let regular_frame_len = 4 + 12 + FRAME_LENGTH as usize + 16;
    let empty_final_frame_len = 4 + 4 + 12 + 4 + 16;
    assert_eq!(
        message.len(),
        header_len + header_auth_len + 2 * regular_frame_len + empty_final_frame_len
    );

    let (decrypted, _) = client.decrypt(&message).unwrap();
    assert_eq!(decrypted, plaintext);
}
