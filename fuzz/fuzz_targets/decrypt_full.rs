#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

use bastion_envelope::{Bastion, RawAesMasterKey, RawAesMasterKeyProvider};

static CLIENT: Lazy<Bastion> = Lazy::new(|| {
    let provider = RawAesMasterKeyProvider::new(
        "raw-aes",
        vec![RawAesMasterKey::new("raw-aes", "fuzz-key", &[0x42; 32])],
    )
    .expect("provider");
    Bastion::new(provider)
});

fuzz_target!(|data: &[u8]| {
    let _ = CLIENT.decrypt(data);
});
