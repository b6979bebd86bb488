#![no_main]

use libfuzzer_sys::fuzz_target;

use bastion_envelope::codec::FieldReader;
use bastion_envelope::format::header::deserialize_header;

fuzz_target!(|data: &[u8]| {
    let mut reader = FieldReader::new(data);
    let _ = deserialize_header(&mut reader, 10);
});
