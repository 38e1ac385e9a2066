#![no_main]

use libfuzzer_sys::fuzz_target;
use mc_protocol::nbt::{self, from_native, to_native, Schema};

fuzz_target!(|data: &[u8]| {
    let Ok(root) = nbt::from_bytes(data) else {
        return;
    };

    // compare bytes, NaN payloads never compare equal as values
    let bytes = nbt::to_bytes(&root).expect("decoded tree must encode");
    let again = nbt::from_bytes(&bytes).expect("encoded tree must decode");
    assert_eq!(nbt::to_bytes(&again).expect("re-encode"), bytes);

    // the first list element drives a list schema, so only require no panic
    if let Some(schema) = Schema::of(&root.tag) {
        let _ = from_native(&to_native(&root.tag), Some(&schema));
    }
});
