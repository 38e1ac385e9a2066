#![no_main]

use libfuzzer_sys::fuzz_target;
use mc_protocol::core::primitives::{McRead, McWrite};
use mc_protocol::core::varint::{peek_varint, varint_len};

fuzz_target!(|data: &[u8]| {
    let mut reader = data;
    let streamed = reader.read_varint();

    match peek_varint(data) {
        Ok(Some((value, len))) => {
            assert_eq!(streamed.ok(), Some(value));
            assert!(len <= 5);

            let mut out = Vec::new();
            out.write_varint(value).expect("vec writes cannot fail");
            assert_eq!(out.len(), varint_len(value));
        }
        Ok(None) => assert!(streamed.is_err()),
        Err(_) => assert!(streamed.is_err()),
    }

    let mut reader = data;
    let _ = reader.read_varlong();
});
