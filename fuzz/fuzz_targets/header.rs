#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate ustar_core;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = ustar_core::RawHeader::from_bytes(data) {
        let _result = ustar_core::decode(raw);
    }
});
