#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate ustar_core;

use ustar_core::{ArchiveBuf, Cursor};

fuzz_target!(|data: &[u8]| {
    let mut cursor = Cursor::new(ArchiveBuf::new(data));
    if cursor.rewind().is_err() {
        return;
    }
    let mut buf = [0; 512];
    while !cursor.is_at_end() {
        while !cursor.entry_at_end() {
            if cursor.read_content(&mut buf).is_err() {
                return;
            }
        }
        if cursor.advance().is_err() {
            return;
        }
    }
});
