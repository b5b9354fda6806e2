//! In-memory archives for tests

use alloc::vec::Vec;

use bytemuck::Zeroable;

use crate::header::{checksum, RawHeader, MAGIC};
use crate::{octal, BLOCK_SIZE};

pub trait RawHeaderExt {
    /// Recompute the checksum after editing fields
    fn seal(&mut self);
}

impl RawHeaderExt for RawHeader {
    fn seal(&mut self) {
        let sum = checksum(self);
        octal::encode(u64::from(sum), &mut self.checksum[..7]).unwrap();
        self.checksum[7] = b' ';
    }
}

/// A sealed regular file header
pub fn header_block(name: &str, size: u64) -> RawHeader {
    let mut raw = RawHeader::zeroed();
    raw.name[..name.len()].copy_from_slice(name.as_bytes());
    octal::encode(0o644, &mut raw.mode).unwrap();
    octal::encode(1000, &mut raw.uid).unwrap();
    octal::encode(1000, &mut raw.gid).unwrap();
    octal::encode(size, &mut raw.size).unwrap();
    octal::encode(1_700_000_000, &mut raw.mtime).unwrap();
    raw.typeflag = b'0';
    raw.magic = *MAGIC;
    raw.version = *b"00";
    raw.seal();
    raw
}

pub struct ArchiveBuilder {
    data: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> ArchiveBuilder {
        ArchiveBuilder { data: Vec::new() }
    }

    pub fn file(self, name: &str, contents: &[u8]) -> ArchiveBuilder {
        self.entry(header_block(name, contents.len() as u64), contents)
    }

    pub fn entry(mut self, raw: RawHeader, contents: &[u8]) -> ArchiveBuilder {
        self.data.extend_from_slice(raw.as_bytes());
        self.data.extend_from_slice(contents);
        let padded = (self.data.len() + BLOCK_SIZE - 1) / BLOCK_SIZE * BLOCK_SIZE;
        self.data.resize(padded, 0);
        self
    }

    /// Append the two zero blocks that end an archive
    pub fn finish(mut self) -> Vec<u8> {
        self.data.resize(self.data.len() + 2 * BLOCK_SIZE, 0);
        self.data
    }

    pub fn unterminated(self) -> Vec<u8> {
        self.data
    }
}
