//! Writes small USTAR archives for the integration tests
#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytemuck::Zeroable;
use ustar_core::{checksum, octal, RawHeader, BLOCK_SIZE, MAGIC};

pub struct TestDir {
    tmpdir: tempfile::TempDir,
}

impl TestDir {
    pub fn new() -> io::Result<TestDir> {
        Ok(TestDir {
            tmpdir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.tmpdir.path().join(path)
    }
}

fn put(field: &mut [u8], value: &str) {
    field[..value.len()].copy_from_slice(value.as_bytes());
}

pub fn seal(raw: &mut RawHeader) {
    let sum = checksum(raw);
    octal::encode(u64::from(sum), &mut raw.checksum[..7]).unwrap();
    raw.checksum[7] = b' ';
}

pub fn raw_header(typeflag: u8, prefix: &str, name: &str, mode: u64, size: u64) -> RawHeader {
    let mut raw = RawHeader::zeroed();
    put(&mut raw.name, name);
    put(&mut raw.prefix, prefix);
    octal::encode(mode, &mut raw.mode).unwrap();
    octal::encode(1000, &mut raw.uid).unwrap();
    octal::encode(100, &mut raw.gid).unwrap();
    octal::encode(size, &mut raw.size).unwrap();
    octal::encode(1_700_000_000, &mut raw.mtime).unwrap();
    raw.typeflag = typeflag;
    raw.magic = *MAGIC;
    raw.version = *b"00";
    put(&mut raw.uname, "alice");
    put(&mut raw.gname, "users");
    seal(&mut raw);
    raw
}

#[derive(Default)]
pub struct TarBuilder {
    data: Vec<u8>,
}

impl TarBuilder {
    pub fn new() -> TarBuilder {
        TarBuilder::default()
    }

    pub fn raw(mut self, raw: RawHeader, contents: &[u8]) -> TarBuilder {
        self.data.extend_from_slice(raw.as_bytes());
        self.data.extend_from_slice(contents);
        let padded = self.data.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        self.data.resize(padded, 0);
        self
    }

    pub fn file(self, name: &str, contents: &[u8]) -> TarBuilder {
        self.file_in("", name, contents)
    }

    pub fn file_in(self, prefix: &str, name: &str, contents: &[u8]) -> TarBuilder {
        let raw = raw_header(b'0', prefix, name, 0o644, contents.len() as u64);
        self.raw(raw, contents)
    }

    pub fn dir(self, name: &str) -> TarBuilder {
        self.raw(raw_header(b'5', "", name, 0o755, 0), &[])
    }

    pub fn symlink(self, name: &str, target: &str) -> TarBuilder {
        let mut raw = raw_header(b'2', "", name, 0o777, 0);
        put(&mut raw.linkname, target);
        seal(&mut raw);
        self.raw(raw, &[])
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.data.resize(self.data.len() + 2 * BLOCK_SIZE, 0);
        self.data
    }

    pub fn write(self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, self.finish())
    }
}
