//! The packed struct represents the on-disk USTAR header block

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem;
use core::ops::Range;

use bytemuck::{Pod, PodCastError, Zeroable};

use crate::{octal, EntryKind, Error, Mode, BLOCK_SIZE};

/// Magic of a POSIX USTAR header, including the terminating NUL
pub const MAGIC: &[u8; 6] = b"ustar\0";

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct RawHeader {
    /// NUL-terminated entry name
    pub name: [u8; 100],
    pub mode: [u8; 8],
    pub uid: [u8; 8],
    pub gid: [u8; 8],
    /// Size in bytes of the content following this block
    pub size: [u8; 12],
    pub mtime: [u8; 12],
    /// Octal sum of the block, computed with this field as spaces
    pub checksum: [u8; 8],
    pub typeflag: u8,
    pub linkname: [u8; 100],
    pub magic: [u8; 6],
    pub version: [u8; 2],
    pub uname: [u8; 32],
    pub gname: [u8; 32],
    pub devmajor: [u8; 8],
    pub devminor: [u8; 8],
    /// Prepended to `name` with a `/` when not empty
    pub prefix: [u8; 155],
    pub padding: [u8; 12],
}

const _: () = assert!(mem::size_of::<RawHeader>() == BLOCK_SIZE);

const CHECKSUM_FIELD: Range<usize> = 148..156;

impl RawHeader {
    /// Reinterpret a block as a header. `data` must be exactly one block.
    pub fn from_bytes(data: &[u8]) -> Result<&RawHeader, Error> {
        if data.len() != BLOCK_SIZE {
            return Err(Error::Cast(PodCastError::SizeMismatch));
        }
        Ok(bytemuck::try_from_bytes(data)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Whether every byte of the block is zero, as in the end-of-archive
    /// marker blocks
    pub fn is_zero(&self) -> bool {
        self.as_bytes().iter().all(|&b| b == 0)
    }
}

/// Sum of all bytes of the block, with the checksum field counted as eight
/// ASCII spaces.
pub fn checksum(raw: &RawHeader) -> u32 {
    let bytes = raw.as_bytes();
    let sum = |range: &[u8]| range.iter().map(|&b| u32::from(b)).sum::<u32>();
    256 + sum(&bytes[..CHECKSUM_FIELD.start]) + sum(&bytes[CHECKSUM_FIELD.end..])
}

/// Retrieve a string field, ending at the first NUL and at most one byte
/// shorter than the field.
fn field_bytes(field: &[u8]) -> Vec<u8> {
    let max = field.len().saturating_sub(1);
    let len = field[..max].iter().position(|&b| b == 0).unwrap_or(max);
    field[..len].to_vec()
}

/// Decoded header of one archive entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryHeader {
    pub name: Vec<u8>,
    pub prefix: Vec<u8>,
    pub linkname: Vec<u8>,
    pub uname: Vec<u8>,
    pub gname: Vec<u8>,
    pub typeflag: u8,
    pub mode: u64,
    pub uid: u64,
    pub gid: u64,
    pub size: u64,
    pub mtime: u64,
    pub devmajor: u64,
    pub devminor: u64,
}

impl EntryHeader {
    pub fn kind(&self) -> EntryKind {
        EntryKind::from_typeflag(self.typeflag)
    }

    pub fn mode(&self) -> Mode {
        Mode::from_bits_truncate(self.mode as u32)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Full path of the entry: `prefix/name`, or `name` without a prefix
    pub fn path_bytes(&self) -> Cow<'_, [u8]> {
        if self.prefix.is_empty() {
            return Cow::Borrowed(&self.name);
        }
        let mut path = Vec::with_capacity(self.prefix.len() + 1 + self.name.len());
        path.extend_from_slice(&self.prefix);
        path.push(b'/');
        path.extend_from_slice(&self.name);
        Cow::Owned(path)
    }

    pub fn path(&self) -> String {
        String::from_utf8_lossy(&self.path_bytes()).into_owned()
    }

    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn linkname(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.linkname)
    }

    pub fn uname(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.uname)
    }

    pub fn gname(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.gname)
    }
}

/// Round `offset` up to the next multiple of [`BLOCK_SIZE`]
pub fn align_up(offset: u64) -> Option<u64> {
    let mask = BLOCK_SIZE as u64 - 1;
    offset.checked_add(mask).map(|n| n & !mask)
}

/// Outcome of decoding one header block
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    Entry(EntryHeader),
    /// A zero block, or a block that is not a USTAR header
    EndOfArchive,
}

/// Validate and decode a raw header block.
///
/// A block whose checksum field starts with NUL, or whose magic is not
/// [`MAGIC`], ends the archive. A checksum mismatch or a malformed numeric
/// field is an error.
pub fn decode(raw: &RawHeader) -> Result<Decoded, Error> {
    if raw.checksum[0] == 0 {
        return Ok(Decoded::EndOfArchive);
    }

    let computed = checksum(raw);
    let stored = octal::decode("checksum", &raw.checksum)?;
    if stored != u64::from(computed) {
        return Err(Error::Checksum { stored, computed });
    }

    if &raw.magic != MAGIC {
        tracing::debug!(magic = ?raw.magic, "unrecognized header magic");
        return Ok(Decoded::EndOfArchive);
    }

    let header = EntryHeader {
        name: field_bytes(&raw.name),
        prefix: field_bytes(&raw.prefix),
        linkname: field_bytes(&raw.linkname),
        uname: field_bytes(&raw.uname),
        gname: field_bytes(&raw.gname),
        typeflag: raw.typeflag,
        mode: octal::decode("mode", &raw.mode)?,
        uid: octal::decode("uid", &raw.uid)?,
        gid: octal::decode("gid", &raw.gid)?,
        size: octal::decode("size", &raw.size)?,
        mtime: octal::decode("mtime", &raw.mtime)?,
        devmajor: octal::decode("devmajor", &raw.devmajor)?,
        devminor: octal::decode("devminor", &raw.devminor)?,
    };
    tracing::trace!(path = %header.path(), size = header.size, "decoded header");
    Ok(Decoded::Entry(header))
}
