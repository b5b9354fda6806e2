#![no_std]
extern crate alloc;
#[cfg(test)]
extern crate std;

pub use crate::cursor::{Cursor, Headers};
pub use crate::error::Error;
pub use crate::header::{align_up, checksum, decode, Decoded, EntryHeader, RawHeader, MAGIC};
pub use crate::mode::{EntryKind, Mode};
pub use crate::src::{ArchiveBuf, ArchiveSrc};

mod cursor;
mod error;
mod header;
mod mode;
pub mod octal;
mod src;
#[cfg(test)]
mod test;

/// Size of a header block, and the alignment of every header
pub const BLOCK_SIZE: usize = 512;
pub const HEADER_SIZE: usize = core::mem::size_of::<RawHeader>();

