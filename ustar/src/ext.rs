//! Extention traits for base types defined in `ustar-core`.
use std::error::Error as StdError;
use std::ffi::OsStr;
use std::io::{self, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

use blake3::{Hash, Hasher};
use ustar_core::{ArchiveSrc, Cursor, EntryHeader};

use crate::Error;

pub trait EntryExt {
    fn check_path(&self) -> Result<PathBuf, Error>;
}

impl EntryExt for EntryHeader {
    /// Iterate the components of the full path and ensure that there are no
    /// components leaving the extract directory. `.` components are dropped,
    /// so the result may be empty.
    fn check_path(&self) -> Result<PathBuf, Error> {
        let path_bytes = self.path_bytes();
        let path = Path::new(OsStr::from_bytes(&path_bytes));
        let mut checked = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => checked.push(part),
                Component::CurDir => {}
                invalid => {
                    let bad_component: &Path = invalid.as_ref();
                    return Err(Error::InvalidPath {
                        entry: path.to_path_buf(),
                        component: bad_component.to_path_buf(),
                    });
                }
            }
        }
        Ok(checked)
    }
}

/// Reads the content of a cursor's current entry through [`std::io::Read`]
pub struct EntryReader<'a, S: ArchiveSrc> {
    cursor: &'a mut Cursor<S>,
}

impl<S> Read for EntryReader<'_, S>
where
    S: ArchiveSrc,
    S::Err: StdError + Send + Sync + 'static,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.cursor.entry_at_end() {
            return Ok(0);
        }
        self.cursor.read_content(buf).map_err(io::Error::other)
    }
}

pub trait CursorExt<S: ArchiveSrc> {
    /// Reader over the remaining content of the current entry; reads return
    /// 0 once the entry is consumed.
    fn entry_reader(&mut self) -> EntryReader<'_, S>;
}

impl<S: ArchiveSrc> CursorExt<S> for Cursor<S> {
    fn entry_reader(&mut self) -> EntryReader<'_, S> {
        EntryReader { cursor: self }
    }
}

/// Copy `read` to `write` and hash everything that passes through
pub(crate) fn copy_and_hash<R: Read, W: Write>(
    mut read: R,
    mut write: W,
    buf: &mut [u8],
) -> Result<(u64, Hash), io::Error> {
    let mut hasher = Hasher::new();
    let mut total = 0;
    loop {
        let count = read.read(buf)?;
        if count == 0 {
            break;
        }
        total += count as u64;
        write.write_all(&buf[..count])?;
        hasher.update_rayon(&buf[..count]);
    }
    Ok((total, hasher.finalize()))
}
