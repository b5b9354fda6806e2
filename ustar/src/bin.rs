use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use ustar_core::{Cursor, EntryHeader, EntryKind, Mode};

use crate::ext::{copy_and_hash, CursorExt, EntryExt};
use crate::{wrap_io_err, ArchiveFile, Error, READ_WRITE_HASH_BUF_SIZE};

/// Open an archive file and position a cursor on its first entry
pub fn open(archive_path: impl AsRef<Path>) -> Result<Cursor<ArchiveFile>, Error> {
    Cursor::open(ArchiveFile::open(archive_path)?)
}

/// Archive errors raised inside an [`EntryReader`](crate::ext::EntryReader)
/// come back out unchanged; any other I/O error is wrapped.
fn entry_err(err: io::Error, wrap: impl FnOnce(io::Error) -> Error) -> Error {
    err.downcast::<Error>().unwrap_or_else(wrap)
}

fn mode_string(kind: EntryKind, mode: Mode) -> String {
    let bit = |flag: Mode, c: char| if mode.contains(flag) { c } else { '-' };
    let special = |exec: Mode, flag: Mode, set: char| {
        match (mode.contains(exec), mode.contains(flag)) {
            (true, true) => set,
            (false, true) => set.to_ascii_uppercase(),
            (true, false) => 'x',
            (false, false) => '-',
        }
    };
    [
        kind.symbol(),
        bit(Mode::USER_READ, 'r'),
        bit(Mode::USER_WRITE, 'w'),
        special(Mode::USER_EXEC, Mode::SUID, 's'),
        bit(Mode::GROUP_READ, 'r'),
        bit(Mode::GROUP_WRITE, 'w'),
        special(Mode::GROUP_EXEC, Mode::SGID, 's'),
        bit(Mode::OTHER_READ, 'r'),
        bit(Mode::OTHER_WRITE, 'w'),
        special(Mode::OTHER_EXEC, Mode::SVTX, 't'),
    ]
    .iter()
    .collect()
}

/// A `tar tv` style line for one entry
pub fn long_listing(header: &EntryHeader) -> String {
    let owner = if header.uname.is_empty() {
        header.uid.to_string()
    } else {
        header.uname().into_owned()
    };
    let group = if header.gname.is_empty() {
        header.gid.to_string()
    } else {
        header.gname().into_owned()
    };
    let mtime = i64::try_from(header.mtime)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| header.mtime.to_string());

    let mut line = format!(
        "{} {}/{} {:>10} {} {}",
        mode_string(header.kind(), header.mode()),
        owner,
        group,
        header.size,
        mtime,
        header.path(),
    );
    match header.kind() {
        EntryKind::Symlink => {
            line.push_str(" -> ");
            line.push_str(&header.linkname());
        }
        EntryKind::HardLink => {
            line.push_str(" link to ");
            line.push_str(&header.linkname());
        }
        _ => {}
    }
    line
}

/// Write one line per entry to `out`, stopping at the end of the archive
pub fn list(archive_path: impl AsRef<Path>, verbose: bool, out: &mut impl Write) -> Result<(), Error> {
    let mut cursor = open(archive_path)?;
    for header in cursor.headers() {
        let header = header?;
        let written = if verbose {
            writeln!(out, "{}", long_listing(&header))
        } else {
            writeln!(out, "{} ({} bytes)", header.path(), header.size)
        };
        written.map_err(wrap_io_err!("Write listing"))?;
    }
    cursor.close()
}

/// Copy the content of the entry at `entry_path` to `out`
pub fn cat(
    archive_path: impl AsRef<Path>,
    entry_path: &str,
    out: &mut impl Write,
) -> Result<(), Error> {
    let mut cursor = open(archive_path)?;
    while !cursor.is_at_end() {
        if *cursor.current_header()?.path_bytes() == *entry_path.as_bytes() {
            io::copy(&mut cursor.entry_reader(), out)
                .map_err(|err| entry_err(err, wrap_io_err!("Copy entry")))?;
            return cursor.close();
        }
        cursor.advance()?;
    }
    Err(Error::NotFound(PathBuf::from(entry_path)))
}

/// Write the blake3 hash of every file entry's content to `out`
pub fn hash(archive_path: impl AsRef<Path>, out: &mut impl Write) -> Result<(), Error> {
    let mut cursor = open(archive_path)?;
    let mut buf = vec![0; READ_WRITE_HASH_BUF_SIZE];
    while !cursor.is_at_end() {
        let header = cursor.current_header()?.clone();
        if header.kind().is_file() {
            let (_, hash) = copy_and_hash(cursor.entry_reader(), io::sink(), &mut buf)
                .map_err(|err| entry_err(err, wrap_io_err!("Hash entry")))?;
            writeln!(out, "{}  {}", hash.to_hex(), header.path())
                .map_err(wrap_io_err!("Write hash"))?;
        }
        cursor.advance()?;
    }
    cursor.close()
}

/// Unpack directories and regular files into `base_dir`
pub fn extract(archive_path: impl AsRef<Path>, base_dir: impl AsRef<Path>) -> Result<(), Error> {
    let base_dir = base_dir.as_ref();
    let mut cursor = open(archive_path)?;
    let mut buf = vec![0; READ_WRITE_HASH_BUF_SIZE];

    while !cursor.is_at_end() {
        let header = cursor.current_header()?.clone();
        let relative = header.check_path()?;
        let target = base_dir.join(&relative);

        match header.kind() {
            EntryKind::Directory => {
                tracing::debug!(path = %target.display(), "create directory");
                fs::create_dir_all(&target).map_err(wrap_io_err!(target, "Create directory"))?;
            }
            kind if kind.is_file() && relative.as_os_str().is_empty() => {
                return Err(Error::InvalidPath {
                    entry: PathBuf::from(header.path()),
                    component: relative,
                });
            }
            kind if kind.is_file() => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(wrap_io_err!(parent, "Create directory"))?;
                }
                tracing::debug!(path = %target.display(), size = header.size, "extract file");
                let mut file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(header.mode().perm().bits())
                    .open(&target)
                    .map_err(wrap_io_err!(target, "Open file"))?;
                copy_and_hash(cursor.entry_reader(), &mut file, &mut buf)
                    .map_err(|err| entry_err(err, wrap_io_err!(target, "Write file")))?;
            }
            kind => {
                tracing::warn!(path = %relative.display(), ?kind, "skipping unsupported entry");
            }
        }
        cursor.advance()?;
    }
    cursor.close()
}
