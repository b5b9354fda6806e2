use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use ustar_core::ArchiveSrc;

use crate::{wrap_io_err, Error};

/// An archive file on disk
#[derive(Debug)]
pub struct ArchiveFile {
    path: PathBuf,
    src: Option<BufReader<File>>,
}

impl ArchiveFile {
    pub fn open(path: impl AsRef<Path>) -> Result<ArchiveFile, Error> {
        let path = path.as_ref().to_path_buf();
        tracing::debug!(path = %path.display(), "opening archive");

        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(wrap_io_err!(path, "Open"))?;

        Ok(ArchiveFile {
            path,
            src: Some(BufReader::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArchiveSrc for ArchiveFile {
    type Err = Error;

    fn seek(&mut self, offset: u64) -> Result<(), Error> {
        let ArchiveFile { path, src } = self;
        let Some(src) = src else {
            return Err(Error::Core(ustar_core::Error::Closed));
        };
        src.seek(SeekFrom::Start(offset))
            .map_err(wrap_io_err!(path, "Seek"))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let ArchiveFile { path, src } = self;
        let Some(src) = src else {
            return Err(Error::Core(ustar_core::Error::Closed));
        };
        loop {
            match src.read(buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                res => return res.map_err(wrap_io_err!(path, "Read")),
            }
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        match self.src.take() {
            Some(_) => {
                tracing::debug!(path = %self.path.display(), "closed archive");
                Ok(())
            }
            None => Err(Error::Core(ustar_core::Error::Closed)),
        }
    }

    fn core_error(err: &Error) -> Option<ustar_core::Error> {
        match err {
            Error::Core(err) => Some(err.clone()),
            _ => None,
        }
    }
}
