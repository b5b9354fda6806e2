use crate::Error;

/// A readable byte stream holding an archive.
///
/// This is the read capability only; the cursor drives it with absolute
/// seeks followed by sequential reads.
pub trait ArchiveSrc {
    type Err: From<Error>;

    /// Move to an absolute byte offset from the start of the archive
    fn seek(&mut self, offset: u64) -> Result<(), Self::Err>;

    /// Read up to `buf.len()` bytes at the current position. Returning 0 for
    /// a non-empty `buf` means the source has no more data.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Err>;

    /// Release the underlying handle
    fn close(&mut self) -> Result<(), Self::Err> {
        Ok(())
    }

    /// The core error carried by a source error, if any. A failed cursor
    /// reports it again on later calls instead of [`Error::Aborted`].
    fn core_error(_err: &Self::Err) -> Option<Error> {
        None
    }
}

/// An archive held in memory
#[derive(Clone, Debug)]
pub struct ArchiveBuf<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ArchiveBuf<'a> {
    pub fn new(data: &'a [u8]) -> ArchiveBuf<'a> {
        ArchiveBuf { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

impl ArchiveSrc for ArchiveBuf<'_> {
    type Err = Error;

    fn seek(&mut self, offset: u64) -> Result<(), Error> {
        let pos = usize::try_from(offset)?;
        if pos > self.data.len() {
            return Err(Error::Seek(offset));
        }
        self.pos = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let rest = &self.data[self.pos..];
        let count = rest.len().min(buf.len());
        buf[..count].copy_from_slice(&rest[..count]);
        self.pos += count;
        Ok(count)
    }

    fn core_error(err: &Error) -> Option<Error> {
        Some(err.clone())
    }
}
