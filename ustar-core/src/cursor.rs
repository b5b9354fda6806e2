//! Forward-only iteration over the entries of an archive

use crate::header::{align_up, decode, Decoded, EntryHeader, RawHeader};
use crate::{ArchiveSrc, Error, BLOCK_SIZE};

const BLOCK: u64 = BLOCK_SIZE as u64;

enum State {
    /// Created, not rewound yet
    Unopened,
    Positioned {
        /// Start of the current header block, always block aligned
        offset: u64,
        /// Next unread content byte, in `offset + 512 ..= end`
        read_pos: u64,
        /// One past the last content byte
        end: u64,
        header: EntryHeader,
    },
    Ended,
    /// Holds the error to report again, when it can be replayed
    Failed(Option<Error>),
}

/// Failure of a cursor step, split by where it came from so that core
/// errors can be kept for later calls
enum Fault<E> {
    Core(Error),
    Src(E),
}

impl<E> From<Error> for Fault<E> {
    fn from(err: Error) -> Self {
        Fault::Core(err)
    }
}

/// Reads an archive one entry at a time.
///
/// The cursor owns its source. Every header is validated before it is
/// exposed, and content reads are clamped to the size the header declares.
/// Any decode, seek or read failure leaves the cursor without a current
/// entry; it stays that way until [`Cursor::rewind`].
pub struct Cursor<S: ArchiveSrc> {
    src: S,
    state: State,
}

impl<S: ArchiveSrc> Cursor<S> {
    /// Wrap a source without reading from it
    pub fn new(src: S) -> Cursor<S> {
        Cursor {
            src,
            state: State::Unopened,
        }
    }

    /// Wrap a source and position the cursor on its first entry
    pub fn open(src: S) -> Result<Cursor<S>, S::Err> {
        let mut cursor = Cursor::new(src);
        cursor.rewind()?;
        Ok(cursor)
    }

    /// Go back to the first entry of the archive.
    ///
    /// Returns `None` if the archive has no entries.
    pub fn rewind(&mut self) -> Result<Option<&EntryHeader>, S::Err> {
        self.state = State::Unopened;
        self.load(0)
    }

    /// Move to the entry following the current one.
    ///
    /// Returns `None` at the end of the archive. Once the archive has ended
    /// or failed, further calls report the same outcome without reading.
    pub fn advance(&mut self) -> Result<Option<&EntryHeader>, S::Err> {
        let next = match &self.state {
            State::Positioned { end, .. } => align_up(*end).ok_or(Error::Overflow),
            State::Ended => return Ok(None),
            State::Failed(Some(err)) => return Err(err.clone().into()),
            State::Failed(None) => return Err(Error::Aborted.into()),
            State::Unopened => return Err(Error::NoCurrentEntry.into()),
        };
        match next {
            Ok(next) => self.load(next),
            Err(err) => Err(self.fail(Fault::Core(err))),
        }
    }

    /// True when there is no current entry
    pub fn is_at_end(&self) -> bool {
        !matches!(self.state, State::Positioned { .. })
    }

    pub fn current_header(&self) -> Result<&EntryHeader, Error> {
        match &self.state {
            State::Positioned { header, .. } => Ok(header),
            _ => Err(Error::NoCurrentEntry),
        }
    }

    /// Byte offset of the current header block
    pub fn offset(&self) -> Option<u64> {
        match self.state {
            State::Positioned { offset, .. } => Some(offset),
            _ => None,
        }
    }

    /// Whether all content bytes of the current entry have been read
    pub fn entry_at_end(&self) -> bool {
        match self.state {
            State::Positioned { read_pos, end, .. } => read_pos >= end,
            _ => true,
        }
    }

    /// Read content of the current entry into `buf`, never past the entry's
    /// declared size.
    ///
    /// Fails with [`Error::EntryExhausted`] once the content is consumed. A
    /// source that ends early fails the cursor with [`Error::Truncated`].
    pub fn read_content(&mut self, buf: &mut [u8]) -> Result<usize, S::Err> {
        let remaining = match self.state {
            State::Positioned { read_pos, end, .. } => end - read_pos,
            _ => return Err(Error::NoCurrentEntry.into()),
        };
        if remaining == 0 {
            return Err(Error::EntryExhausted.into());
        }

        let count = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        if let Err(fault) = self.fill(&mut buf[..count]) {
            return Err(self.fail(fault));
        }
        if let State::Positioned { read_pos, .. } = &mut self.state {
            *read_pos += count as u64;
        }
        Ok(count)
    }

    /// Iterate headers from the current entry to the end of the archive
    pub fn headers(&mut self) -> Headers<'_, S> {
        Headers {
            cursor: self,
            started: false,
            done: false,
        }
    }

    /// Release the source
    pub fn close(mut self) -> Result<(), S::Err> {
        tracing::debug!("closing archive");
        self.src.close()
    }

    fn load(&mut self, offset: u64) -> Result<Option<&EntryHeader>, S::Err> {
        match self.read_header(offset) {
            Ok(Decoded::Entry(header)) => {
                let read_pos = offset + BLOCK;
                match read_pos.checked_add(header.size) {
                    Some(end) => {
                        tracing::debug!(offset, size = header.size, "positioned on entry");
                        self.state = State::Positioned {
                            offset,
                            read_pos,
                            end,
                            header,
                        };
                    }
                    None => return Err(self.fail(Fault::Core(Error::Overflow))),
                }
            }
            Ok(Decoded::EndOfArchive) => {
                tracing::debug!(offset, "end of archive");
                self.state = State::Ended;
            }
            Err(fault) => return Err(self.fail(fault)),
        }
        Ok(self.current_header().ok())
    }

    fn read_header(&mut self, offset: u64) -> Result<Decoded, Fault<S::Err>> {
        offset.checked_add(BLOCK).ok_or(Error::Overflow)?;
        tracing::trace!(offset, "seek to header");
        self.src.seek(offset).map_err(Fault::Src)?;

        let mut block = [0; BLOCK_SIZE];
        self.fill(&mut block)?;
        let raw = RawHeader::from_bytes(&block)?;
        Ok(decode(raw)?)
    }

    /// Read exactly `buf.len()` bytes from the source
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), Fault<S::Err>> {
        let mut filled = 0;
        while filled < buf.len() {
            let count = self.src.read(&mut buf[filled..]).map_err(Fault::Src)?;
            if count == 0 {
                return Err(Fault::Core(Error::Truncated {
                    expected: buf.len(),
                    actual: filled,
                }));
            }
            filled += count;
        }
        Ok(())
    }

    fn fail(&mut self, fault: Fault<S::Err>) -> S::Err {
        match fault {
            Fault::Core(err) => {
                tracing::debug!(error = %err, "archive failed");
                self.state = State::Failed(Some(err.clone()));
                err.into()
            }
            Fault::Src(err) => {
                tracing::debug!("archive source failed");
                self.state = State::Failed(S::core_error(&err));
                err
            }
        }
    }
}

/// Iterator returned by [`Cursor::headers`]
pub struct Headers<'a, S: ArchiveSrc> {
    cursor: &'a mut Cursor<S>,
    started: bool,
    done: bool,
}

impl<S: ArchiveSrc> Iterator for Headers<'_, S> {
    type Item = Result<EntryHeader, S::Err>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Ok(header) = self.cursor.current_header() {
                return Some(Ok(header.clone()));
            }
            self.done = true;
            return None;
        }
        match self.cursor.advance() {
            Ok(Some(header)) => Some(Ok(header.clone())),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::Cursor;
    use crate::test::{header_block, ArchiveBuilder, RawHeaderExt};
    use crate::{ArchiveBuf, ArchiveSrc, Error, BLOCK_SIZE};

    #[test]
    fn hello_scenario() {
        let archive = ArchiveBuilder::new().file("hello.txt", b"hi").finish();
        assert_eq!(archive.len(), 4 * BLOCK_SIZE);

        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();
        let header = cursor.current_header().unwrap();
        assert_eq!(header.name, b"hello.txt");
        assert_eq!(header.size, 2);

        let mut buf = [0; 10];
        assert_eq!(cursor.read_content(&mut buf), Ok(2));
        assert_eq!(&buf[..2], b"hi");
        assert!(cursor.entry_at_end());

        assert_eq!(cursor.advance(), Ok(None));
        assert!(cursor.is_at_end());
    }

    #[test]
    fn entries_in_stream_order() {
        let big = [7u8; 1000];
        let archive = ArchiveBuilder::new()
            .file("a", b"")
            .file("b", &big)
            .file("c", &[1; 512])
            .finish();

        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();
        let mut seen = Vec::new();
        let mut consumed = 0u64;
        loop {
            let header = cursor.current_header().unwrap();
            assert_eq!(cursor.offset(), Some(consumed));
            seen.push(header.path());
            consumed += 512 + (header.size + 511) / 512 * 512;
            if cursor.advance().unwrap().is_none() {
                break;
            }
        }
        assert_eq!(seen, ["a", "b", "c"]);
        // 1 + 1 + 2 + 1 + 1 blocks of entries before the terminator
        assert_eq!(consumed, 6 * 512);
    }

    #[test]
    fn read_is_clamped_to_entry() {
        let archive = ArchiveBuilder::new()
            .file("one", b"0123456789")
            .file("two", b"abc")
            .finish();
        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();

        let mut buf = [0; 4];
        assert_eq!(cursor.read_content(&mut buf), Ok(4));
        assert_eq!(cursor.read_content(&mut buf), Ok(4));
        assert!(!cursor.entry_at_end());
        assert_eq!(cursor.read_content(&mut buf), Ok(2));
        assert_eq!(&buf[..2], b"89");
        assert_eq!(cursor.read_content(&mut buf), Err(Error::EntryExhausted));

        // exhausting an entry is not fatal
        let header = cursor.advance().unwrap().unwrap();
        assert_eq!(header.name, b"two");
        let mut big = [0; 64];
        assert_eq!(cursor.read_content(&mut big), Ok(3));
    }

    #[test]
    fn advance_skips_unread_content() {
        let archive = ArchiveBuilder::new()
            .file("skip", &[9; 700])
            .file("next", b"x")
            .finish();
        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();
        let mut buf = [0; 10];
        cursor.read_content(&mut buf).unwrap();

        let header = cursor.advance().unwrap().unwrap();
        assert_eq!(header.name, b"next");
        assert_eq!(cursor.offset(), Some(3 * 512));
        assert_eq!(cursor.read_content(&mut buf), Ok(1));
        assert_eq!(buf[0], b'x');
    }

    #[test]
    fn empty_archive_is_at_end() {
        let archive = ArchiveBuilder::new().finish();
        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();
        assert!(cursor.is_at_end());
        assert_eq!(cursor.current_header(), Err(Error::NoCurrentEntry));
        assert_eq!(cursor.advance(), Ok(None));
        assert_eq!(cursor.advance(), Ok(None));
    }

    #[test]
    fn unopened_cursor_has_no_entry() {
        let archive = ArchiveBuilder::new().file("a", b"a").finish();
        let mut cursor = Cursor::new(ArchiveBuf::new(&archive));
        assert!(cursor.is_at_end());
        assert_eq!(cursor.advance(), Err(Error::NoCurrentEntry));
        let mut buf = [0; 1];
        assert_eq!(cursor.read_content(&mut buf), Err(Error::NoCurrentEntry));
        assert!(cursor.rewind().unwrap().is_some());
    }

    #[test]
    fn corrupt_header_fails_and_stays_failed() {
        let mut archive = ArchiveBuilder::new()
            .file("good", b"data")
            .file("bad", b"data")
            .finish();
        archive[1024] ^= 0x20;

        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();
        let err = cursor.advance().unwrap_err();
        assert!(matches!(err, Error::Checksum { .. }));
        assert!(err.is_format_error());
        assert!(cursor.is_at_end());
        assert_eq!(cursor.advance(), Err(err));

        // rewinding recovers the readable prefix
        assert!(cursor.rewind().unwrap().is_some());
    }

    #[test]
    fn truncated_content_is_error() {
        let mut archive = ArchiveBuilder::new().file("cut", &[1; 100]).unterminated();
        archive.truncate(512 + 40);

        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();
        let mut buf = [0; 100];
        assert_eq!(
            cursor.read_content(&mut buf),
            Err(Error::Truncated { expected: 100, actual: 40 })
        );
        assert!(cursor.is_at_end());
    }

    #[test]
    fn seek_past_end_is_error() {
        let archive = ArchiveBuilder::new().file("big", &[0; 2048]).unterminated();
        let mut cursor = Cursor::open(ArchiveBuf::new(&archive[..1024])).unwrap();
        assert_eq!(cursor.advance(), Err(Error::Seek(2560)));
        assert_eq!(cursor.advance(), Err(Error::Seek(2560)));
        assert!(cursor.is_at_end());
    }

    #[test]
    fn missing_terminator_is_truncated() {
        let archive = ArchiveBuilder::new().file("a", b"a").unterminated();
        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();
        assert_eq!(
            cursor.advance(),
            Err(Error::Truncated { expected: 512, actual: 0 })
        );
    }

    #[test]
    fn headers_iterates_from_current() {
        let mut raw = header_block("file.txt", 0);
        raw.prefix[..3].copy_from_slice(b"dir");
        raw.seal();
        let archive = ArchiveBuilder::new()
            .file("first", b"1")
            .entry(raw, b"")
            .finish();

        let mut cursor = Cursor::open(ArchiveBuf::new(&archive)).unwrap();
        let paths: Result<Vec<_>, _> = cursor.headers().map(|h| h.map(|h| h.path())).collect();
        assert_eq!(paths.unwrap(), ["first", "dir/file.txt"]);
        assert!(cursor.is_at_end());
    }

    struct FailingSrc;

    impl ArchiveSrc for FailingSrc {
        type Err = Error;

        fn seek(&mut self, _offset: u64) -> Result<(), Error> {
            Err(Error::Closed)
        }

        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Error> {
            Err(Error::Closed)
        }
    }

    #[test]
    fn source_failure_is_not_replayed() {
        let mut cursor = Cursor::new(FailingSrc);
        assert_eq!(cursor.rewind().err(), Some(Error::Closed));
        assert_eq!(cursor.advance(), Err(Error::Aborted));
    }
}
