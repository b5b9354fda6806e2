bitflags::bitflags! {
    /// Permission bits of the USTAR mode field
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Mode: u32 {
        const SUID = 0o4000;
        const SGID = 0o2000;
        const SVTX = 0o1000;

        const USER_READ = 0o400;
        const USER_WRITE = 0o200;
        const USER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;

        const PERM = 0o777;
    }
}

impl Mode {
    /// The rwx bits only, without set-id and sticky bits
    pub fn perm(self) -> Mode {
        self & Mode::PERM
    }
}

/// Kind of an entry, taken from the header's typeflag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `'0'`, or NUL in pre-POSIX archives
    Regular,
    HardLink,
    Symlink,
    CharDevice,
    BlockDevice,
    Directory,
    Fifo,
    Contiguous,
    Other(u8),
}

impl EntryKind {
    pub fn from_typeflag(typeflag: u8) -> Self {
        match typeflag {
            b'0' | 0 => EntryKind::Regular,
            b'1' => EntryKind::HardLink,
            b'2' => EntryKind::Symlink,
            b'3' => EntryKind::CharDevice,
            b'4' => EntryKind::BlockDevice,
            b'5' => EntryKind::Directory,
            b'6' => EntryKind::Fifo,
            b'7' => EntryKind::Contiguous,
            other => EntryKind::Other(other),
        }
    }

    /// Whether the entry's content bytes are file data
    pub fn is_file(self) -> bool {
        matches!(self, EntryKind::Regular | EntryKind::Contiguous)
    }

    /// Single character used by `ls -l` style listings
    pub fn symbol(self) -> char {
        match self {
            EntryKind::Regular | EntryKind::Contiguous => '-',
            EntryKind::HardLink => 'h',
            EntryKind::Symlink => 'l',
            EntryKind::CharDevice => 'c',
            EntryKind::BlockDevice => 'b',
            EntryKind::Directory => 'd',
            EntryKind::Fifo => 'p',
            EntryKind::Other(_) => '?',
        }
    }
}
