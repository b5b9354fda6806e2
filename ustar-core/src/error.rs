use alloc::format;
use alloc::string::ToString;
use core::error;
use core::fmt::{Display, Formatter, Result};

use bytemuck::PodCastError;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A failure that happened at the source and was already reported once
    Aborted,
    Cast(PodCastError),
    /// Stored header checksum does not match the computed one
    Checksum { stored: u64, computed: u32 },
    Closed,
    EntryExhausted,
    InvalidOctal { field: &'static str, byte: u8 },
    NoCurrentEntry,
    Overflow,
    Seek(u64),
    /// The source ended before a header or entry content was complete
    Truncated { expected: usize, actual: usize },
    TryFromInt(core::num::TryFromIntError),
}

impl Error {
    /// Whether this error means the archive itself is malformed, as opposed
    /// to a misuse of the cursor or a failure of the source.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::Cast(_)
                | Error::Checksum { .. }
                | Error::InvalidOctal { .. }
                | Error::Overflow
                | Error::Truncated { .. }
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        let msg = match self {
            Aborted => "Archive iteration aborted by an earlier failure".to_string(),
            Cast(err) => format!("Cast: {:?}", err),
            Checksum { stored, computed } => format!(
                "Header checksum mismatch: stored {:o}, computed {:o}",
                stored, computed
            ),
            Closed => "Archive source closed".to_string(),
            EntryExhausted => "Entry content already consumed".to_string(),
            InvalidOctal { field, byte } => {
                format!("Invalid octal digit {:#04x} in {} field", byte, field)
            }
            NoCurrentEntry => "No current entry".to_string(),
            Overflow => "Overflow".to_string(),
            Seek(offset) => format!("Seek to {} failed", offset),
            Truncated { expected, actual } => format!(
                "Truncated archive: expected {} bytes, got {}",
                expected, actual
            ),
            TryFromInt(err) => format!("TryFromInt: {}", err),
        };
        write!(f, "{}", msg)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::TryFromInt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PodCastError> for Error {
    fn from(err: PodCastError) -> Error {
        Error::Cast(err)
    }
}

impl From<core::num::TryFromIntError> for Error {
    fn from(err: core::num::TryFromIntError) -> Error {
        Error::TryFromInt(err)
    }
}
