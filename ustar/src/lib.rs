macro_rules! wrap_io_err {
    ($path:expr, $context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: Some($path.to_path_buf()),
            context: $context,
        }
    };
    ($context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: None,
            context: $context,
        }
    };
}
pub(crate) use wrap_io_err;

mod archive;
mod bin;
pub mod ext;

pub use archive::*;
pub use bin::*;

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub use ustar_core::{Cursor, EntryHeader, EntryKind, Mode};

const READ_WRITE_HASH_BUF_SIZE: usize = 4 * 1024 * 1024;

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(": {}", path.display()),
        None => String::new(),
    }
}

#[derive(thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] ustar_core::Error),
    #[error("{context}{}", display_path(.path))]
    Io {
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
        context: &'static str,
    },
    #[error("Invalid path component '{}' in entry '{}'", .component.display(), .entry.display())]
    InvalidPath { entry: PathBuf, component: PathBuf },
    #[error("No entry '{}' in archive", .0.display())]
    NotFound(PathBuf),
}

impl Error {
    /// Whether the archive itself is malformed
    pub fn is_format_error(&self) -> bool {
        match self {
            Error::Core(err) => err.is_format_error(),
            _ => false,
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;

        let mut source = self.source();
        while let Some(err) = source {
            writeln!(f, "\tCaused by: {err}")?;
            source = err.source();
        }

        Ok(())
    }
}
