use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to open a file for viewing. Fatal to the session; never retried.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("could not open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} has an empty first line; expected a header", .path.display())]
    EmptyHeader { path: PathBuf },
    #[error("invalid engine options: {0}")]
    InvalidOptions(String),
}

/// Failure while reading chunk data from an open file.
#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error("no file is open")]
    Closed,
    #[error(transparent)]
    Io(#[from] io::Error),
}
