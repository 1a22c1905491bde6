use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("digit count must be at least 1, got {0}")]
    InvalidDigits(u64),
    #[error("{value} is outside the sieve range (bound {bound})")]
    OutOfSieveRange { value: u64, bound: u64 },
    #[error("{0} digits need more precision than a float can carry")]
    PrecisionTooLarge(u64),
    #[error("result is not a finite number")]
    NotFinite,
    #[error("a binary splitting worker panicked")]
    WorkerPanicked,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("could not write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}
