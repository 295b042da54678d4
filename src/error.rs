use std::io;
use std::path::PathBuf;

/// Specialized `Result` type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while parsing a WAVE container or decoding its payload.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file could not be opened for reading.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The outer RIFF/WAVE header is missing, truncated or carries the wrong tags.
    #[error("malformed RIFF container: {0}")]
    MalformedContainer(&'static str),
    /// The `fmt ` chunk is too small, truncated or describes an inconsistent layout.
    #[error("malformed format chunk: {0}")]
    MalformedFormat(&'static str),
    /// No usable `data` chunk was found before the end of the stream.
    #[error("no audio payload found")]
    MissingPayload,
    /// Fewer payload bytes were available than the `data` chunk declared.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: u64, actual: u64 },
    /// The sample encoding is outside the supported PCM/float set.
    #[error("unsupported encoding: format tag 0x{audio_format:04X} at {bits_per_sample} bits")]
    UnsupportedEncoding {
        audio_format: u16,
        bits_per_sample: u16,
    },
    /// Seek or read failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Coarse category of an [`Error`], for callers that only branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Open,
    Container,
    Format,
    MissingPayload,
    Io,
    Unsupported,
}

impl Error {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Open { .. } => ErrorKind::Open,
            Error::MalformedContainer(_) => ErrorKind::Container,
            Error::MalformedFormat(_) => ErrorKind::Format,
            Error::MissingPayload => ErrorKind::MissingPayload,
            Error::ShortRead { .. } | Error::Io(_) => ErrorKind::Io,
            Error::UnsupportedEncoding { .. } => ErrorKind::Unsupported,
        }
    }
}
