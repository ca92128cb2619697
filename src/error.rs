// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

//! A module which holds relevant error reporting structures/types.

use thiserror::Error;

/// A Result type alias over ZipError to minimise repetition.
pub type Result<V> = std::result::Result<V, ZipError>;

/// An enum of possible errors and their descriptions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ZipError {
    #[error("unexpected end of stream")]
    UnexpectedEnd,
    #[error("unexpected header signature: {0:#010x}")]
    BadSignature(u32),
    #[error("unsupported version needed to extract: {0}")]
    UnsupportedVersion(u16),
    #[error("unsupported general purpose flag bits: {0:#06x}")]
    UnsupportedFlag(u16),
    #[error("unsupported compression method: {0}")]
    UnknownCompressionMethod(u16),
    #[error("extra field record overruns the extra field area")]
    InvalidExtraField,
    #[error("entry body has already been streamed or drained")]
    BodyAlreadyUsed,
    #[error("previous entry body was neither streamed nor drained")]
    BodyNotConsumed,
    #[error("expected {expected} bytes but observed {actual}")]
    ByteCountMismatch { expected: u64, actual: u64 },
    #[error("file name of {0} bytes exceeds the 16-bit length field")]
    FilenameTooLong(usize),
    #[error("operation aborted")]
    Aborted,
    #[error("an upstream reader returned an error: {0}")]
    Io(#[from] std::io::Error),
}

// Body pipelines run over AsyncRead, so ZIP failures have to travel as I/O errors. Callers can
// recover the original via `io::Error::get_ref()` + downcast.
impl From<ZipError> for std::io::Error {
    fn from(value: ZipError) -> Self {
        match value {
            ZipError::Io(inner) => inner,
            ZipError::UnexpectedEnd => std::io::Error::new(std::io::ErrorKind::UnexpectedEof, value),
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
