// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use crate::error::ZipError;

/// A compression method supported by this crate.
///
/// The streaming writer never compresses data itself, so Deflate entries are written from
/// caller-supplied, already-deflated bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Stored,
    Deflate,
}

impl From<Compression> for u16 {
    fn from(compression: Compression) -> u16 {
        match compression {
            Compression::Stored => 0,
            Compression::Deflate => 8,
        }
    }
}

impl TryFrom<u16> for Compression {
    type Error = ZipError;

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Compression::Stored),
            8 => Ok(Compression::Deflate),
            _ => Err(ZipError::UnknownCompressionMethod(value)),
        }
    }
}
