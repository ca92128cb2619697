// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

//! # zip_stream
//!
//! A forward-only streaming ZIP archive reading/writing crate.
//!
//! Both halves of the crate operate over unseekable byte streams: the reader parses an archive as
//! it arrives from a network connection or pipe, and the writer emits an archive straight into a
//! sink as entries are produced, buffering no more than the entry currently in flight.
//!
//! ## Features
//! - Byte-precise reading over chunk-granular sources via [`PartialReader`].
//! - Stored and Deflate entries; ZIP64 sizes and extended UNIX timestamps throughout.
//! - Cooperative cancellation through a [`CancellationToken`] on both halves.
//! - Aims for reasonable [specification](https://pkware.cachefly.net/webdocs/casestudies/APPNOTE.TXT)
//!   compliance within its streaming subset.
//!
//! [`PartialReader`]: crate::partial::PartialReader
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod error;
pub mod partial;
pub mod read;
pub mod write;

pub(crate) mod exact;
pub(crate) mod gzip;
pub(crate) mod spec;
pub(crate) mod timestamp;

#[cfg(test)]
pub(crate) mod tests;

pub use crate::spec::compression::Compression;
pub use crate::timestamp::ExtendedTimestamps;
