// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

//! A ZIP reader which acts over a non-seekable source.
//!
//! # API Design
//! Entries arrive strictly in archive order, and the data of an entry must be fully dealt with
//! before the proceeding entry can be read. This is a result of not being able to seek forwards
//! or backwards; the reader must end up at the start of the next entry.
//!
//! Each yielded file entry therefore carries a single-use body handle with exactly two
//! operations: [`EntryBody::stream`] opens the decoded body for reading, and [`EntryBody::drain`]
//! discards it unread. One of the two must happen before the next call to
//! [`ZipStreamReader::next_entry`], which otherwise fails with [`ZipError::BodyNotConsumed`]. A
//! body reader dropped part-way through counts as a cancellation: the unread remainder is
//! skipped on the upstream before the next header is parsed. The yielded entry borrows the
//! reader mutably, so holding a body reader across an iteration cannot compile.
//!
//! # Considerations
//! As the central directory of a ZIP archive is stored at the end of it, a non-seekable reader
//! never sees it; parsing stops cleanly at its first header. All metadata comes from local file
//! headers, with ZIP64 sizes promoted over the 32-bit fields and timestamps taken from the
//! extended timestamp extra field. Entries relying on a data descriptor (general purpose flag
//! bit 3) are refused up front, as are encrypted and patch entries.
//!
//! # Example
//! ```no_run
//! # use futures_lite::io::AsyncReadExt;
//! # use zip_stream::error::Result;
//! # use zip_stream::read::{ZipEntry, ZipStreamReader};
//! #
//! # async fn run() -> Result<()> {
//! # let source: &[u8] = &[];
//! let mut zip = ZipStreamReader::from_reader(source);
//!
//! while let Some(entry) = zip.next_entry().await? {
//!     match entry {
//!         ZipEntry::Directory(dir) => println!("Dir: {}", dir.name()),
//!         ZipEntry::File(mut file) => {
//!             println!("File: {}", file.name());
//!             let mut content = Vec::new();
//!             file.body().stream()?.read_to_end(&mut content).await?;
//!         }
//!     }
//! }
//! #
//! #     Ok(())
//! # }
//! ```

pub(crate) mod io;

use crate::error::{Result, ZipError};
use crate::exact::ExactBytes;
use crate::gzip::GzipFramed;
use crate::partial::{ByteSource, ChunkSource, PartialReader, ReaderSource, SubStream};
use crate::read::io::ChunkedReader;
use crate::spec::compression::Compression;
use crate::spec::consts::{CDH_SIGNATURE, LFH_LENGTH, LFH_SIGNATURE, UNSUPPORTED_FLAG_MASK, ZIP64_VERSION};
use crate::spec::extra_field::{parse_extra_fields, ExtraField};
use crate::spec::header::LocalFileHeader;
use crate::timestamp::ExtendedTimestamps;

use std::pin::Pin;
use std::task::{Context, Poll};

use async_compression::futures::bufread::GzipDecoder;
use bytes::Bytes;
use crc32fast::Hasher;
use futures_lite::io::AsyncRead;
use futures_lite::ready;
use futures_lite::stream::Stream;
use pin_project::pin_project;
use tokio_util::sync::CancellationToken;

/// Tracks what has happened to the body of the most recently yielded file entry.
#[derive(Debug)]
enum BodyState {
    Idle,
    Unresolved,
    Streaming,
    Resolved,
}

/// A ZIP reader which acts over a non-seekable source.
///
/// See the [module-level docs](self) for more information.
pub struct ZipStreamReader<U> {
    partial: PartialReader<U>,
    body: BodyState,
    abort: Option<CancellationToken>,
}

/// The owned outcome of parsing one local file header.
struct ParsedHeader {
    name: String,
    timestamps: ExtendedTimestamps,
    compression: u16,
    crc32: u32,
    uncompressed_size: u64,
    compressed_size: u64,
}

impl<S> ZipStreamReader<ChunkSource<S>>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    /// Constructs a new ZIP reader from a stream of arbitrarily-sized byte chunks.
    pub fn from_chunk_stream(stream: S) -> Self {
        Self::new(PartialReader::from_stream(stream))
    }
}

impl<R> ZipStreamReader<ReaderSource<R>>
where
    R: AsyncRead + Unpin,
{
    /// Constructs a new ZIP reader from a non-seekable [`AsyncRead`] source.
    pub fn from_reader(reader: R) -> Self {
        Self::new(PartialReader::from_reader(reader))
    }
}

impl<U> ZipStreamReader<U>
where
    U: ByteSource + Unpin,
{
    /// Constructs a new ZIP reader over an existing [`PartialReader`].
    pub fn new(partial: PartialReader<U>) -> Self {
        Self { partial, body: BodyState::Idle, abort: None }
    }

    /// Registers an abort signal checked at every iteration of the parse loop.
    ///
    /// Once the token trips, [`ZipStreamReader::next_entry`] fails with [`ZipError::Aborted`] —
    /// including at what would otherwise be a clean end of archive, so a truncated source is
    /// never mistaken for a complete one.
    pub fn with_abort(mut self, token: CancellationToken) -> Self {
        self.abort = Some(token);
        self
    }

    /// Consumes this reader and returns the underlying [`PartialReader`].
    pub fn into_inner(self) -> PartialReader<U> {
        self.partial
    }

    fn check_abort(&mut self) -> Result<()> {
        if self.abort.as_ref().is_some_and(|token| token.is_cancelled()) {
            self.partial.cancel();
            return Err(ZipError::Aborted);
        }
        Ok(())
    }

    /// Parses the next entry if the central directory hasn't yet been reached.
    ///
    /// For directory entries the (zero-length) body is drained internally. For file entries the
    /// previous body must have been streamed to completion or drained, else this fails with
    /// [`ZipError::BodyNotConsumed`].
    pub async fn next_entry(&mut self) -> Result<Option<ZipEntry<'_, U>>> {
        let parsed = match self.parse_next_header().await {
            Ok(Some(parsed)) => parsed,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.partial.cancel();
                return Err(err);
            }
        };

        if parsed.name.ends_with('/') {
            // Directory bodies are empty in any well-formed archive; drain whatever is declared
            // so the loop lands on the next header regardless.
            if let Err(err) = self.partial.skip_amount(parsed.compressed_size).await {
                self.partial.cancel();
                return Err(err);
            }
            return Ok(Some(ZipEntry::Directory(DirectoryEntry {
                name: parsed.name,
                timestamps: parsed.timestamps,
            })));
        }

        let Self { partial, body, .. } = self;
        *body = BodyState::Unresolved;

        Ok(Some(ZipEntry::File(FileEntry {
            name: parsed.name,
            timestamps: parsed.timestamps,
            uncompressed_size: parsed.uncompressed_size,
            compressed_size: parsed.compressed_size,
            crc32: parsed.crc32,
            body: EntryBody {
                inner: Some(BodyInner {
                    partial,
                    state: body,
                    compression: parsed.compression,
                    compressed_size: parsed.compressed_size,
                    uncompressed_size: parsed.uncompressed_size,
                    crc32: parsed.crc32,
                }),
            },
        })))
    }

    async fn parse_next_header(&mut self) -> Result<Option<ParsedHeader>> {
        self.check_abort()?;

        match std::mem::replace(&mut self.body, BodyState::Idle) {
            BodyState::Idle | BodyState::Resolved => {}
            // A part-read body reader was dropped; treat it as cancelled and reposition past
            // the entry.
            BodyState::Streaming => {
                let remaining = self.partial.take_sub_remaining();
                if remaining > 0 {
                    tracing::trace!(remaining, "skipping unread entry body");
                    self.partial.skip_amount(remaining).await?;
                }
            }
            BodyState::Unresolved => return Err(ZipError::BodyNotConsumed),
        }

        let header_bytes = self.partial.read_amount(LFH_LENGTH).await?;
        if header_bytes.is_empty() {
            self.check_abort()?;
            return Ok(None);
        }
        if header_bytes.len() < LFH_LENGTH {
            return Err(ZipError::UnexpectedEnd);
        }

        let signature = u32::from_le_bytes(header_bytes[0..4].try_into().unwrap());
        match signature {
            LFH_SIGNATURE => {}
            CDH_SIGNATURE => {
                self.check_abort()?;
                return Ok(None);
            }
            other => return Err(ZipError::BadSignature(other)),
        }

        let header = LocalFileHeader::from(<[u8; 26]>::try_from(&header_bytes[4..30]).unwrap());
        if header.version > ZIP64_VERSION {
            return Err(ZipError::UnsupportedVersion(header.version));
        }
        if header.flags & UNSUPPORTED_FLAG_MASK != 0 {
            return Err(ZipError::UnsupportedFlag(header.flags));
        }

        let filename = self.partial.read_amount_strict(header.file_name_length.into()).await?;
        let name = String::from_utf8_lossy(&filename).into_owned();

        let extra = self.partial.read_amount_strict(header.extra_field_length.into()).await?;
        let fields = parse_extra_fields(&extra)?;

        let mut uncompressed_size = u64::from(header.uncompressed_size);
        let mut compressed_size = u64::from(header.compressed_size);
        if let Some(zip64) = fields.iter().find_map(|field| match field {
            ExtraField::Zip64(zip64) => Some(zip64),
            _ => None,
        }) {
            if let Some(size) = zip64.uncompressed_size {
                uncompressed_size = size;
            }
            if let Some(size) = zip64.compressed_size {
                compressed_size = size;
            }
        }

        let timestamps = fields
            .iter()
            .find_map(|field| match field {
                ExtraField::Timestamp(timestamps) => Some(*timestamps),
                _ => None,
            })
            .unwrap_or_default();

        tracing::debug!(
            name = %name,
            method = header.compression,
            compressed_size,
            uncompressed_size,
            "parsed local file header"
        );

        Ok(Some(ParsedHeader {
            name,
            timestamps,
            compression: header.compression,
            crc32: header.crc,
            uncompressed_size,
            compressed_size,
        }))
    }
}

/// An entry yielded by [`ZipStreamReader::next_entry`].
#[derive(Debug)]
pub enum ZipEntry<'a, U>
where
    U: ByteSource + Unpin,
{
    File(FileEntry<'a, U>),
    Directory(DirectoryEntry),
}

impl<U> ZipEntry<'_, U>
where
    U: ByteSource + Unpin,
{
    /// Returns the entry's file name as stored in the archive.
    pub fn name(&self) -> &str {
        match self {
            ZipEntry::File(file) => file.name(),
            ZipEntry::Directory(dir) => dir.name(),
        }
    }

    /// Returns the entry's extended timestamps.
    pub fn timestamps(&self) -> &ExtendedTimestamps {
        match self {
            ZipEntry::File(file) => file.timestamps(),
            ZipEntry::Directory(dir) => dir.timestamps(),
        }
    }
}

/// A directory entry. Its name always ends with `/` and it carries no body.
#[derive(Debug)]
pub struct DirectoryEntry {
    name: String,
    timestamps: ExtendedTimestamps,
}

impl DirectoryEntry {
    /// Returns the directory's name as stored in the archive.
    ///
    /// ## Note
    /// This is the raw stored name. When reading untrusted archives it should be sanitised
    /// before being used as a path, to prevent
    /// [directory traversal attacks](https://en.wikipedia.org/wiki/Directory_traversal_attack).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directory's extended timestamps.
    pub fn timestamps(&self) -> &ExtendedTimestamps {
        &self.timestamps
    }
}

/// A file entry together with its single-use body handle.
#[derive(Debug)]
pub struct FileEntry<'a, U>
where
    U: ByteSource + Unpin,
{
    name: String,
    timestamps: ExtendedTimestamps,
    uncompressed_size: u64,
    compressed_size: u64,
    crc32: u32,
    body: EntryBody<'a, U>,
}

impl<'a, U> FileEntry<'a, U>
where
    U: ByteSource + Unpin,
{
    /// Returns the file's name as stored in the archive.
    ///
    /// ## Note
    /// This is the raw stored name. When reading untrusted archives it should be sanitised
    /// before being used as a path, to prevent
    /// [directory traversal attacks](https://en.wikipedia.org/wiki/Directory_traversal_attack).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the file's extended timestamps.
    pub fn timestamps(&self) -> &ExtendedTimestamps {
        &self.timestamps
    }

    /// Returns the file's uncompressed size in bytes.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Returns the file's on-wire (compressed) size in bytes.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Returns the CRC-32 of the file's uncompressed content, as declared by its header.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Returns a mutable reference to the file's body handle.
    pub fn body(&mut self) -> &mut EntryBody<'a, U> {
        &mut self.body
    }

    /// Consumes this entry and returns its body handle.
    pub fn into_body(self) -> EntryBody<'a, U> {
        self.body
    }
}

#[derive(Debug)]
struct BodyInner<'a, U> {
    partial: &'a mut PartialReader<U>,
    state: &'a mut BodyState,
    compression: u16,
    compressed_size: u64,
    uncompressed_size: u64,
    crc32: u32,
}

/// The single-use handle to a file entry's body.
///
/// Exactly one of [`EntryBody::stream`] or [`EntryBody::drain`] must be invoked before the
/// parse loop is resumed; a second invocation on the same handle fails with
/// [`ZipError::BodyAlreadyUsed`].
#[derive(Debug)]
pub struct EntryBody<'a, U> {
    inner: Option<BodyInner<'a, U>>,
}

impl<'a, U> EntryBody<'a, U>
where
    U: ByteSource + Unpin,
{
    /// Opens the decoded body as a reader yielding the entry's uncompressed bytes.
    ///
    /// Fails with [`ZipError::UnknownCompressionMethod`] for methods other than stored and
    /// deflate, leaving the handle usable so the entry can still be drained.
    pub fn stream(&mut self) -> Result<BodyReader<'a, U>> {
        let compression = match &self.inner {
            Some(inner) => Compression::try_from(inner.compression)?,
            None => return Err(ZipError::BodyAlreadyUsed),
        };
        let Some(inner) = self.inner.take() else {
            return Err(ZipError::BodyAlreadyUsed);
        };
        let BodyInner { partial, state, compressed_size, uncompressed_size, crc32, .. } = inner;

        *state = BodyState::Streaming;
        let raw = ChunkedReader::new(ExactBytes::new(partial.stream_amount(compressed_size), compressed_size));

        let reader = match compression {
            Compression::Stored => InnerBody::Stored(raw),
            Compression::Deflate => {
                InnerBody::Deflate(GzipDecoder::new(GzipFramed::new(raw, crc32, uncompressed_size)))
            }
        };

        Ok(BodyReader { inner: reader, hasher: Hasher::new() })
    }

    /// Discards the body unread, advancing the parser past it. Returns the number of on-wire
    /// bytes skipped, which falls short of the declared size only if the upstream ended early.
    pub async fn drain(&mut self) -> Result<u64> {
        let Some(inner) = self.inner.take() else {
            return Err(ZipError::BodyAlreadyUsed);
        };

        let skipped = inner.partial.skip_amount(inner.compressed_size).await?;
        *inner.state = BodyState::Resolved;
        Ok(skipped)
    }
}

type RawBody<'a, U> = ChunkedReader<ExactBytes<SubStream<'a, U>>>;

#[pin_project(project = InnerBodyProj)]
#[derive(Debug)]
enum InnerBody<'a, U>
where
    U: ByteSource + Unpin,
{
    Stored(#[pin] RawBody<'a, U>),
    Deflate(#[pin] GzipDecoder<GzipFramed<RawBody<'a, U>>>),
}

/// A reader over a file entry's decoded body.
///
/// The exact-bytes assertion on the underlying sub-stream means reads fail with a
/// [`ZipError::ByteCountMismatch`] (wrapped in the I/O error) if the source ends before the
/// declared compressed size.
#[pin_project]
pub struct BodyReader<'a, U>
where
    U: ByteSource + Unpin,
{
    #[pin]
    inner: InnerBody<'a, U>,
    hasher: Hasher,
}

impl<U> std::fmt::Debug for BodyReader<'_, U>
where
    U: ByteSource + Unpin + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyReader").field("inner", &self.inner).finish()
    }
}

impl<U> BodyReader<'_, U>
where
    U: ByteSource + Unpin,
{
    /// Returns the CRC-32 of the decoded bytes read so far.
    ///
    /// Meaningful for verification only once the body has been read to end-of-file, at which
    /// point it can be compared against [`FileEntry::crc32`].
    pub fn computed_crc32(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

impl<U> AsyncRead for BodyReader<'_, U>
where
    U: ByteSource + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<std::io::Result<usize>> {
        let this = self.project();
        let count = match this.inner.project() {
            InnerBodyProj::Stored(inner) => ready!(inner.poll_read(cx, buf))?,
            InnerBodyProj::Deflate(inner) => ready!(inner.poll_read(cx, buf))?,
        };

        this.hasher.update(&buf[..count]);
        Poll::Ready(Ok(count))
    }
}
