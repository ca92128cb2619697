// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

//! Byte-precise reading over unseekable, chunk-granular byte sources.
//!
//! # API Design
//! Upstream sources deliver bytes at whatever granularity they please, while the ZIP format is
//! framed at exact byte offsets. [`PartialReader`] bridges the two with four primitives: read up
//! to `max` bytes, read (strictly or not) the next `n` bytes, skip `n` bytes, and borrow out the
//! next `n` bytes as a sub-stream. Chunk boundaries never align with frame boundaries, so excess
//! bytes from a bounded request are retained as a single leftover slice and served before any
//! further upstream read. The leftover is a view into the upstream's own buffer, not a copy.
//!
//! Two source flavours exist behind one contract:
//! - [`ChunkSource`]: the upstream hands back chunks of arbitrary length ([`Stream`] of
//!   [`Bytes`]), and overflow past a request's bound becomes the leftover.
//! - [`ReaderSource`]: the upstream fills a buffer this reader supplies ([`AsyncRead`]), so each
//!   read is bounded up front and no leftover ever forms.
//!
//! # Considerations
//! A [`SubStream`] borrows its `PartialReader` mutably for as long as it lives, so no other
//! operation can be interleaved with it. Cancelling a sub-stream is not an error: the remaining
//! bytes of the logical region are skipped on the upstream, leaving the parent positioned at the
//! first byte past it.
//!
//! [`Stream`]: futures_lite::stream::Stream
//! [`AsyncRead`]: futures_lite::io::AsyncRead

pub(crate) mod source;

pub use source::{ByteSource, ChunkSource, ReaderSource};

use crate::error::{Result, ZipError};

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_lite::io::AsyncRead;
use futures_lite::stream::Stream;
use futures_lite::{future, ready};

/// The bound on scratch reads issued while skipping, so a large skip never asks the upstream for
/// a large allocation.
const SKIP_BUFFER_SIZE: usize = 2048;

/// The per-read bound a [`SubStream`] places on its parent.
const SUB_STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// A reader which converts a chunk-granular upstream into byte-precise operations.
///
/// Constructed via [`PartialReader::from_stream`] or [`PartialReader::from_reader`] depending on
/// the upstream's shape. Construction performs no I/O.
#[derive(Debug)]
pub struct PartialReader<U> {
    upstream: U,
    leftover: Option<Bytes>,
    ended: bool,
    cancelled: bool,
    sub_remaining: u64,
}

impl<S> PartialReader<ChunkSource<S>>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    /// Constructs a new reader over a stream of arbitrarily-sized byte chunks.
    pub fn from_stream(stream: S) -> Self {
        Self::new(ChunkSource::new(stream))
    }
}

impl<R> PartialReader<ReaderSource<R>>
where
    R: AsyncRead + Unpin,
{
    /// Constructs a new reader over an [`AsyncRead`] upstream.
    ///
    /// Reads are issued into buffers bounded by each operation, so this variant never retains a
    /// leftover slice.
    pub fn from_reader(reader: R) -> Self {
        Self::new(ReaderSource::new(reader))
    }
}

impl<U> PartialReader<U>
where
    U: ByteSource + Unpin,
{
    /// Constructs a new reader from any [`ByteSource`] implementation.
    pub fn new(upstream: U) -> Self {
        Self { upstream, leftover: None, ended: false, cancelled: false, sub_remaining: 0 }
    }

    /// Consumes this reader and returns the upstream source.
    pub fn into_inner(self) -> U {
        self.upstream
    }

    pub(crate) fn poll_limited_read(&mut self, cx: &mut Context<'_>, max: usize) -> Poll<Result<Option<Bytes>>> {
        debug_assert!(max != 0, "limited_read bound must be non-zero");

        if self.cancelled {
            return Poll::Ready(Err(ZipError::Aborted));
        }
        if let Some(mut chunk) = self.leftover.take() {
            if chunk.len() > max {
                self.leftover = Some(chunk.split_off(max));
            }
            return Poll::Ready(Ok(Some(chunk)));
        }
        if self.ended {
            return Poll::Ready(Ok(None));
        }

        loop {
            match ready!(Pin::new(&mut self.upstream).poll_fetch(cx, max)) {
                Ok(Some(mut chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    if chunk.len() > max {
                        self.leftover = Some(chunk.split_off(max));
                    }
                    return Poll::Ready(Ok(Some(chunk)));
                }
                Ok(None) => {
                    self.ended = true;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => return Poll::Ready(Err(err.into())),
            }
        }
    }

    /// Delivers the next available bytes, capped at `max` (which must be non-zero).
    ///
    /// Returns `None` once the upstream has ended; otherwise the returned slice holds between 1
    /// and `max` bytes. At most one upstream read is issued.
    pub async fn limited_read(&mut self, max: usize) -> Result<Option<Bytes>> {
        future::poll_fn(|cx| self.poll_limited_read(cx, max)).await
    }

    /// Reads the next `n` bytes, returning a short prefix if the upstream ends first.
    pub async fn read_amount(&mut self, n: usize) -> Result<Bytes> {
        if n == 0 {
            return Ok(Bytes::new());
        }
        let first = match self.limited_read(n).await? {
            Some(chunk) => chunk,
            None => return Ok(Bytes::new()),
        };
        // The common case: one upstream chunk covers the request, so hand its slice straight
        // back rather than accumulating into a fresh buffer.
        if first.len() == n {
            return Ok(first);
        }

        let mut buffer = BytesMut::with_capacity(n);
        buffer.extend_from_slice(&first);
        while buffer.len() < n {
            match self.limited_read(n - buffer.len()).await? {
                Some(chunk) => buffer.extend_from_slice(&chunk),
                None => break,
            }
        }

        Ok(buffer.freeze())
    }

    /// Reads exactly `n` bytes, failing with [`ZipError::UnexpectedEnd`] if the upstream ends
    /// before delivering them.
    pub async fn read_amount_strict(&mut self, n: usize) -> Result<Bytes> {
        let bytes = self.read_amount(n).await?;
        if bytes.len() < n {
            return Err(ZipError::UnexpectedEnd);
        }
        Ok(bytes)
    }

    /// Reads and discards up to `n` bytes, returning how many were skipped. Stops early if the
    /// upstream ends.
    pub async fn skip_amount(&mut self, n: u64) -> Result<u64> {
        let mut skipped = 0u64;
        while skipped < n {
            let max = usize::try_from(n - skipped).unwrap_or(usize::MAX).min(SKIP_BUFFER_SIZE);
            match self.limited_read(max).await? {
                Some(chunk) => skipped += chunk.len() as u64,
                None => break,
            }
        }
        Ok(skipped)
    }

    /// Borrows out the next `n` bytes of the upstream as a pull-driven sub-stream.
    ///
    /// The sub-stream yields exactly `n` bytes, or fewer if the upstream ends first. While it
    /// lives, no other operation can be issued on this reader; once it has been fully read,
    /// cancelled, or dropped part-way, the unread remainder is accounted in
    /// [`PartialReader::take_sub_remaining`] for the owner to skip.
    pub fn stream_amount(&mut self, n: u64) -> SubStream<'_, U> {
        self.sub_remaining = n;
        SubStream { reader: self }
    }

    /// Returns and clears the number of bytes the last sub-stream left unread.
    pub fn take_sub_remaining(&mut self) -> u64 {
        std::mem::take(&mut self.sub_remaining)
    }

    /// Releases interest in the upstream. Any further operation fails with
    /// [`ZipError::Aborted`].
    pub fn cancel(&mut self) {
        tracing::trace!("partial reader cancelled");
        self.cancelled = true;
        self.leftover = None;
    }
}

/// A pull-driven view of the next `n` bytes of a [`PartialReader`].
#[derive(Debug)]
pub struct SubStream<'a, U> {
    reader: &'a mut PartialReader<U>,
}

impl<U> SubStream<'_, U>
where
    U: ByteSource + Unpin,
{
    /// Returns the number of bytes this sub-stream has yet to yield.
    pub fn remaining(&self) -> u64 {
        self.reader.sub_remaining
    }

    /// Abandons the sub-stream, skipping its unread bytes on the upstream so the parent reader
    /// is positioned past the whole region. Returns how many bytes were skipped.
    pub async fn cancel(self) -> Result<u64> {
        let remaining = self.reader.take_sub_remaining();
        tracing::trace!(remaining, "sub-stream cancelled");
        self.reader.skip_amount(remaining).await
    }
}

impl<U> Stream for SubStream<'_, U>
where
    U: ByteSource + Unpin,
{
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let reader = &mut *self.reader;
        if reader.sub_remaining == 0 {
            return Poll::Ready(None);
        }

        let max = usize::try_from(reader.sub_remaining).unwrap_or(usize::MAX).min(SUB_STREAM_CHUNK_SIZE);
        match ready!(reader.poll_limited_read(cx, max)) {
            Ok(Some(chunk)) => {
                reader.sub_remaining -= chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            // Upstream ended inside the region; yield the short stream and leave nothing to skip.
            Ok(None) => {
                reader.sub_remaining = 0;
                Poll::Ready(None)
            }
            Err(err) => Poll::Ready(Some(Err(err))),
        }
    }
}
