// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_lite::io::AsyncRead;
use futures_lite::ready;
use futures_lite::stream::Stream;

/// A chunk-granular upstream byte source.
///
/// `poll_fetch` resolves with the next chunk, `None` once the source is exhausted. `max` is a
/// hint bounding how many bytes the caller wants; a source may over-deliver, in which case the
/// [`PartialReader`](super::PartialReader) retains the excess as its leftover.
pub trait ByteSource {
    fn poll_fetch(self: Pin<&mut Self>, cx: &mut Context<'_>, max: usize) -> Poll<io::Result<Option<Bytes>>>;
}

/// A source over a [`Stream`] of byte chunks. Chunk lengths are whatever the upstream produced,
/// so `max` is ignored and over-delivery is the norm.
pub struct ChunkSource<S> {
    stream: S,
}

impl<S> ChunkSource<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Consumes this source and returns the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> ByteSource for ChunkSource<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    fn poll_fetch(mut self: Pin<&mut Self>, cx: &mut Context<'_>, _max: usize) -> Poll<io::Result<Option<Bytes>>> {
        match ready!(Pin::new(&mut self.stream).poll_next(cx)) {
            Some(Ok(chunk)) => Poll::Ready(Ok(Some(chunk))),
            Some(Err(err)) => Poll::Ready(Err(err)),
            None => Poll::Ready(Ok(None)),
        }
    }
}

/// A source over an [`AsyncRead`]. Each fetch reads into a fresh buffer of exactly `max` bytes,
/// so this source never over-delivers and the reader above it never buffers a leftover.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R> ReaderSource<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Consumes this source and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R> ByteSource for ReaderSource<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_fetch(mut self: Pin<&mut Self>, cx: &mut Context<'_>, max: usize) -> Poll<io::Result<Option<Bytes>>> {
        let mut buffer = vec![0u8; max];
        let count = ready!(Pin::new(&mut self.reader).poll_read(cx, &mut buffer))?;
        if count == 0 {
            return Poll::Ready(Ok(None));
        }

        buffer.truncate(count);
        Poll::Ready(Ok(Some(Bytes::from(buffer))))
    }
}
