// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use futures_lite::io::{AsyncBufRead, AsyncRead};
use futures_lite::ready;
use futures_lite::stream::Stream;
use pin_project::pin_project;

/// A wrapper which exposes a stream of byte chunks as an [`AsyncBufRead`].
///
/// The current chunk doubles as the buffer, so no bytes are copied on the way through; empty
/// chunks are discarded rather than surfaced as spurious end-of-file.
#[pin_project]
#[derive(Debug)]
pub(crate) struct ChunkedReader<S> {
    #[pin]
    stream: S,
    current: Bytes,
    done: bool,
}

impl<S> ChunkedReader<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self { stream, current: Bytes::new(), done: false }
    }
}

impl<S, E> AsyncBufRead for ChunkedReader<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    io::Error: From<E>,
{
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        let mut this = self.project();
        while this.current.is_empty() && !*this.done {
            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => *this.current = chunk,
                Some(Err(err)) => return Poll::Ready(Err(err.into())),
                None => *this.done = true,
            }
        }
        Poll::Ready(Ok(this.current))
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        self.project().current.advance(amt);
    }
}

impl<S, E> AsyncRead for ChunkedReader<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    io::Error: From<E>,
{
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        let amt = {
            let available = ready!(self.as_mut().poll_fill_buf(cx))?;
            let amt = available.len().min(buf.len());
            buf[..amt].copy_from_slice(&available[..amt]);
            amt
        };
        self.consume(amt);
        Poll::Ready(Ok(amt))
    }
}
