// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

//! An adapter which reframes a raw DEFLATE byte stream as a single-member gzip stream.
//!
//! ZIP stores method-8 entry bodies as bare DEFLATE with no framing, while the decompressor this
//! crate drives consumes gzip. The adapter synthesises the 10-byte gzip header in front of the
//! body and the 8-byte trailer behind it, building the trailer from the CRC-32 and uncompressed
//! size the local file header already declares. As a side effect, the decompressor's trailer
//! check verifies the decoded body against the declared CRC.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_lite::io::{AsyncBufRead, AsyncRead};
use futures_lite::ready;
use pin_project::pin_project;

// Magic, deflate method, no flags, zeroed mtime, no extra flags, unknown OS.
const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff];

#[derive(Debug)]
enum FrameState {
    Header(usize),
    Body,
    Trailer(usize),
    Done,
}

/// A wrapper around a raw-DEFLATE [`AsyncBufRead`] which serves gzip framing around it.
#[pin_project]
#[derive(Debug)]
pub(crate) struct GzipFramed<R> {
    #[pin]
    inner: R,
    trailer: [u8; 8],
    state: FrameState,
}

impl<R> GzipFramed<R> {
    /// Constructs a new adapter over the raw body. `crc32` and `uncompressed_size` come from the
    /// entry's header; the adapter computes neither.
    pub(crate) fn new(inner: R, crc32: u32, uncompressed_size: u64) -> Self {
        let mut trailer = [0; 8];
        trailer[0..4].copy_from_slice(&crc32.to_le_bytes());
        trailer[4..8].copy_from_slice(&(uncompressed_size as u32).to_le_bytes());

        Self { inner, trailer, state: FrameState::Header(0) }
    }
}

impl<R> AsyncBufRead for GzipFramed<R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        let mut this = self.project();
        loop {
            match this.state {
                FrameState::Header(position) => {
                    if *position < GZIP_HEADER.len() {
                        return Poll::Ready(Ok(&GZIP_HEADER[*position..]));
                    }
                    *this.state = FrameState::Body;
                }
                FrameState::Body => {
                    let available = ready!(this.inner.as_mut().poll_fill_buf(cx))?.len();
                    if available == 0 {
                        *this.state = FrameState::Trailer(0);
                        continue;
                    }
                    // The inner buffer is already filled, so this resolves immediately; polling
                    // twice sidesteps returning a borrow out of the loop above.
                    return this.inner.poll_fill_buf(cx);
                }
                FrameState::Trailer(position) => {
                    if *position < this.trailer.len() {
                        return Poll::Ready(Ok(&this.trailer[*position..]));
                    }
                    *this.state = FrameState::Done;
                }
                FrameState::Done => return Poll::Ready(Ok(&[])),
            }
        }
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        let this = self.project();
        match this.state {
            FrameState::Header(position) | FrameState::Trailer(position) => *position += amt,
            FrameState::Body => this.inner.consume(amt),
            FrameState::Done => {}
        }
    }
}

impl<R> AsyncRead for GzipFramed<R>
where
    R: AsyncBufRead + Unpin,
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
