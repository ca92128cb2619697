// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use crate::error::ZipError;

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_lite::ready;
use futures_lite::stream::Stream;
use pin_project::pin_project;

/// A pass-through chunk stream which asserts that exactly `expected` bytes flow through it.
///
/// The first chunk that would push the running total past `expected` fails, as does end-of-input
/// short of it, so a wrong declared entry size surfaces loudly instead of silently under- or
/// over-filling an archive. Placed on every reader body sub-stream and every writer body.
#[pin_project]
#[derive(Debug)]
pub(crate) struct ExactBytes<S> {
    #[pin]
    inner: S,
    expected: u64,
    observed: u64,
    done: bool,
}

impl<S> ExactBytes<S> {
    pub(crate) fn new(inner: S, expected: u64) -> Self {
        Self { inner, expected, observed: 0, done: false }
    }
}

impl<S, E> Stream for ExactBytes<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    ZipError: From<E>,
{
    type Item = std::result::Result<Bytes, ZipError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                *this.observed += chunk.len() as u64;
                if *this.observed > *this.expected {
                    *this.done = true;
                    return Poll::Ready(Some(Err(ZipError::ByteCountMismatch {
                        expected: *this.expected,
                        actual: *this.observed,
                    })));
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(err)) => {
                *this.done = true;
                Poll::Ready(Some(Err(err.into())))
            }
            None => {
                *this.done = true;
                if *this.observed < *this.expected {
                    return Poll::Ready(Some(Err(ZipError::ByteCountMismatch {
                        expected: *this.expected,
                        actual: *this.observed,
                    })));
                }
                Poll::Ready(None)
            }
        }
    }
}
