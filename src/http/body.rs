//! HTTP body types
//!
//! Requests arrive as a boxed body so the dispatch layer does not depend on the
//! connection type. Responses are either a buffered JSON document or a file
//! streamed from disk.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::Stream;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes, Frame, SizeHint};
use tokio::fs::File;
use tokio::io::Take;
use tokio_util::io::ReaderStream;

/// Error type carried by request bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased inbound request body
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// Erase a concrete body into a [`RequestBody`]
pub fn boxed_request_body<B>(body: B) -> RequestBody
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed_unsync()
}

/// Response body for every route
#[derive(Debug, Default)]
pub enum ResponseBody {
    /// A fully buffered body (JSON documents, error envelopes)
    Buffered(Full<Bytes>),
    /// A byte range of a file read lazily from disk
    File {
        stream: ReaderStream<Take<File>>,
        remaining: u64,
    },
    #[default]
    Empty,
}

impl ResponseBody {
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Stream `length` bytes from the current position of `file`
    #[must_use]
    pub fn from_file(file: File, length: u64) -> Self {
        use tokio::io::AsyncReadExt;

        Self::File {
            stream: ReaderStream::new(file.take(length)),
            remaining: length,
        }
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::File { stream, remaining } => {
                match ready!(Pin::new(stream).poll_next(cx)) {
                    Some(Ok(chunk)) => {
                        *remaining = remaining.saturating_sub(chunk.len() as u64);
                        Poll::Ready(Some(Ok(Frame::data(chunk))))
                    }
                    Some(Err(e)) => Poll::Ready(Some(Err(e))),
                    None => Poll::Ready(None),
                }
            }
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::File { remaining, .. } => *remaining == 0,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::File { remaining, .. } => SizeHint::with_exact(*remaining),
            Self::Empty => SizeHint::with_exact(0),
        }
    }
}
