//! Conversions between hyper's body types and `tokio::io::{AsyncRead, AsyncWrite}`,
//! so the core crate's `Stream::consume` and `ObserverHandle::write_to` never
//! need to know hyper exists.

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use std::convert::Infallible;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::{ReaderStream, StreamReader};

pub(crate) type BoxBody = http_body_util::combinators::BoxBody<Bytes, io::Error>;

/// Adapts an incoming request body into an `AsyncRead` so it can be handed
/// straight to [`livelog_core::Stream::consume`]. Trailer frames, if any,
/// are silently dropped; only data frames carry bytes.
pub(crate) fn body_to_async_read(body: Incoming) -> impl AsyncRead + Unpin + Send + 'static {
    let stream = http_body_util::BodyStream::new(body)
        .try_filter_map(|frame| async move { Ok::<_, hyper::Error>(frame.into_data().ok()) })
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
    StreamReader::new(stream)
}

/// A response body that's just a fixed, already-known byte slice: error
/// bodies, acknowledgements, HEAD responses.
pub(crate) fn full_body(bytes: impl Into<Bytes>) -> BoxBody {
    Full::new(bytes.into())
        .map_err(|never: Infallible| match never {})
        .boxed()
}

/// A response body fed incrementally from an `AsyncRead` — the egress side
/// of an [`livelog_core::ObserverHandle::write_to`] call, via a duplex pipe.
pub(crate) fn streaming_body(reader: impl AsyncRead + Send + 'static) -> BoxBody {
    let stream = ReaderStream::new(reader).map_ok(Frame::data);
    StreamBody::new(stream).boxed()
}
