//! End-to-end coverage of the fan-out buffer's documented scenarios, using
//! in-memory duplex pipes as the producer source and `Vec<u8>` sinks for
//! observers — no real sockets needed to exercise the core.

use livelog_core::{Stop, Stream};
use std::time::Duration;
use tokio::io::{duplex, AsyncWriteExt};
use tokio::time::timeout;

async fn drain(stream: &Stream, start: u64, stop: Stop) -> Vec<u8> {
    let handle = stream.observe(start, stop);
    let mut sink = Vec::new();
    handle.write_to(&mut sink).await.expect("write_to failed");
    sink
}

// S1: a consumer attached mid-upload sees historical bytes, then blocks,
// then sees the rest once the producer catches up and closes.
#[tokio::test]
async fn s1_attach_mid_upload_then_close() {
    let stream = Stream::new().unwrap();
    let (mut writer, reader) = duplex(1024);

    writer.write_all(b"AB").await.unwrap();
    writer.flush().await.unwrap();

    let consume_stream = stream.clone();
    let ingest = tokio::spawn(async move { consume_stream.consume(reader).await });

    // Give the ingest task a chance to observe "AB" before we attach.
    while stream.length() < 2 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let observer_stream = stream.clone();
    let reader_task = tokio::spawn(async move { drain(&observer_stream, 0, Stop::Open).await });

    writer.write_all(b"CDE").await.unwrap();
    drop(writer);

    ingest.await.unwrap().unwrap();
    let received = timeout(Duration::from_secs(1), reader_task)
        .await
        .expect("observer never completed")
        .unwrap();
    assert_eq!(received, b"ABCDE");
}

// S2: bounded range on a closed stream.
#[tokio::test]
async fn s2_bounded_range_on_closed_stream() {
    let stream = Stream::new().unwrap();
    let (mut writer, reader) = duplex(1024);
    writer.write_all(b"0123456789").await.unwrap();
    drop(writer);
    stream.consume(reader).await.unwrap();

    let (start, stop) = livelog_core::parse_range(Some("bytes=3-6")).unwrap();
    let received = drain(&stream, start, stop).await;
    assert_eq!(received, b"3456");
}

// S3: open-ended range on a closed stream.
#[tokio::test]
async fn s3_open_ended_range_on_closed_stream() {
    let stream = Stream::new().unwrap();
    let (mut writer, reader) = duplex(1024);
    writer.write_all(b"0123456789").await.unwrap();
    drop(writer);
    stream.consume(reader).await.unwrap();

    let (start, stop) = livelog_core::parse_range(Some("bytes=7-")).unwrap();
    let received = drain(&stream, start, stop).await;
    assert_eq!(received, b"789");
}

// S5: two observers attached before any bytes exist both get the full,
// identical output (fan-out equivalence, invariant 2).
#[tokio::test]
async fn s5_fan_out_equivalence() {
    let stream = Stream::new().unwrap();
    let (mut writer, reader) = duplex(1024);

    let a = stream.clone();
    let b = stream.clone();
    let first = tokio::spawn(async move { drain(&a, 0, Stop::Open).await });
    let second = tokio::spawn(async move { drain(&b, 0, Stop::Open).await });

    // Let both observers register before any bytes show up.
    while stream.observer_count() < 2 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    writer.write_all(b"hello").await.unwrap();
    drop(writer);
    stream.consume(reader).await.unwrap();

    let a_result = first.await.unwrap();
    let b_result = second.await.unwrap();
    assert_eq!(a_result, b"hello");
    assert_eq!(b_result, b"hello");
}

// S6: producer aborts mid-stream; existing and late observers both see
// exactly the bytes written before the abort, then EOF.
#[tokio::test]
async fn s6_producer_abort_mid_stream() {
    let stream = Stream::new().unwrap();
    let (mut writer, reader) = duplex(1024);

    writer.write_all(b"par").await.unwrap();
    writer.flush().await.unwrap();

    let observer_stream = stream.clone();
    let early = tokio::spawn(async move { drain(&observer_stream, 0, Stop::Open).await });

    while stream.length() < 3 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // Simulate an abort: drop the write half without writing more, which
    // surfaces as an io error on the read half... but `duplex`'s read side
    // just sees EOF on drop, so we model "abort" as the producer side
    // returning a genuine io error instead.
    drop(writer);
    let err_reader = FailingAfterEof { inner: reader };
    let result = stream.consume(err_reader).await;
    assert!(result.is_err());
    assert!(stream.is_closed());

    let early_result = timeout(Duration::from_secs(1), early)
        .await
        .expect("early observer never completed")
        .unwrap();
    assert_eq!(early_result, b"par");

    // A second observer attached after the abort sees exactly the same
    // bytes, then completes immediately.
    let late_result = drain(&stream, 0, Stop::Open).await;
    assert_eq!(late_result, b"par");
}

/// Wraps a duplex reader so that hitting EOF once is reported as an I/O
/// error instead, modeling a producer-side failure after partial success.
struct FailingAfterEof<T> {
    inner: T,
}

impl<T: tokio::io::AsyncRead + Unpin> tokio::io::AsyncRead for FailingAfterEof<T> {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        match std::pin::Pin::new(&mut self.inner).poll_read(cx, buf) {
            std::task::Poll::Ready(Ok(())) if buf.filled().len() == before => {
                std::task::Poll::Ready(Err(std::io::Error::new(std::io::ErrorKind::Other, "producer aborted")))
            }
            other => other,
        }
    }
}

// Invariant 3 & cleanup (6): position is monotonic and the handle leaves
// the registry once write_to returns.
#[tokio::test]
async fn position_monotonic_and_cleanup_on_completion() {
    let stream = Stream::new().unwrap();
    let (mut writer, reader) = duplex(1024);
    writer.write_all(b"abcdefgh").await.unwrap();
    drop(writer);
    stream.consume(reader).await.unwrap();

    let handle = stream.observe(2, Stop::Bounded(6));
    assert_eq!(handle.position(), 2);
    let mut sink = Vec::new();
    let delivered = handle.write_to(&mut sink).await.unwrap();
    assert_eq!(delivered, 4);
    assert_eq!(sink, b"cdef");
    assert_eq!(stream.observer_count(), 0);
}

// Invariant 6, sink-error path: a failing sink still deregisters the
// handle once write_to returns its error.
#[tokio::test]
async fn cleanup_on_sink_error() {
    struct FailingSink;
    impl tokio::io::AsyncWrite for FailingSink {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::new(std::io::ErrorKind::Other, "disconnected")))
        }
        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    let stream = Stream::new().unwrap();
    let (mut writer, reader) = duplex(1024);
    writer.write_all(b"x").await.unwrap();
    drop(writer);
    stream.consume(reader).await.unwrap();

    let handle = stream.observe(0, Stop::Open);
    let mut sink = FailingSink;
    let result = handle.write_to(&mut sink).await;
    assert!(result.is_err());
    assert_eq!(stream.observer_count(), 0);
}

// Cleanup (6) via cancellation: dropping an observer without ever calling
// write_to still deregisters it.
#[tokio::test]
async fn cleanup_on_drop_without_write() {
    let stream = Stream::new().unwrap();
    let handle = stream.observe(0, Stop::Open);
    assert_eq!(stream.observer_count(), 1);
    drop(handle);
    assert_eq!(stream.observer_count(), 0);
}

// Invariant 4 (liveness): an observer attached before any data blocks,
// then wakes and delivers bytes as soon as they're appended, without the
// stream ever closing.
#[tokio::test]
async fn liveness_without_closing() {
    let stream = Stream::new().unwrap();
    let handle = stream.observe(0, Stop::Bounded(3));
    let mut sink = Vec::new();

    // write_to would block forever on an all-zero producer; race it
    // against a task that appends bytes via a side channel after a short
    // delay, then assert it completes well within the timeout.
    let (mut writer, reader) = duplex(1024);
    let consume_stream = stream.clone();
    let _ingest = tokio::spawn(async move {
        let _ = consume_stream.consume(reader).await;
    });

    let writer_task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        writer.write_all(b"xyz").await.unwrap();
        // keep the duplex open; this observer only needs 3 bytes
        std::mem::forget(writer);
    });

    let delivered = timeout(Duration::from_secs(1), handle.write_to(&mut sink))
        .await
        .expect("observer did not wake on new data")
        .unwrap();
    assert_eq!(delivered, 3);
    assert_eq!(sink, b"xyz");
    writer_task.await.unwrap();
}
