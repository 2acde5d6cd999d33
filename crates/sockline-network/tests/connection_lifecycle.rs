//! Connection lifecycle tests against the mock transport.
//!
//! These tests drive every notification sequence by hand, so each race
//! (ready vs error, completion vs close, data vs timeout vs close) is
//! exercised deterministically.

use futures::poll;
use std::io;
use std::pin::pin;
use std::time::Duration;
use sockline_core::{ErrorKind, Operation};
use sockline_network::mock::{MockTransport, MockTransportHandle, WriteOutcome};
use sockline_network::{Connection, LineFraming};

async fn connected() -> (Connection<MockTransport>, MockTransportHandle) {
    let (transport, handle) = MockTransport::new();
    handle.ready();

    let conn = Connection::establish(transport, None, LineFraming::new("\n"))
        .await
        .unwrap();

    (conn, handle)
}

// ============================================================================
// Connection Factory
// ============================================================================

/// Test that an error before ready rejects with ConnectionRefused
#[tokio::test(start_paused = true)]
async fn test_error_before_ready_is_refused() {
    let (transport, handle) = MockTransport::new();

    let driver = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.error(io::Error::new(io::ErrorKind::ConnectionRefused, "Connection Refused"));
    };

    let (result, ()) = tokio::join!(
        Connection::establish(transport, None, LineFraming::default()),
        driver
    );

    let err = result.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
    assert_eq!(err.operation(), Operation::Connect);
    assert_eq!(err.io_error().unwrap().to_string(), "Connection Refused");
}

/// Test that ready resolves with a usable connection
#[tokio::test(start_paused = true)]
async fn test_ready_resolves_connection() {
    let (transport, handle) = MockTransport::new();

    let driver = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.ready();
    };

    let (result, ()) = tokio::join!(
        Connection::establish(transport, None, LineFraming::default()),
        driver
    );

    let mut conn = result.unwrap();
    conn.write("test message").await.unwrap();
    assert_eq!(handle.writes().len(), 1);
}

/// Test that only the first of {ready, error} counts
#[tokio::test]
async fn test_ready_then_error_still_resolves() {
    let (transport, handle) = MockTransport::new();
    handle.ready();
    handle.error(io::Error::other("too late"));

    let conn = Connection::establish(transport, None, LineFraming::default()).await;
    assert!(conn.is_ok());
}

/// Test that the idle timeout is armed before first use
#[tokio::test]
async fn test_idle_timeout_armed_during_establish() {
    let (transport, handle) = MockTransport::new();
    handle.ready();

    let idle = Some(Duration::from_millis(750));
    let conn = Connection::establish(transport, idle, LineFraming::default())
        .await
        .unwrap();

    assert_eq!(handle.idle_timeout(), idle);
    assert_eq!(conn.idle_timeout(), idle);
}

// ============================================================================
// write()
// ============================================================================

/// Test successful write completion
#[tokio::test]
async fn test_write_success() {
    let (mut conn, handle) = connected().await;

    conn.write("test message").await.unwrap();

    assert_eq!(handle.writes(), vec![bytes::Bytes::from_static(b"test message")]);
}

/// Test that a failed write completion is a transmission error
#[tokio::test]
async fn test_write_completion_failure() {
    let (mut conn, handle) = connected().await;
    handle.script_write(WriteOutcome::Fail(io::Error::from(io::ErrorKind::BrokenPipe)));

    let err = conn.write("test message").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransmissionError);
    assert_eq!(err.operation(), Operation::Write);
    assert_eq!(err.io_error().unwrap().kind(), io::ErrorKind::BrokenPipe);
}

/// Test close with error before write completion
#[tokio::test]
async fn test_close_with_error_before_completion() {
    let (mut conn, handle) = connected().await;
    handle.script_write(WriteOutcome::Hold);

    let mut write = pin!(conn.write("test message"));
    assert!(poll!(write.as_mut()).is_pending());

    handle.close(true);
    let err = write.await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransmissionError);
    assert_eq!(err.close_signal().map(|s| s.had_error), Some(true));
}

/// Test clean close before write completion
#[tokio::test]
async fn test_clean_close_before_completion() {
    let (mut conn, handle) = connected().await;
    handle.script_write(WriteOutcome::Hold);

    let mut write = pin!(conn.write("test message"));
    assert!(poll!(write.as_mut()).is_pending());

    handle.close(false);
    let err = write.await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConnectionClosed);
}

/// Test that completion arriving before close wins
#[tokio::test]
async fn test_completion_before_close_wins() {
    let (mut conn, handle) = connected().await;
    handle.script_write(WriteOutcome::Hold);

    let mut write = pin!(conn.write("test message"));
    assert!(poll!(write.as_mut()).is_pending());

    assert!(handle.complete_write(Ok(())));
    handle.close(true);

    write.await.unwrap();
}

/// Test that data arriving while a write is pending never reaches a later recv
#[tokio::test]
async fn test_data_during_write_is_discarded() {
    let (mut conn, handle) = connected().await;
    handle.script_write(WriteOutcome::Hold);

    {
        let mut write = pin!(conn.write("request\n"));
        assert!(poll!(write.as_mut()).is_pending());

        handle.data("stray\n");
        assert!(poll!(write.as_mut()).is_pending());

        assert!(handle.complete_write(Ok(())));
        write.await.unwrap();
    }

    handle.data("reply\n");
    assert_eq!(conn.recv().await.unwrap(), "reply\n");
}

/// Test that a failed write does not close the transport
#[tokio::test]
async fn test_failed_write_leaves_transport_open() {
    let (mut conn, handle) = connected().await;
    handle.script_write(WriteOutcome::Fail(io::Error::other("boom")));

    assert!(conn.write("x").await.is_err());
    assert_eq!(handle.destroy_calls(), 0);

    conn.write("y").await.unwrap();
}

// ============================================================================
// recv()
// ============================================================================

/// Test single-chunk message
#[tokio::test]
async fn test_recv_single_chunk() {
    let (mut conn, handle) = connected().await;
    handle.data("test\n");

    assert_eq!(conn.recv().await.unwrap(), "test\n");
}

/// Test message delivered across several chunks
#[tokio::test(start_paused = true)]
async fn test_recv_multi_chunk() {
    let (mut conn, handle) = connected().await;

    let driver = async {
        for chunk in ["hel", "lo ", "world\n"] {
            tokio::time::sleep(Duration::from_millis(5)).await;
            handle.data(chunk);
        }
    };

    let (result, ()) = tokio::join!(conn.recv(), driver);
    assert_eq!(result.unwrap(), "hello world\n");
}

/// Test that a delimiter not at the end of the chunk does not complete
#[tokio::test]
async fn test_recv_delimiter_mid_chunk() {
    let (mut conn, handle) = connected().await;
    handle.data("first\nsecond");

    let mut recv = pin!(conn.recv());
    assert!(poll!(recv.as_mut()).is_pending());

    handle.data(" third\n");
    assert_eq!(recv.await.unwrap(), "first\nsecond third\n");
}

/// Test idle timeout before data
#[tokio::test]
async fn test_recv_timeout() {
    let (transport, handle) = MockTransport::new();
    handle.ready();
    let idle = Some(Duration::from_millis(100));
    let mut conn = Connection::establish(transport, idle, LineFraming::new("\n"))
        .await
        .unwrap();

    handle.timeout();
    let err = conn.recv().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.operation(), Operation::Recv);
}

/// Test clean close before data
#[tokio::test]
async fn test_recv_clean_close() {
    let (mut conn, handle) = connected().await;
    handle.close(false);

    let err = conn.recv().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionClosed);
}

/// Test close with error before data
#[tokio::test]
async fn test_recv_close_with_error() {
    let (mut conn, handle) = connected().await;
    handle.close(true);

    let err = conn.recv().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransmissionError);
}

/// Test that a partial message is dropped when the connection closes
#[tokio::test]
async fn test_recv_close_mid_message() {
    let (mut conn, handle) = connected().await;
    handle.data("partial");
    handle.close(false);

    let err = conn.recv().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionClosed);
}

/// Test that each recv starts with an empty accumulator
#[tokio::test]
async fn test_recv_does_not_carry_over_partial_data() {
    let (mut conn, handle) = connected().await;

    handle.data("partial");
    handle.timeout();
    assert_eq!(conn.recv().await.unwrap_err().kind(), ErrorKind::Timeout);

    handle.data("complete\n");
    assert_eq!(conn.recv().await.unwrap(), "complete\n");
}

/// Test request/response cycles on one connection
#[tokio::test]
async fn test_sequential_exchanges() {
    let (mut conn, handle) = connected().await;

    for i in 1..=5 {
        conn.write(format!("request {i}\n")).await.unwrap();
        handle.data(format!("response {i}\n"));
        assert_eq!(conn.recv().await.unwrap(), format!("response {i}\n"));
    }

    assert_eq!(handle.writes().len(), 5);
}

/// Test custom delimiter
#[tokio::test]
async fn test_recv_custom_delimiter() {
    let (transport, handle) = MockTransport::new();
    handle.ready();
    let mut conn = Connection::establish(transport, None, LineFraming::new("\r\n"))
        .await
        .unwrap();

    handle.data("line\n");
    handle.data("end\r\n");

    assert_eq!(conn.recv().await.unwrap(), "line\nend\r\n");
}

// ============================================================================
// close()
// ============================================================================

/// Test that close destroys the transport once per call
#[tokio::test]
async fn test_close_destroys_transport() {
    let (mut conn, handle) = connected().await;

    conn.close();

    assert_eq!(handle.destroy_calls(), 1);
}

/// Test close after abandoning a pending recv
#[tokio::test]
async fn test_close_after_abandoned_recv() {
    let (mut conn, handle) = connected().await;

    {
        let mut recv = pin!(conn.recv());
        assert!(poll!(recv.as_mut()).is_pending());
    }

    conn.close();
    assert_eq!(handle.destroy_calls(), 1);
}
