//! Integration tests for pharos-client.
//!
//! Each test starts a one-connection scripted server on an ephemeral
//! port and drives the public client API against it over a real socket.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use pharos_client::{execute_query, PharosClient, PharosError, PharosResult};

/// Bind a scripted server that greets with a banner, answers the `id`
/// line with `id_reply`, then answers the next command with `response`
/// written in `chunk`-sized pieces. Returns the bound address and a
/// handle resolving to the command line the server received.
async fn scripted_server(
    id_reply: &'static str,
    response: &'static [u8],
    chunk: usize,
) -> (String, tokio::task::JoinHandle<Option<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        write_half
            .write_all(b"100:Pharos Directory ready\r\n")
            .await
            .unwrap();

        let id_line = lines.next_line().await.unwrap()?;
        assert!(id_line.starts_with("id "), "expected id line, got {id_line:?}");
        write_half.write_all(id_reply.as_bytes()).await.unwrap();

        let command = lines.next_line().await.unwrap()?;
        for piece in response.chunks(chunk.max(1)) {
            // The client may hang up right after its terminal line;
            // trailing write failures are not the server's problem.
            if write_half.write_all(piece).await.is_err() {
                break;
            }
            let _ = write_half.flush().await;
        }
        Some(command)
    });

    (addr, handle)
}

const SINGLE_RECORD: &[u8] = b"102:There were 1 matches to your request.\r\n\
    -200:1:hostname: node-01\r\n\
    -200:1:ip: 192.168.1.1\r\n\
    200:Ok\r\n";

fn assert_single_record(result: PharosResult) {
    match result {
        PharosResult::Matches { count, records } => {
            assert_eq!(count, 1);
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].id, 1);
            assert_eq!(records[0].field("hostname"), Some("node-01"));
            assert_eq!(records[0].field("ip"), Some("192.168.1.1"));
        }
        other => panic!("expected one match, got {other:?}"),
    }
}

#[tokio::test]
async fn test_single_record_round_trip() {
    let (addr, server) = scripted_server("200:Ok\r\n", SINGLE_RECORD, usize::MAX).await;

    let result = PharosClient::new(addr, "test-suite")
        .query("hostname=node-01")
        .await
        .unwrap();

    assert_single_record(result);
    assert_eq!(
        server.await.unwrap().as_deref(),
        Some("query hostname=node-01")
    );
}

#[tokio::test]
async fn test_response_split_across_small_chunks() {
    // Same response delivered three bytes at a time must parse
    // identically to the single-write case.
    let (addr, server) = scripted_server("200:Ok\r\n", SINGLE_RECORD, 3).await;

    let result = PharosClient::new(addr, "test-suite")
        .query("hostname=node-01")
        .await
        .unwrap();

    assert_single_record(result);
    server.await.unwrap();
}

#[tokio::test]
async fn test_execute_query_entry_point() {
    let (addr, server) = scripted_server("200:Ok\r\n", SINGLE_RECORD, usize::MAX).await;
    let (host, port) = addr.rsplit_once(':').unwrap();

    let result = execute_query("test-suite", "hostname=node-01", host, port.parse().unwrap())
        .await
        .unwrap();

    assert_single_record(result);
    server.await.unwrap();
}

#[tokio::test]
async fn test_zero_matches_yields_ok() {
    let (addr, server) =
        scripted_server("200:ID:Accepted\r\n", b"200:QUERY:Complete\r\n", usize::MAX).await;

    let result = PharosClient::new(addr, "test-suite")
        .query("hostname=unknown")
        .await
        .unwrap();

    assert_eq!(
        result,
        PharosResult::Ok {
            message: "QUERY:Complete".to_string()
        }
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_server_error_surfaced() {
    let (addr, server) =
        scripted_server("200:Ok\r\n", b"404:QUERY:Record not found\r\n", usize::MAX).await;

    let result = PharosClient::new(addr, "test-suite")
        .query("hostname=missing")
        .await
        .unwrap();

    assert_eq!(
        result,
        PharosResult::Error {
            code: 404,
            message: "QUERY:Record not found".to_string()
        }
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_identity_rejection_short_circuits() {
    let (addr, server) = scripted_server("500:Denied\r\n", b"", usize::MAX).await;

    let result = PharosClient::new(addr, "test-suite")
        .query("hostname=x")
        .await
        .unwrap();

    match result {
        PharosResult::Error { code: 500, message } => assert!(message.contains("500:Denied")),
        other => panic!("expected rejection, got {other:?}"),
    }

    // The only line after `id` is the courtesy quit: no query was sent.
    assert_eq!(server.await.unwrap().as_deref(), Some("quit"));
}

#[tokio::test]
async fn test_add_command_sent_quoted() {
    let (addr, server) = scripted_server("200:Ok\r\n", b"200:ADD:Ok\r\n", usize::MAX).await;

    let result = PharosClient::new(addr, "test-suite")
        .add(&[("type", "machine"), ("note", "rack \"B\"")])
        .await
        .unwrap();

    assert_eq!(
        result,
        PharosResult::Ok {
            message: "ADD:Ok".to_string()
        }
    );
    assert_eq!(
        server.await.unwrap().as_deref(),
        Some(r#"add type="machine" note="rack \"B\"""#)
    );
}

#[tokio::test]
async fn test_blank_line_terminal() {
    let (addr, server) = scripted_server("200:Ok\r\n", b"\r\n", usize::MAX).await;

    let result = PharosClient::new(addr, "test-suite")
        .query("hostname=x")
        .await
        .unwrap();

    assert_eq!(
        result,
        PharosResult::Ok {
            message: "Ok".to_string()
        }
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_silent_peer_hits_deadline() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        // Banner only, then silence: the handshake never completes.
        let (_read_half, mut write_half) = stream.into_split();
        write_half.write_all(b"100:ready\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let result = PharosClient::new(addr, "test-suite")
        .deadline(Duration::from_millis(100))
        .query("hostname=x")
        .await
        .unwrap();

    match result {
        PharosResult::Error { code, .. } => assert_eq!(code, 408),
        other => panic!("expected timeout error, got {other:?}"),
    }
    server.abort();
}

#[tokio::test]
async fn test_cancellation_resolves_operation() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (_read_half, mut write_half) = stream.into_split();
        write_half.write_all(b"100:ready\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = PharosClient::new(addr, "test-suite")
        .cancel_token(token)
        .query("hostname=x")
        .await
        .unwrap();

    match result {
        PharosResult::Error { code, .. } => assert_eq!(code, 499),
        other => panic!("expected cancellation error, got {other:?}"),
    }
    server.abort();
}

#[tokio::test]
async fn test_eof_before_terminal_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        write_half.write_all(b"100:ready\r\n").await.unwrap();
        let _id = lines.next_line().await.unwrap();
        write_half.write_all(b"200:Ok\r\n").await.unwrap();
        let _query = lines.next_line().await.unwrap();
        // Hang up without a terminal line.
    });

    let result = PharosClient::new(addr, "test-suite").query("hostname=x").await;

    assert!(matches!(result, Err(PharosError::ConnectionClosed)));
    server.await.unwrap();
}
