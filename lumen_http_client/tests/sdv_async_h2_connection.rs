// Copyright (c) 2023 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end tests of the HTTP/2 connection over an in-memory transport.
//! The peer side is scripted frame by frame so that frame ordering, flow
//! control and error classification are checked byte-exactly.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lumen_http_client::async_impl::{Body, H2Connection};
use lumen_http_client::{Cancellation, ConnDetail, H2Config, Request};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

const PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

// Indexed static-table entries `:status: 200` and `:status: 204`, and a
// literal `content-length` field with an indexed name.
const STATUS_200: u8 = 0x88;
const STATUS_204: u8 = 0x89;

fn detail() -> ConnDetail {
    ConnDetail {
        local: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080),
        peer: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 443),
        addr: String::from("localhost"),
    }
}

async fn write_frame(io: &mut DuplexStream, frame_type: u8, flags: u8, id: u32, payload: &[u8]) {
    let mut bytes = vec![
        (payload.len() >> 16) as u8,
        (payload.len() >> 8) as u8,
        payload.len() as u8,
        frame_type,
        flags,
        (id >> 24) as u8,
        (id >> 16) as u8,
        (id >> 8) as u8,
        id as u8,
    ];
    bytes.extend_from_slice(payload);
    io.write_all(&bytes).await.unwrap();
}

async fn read_frame(io: &mut DuplexStream) -> (u8, u8, u32, Vec<u8>) {
    let mut header = [0u8; 9];
    io.read_exact(&mut header).await.unwrap();
    let length =
        ((header[0] as usize) << 16) | ((header[1] as usize) << 8) | (header[2] as usize);
    let id = (((header[5] & 0x7f) as u32) << 24)
        | ((header[6] as u32) << 16)
        | ((header[7] as u32) << 8)
        | (header[8] as u32);
    let mut payload = vec![0u8; length];
    io.read_exact(&mut payload).await.unwrap();
    (header[3], header[4], id, payload)
}

// Consumes the client preface and SETTINGS, answers with the given server
// settings and consumes the client's SETTINGS ack.
async fn handshake(io: &mut DuplexStream, server_settings: &[u8]) {
    let mut preface = [0u8; 24];
    io.read_exact(&mut preface).await.unwrap();
    assert_eq!(preface, PREFACE);

    let (frame_type, flags, id, _) = read_frame(io).await;
    assert_eq!(frame_type, 0x4);
    assert_eq!(flags, 0);
    assert_eq!(id, 0);

    write_frame(io, 0x4, 0, 0, server_settings).await;

    let (frame_type, flags, _, payload) = read_frame(io).await;
    assert_eq!(frame_type, 0x4);
    assert_eq!(flags, 0x1);
    assert!(payload.is_empty());
}

fn get_request(path: &str) -> Request<Body> {
    let url = format!("http://localhost{path}");
    Request::builder()
        .method("GET")
        .url(url.as_str())
        .body(Body::empty())
        .unwrap()
}

/// SDV test case for a headers-only response.
///
/// # Brief
/// 1. Sends a GET request with an empty body.
/// 2. The peer answers a PING and a 204 response with END_STREAM set.
/// 3. Checks the PING echo, the status, the empty body, and that the next
///    stream takes the following odd identifier.
#[tokio::test]
async fn sdv_h2_headers_only_response() {
    let (client_io, mut server) = tokio::io::duplex(64 * 1024);
    let connection = H2Connection::new(detail(), H2Config::new(), client_io);

    let server_task = tokio::spawn(async move {
        handshake(&mut server, &[]).await;

        let (frame_type, flags, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        // END_STREAM and END_HEADERS are both set on a bodyless request.
        assert_eq!(flags & 0x5, 0x5);
        assert_eq!(id, 1);

        write_frame(&mut server, 0x6, 0, 0, b"pingpong").await;
        let (frame_type, flags, _, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x6);
        assert_eq!(flags, 0x1);
        assert_eq!(payload, b"pingpong");

        write_frame(&mut server, 0x1, 0x5, 1, &[STATUS_204]).await;

        // The next request must take the next odd stream id.
        let (frame_type, _, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 3);
        write_frame(&mut server, 0x1, 0x5, 3, &[STATUS_204]).await;
    });

    let mut response = connection
        .request(get_request("/x"), Cancellation::new())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    assert!(response.text().await.unwrap().is_empty());
    assert!(!connection.is_busy());

    let response = connection
        .request(get_request("/y"), Cancellation::new())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    server_task.await.unwrap();
}

/// SDV test case for a chunked response body gated by flow control.
///
/// # Brief
/// 1. Configures a 10-byte stream receive window and sends a GET request.
/// 2. The peer answers 200 with `content-length: 20` and two 10-byte DATA
///    frames, waiting for the stream WINDOW_UPDATE in between.
/// 3. Checks that the update replenishes exactly the consumed 10 bytes and
///    that the body arrives completely and in order.
#[tokio::test]
async fn sdv_h2_response_body_flow_control() {
    let (client_io, mut server) = tokio::io::duplex(64 * 1024);
    let mut config = H2Config::new();
    config.set_stream_window_size(10);
    let connection = H2Connection::new(detail(), config, client_io);

    let server_task = tokio::spawn(async move {
        handshake(&mut server, &[]).await;

        let (frame_type, _, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 1);

        // 200 with content-length: 20, END_HEADERS only.
        write_frame(
            &mut server,
            0x1,
            0x4,
            1,
            &[STATUS_200, 0x5c, 0x02, b'2', b'0'],
        )
        .await;
        write_frame(&mut server, 0x0, 0, 1, b"abcdefghij").await;

        // The consumed stream window must be replenished before the rest of
        // the body is sent.
        let (frame_type, _, id, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x8);
        assert_eq!(id, 1);
        assert_eq!(payload, [0, 0, 0, 10]);

        write_frame(&mut server, 0x0, 0x1, 1, b"klmnopqrst").await;
    });

    let mut response = connection
        .request(get_request("/data"), Cancellation::new())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers().get("content-length").unwrap().to_string().unwrap(),
        "20"
    );
    assert_eq!(response.text().await.unwrap(), "abcdefghijklmnopqrst");

    server_task.await.unwrap();
}

/// SDV test case for oversized outbound header blocks.
///
/// # Brief
/// 1. Sends a request whose header block exceeds the maximum frame size.
/// 2. Checks that the wire carries a full-sized HEADERS frame without
///    END_HEADERS (but with END_STREAM) followed by a CONTINUATION frame
///    with END_HEADERS.
#[tokio::test]
async fn sdv_h2_oversized_header_block_continuation() {
    let (client_io, mut server) = tokio::io::duplex(256 * 1024);
    let connection = H2Connection::new(detail(), H2Config::new(), client_io);

    let server_task = tokio::spawn(async move {
        handshake(&mut server, &[]).await;

        let (frame_type, flags, id, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 1);
        // The first fragment fills the whole frame, carries END_STREAM and
        // leaves END_HEADERS to the last fragment.
        assert_eq!(payload.len(), 16384);
        assert_eq!(flags & 0x4, 0);
        assert_eq!(flags & 0x1, 0x1);

        let (frame_type, flags, id, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x9);
        assert_eq!(id, 1);
        assert_eq!(flags & 0x4, 0x4);
        assert!(!payload.is_empty());

        write_frame(&mut server, 0x1, 0x5, 1, &[STATUS_204]).await;
    });

    let huge = "x".repeat(20000);
    let request = Request::builder()
        .method("GET")
        .url("http://localhost/big")
        .header("x-filler", &huge)
        .body(Body::empty())
        .unwrap();
    let response = connection
        .request(request, Cancellation::new())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    server_task.await.unwrap();
}

/// SDV test case for a peer reset in the middle of a response body.
///
/// # Brief
/// 1. The peer sends part of the body and then RST_STREAM with
///    REFUSED_STREAM.
/// 2. Checks that the body read fails with the peer's error code while the
///    connection stays usable for the next request.
#[tokio::test]
async fn sdv_h2_peer_reset_mid_body() {
    let (client_io, mut server) = tokio::io::duplex(64 * 1024);
    let connection = H2Connection::new(detail(), H2Config::new(), client_io);

    let server_task = tokio::spawn(async move {
        handshake(&mut server, &[]).await;

        let (frame_type, _, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 1);

        write_frame(&mut server, 0x1, 0x4, 1, &[STATUS_200]).await;
        write_frame(&mut server, 0x0, 0, 1, b"hello").await;
        // REFUSED_STREAM = 0x7.
        write_frame(&mut server, 0x3, 0, 1, &[0, 0, 0, 7]).await;

        // The connection survives; the next exchange works.
        let (frame_type, _, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 3);
        write_frame(&mut server, 0x1, 0x5, 3, &[STATUS_204]).await;
    });

    let mut response = connection
        .request(get_request("/interrupted"), Cancellation::new())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let err = response.text().await.unwrap_err();
    assert!(format!("{err}").contains("RefusedStream"));

    let response = connection
        .request(get_request("/next"), Cancellation::new())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    server_task.await.unwrap();
}

/// SDV test case for a peer GOAWAY with two streams in flight.
///
/// # Brief
/// 1. Starts two requests so streams 1 and 3 are open, then the peer sends
///    GOAWAY naming last stream 1.
/// 2. Checks that stream 3 fails with the retryable disconnect error and
///    stream 1 with a terminal error, and that the connection reports
///    closed afterwards.
#[tokio::test]
async fn sdv_h2_goaway_classifies_streams() {
    let (client_io, mut server) = tokio::io::duplex(64 * 1024);
    let connection = H2Connection::new(detail(), H2Config::new(), client_io);
    let closed = Arc::new(AtomicBool::new(false));
    let closed_mark = closed.clone();
    connection.on_close(move || closed_mark.store(true, Ordering::Release));

    let server_task = tokio::spawn(async move {
        handshake(&mut server, &[]).await;

        let (frame_type, _, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 1);
        let (frame_type, _, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 3);

        // GOAWAY: last stream id 1, NO_ERROR.
        write_frame(&mut server, 0x7, 0, 0, &[0, 0, 0, 1, 0, 0, 0, 0]).await;
    });

    let first = connection.request(get_request("/one"), Cancellation::new());
    let second = connection.request(get_request("/two"), Cancellation::new());
    let (first, second) = tokio::join!(first, second);

    // Stream 3 was never processed by the peer and is retry-eligible.
    let second_err = second.unwrap_err();
    assert!(format!("{second_err}").contains("remote peer closed"));
    // Stream 1 fails with the terminal connection error.
    let first_err = first.unwrap_err();
    assert!(!format!("{first_err}").contains("remote peer closed"));

    server_task.await.unwrap();

    // The close callbacks fire exactly once on the goaway path as well.
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !closed.load(Ordering::Acquire) {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert!(connection.is_busy());
}

/// SDV test case for cooperative cancellation.
///
/// # Brief
/// 1. Starts a request whose streamed body never finishes.
/// 2. Fires the cancellation after the peer has seen the request head and
///    the first body chunk.
/// 3. Checks that RST_STREAM with CANCEL goes out, the caller observes a
///    user-aborted error and the concurrency slot is restored.
#[tokio::test]
async fn sdv_h2_request_cancellation() {
    let (client_io, mut server) = tokio::io::duplex(64 * 1024);
    let connection = H2Connection::new(detail(), H2Config::new(), client_io);

    let cancel = Cancellation::new();
    let handle = cancel.clone();
    let (seen_tx, seen_rx) = tokio::sync::oneshot::channel::<()>();

    let server_task = tokio::spawn(async move {
        handshake(&mut server, &[]).await;

        let (frame_type, flags, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        // A streamed request body leaves END_STREAM unset.
        assert_eq!(flags & 0x1, 0);
        assert_eq!(id, 1);

        let (frame_type, _, id, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x0);
        assert_eq!(id, 1);
        assert_eq!(payload, b"abc");
        seen_tx.send(()).unwrap();

        // The client must reset the stream with CANCEL = 0x8.
        loop {
            let (frame_type, _, id, payload) = read_frame(&mut server).await;
            if frame_type == 0x3 {
                assert_eq!(id, 1);
                assert_eq!(payload, [0, 0, 0, 8]);
                break;
            }
        }
        // The transport is handed back so the connection stays open while
        // the test checks its state.
        server
    });

    // A body that yields three bytes and then stays pending.
    let (mut body_tx, body_rx) = tokio::io::duplex(1024);
    body_tx.write_all(b"abc").await.unwrap();
    let request = Request::builder()
        .method("POST")
        .url("http://localhost/upload")
        .body(Body::stream(body_rx))
        .unwrap();

    let request_task = connection.request(request, cancel);
    tokio::pin!(request_task);

    // Fires the cancellation once the peer has observed the first chunk.
    let err = {
        tokio::select! {
            res = &mut request_task => res.unwrap_err(),
            _ = async {
                seen_rx.await.unwrap();
                handle.cancel();
                std::future::pending::<()>().await
            } => unreachable!(),
        }
    };
    assert_eq!(
        err.error_kind(),
        lumen_http_client::ErrorKind::UserAborted
    );

    let _server = server_task.await.unwrap();
    assert!(!connection.is_busy());
}

/// SDV test case for a request body gated by the peer's send window.
///
/// # Brief
/// 1. The peer advertises INITIAL_WINDOW_SIZE = 5 during the handshake.
/// 2. An 8-byte body must go out as a 5-byte DATA frame, and only after a
///    stream WINDOW_UPDATE the remaining 3 bytes and the END_STREAM frame.
#[tokio::test]
async fn sdv_h2_request_body_send_window() {
    let (client_io, mut server) = tokio::io::duplex(64 * 1024);
    let connection = H2Connection::new(detail(), H2Config::new(), client_io);

    let server_task = tokio::spawn(async move {
        // INITIAL_WINDOW_SIZE = 5.
        handshake(&mut server, &[0x00, 0x04, 0x00, 0x00, 0x00, 0x05]).await;

        let (frame_type, _, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 1);

        let (frame_type, flags, _, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x0);
        assert_eq!(flags & 0x1, 0);
        assert_eq!(payload, b"abcde");

        // Grant 5 more bytes; the remainder drains on the next credit.
        write_frame(&mut server, 0x8, 0, 1, &[0, 0, 0, 5]).await;

        let (frame_type, _, _, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x0);
        assert_eq!(payload, b"fgh");
        let (frame_type, flags, _, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x0);
        assert_eq!(flags & 0x1, 0x1);
        assert!(payload.is_empty());

        write_frame(&mut server, 0x1, 0x5, 1, &[STATUS_204]).await;
    });

    let request = Request::builder()
        .method("POST")
        .url("http://localhost/upload")
        .body(Body::slice(b"abcdefgh".to_vec()))
        .unwrap();
    let response = connection
        .request(request, Cancellation::new())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    server_task.await.unwrap();
}

/// SDV test case for graceful shutdown.
///
/// # Brief
/// 1. Completes one exchange, then closes the connection.
/// 2. Checks that GOAWAY with NO_ERROR goes out, the on-close callback
///    fires exactly once, the connection reports closed, and further
///    requests are rejected.
#[tokio::test]
async fn sdv_h2_graceful_close() {
    let (client_io, mut server) = tokio::io::duplex(64 * 1024);
    let connection = H2Connection::new(detail(), H2Config::new(), client_io);
    let fired = Arc::new(AtomicBool::new(false));
    let fired_mark = fired.clone();
    connection.on_close(move || fired_mark.store(true, Ordering::Release));

    let server_task = tokio::spawn(async move {
        handshake(&mut server, &[]).await;

        let (frame_type, _, id, _) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x1);
        assert_eq!(id, 1);
        write_frame(&mut server, 0x1, 0x5, 1, &[STATUS_204]).await;

        let (frame_type, _, id, payload) = read_frame(&mut server).await;
        assert_eq!(frame_type, 0x7);
        assert_eq!(id, 0);
        // Last stream id 0 (all streams complete) and NO_ERROR.
        assert_eq!(&payload[..8], &[0, 0, 0, 0, 0, 0, 0, 0]);
    });

    let response = connection
        .request(get_request("/last"), Cancellation::new())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    connection.close().await;
    assert!(fired.load(Ordering::Acquire));
    assert!(connection.is_busy());

    // Closing again is a no-op, late callbacks fire immediately.
    connection.close().await;
    let late = Arc::new(AtomicBool::new(false));
    let late_mark = late.clone();
    connection.on_close(move || late_mark.store(true, Ordering::Release));
    assert!(late.load(Ordering::Acquire));

    let err = connection
        .request(get_request("/rejected"), Cancellation::new())
        .await
        .unwrap_err();
    assert_eq!(err.error_kind(), lumen_http_client::ErrorKind::Connect);

    server_task.await.unwrap();
}
