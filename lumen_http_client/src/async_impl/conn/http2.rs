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

use std::cmp::min;
use std::pin::Pin;
use std::task::{Context, Poll};

use lumen_http::error::HttpError;
use lumen_http::h2;
use lumen_http::h2::{ErrorCode, Frame, FrameFlags, H2Error, Payload, PseudoHeaders};
use lumen_http::headers::Headers;
use lumen_http::request::uri::Scheme;
use lumen_http::request::RequestPart;
use lumen_http::response::status::StatusCode;
use lumen_http::response::ResponsePart;
use lumen_http::version::Version;

use crate::async_impl::{Body, HttpBody, Response};
use crate::error::{ErrorKind, HttpClientError};
use crate::runtime::{AsyncRead, ReadBuf};
use crate::util::cancel::Cancellation;
use crate::util::data_ref::BodyDataRef;
use crate::util::dispatcher::http2::{Http2Conn, ReqMessage};
use crate::util::h2::RequestWrapper;
use crate::Request;

const UNUSED_FLAG: u8 = 0x0;

/// Drives one request/response exchange over the connection: the request
/// head and body are handed to the connection manager, the response head is
/// awaited on the per-request channel, and the remaining frames become the
/// response body stream. Cancellation resets the stream with the CANCEL
/// error code and resolves the caller with a user-aborted error.
pub(crate) async fn request<S>(
    mut conn: Http2Conn<S>,
    request: Request<Body>,
    mut cancel: Cancellation,
) -> Result<Response, HttpClientError>
where
    S: Sync + Send + Unpin + 'static,
{
    let (part, body) = request.into_parts();
    let is_end_stream = body.is_empty();
    let (flag, payload) = build_headers_payload(part, is_end_stream)
        .map_err(|e| HttpClientError::from_error(ErrorKind::Request, e))?;
    let data = BodyDataRef::new(body);
    let stream = RequestWrapper {
        flag,
        payload,
        data,
    };
    conn.send_frame_to_controller(stream)?;
    let cancel_tx = conn.sender.clone();
    let token = conn.token;
    let frame = {
        tokio::select! {
            frame = conn.receiver.recv() => frame,
            _ = cancel.cancelled() => {
                let _ = cancel_tx.send(ReqMessage::Cancel(token));
                Err(HttpClientError::user_aborted())
            }
        }
    }?;
    frame_2_response(conn, frame)
}

fn frame_2_response<S>(
    conn: Http2Conn<S>,
    headers_frame: Frame,
) -> Result<Response, HttpClientError>
where
    S: Sync + Send + Unpin + 'static,
{
    let part = match headers_frame.payload() {
        Payload::Headers(headers) => {
            let (pseudo, fields) = headers.parts();
            let status_code = match pseudo.status() {
                Some(status) => StatusCode::from_bytes(status.as_bytes())
                    .map_err(|e| HttpClientError::from_error(ErrorKind::Request, e))?,
                None => {
                    return Err(build_client_error(
                        headers_frame.stream_id(),
                        ErrorCode::ProtocolError,
                    ));
                }
            };
            ResponsePart {
                version: Version::HTTP2,
                status: status_code,
                headers: fields.clone(),
            }
        }
        Payload::RstStream(reset) => {
            return Err(build_client_error(
                headers_frame.stream_id(),
                ErrorCode::try_from(reset.error_code()).unwrap_or(ErrorCode::InternalError),
            ));
        }
        _ => {
            return Err(build_client_error(
                headers_frame.stream_id(),
                ErrorCode::ProtocolError,
            ));
        }
    };

    // A headers-only response carries an empty body and its stream is
    // already released.
    let body = if headers_frame.flags().is_end_stream() {
        HttpBody::empty()
    } else {
        HttpBody::stream(TextIo::new(conn))
    };
    Ok(Response::new(lumen_http::response::Response::from_raw_parts(part, body)))
}

pub(crate) fn build_headers_payload(
    mut part: RequestPart,
    is_end_stream: bool,
) -> Result<(FrameFlags, Payload), HttpError> {
    let host = part.headers.remove("host");
    remove_connection_specific_headers(&mut part.headers)?;
    let pseudo = build_pseudo_headers(&part, host.and_then(|value| value.to_string().ok()));
    let mut header_part = h2::Parts::new();
    header_part.set_header_lines(part.headers);
    header_part.set_pseudo(pseudo);
    let headers_payload = h2::Headers::new(header_part);

    let mut flag = FrameFlags::new(UNUSED_FLAG);
    flag.set_end_headers(true);
    if is_end_stream {
        flag.set_end_stream(true);
    }
    Ok((flag, Payload::Headers(headers_payload)))
}

// Illegal headers validation in http2.
// [`Connection-Specific Headers`] implementation.
//
// [`Connection-Specific Headers`]: https://www.rfc-editor.org/rfc/rfc9113.html#name-connection-specific-header-
fn remove_connection_specific_headers(headers: &mut Headers) -> Result<(), HttpError> {
    const CONNECTION_SPECIFIC_HEADERS: &[&str; 5] = &[
        "connection",
        "keep-alive",
        "proxy-connection",
        "upgrade",
        "transfer-encoding",
    ];
    for specific_header in CONNECTION_SPECIFIC_HEADERS.iter() {
        headers.remove(*specific_header);
    }

    if let Some(te_ref) = headers.get("te") {
        let te = te_ref.to_string()?;
        if te.as_str() != "trailers" {
            headers.remove("te");
        }
    }
    Ok(())
}

fn build_pseudo_headers(request_part: &RequestPart, host: Option<String>) -> PseudoHeaders {
    let mut pseudo = PseudoHeaders::default();
    match request_part.uri.scheme() {
        Some(scheme) => pseudo.set_scheme(Some(String::from(scheme.as_str()))),
        None => pseudo.set_scheme(Some(String::from(Scheme::HTTP.as_str()))),
    }
    pseudo.set_method(Some(String::from(request_part.method.as_str())));
    pseudo.set_path(
        request_part
            .uri
            .path_and_query()
            .or_else(|| Some(String::from("/"))),
    );
    pseudo.set_authority(host.or_else(|| request_part.uri.authority()));
    pseudo
}

fn build_client_error(id: u32, code: ErrorCode) -> HttpClientError {
    HttpClientError::from_error(
        ErrorKind::Request,
        HttpError::from(H2Error::StreamError(id, code)),
    )
}

/// The response body reader of one exchange: DATA payloads arrive in order
/// on the per-request channel and END_STREAM closes the stream.
struct TextIo<S> {
    pub(crate) handle: Http2Conn<S>,
    pub(crate) offset: usize,
    pub(crate) remain: Option<Frame>,
    pub(crate) is_closed: bool,
}

impl<S> TextIo<S>
where
    S: Sync + Send + Unpin + 'static,
{
    pub(crate) fn new(handle: Http2Conn<S>) -> Self {
        Self {
            handle,
            offset: 0,
            remain: None,
            is_closed: false,
        }
    }

    fn stream_error(id: u32, code: ErrorCode) -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            HttpError::from(H2Error::StreamError(id, code)),
        )
    }

    fn match_channel_message(
        poll_result: Poll<Frame>,
        text_io: &mut TextIo<S>,
        buf: &mut ReadBuf<'_>,
    ) -> Option<Poll<std::io::Result<()>>> {
        match poll_result {
            Poll::Ready(frame) => match frame.payload() {
                Payload::Data(data) => {
                    let data = data.data();
                    let unfilled_len = buf.remaining();
                    let data_len = data.len();
                    let fill_len = min(data_len, unfilled_len);
                    if unfilled_len < data_len {
                        buf.put_slice(&data[..fill_len]);
                        text_io.offset += fill_len;
                        text_io.remain = Some(frame);
                        Some(Poll::Ready(Ok(())))
                    } else {
                        buf.put_slice(&data[..fill_len]);
                        Self::end_read(text_io, frame.flags().is_end_stream(), data_len)
                    }
                }
                Payload::RstStream(reset) => {
                    if reset.is_no_error() {
                        text_io.is_closed = true;
                        Some(Poll::Ready(Ok(())))
                    } else {
                        let code = ErrorCode::try_from(reset.error_code())
                            .unwrap_or(ErrorCode::InternalError);
                        Some(Poll::Ready(Err(Self::stream_error(
                            frame.stream_id(),
                            code,
                        ))))
                    }
                }
                _ => Some(Poll::Ready(Err(Self::stream_error(
                    frame.stream_id(),
                    ErrorCode::ProtocolError,
                )))),
            },
            Poll::Pending => Some(Poll::Pending),
        }
    }

    fn end_read(
        text_io: &mut TextIo<S>,
        end_stream: bool,
        data_len: usize,
    ) -> Option<Poll<std::io::Result<()>>> {
        text_io.offset = 0;
        text_io.remain = None;
        if end_stream {
            text_io.is_closed = true;
            Some(Poll::Ready(Ok(())))
        } else if data_len == 0 {
            // No bytes were produced and the stream is still open, poll the
            // next frame.
            None
        } else {
            Some(Poll::Ready(Ok(())))
        }
    }

    fn read_remaining_data(
        text_io: &mut TextIo<S>,
        buf: &mut ReadBuf<'_>,
    ) -> Option<Poll<std::io::Result<()>>> {
        if let Some(frame) = &text_io.remain {
            return match frame.payload() {
                Payload::Data(data) => {
                    let data = data.data();
                    let unfilled_len = buf.remaining();
                    let data_len = data.len() - text_io.offset;
                    let fill_len = min(unfilled_len, data_len);
                    if unfilled_len < data_len {
                        buf.put_slice(&data[text_io.offset..text_io.offset + fill_len]);
                        text_io.offset += fill_len;
                        Some(Poll::Ready(Ok(())))
                    } else {
                        buf.put_slice(&data[text_io.offset..text_io.offset + fill_len]);
                        let end_stream = frame.flags().is_end_stream();
                        Self::end_read(text_io, end_stream, data_len)
                    }
                }
                _ => Some(Poll::Ready(Err(Self::stream_error(
                    frame.stream_id(),
                    ErrorCode::ProtocolError,
                )))),
            };
        }
        None
    }
}

impl<S: Sync + Send + Unpin + 'static> AsyncRead for TextIo<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let text_io = self.get_mut();
        if buf.remaining() == 0 || text_io.is_closed {
            return Poll::Ready(Ok(()));
        }
        while buf.remaining() != 0 {
            if let Some(result) = Self::read_remaining_data(text_io, buf) {
                return result;
            }

            let poll_result = text_io
                .handle
                .receiver
                .poll_recv(cx)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

            if let Some(result) = Self::match_channel_message(poll_result, text_io, buf) {
                return result;
            }
        }
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod ut_http2 {
    use super::*;

    macro_rules! build_request {
        (
            Method: $method: expr,
            Uri: $uri:expr,
            $(
                Header: $req_n: expr, $req_v: expr,
            )*
        ) => {
            crate::Request::builder()
                .method($method)
                .url($uri)
                $(.header($req_n, $req_v))*
                .body(crate::async_impl::Body::empty())
                .expect("Request build failed")
        }
    }

    /// UT test cases for `build_headers_payload`.
    ///
    /// # Brief
    /// 1. Builds the HEADERS payload of a request carrying host, connection
    ///    and te headers.
    /// 2. Checks the frame flags and the derived pseudo headers.
    /// 3. Checks that connection-specific headers were stripped.
    #[test]
    fn ut_http2_build_headers_payload() {
        let request = build_request!(
            Method: "GET",
            Uri: "http://127.0.0.1:3000/data?id=6",
            Header: "te", "trailers",
            Header: "host", "127.0.0.1:3000",
            Header: "connection", "keep-alive",
            Header: "accept", "text/html",
        );
        let (part, _body) = request.into_parts();

        let (flag, _) = build_headers_payload(part.clone(), false).unwrap();
        assert_eq!(flag.bits(), 0x4);
        let (flag, payload) = build_headers_payload(part, true).unwrap();
        assert_eq!(flag.bits(), 0x5);
        if let Payload::Headers(headers) = payload {
            let (pseudo, fields) = headers.parts();
            assert_eq!(pseudo.status(), None);
            assert_eq!(pseudo.scheme().unwrap(), "http");
            assert_eq!(pseudo.method().unwrap(), "GET");
            assert_eq!(pseudo.authority().unwrap(), "127.0.0.1:3000");
            assert_eq!(pseudo.path().unwrap(), "/data?id=6");
            assert!(fields.get("host").is_none());
            assert!(fields.get("connection").is_none());
            assert_eq!(fields.get("te").unwrap().to_string().unwrap(), "trailers");
            assert_eq!(
                fields.get("accept").unwrap().to_string().unwrap(),
                "text/html"
            );
        } else {
            panic!("Unexpected frame type")
        }
    }

    /// UT test cases for the default path pseudo header.
    ///
    /// # Brief
    /// 1. Builds the HEADERS payload of a request whose uri has no path.
    /// 2. Checks that the path defaults to `/`.
    #[test]
    fn ut_http2_build_headers_payload_default_path() {
        let request = build_request!(
            Method: "GET",
            Uri: "http://example.com",
        );
        let (part, _body) = request.into_parts();
        let (_, payload) = build_headers_payload(part, true).unwrap();
        if let Payload::Headers(headers) = payload {
            let (pseudo, _) = headers.parts();
            assert_eq!(pseudo.path().unwrap(), "/");
            assert_eq!(pseudo.authority().unwrap(), "example.com");
        } else {
            panic!("Unexpected frame type")
        }
    }

    /// UT test for reading a response body from `TextIo`.
    ///
    /// # Brief
    /// 1. Creates three data frames, one greater than the read buffer, one
    ///    smaller, and a final frame with END_STREAM.
    /// 2. Reads the body from `TextIo` with a 10-byte buffer.
    /// 3. Checks that all bytes are read and the reader then reports EOF.
    #[test]
    fn ut_http2_body_poll_read() {
        use lumen_http::h2::Data;

        use crate::util::dispatcher::http2::{Http2Conn, RespMessage};

        let (resp_tx, resp_rx) = crate::runtime::bounded_channel(20);
        let (req_tx, _req_rx) = crate::runtime::unbounded_channel();
        let mut conn: Http2Conn<()> = Http2Conn::new(1, 20, req_tx);
        conn.receiver.set_receiver(resp_rx);
        let mut text_io = TextIo::new(conn);
        let data_1 = Frame::new(
            1,
            FrameFlags::new(0),
            Payload::Data(Data::new(vec![b'a'; 128])),
        );
        let data_2 = Frame::new(
            1,
            FrameFlags::new(0),
            Payload::Data(Data::new(vec![b'a'; 2])),
        );
        let data_3 = Frame::new(
            1,
            FrameFlags::new(1),
            Payload::Data(Data::new(vec![b'a'; 10])),
        );

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            resp_tx.send(RespMessage::Output(data_1)).await.unwrap();
            resp_tx.send(RespMessage::Output(data_2)).await.unwrap();
            resp_tx.send(RespMessage::Output(data_3)).await.unwrap();

            let mut buf = [0_u8; 10];
            let mut output_vec = vec![];
            let mut size = buf.len();
            while size != 0 && output_vec.len() < 1024 {
                let mut buffer = ReadBuf::new(buf.as_mut_slice());
                std::future::poll_fn(|cx| Pin::new(&mut text_io).poll_read(cx, &mut buffer))
                    .await
                    .unwrap();
                size = buffer.filled().len();
                output_vec.extend_from_slice(&buf[..size]);
            }
            assert_eq!(output_vec.len(), 140);
        });
    }
}
