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

//! HTTP/2 client connection.

use crate::async_impl::conn;
use crate::async_impl::{Body, Response};
use crate::error::{ErrorKind, HttpClientError};
use crate::runtime::{AsyncRead, AsyncWrite};
use crate::util::cancel::Cancellation;
use crate::util::config::H2Config;
use crate::util::dispatcher::http2::Http2Dispatcher;
use crate::util::information::ConnDetail;
use crate::Request;

/// One multiplexed HTTP/2 client connection over a caller-provided
/// transport.
///
/// Creating the connection writes the client preface and the initial
/// SETTINGS frame and spawns the connection tasks. Many requests may then be
/// driven concurrently; each is carried on its own client-initiated stream.
///
/// # Examples
///
/// ```no_run
/// use lumen_http_client::async_impl::{Body, H2Connection};
/// use lumen_http_client::{Cancellation, ConnDetail, H2Config, Request};
///
/// # async fn example(
/// #     detail: ConnDetail,
/// #     io: tokio::io::DuplexStream,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let connection = H2Connection::new(detail, H2Config::new(), io);
/// let request = Request::builder()
///     .url("http://example.com/data")
///     .body(Body::empty())?;
/// let mut response = connection.request(request, Cancellation::new()).await?;
/// println!("{}", response.status().as_u16());
/// # Ok(())
/// # }
/// ```
pub struct H2Connection<S> {
    dispatcher: Http2Dispatcher<S>,
}

impl<S> H2Connection<S>
where
    S: AsyncRead + AsyncWrite + Sync + Send + Unpin + 'static,
{
    /// Creates a new `H2Connection` over the given transport and spawns its
    /// connection tasks.
    pub fn new(detail: ConnDetail, config: H2Config, io: S) -> Self {
        Self {
            dispatcher: Http2Dispatcher::new(detail, config, io),
        }
    }

    /// Sends a request over this connection and awaits its response head.
    /// The response body is streamed afterwards.
    ///
    /// Firing `cancel` resets the stream with the CANCEL error code and
    /// resolves this future with a user-aborted error.
    pub async fn request(
        &self,
        request: Request<Body>,
        cancel: Cancellation,
    ) -> Result<Response, HttpClientError> {
        if self.dispatcher.is_shutdown() {
            return Err(HttpClientError::from_str(
                ErrorKind::Connect,
                "Connection is closed.",
            ));
        }
        let conn = self.dispatcher.dispatch();
        conn::http2::request(conn, request, cancel).await
    }

    /// Checks whether this connection can take further requests right now:
    /// `true` if the peer-advertised concurrency budget is used up or the
    /// connection is shut down.
    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    /// Registers a callback fired exactly once when the connection closes.
    /// If the connection is already closed, the callback fires immediately.
    pub fn on_close<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatcher.on_close(callback);
    }

    /// Shuts this connection down gracefully: a GOAWAY frame naming the
    /// last open stream is sent, every in-flight request is failed with a
    /// disconnect error, pending writes are drained and the on-close
    /// callbacks fire. Calling `close` again is a no-op.
    pub async fn close(&self) {
        self.dispatcher.close().await;
    }

    /// Gets the address information of this connection.
    pub fn detail(&self) -> &ConnDetail {
        &self.dispatcher.detail
    }
}
