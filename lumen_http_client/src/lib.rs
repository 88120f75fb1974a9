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

//! `lumen_http_client` provides an HTTP/2 client connection engine based on
//! the `lumen_http` crate: one multiplexed transport over a single
//! bidirectional byte stream that concurrently carries many logical
//! request/response exchanges.
//!
//! The engine drives the client side of the HTTP/2 wire protocol: frame
//! encoding and parsing, stream lifecycle, per-connection and per-stream
//! flow control, header compression integration, SETTINGS negotiation, PING
//! keepalive and graceful shutdown.

// lumen_http crate re-export.
pub use lumen_http::headers::{
    Header, HeaderName, HeaderValue, HeaderValueIter, HeaderValueIterMut, Headers, HeadersIntoIter,
    HeadersIter,
};
pub use lumen_http::request::method::Method;
pub use lumen_http::request::uri::{Scheme, Uri};
pub use lumen_http::request::{Request, RequestBuilder, RequestPart};
pub use lumen_http::response::status::StatusCode;
pub use lumen_http::response::ResponsePart;
pub use lumen_http::version::Version;

#[macro_use]
mod error;

pub mod async_impl;

pub(crate) mod util;

pub use error::{ErrorKind, HttpClientError};
pub use util::cancel::Cancellation;
pub use util::config::H2Config;
pub use util::information::ConnDetail;

// Runtime components import adapter.
pub(crate) mod runtime {
    pub(crate) use tokio::io::{
        split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf, ReadHalf, WriteHalf,
    };
    pub(crate) use tokio::spawn;
    pub(crate) use tokio::sync::mpsc::error::SendError;
    pub(crate) use tokio::sync::mpsc::{
        channel as bounded_channel, unbounded_channel, Receiver as BoundedReceiver,
        Sender as BoundedSender, UnboundedReceiver, UnboundedSender,
    };
    pub(crate) use tokio::sync::watch;
    pub(crate) use tokio::task::JoinHandle;
}
