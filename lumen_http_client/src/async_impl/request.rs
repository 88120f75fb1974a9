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

//! Asynchronous request body.

use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::runtime::{AsyncRead, ReadBuf};

/// The body of a request. Bodies are either empty, a complete in-memory
/// chunk, or an asynchronous reader streamed chunk by chunk while the
/// request is being sent.
///
/// # Examples
///
/// ```
/// use lumen_http_client::async_impl::Body;
///
/// let body = Body::empty();
/// assert!(body.is_empty());
///
/// let body = Body::slice("content");
/// assert!(!body.is_empty());
/// ```
pub struct Body {
    kind: Kind,
}

enum Kind {
    Empty,
    Slice(Cursor<Vec<u8>>),
    Stream(Box<dyn AsyncRead + Send + Sync + Unpin>),
}

impl Body {
    /// Creates an empty `Body`.
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    /// Creates a `Body` from in-memory bytes.
    pub fn slice<T: Into<Vec<u8>>>(data: T) -> Self {
        let data = data.into();
        if data.is_empty() {
            return Self::empty();
        }
        Self {
            kind: Kind::Slice(Cursor::new(data)),
        }
    }

    /// Creates a `Body` from an asynchronous reader. The body ends when the
    /// reader reports EOF.
    pub fn stream<T>(reader: T) -> Self
    where
        T: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self {
            kind: Kind::Stream(Box::new(reader)),
        }
    }

    /// Checks whether this `Body` is known to be empty. A streamed body is
    /// never considered empty since its length is unknown in advance.
    pub fn is_empty(&self) -> bool {
        match self.kind {
            Kind::Empty => true,
            Kind::Slice(ref cursor) => cursor.get_ref().is_empty(),
            Kind::Stream(_) => false,
        }
    }
}

impl AsyncRead for Body {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut().kind {
            Kind::Empty => Poll::Ready(Ok(())),
            Kind::Slice(ref mut cursor) => Pin::new(cursor).poll_read(cx, buf),
            Kind::Stream(ref mut stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

#[cfg(test)]
mod ut_body {
    use super::Body;
    use crate::runtime::AsyncReadExt;

    /// UT test cases for `Body::is_empty`.
    ///
    /// # Brief
    /// 1. Creates empty, slice and stream bodies.
    /// 2. Checks the emptiness of each.
    #[test]
    fn ut_body_is_empty() {
        assert!(Body::empty().is_empty());
        assert!(Body::slice(Vec::new()).is_empty());
        assert!(!Body::slice("content").is_empty());
        assert!(!Body::stream(std::io::Cursor::new(Vec::new())).is_empty());
    }

    /// UT test cases for reading a `Body`.
    ///
    /// # Brief
    /// 1. Reads a slice body and a stream body to the end.
    /// 2. Checks the bytes that were read.
    #[test]
    fn ut_body_read() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            let mut body = Body::slice("hello");
            let mut out = Vec::new();
            body.read_to_end(&mut out).await.unwrap();
            assert_eq!(out, b"hello");

            let mut body = Body::stream(std::io::Cursor::new(b"world".to_vec()));
            let mut out = Vec::new();
            body.read_to_end(&mut out).await.unwrap();
            assert_eq!(out, b"world");

            let mut body = Body::empty();
            let mut out = Vec::new();
            body.read_to_end(&mut out).await.unwrap();
            assert!(out.is_empty());
        });
    }
}
