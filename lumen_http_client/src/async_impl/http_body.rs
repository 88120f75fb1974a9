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

//! Streamed response body.

use std::pin::Pin;
use std::task::{Context, Poll};

use crate::runtime::{AsyncRead, ReadBuf};

/// The body of a response.
///
/// A headers-only response carries an empty body; otherwise the body is an
/// ordered sequence of DATA payloads produced by the connection as they
/// arrive from the peer. Reading past the end yields zero bytes.
pub struct HttpBody {
    kind: Kind,
}

impl std::fmt::Debug for HttpBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBody").field("kind", &self.kind).finish()
    }
}

enum Kind {
    Empty,
    Stream(Box<dyn AsyncRead + Send + Sync + Unpin>),
}

impl std::fmt::Debug for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Empty => f.write_str("Empty"),
            Kind::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl HttpBody {
    pub(crate) fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    pub(crate) fn stream<T>(io: T) -> Self
    where
        T: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self {
            kind: Kind::Stream(Box::new(io)),
        }
    }

    /// Checks whether this body is known to be empty.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::Empty)
    }
}

impl AsyncRead for HttpBody {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut().kind {
            Kind::Empty => Poll::Ready(Ok(())),
            Kind::Stream(ref mut io) => Pin::new(io).poll_read(cx, buf),
        }
    }
}

#[cfg(test)]
mod ut_http_body {
    use super::HttpBody;
    use crate::runtime::AsyncReadExt;

    /// UT test cases for `HttpBody`.
    ///
    /// # Brief
    /// 1. Reads an empty body and a streamed body to the end.
    /// 2. Checks the bytes that were read.
    #[test]
    fn ut_http_body_read() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            let mut body = HttpBody::empty();
            assert!(body.is_empty());
            let mut out = Vec::new();
            body.read_to_end(&mut out).await.unwrap();
            assert!(out.is_empty());

            let mut body = HttpBody::stream(std::io::Cursor::new(b"content".to_vec()));
            assert!(!body.is_empty());
            let mut out = Vec::new();
            body.read_to_end(&mut out).await.unwrap();
            assert_eq!(out, b"content");
        });
    }
}
