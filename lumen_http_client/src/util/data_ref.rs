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

//! defines `BodyDataRef`.

use std::pin::Pin;
use std::task::{Context, Poll};

use crate::async_impl::Body;
use crate::runtime::{AsyncRead, ReadBuf};
use crate::HttpClientError;

/// The request body handle owned by a stream. Reading yields the next chunk
/// of outbound body bytes; `clear` drops the body once the stream ends.
pub(crate) struct BodyDataRef {
    body: Option<Body>,
}

impl BodyDataRef {
    pub(crate) fn new(body: Body) -> Self {
        Self { body: Some(body) }
    }

    pub(crate) fn clear(&mut self) {
        self.body = None;
    }

    pub(crate) fn poll_read(
        &mut self,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<Result<usize, HttpClientError>> {
        let body = if let Some(ref mut body) = self.body {
            body
        } else {
            return Poll::Ready(Ok(0));
        };
        let mut read_buf = ReadBuf::new(buf);
        match Pin::new(body).poll_read(cx, &mut read_buf) {
            Poll::Ready(Err(e)) => Poll::Ready(err_from_io!(BodyTransfer, e)),
            Poll::Ready(Ok(())) => Poll::Ready(Ok(read_buf.filled().len())),
            Poll::Pending => Poll::Pending,
        }
    }
}
