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

//! Asynchronous response.

use lumen_http::headers::Headers;
use lumen_http::response::status::StatusCode;
use lumen_http::version::Version;

use crate::async_impl::HttpBody;
use crate::error::{ErrorKind, HttpClientError};
use crate::runtime::AsyncReadExt;

/// The response of a request, whose body is streamed from the connection as
/// it arrives.
#[derive(Debug)]
pub struct Response {
    pub(crate) inner: lumen_http::response::Response<HttpBody>,
}

impl Response {
    pub(crate) fn new(response: lumen_http::response::Response<HttpBody>) -> Self {
        Self { inner: response }
    }

    /// Gets the `StatusCode` of this `Response`.
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Gets the `Version` of this `Response`.
    pub fn version(&self) -> &Version {
        self.inner.version()
    }

    /// Gets a reference to the `Headers` of this `Response`.
    pub fn headers(&self) -> &Headers {
        self.inner.headers()
    }

    /// Gets a mutable reference to the body of this `Response`.
    pub fn body_mut(&mut self) -> &mut HttpBody {
        self.inner.body_mut()
    }

    /// Reads the whole body and interprets it as utf-8 text.
    pub async fn text(&mut self) -> Result<String, HttpClientError> {
        let mut bytes = Vec::new();
        self.inner
            .body_mut()
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| HttpClientError::from_io_error(ErrorKind::BodyTransfer, e))?;
        String::from_utf8(bytes)
            .map_err(|e| HttpClientError::from_error(ErrorKind::BodyDecode, e))
    }
}
