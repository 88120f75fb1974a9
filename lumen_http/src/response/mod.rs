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

//! HTTP [`Response`].
//!
//! [`Response`]: https://httpwg.org/specs/rfc9110.html#status.codes
//!
//! A response message consists of a status code, header fields and an
//! optional body.

pub mod status;

use crate::headers::Headers;
use crate::response::status::StatusCode;
use crate::version::Version;

/// HTTP `Response` implementation.
#[derive(Debug)]
pub struct Response<T> {
    part: ResponsePart,
    body: T,
}

impl<T> Response<T> {
    /// Gets the `StatusCode` of this `Response`.
    pub fn status(&self) -> StatusCode {
        self.part.status
    }

    /// Gets a reference to the `Version`.
    pub fn version(&self) -> &Version {
        &self.part.version
    }

    /// Gets a reference to the `Headers`.
    pub fn headers(&self) -> &Headers {
        &self.part.headers
    }

    /// Gets a reference to the body.
    pub fn body(&self) -> &T {
        &self.body
    }

    /// Gets a mutable reference to the body.
    pub fn body_mut(&mut self) -> &mut T {
        &mut self.body
    }

    /// Splits this `Response` into a `ResponsePart` and a body.
    pub fn into_parts(self) -> (ResponsePart, T) {
        (self.part, self.body)
    }

    /// Combines a `ResponsePart` and a body into a `Response`.
    pub fn from_raw_parts(part: ResponsePart, body: T) -> Response<T> {
        Response { part, body }
    }
}

/// The part of a `Response` other than the body.
#[derive(Clone, Debug)]
pub struct ResponsePart {
    /// HTTP protocol version.
    pub version: Version,

    /// HTTP response status code.
    pub status: StatusCode,

    /// HTTP response headers.
    pub headers: Headers,
}

#[cfg(test)]
mod ut_response {
    use super::*;

    /// UT test cases for `Response`.
    ///
    /// # Brief
    /// 1. Creates a response from raw parts.
    /// 2. Checks the accessors and `into_parts`.
    #[test]
    fn ut_response_from_raw_parts() {
        let part = ResponsePart {
            version: Version::HTTP2,
            status: StatusCode::OK,
            headers: Headers::new(),
        };
        let mut response = Response::from_raw_parts(part, vec![1u8, 2, 3]);
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.version(), &Version::HTTP2);
        assert_eq!(response.body(), &vec![1u8, 2, 3]);
        response.body_mut().push(4);
        let (part, body) = response.into_parts();
        assert_eq!(part.status, StatusCode::OK);
        assert_eq!(body, vec![1, 2, 3, 4]);
    }
}
