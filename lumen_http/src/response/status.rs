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

//! HTTP [`Status Code`].
//!
//! [`Status Code`]: https://httpwg.org/specs/rfc9110.html#status.codes
//!
//! The status code of a response is a three-digit integer code that
//! describes the result of the request and the semantics of the response.

use core::convert::TryFrom;

use crate::error::{ErrorKind, HttpError};

/// HTTP `Status Code` implementation.
///
/// # Examples
///
/// ```
/// use lumen_http::response::status::StatusCode;
///
/// let status = StatusCode::from_bytes(b"200").unwrap();
/// assert_eq!(status.as_u16(), 200);
/// assert!(status.is_successful());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 200 OK.
    pub const OK: Self = Self(200);

    /// 204 No Content.
    pub const NO_CONTENT: Self = Self(204);

    /// 304 Not Modified.
    pub const NOT_MODIFIED: Self = Self(304);

    /// Converts a slice of bytes to a `StatusCode`. The input must be
    /// exactly three ascii digits in `100..=999`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HttpError> {
        if bytes.len() != 3 {
            return Err(ErrorKind::InvalidInput.into());
        }
        let mut code = 0u16;
        for b in bytes {
            if !b.is_ascii_digit() {
                return Err(ErrorKind::InvalidInput.into());
            }
            code = code * 10 + u16::from(b - b'0');
        }
        if code < 100 {
            return Err(ErrorKind::InvalidInput.into());
        }
        Ok(Self(code))
    }

    /// Gets the `u16` value of this `StatusCode`.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Checks whether this `StatusCode` is informational (1xx).
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.0)
    }

    /// Checks whether this `StatusCode` is successful (2xx).
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Checks whether this `StatusCode` is a redirection (3xx).
    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.0)
    }

    /// Checks whether this `StatusCode` is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// Checks whether this `StatusCode` is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = HttpError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if !(100..1000).contains(&value) {
            return Err(ErrorKind::InvalidInput.into());
        }
        Ok(Self(value))
    }
}

#[cfg(test)]
mod ut_status {
    use std::convert::TryFrom;

    use super::StatusCode;

    /// UT test cases for `StatusCode::from_bytes`.
    ///
    /// # Brief
    /// 1. Parses legal and illegal status byte slices.
    /// 2. Checks values and classification helpers.
    #[test]
    fn ut_status_from_bytes() {
        let status = StatusCode::from_bytes(b"204").unwrap();
        assert_eq!(status.as_u16(), 204);
        assert!(status.is_successful());
        assert!(!status.is_redirection());

        assert!(StatusCode::from_bytes(b"20").is_err());
        assert!(StatusCode::from_bytes(b"2000").is_err());
        assert!(StatusCode::from_bytes(b"20x").is_err());
        assert!(StatusCode::from_bytes(b"099").is_err());
    }

    /// UT test cases for `StatusCode::try_from`.
    ///
    /// # Brief
    /// 1. Converts u16 values into status codes.
    /// 2. Checks that out-of-range values are rejected.
    #[test]
    fn ut_status_try_from() {
        assert_eq!(StatusCode::try_from(500).unwrap().as_u16(), 500);
        assert!(StatusCode::try_from(99).is_err());
        assert!(StatusCode::try_from(1000).is_err());
    }
}
