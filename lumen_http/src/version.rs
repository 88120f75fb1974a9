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

//! HTTP [`Version`].
//!
//! [`Version`]: https://httpwg.org/specs/rfc9110.html#protocol.version

use core::convert::TryFrom;

use crate::error::{ErrorKind, HttpError};

/// HTTP `Version` implementation.
///
/// # Examples
///
/// ```
/// use lumen_http::version::Version;
///
/// let version = Version::HTTP2;
/// assert_eq!(version.as_str(), "HTTP/2.0");
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Version {
    /// `HTTP/1.1`
    HTTP1_1,

    /// `HTTP/2.0`
    HTTP2,
}

impl Version {
    /// Gets the `&str` of `Version`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_http::version::Version;
    ///
    /// let version = Version::HTTP2;
    /// assert_eq!(version.as_str(), "HTTP/2.0");
    /// ```
    pub fn as_str(&self) -> &str {
        match self {
            Version::HTTP1_1 => "HTTP/1.1",
            Version::HTTP2 => "HTTP/2.0",
        }
    }
}

impl TryFrom<&str> for Version {
    type Error = HttpError;

    fn try_from(str: &str) -> Result<Self, Self::Error> {
        match str {
            "HTTP/1.1" => Ok(Version::HTTP1_1),
            "HTTP/2.0" => Ok(Version::HTTP2),
            _ => Err(ErrorKind::InvalidInput.into()),
        }
    }
}

#[cfg(test)]
mod ut_version {
    use std::convert::TryFrom;

    use super::Version;

    /// UT test cases for `Version::as_str`.
    ///
    /// # Brief
    /// 1. Creates versions and transfers them to str.
    /// 2. Checks if the results are correct.
    #[test]
    fn ut_version_as_str() {
        assert_eq!(Version::HTTP1_1.as_str(), "HTTP/1.1");
        assert_eq!(Version::HTTP2.as_str(), "HTTP/2.0");
    }

    /// UT test cases for `Version::try_from`.
    ///
    /// # Brief
    /// 1. Converts valid and invalid version strings.
    /// 2. Checks if the results are correct.
    #[test]
    fn ut_version_try_from() {
        assert_eq!(Version::try_from("HTTP/2.0").unwrap(), Version::HTTP2);
        assert!(Version::try_from("HTTP/0.9").is_err());
    }
}
