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

//! HTTP [`Method`].
//!
//! [`Method`]: https://httpwg.org/specs/rfc9110.html#methods

use core::convert::TryFrom;

use crate::error::{ErrorKind, HttpError};

/// HTTP `Method` implementation.
///
/// # Examples
///
/// ```
/// use lumen_http::request::method::Method;
///
/// let method = Method::GET;
/// assert_eq!(method.as_str(), "GET");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Method(Inner);

#[derive(Clone, Debug, Eq, PartialEq)]
enum Inner {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
}

impl Method {
    /// The `GET` method.
    pub const GET: Self = Self(Inner::Get);

    /// The `HEAD` method.
    pub const HEAD: Self = Self(Inner::Head);

    /// The `POST` method.
    pub const POST: Self = Self(Inner::Post);

    /// The `PUT` method.
    pub const PUT: Self = Self(Inner::Put);

    /// The `DELETE` method.
    pub const DELETE: Self = Self(Inner::Delete);

    /// The `CONNECT` method.
    pub const CONNECT: Self = Self(Inner::Connect);

    /// The `OPTIONS` method.
    pub const OPTIONS: Self = Self(Inner::Options);

    /// The `TRACE` method.
    pub const TRACE: Self = Self(Inner::Trace);

    /// Gets the `&str` of `Method`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_http::request::method::Method;
    ///
    /// assert_eq!(Method::POST.as_str(), "POST");
    /// ```
    pub fn as_str(&self) -> &str {
        match self.0 {
            Inner::Get => "GET",
            Inner::Head => "HEAD",
            Inner::Post => "POST",
            Inner::Put => "PUT",
            Inner::Delete => "DELETE",
            Inner::Connect => "CONNECT",
            Inner::Options => "OPTIONS",
            Inner::Trace => "TRACE",
        }
    }
}

impl TryFrom<&str> for Method {
    type Error = HttpError;

    fn try_from(str: &str) -> Result<Self, Self::Error> {
        match str {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "CONNECT" => Ok(Method::CONNECT),
            "OPTIONS" => Ok(Method::OPTIONS),
            "TRACE" => Ok(Method::TRACE),
            _ => Err(ErrorKind::InvalidInput.into()),
        }
    }
}

#[cfg(test)]
mod ut_method {
    use std::convert::TryFrom;

    use super::Method;

    /// UT test cases for `Method::as_str` and `Method::try_from`.
    ///
    /// # Brief
    /// 1. Converts strings to methods and back.
    /// 2. Checks if the results are correct and that unknown methods are
    ///    rejected.
    #[test]
    fn ut_method_conversion() {
        for name in ["GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE"] {
            assert_eq!(Method::try_from(name).unwrap().as_str(), name);
        }
        assert!(Method::try_from("PATCHY").is_err());
    }
}
