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

//! HTTP [`PseudoHeaders`]. HTTP/2 uses pseudo-header fields beginning with
//! the ":" character (ASCII 0x3a) to replace the message start line of
//! HTTP/1.x, conveying the target URI, the request method and the status
//! code of the response.
//!
//! # Example
//! ```
//! use lumen_http::pseudo::PseudoHeaders;
//! let mut pseudo = PseudoHeaders::new();
//! pseudo.set_method(Some("GET".to_string()));
//! assert_eq!(pseudo.method(), Some("GET"));
//! ```

/// [Pseudo-Header fields] that may appear in http2 header fields.
///
/// [Pseudo-Header fields]: https://httpwg.org/specs/rfc9113.html#PseudoHeaderFields
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct PseudoHeaders {
    authority: Option<String>,
    method: Option<String>,
    path: Option<String>,
    scheme: Option<String>,
    status: Option<String>,
}

impl PseudoHeaders {
    /// Creates a new `PseudoHeaders`.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.authority.is_none()
            && self.method.is_none()
            && self.path.is_none()
            && self.scheme.is_none()
            && self.status.is_none()
    }

    /// Gets the `&str` value of `Authority`.
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// Sets the value of `Authority`.
    pub fn set_authority(&mut self, authority: Option<String>) {
        self.authority = authority;
    }

    /// Gets the `&str` value of `Method`.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Sets the value of `Method`.
    pub fn set_method(&mut self, method: Option<String>) {
        self.method = method;
    }

    /// Gets the `&str` value of `Path`.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Sets the value of `Path`.
    pub fn set_path(&mut self, path: Option<String>) {
        self.path = path;
    }

    /// Gets the `&str` value of `Scheme`.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Sets the value of `Scheme`.
    pub fn set_scheme(&mut self, scheme: Option<String>) {
        self.scheme = scheme;
    }

    /// Checks if it contains `Status`.
    pub(crate) fn contains_status(&self) -> bool {
        self.status.is_some()
    }

    /// Gets the `&str` value of `Status`.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Sets the value of `Status`.
    pub fn set_status(&mut self, status: Option<String>) {
        self.status = status;
    }
}
