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

//! HTTP [`Request`].
//!
//! [`Request`]: https://httpwg.org/specs/rfc9110.html#request
//!
//! A request message consists of a method, a target uri, a protocol version,
//! header fields and an optional body.

pub mod method;
pub mod uri;

use core::convert::TryFrom;

use crate::error::HttpError;
use crate::headers::Headers;
use crate::request::method::Method;
use crate::request::uri::Uri;
use crate::version::Version;

/// HTTP `Request` implementation.
///
/// # Examples
///
/// ```
/// use lumen_http::request::Request;
///
/// let request = Request::builder()
///     .method("GET")
///     .url("http://example.com/everything")
///     .header("accept", "text/html")
///     .body(())
///     .unwrap();
///
/// assert_eq!(request.method().as_str(), "GET");
/// ```
pub struct Request<T> {
    part: RequestPart,
    body: T,
}

impl Request<()> {
    /// Creates a new `RequestBuilder`.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }
}

impl<T> Request<T> {
    /// Gets a reference to the `Method`.
    pub fn method(&self) -> &Method {
        &self.part.method
    }

    /// Gets a reference to the `Uri`.
    pub fn uri(&self) -> &Uri {
        &self.part.uri
    }

    /// Gets a reference to the `Version`.
    pub fn version(&self) -> &Version {
        &self.part.version
    }

    /// Gets a reference to the `Headers`.
    pub fn headers(&self) -> &Headers {
        &self.part.headers
    }

    /// Gets a mutable reference to the `Headers`.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.part.headers
    }

    /// Gets a reference to the `RequestPart`.
    pub fn part(&self) -> &RequestPart {
        &self.part
    }

    /// Gets a reference to the body.
    pub fn body(&self) -> &T {
        &self.body
    }

    /// Gets a mutable reference to the body.
    pub fn body_mut(&mut self) -> &mut T {
        &mut self.body
    }

    /// Splits this `Request` into a `RequestPart` and a body.
    pub fn into_parts(self) -> (RequestPart, T) {
        (self.part, self.body)
    }

    /// Combines a `RequestPart` and a body into a `Request`.
    pub fn from_raw_parts(part: RequestPart, body: T) -> Request<T> {
        Request { part, body }
    }
}

/// The part of a `Request` other than the body.
#[derive(Clone)]
pub struct RequestPart {
    /// HTTP request method.
    pub method: Method,

    /// HTTP request uri.
    pub uri: Uri,

    /// HTTP protocol version.
    pub version: Version,

    /// HTTP request headers.
    pub headers: Headers,
}

/// A builder of `Request`.
pub struct RequestBuilder {
    state: Result<RequestPart, HttpError>,
}

impl RequestBuilder {
    /// Creates a new `RequestBuilder`.
    pub fn new() -> Self {
        Self {
            state: Ok(RequestPart {
                method: Method::GET,
                uri: Uri::from_bytes(b"/").unwrap(),
                version: Version::HTTP2,
                headers: Headers::new(),
            }),
        }
    }

    /// Sets the `Method` of the `Request`.
    pub fn method<T>(mut self, method: T) -> Self
    where
        Method: TryFrom<T>,
        <Method as TryFrom<T>>::Error: Into<HttpError>,
    {
        self.state = self.state.and_then(move |mut part| {
            part.method = Method::try_from(method).map_err(Into::into)?;
            Ok(part)
        });
        self
    }

    /// Sets the `Uri` of the `Request`.
    pub fn url<T>(mut self, uri: T) -> Self
    where
        Uri: TryFrom<T>,
        <Uri as TryFrom<T>>::Error: Into<HttpError>,
    {
        self.state = self.state.and_then(move |mut part| {
            part.uri = Uri::try_from(uri).map_err(Into::into)?;
            Ok(part)
        });
        self
    }

    /// Sets the `Version` of the `Request`.
    pub fn version<T>(mut self, version: T) -> Self
    where
        Version: TryFrom<T>,
        <Version as TryFrom<T>>::Error: Into<HttpError>,
    {
        self.state = self.state.and_then(move |mut part| {
            part.version = Version::try_from(version).map_err(Into::into)?;
            Ok(part)
        });
        self
    }

    /// Adds a `Header` to the `Request`. Headers are emitted in the order
    /// they are added.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.state = self.state.and_then(move |mut part| {
            part.headers.insert(name, value)?;
            Ok(part)
        });
        self
    }

    /// Appends a `Header` to the `Request`, keeping existing values of the
    /// same name.
    pub fn append_header(mut self, name: &str, value: &str) -> Self {
        self.state = self.state.and_then(move |mut part| {
            part.headers.append(name, value)?;
            Ok(part)
        });
        self
    }

    /// Consumes the builder and creates a `Request` with the given body.
    pub fn body<T>(self, body: T) -> Result<Request<T>, HttpError> {
        Ok(Request {
            part: self.state?,
            body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
