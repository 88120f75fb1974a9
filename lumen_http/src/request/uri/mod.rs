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

//! HTTP [`URI`].
//!
//! [`URI`]: https://httpwg.org/specs/rfc9110.html#uri
//!
//! URI references are used to target requests. The client subset implemented
//! here covers `scheme`, `authority` (host and optional port), `path` and
//! `query`.

use core::convert::TryFrom;
use core::fmt;

use crate::error::HttpError;

/// HTTP `URI` implementation.
///
/// # Examples
///
/// ```
/// use lumen_http::request::uri::Uri;
///
/// let uri = Uri::from_bytes(b"http://example.com:80/foo?a=1").unwrap();
/// assert_eq!(uri.host().unwrap().as_str(), "example.com");
/// assert_eq!(uri.path_and_query(), Some(String::from("/foo?a=1")));
/// ```
#[derive(Clone, Debug)]
pub struct Uri {
    scheme: Option<Scheme>,
    host: Option<Host>,
    port: Option<Port>,
    path: Option<Path>,
    query: Option<Query>,
}

impl Uri {
    /// Parses a `Uri` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HttpError> {
        let str = core::str::from_utf8(bytes).map_err(|_| InvalidUri::InvalidFormat)?;
        Self::parse(str).map_err(Into::into)
    }

    /// Gets the `Scheme` of this `Uri`.
    pub fn scheme(&self) -> Option<&Scheme> {
        self.scheme.as_ref()
    }

    /// Gets the `Host` of this `Uri`.
    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    /// Gets the `Port` of this `Uri`.
    pub fn port(&self) -> Option<&Port> {
        self.port.as_ref()
    }

    /// Gets the `Path` of this `Uri`.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Gets the `Query` of this `Uri`.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    /// Returns the combined path and query string. Returns `None` if both
    /// are absent.
    pub fn path_and_query(&self) -> Option<String> {
        let mut result = String::new();
        if let Some(path) = self.path() {
            result.push_str(path.as_str());
        }
        if let Some(query) = self.query() {
            result.push('?');
            result.push_str(query.as_str());
        }
        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }

    /// Returns the authority in `host[:port]` form. Returns `None` if the
    /// host is absent.
    pub fn authority(&self) -> Option<String> {
        let host = self.host()?;
        let mut result = String::from(host.as_str());
        if let Some(port) = self.port() {
            result.push(':');
            result.push_str(port.as_str());
        }
        Some(result)
    }

    fn parse(str: &str) -> Result<Self, InvalidUri> {
        if str.is_empty() {
            return Err(InvalidUri::InvalidFormat);
        }
        let (scheme, rest) = match str.find("://") {
            Some(pos) => (Some(Scheme::from_str(&str[..pos])?), &str[pos + 3..]),
            None => (None, str),
        };
        let (authority, rest) = match rest.find(&['/', '?'][..]) {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, ""),
        };
        if authority.is_empty() && scheme.is_some() {
            return Err(InvalidUri::MissingHost);
        }
        let (host, port) = if authority.is_empty() {
            (None, None)
        } else {
            match authority.rfind(':') {
                Some(pos) => {
                    let port = &authority[pos + 1..];
                    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(InvalidUri::InvalidPort);
                    }
                    (
                        Some(Host::from_str(&authority[..pos])?),
                        Some(Port(String::from(port))),
                    )
                }
                None => (Some(Host::from_str(authority)?), None),
            }
        };
        let (path, query) = match rest.find('?') {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
            None => (rest, None),
        };
        Ok(Self {
            scheme,
            host,
            port,
            path: if path.is_empty() {
                None
            } else {
                Some(Path(String::from(path)))
            },
            query: query.map(|q| Query(String::from(q))),
        })
    }
}

impl TryFrom<&str> for Uri {
    type Error = HttpError;

    fn try_from(str: &str) -> Result<Self, Self::Error> {
        Self::from_bytes(str.as_bytes())
    }
}

/// The `scheme` component of a `Uri`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scheme {
    /// `http` scheme.
    repr: SchemeRepr,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum SchemeRepr {
    Http,
    Https,
}

impl Scheme {
    /// The `http` scheme.
    pub const HTTP: Self = Self {
        repr: SchemeRepr::Http,
    };

    /// The `https` scheme.
    pub const HTTPS: Self = Self {
        repr: SchemeRepr::Https,
    };

    /// Gets the `&str` of this `Scheme`.
    pub fn as_str(&self) -> &str {
        match self.repr {
            SchemeRepr::Http => "http",
            SchemeRepr::Https => "https",
        }
    }

    /// Returns the default port of this `Scheme`.
    pub fn default_port(&self) -> u16 {
        match self.repr {
            SchemeRepr::Http => 80,
            SchemeRepr::Https => 443,
        }
    }

    fn from_str(str: &str) -> Result<Self, InvalidUri> {
        match str {
            "http" => Ok(Scheme::HTTP),
            "https" => Ok(Scheme::HTTPS),
            _ => Err(InvalidUri::InvalidScheme),
        }
    }
}

/// The `host` component of a `Uri`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Host(String);

impl Host {
    /// Gets the `&str` of this `Host`.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn from_str(str: &str) -> Result<Self, InvalidUri> {
        if str.is_empty() {
            return Err(InvalidUri::MissingHost);
        }
        Ok(Host(String::from(str)))
    }
}

/// The `port` component of a `Uri`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Port(String);

impl Port {
    /// Gets the `&str` of this `Port`.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Gets the `u16` value of this `Port`.
    pub fn as_u16(&self) -> Result<u16, HttpError> {
        self.0
            .parse::<u16>()
            .map_err(|_| InvalidUri::InvalidPort.into())
    }
}

/// The `path` component of a `Uri`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Path(String);

impl Path {
    /// Gets the `&str` of this `Path`.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// The `query` component of a `Uri`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query(String);

impl Query {
    /// Gets the `&str` of this `Query`.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Errors that can occur while parsing a `Uri`.
#[derive(Debug, Eq, PartialEq)]
pub enum InvalidUri {
    /// The overall format of the uri is invalid.
    InvalidFormat,

    /// The scheme is not `http` or `https`.
    InvalidScheme,

    /// The port is not a decimal number.
    InvalidPort,

    /// The authority component has no host.
    MissingHost,
}

impl fmt::Display for InvalidUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for InvalidUri {}
