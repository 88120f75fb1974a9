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

//! Definition of `HttpClientError` which includes errors that may occur in
//! this crate.

use core::fmt::{Debug, Display, Formatter};
use std::{error, io};

/// The structure encapsulates errors that can be encountered when working
/// with the HTTP client.
///
/// # Examples
///
/// ```
/// use lumen_http_client::HttpClientError;
///
/// let error = HttpClientError::user_aborted();
/// ```
pub struct HttpClientError {
    kind: ErrorKind,
    cause: Cause,
}

impl HttpClientError {
    /// Creates a `UserAborted` error.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_http_client::HttpClientError;
    ///
    /// let user_aborted = HttpClientError::user_aborted();
    /// ```
    pub fn user_aborted() -> Self {
        Self {
            kind: ErrorKind::UserAborted,
            cause: Cause::NoReason,
        }
    }

    /// Creates an `Other` error.
    pub fn other<T>(cause: T) -> Self
    where
        T: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self {
            kind: ErrorKind::Other,
            cause: Cause::Other(cause.into()),
        }
    }

    /// Gets the `ErrorKind` of this `HttpClientError`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_http_client::{ErrorKind, HttpClientError};
    ///
    /// let user_aborted = HttpClientError::user_aborted();
    /// assert_eq!(user_aborted.error_kind(), ErrorKind::UserAborted);
    /// ```
    pub fn error_kind(&self) -> ErrorKind {
        self.kind
    }

    /// Gets the `io::Error` if this `HttpClientError` comes from an
    /// `io::Error`. Returns `None` otherwise.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self.cause {
            Cause::Io(ref io) => Some(io),
            _ => None,
        }
    }
}

impl HttpClientError {
    pub(crate) fn from_error<T>(kind: ErrorKind, err: T) -> Self
    where
        T: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self {
            kind,
            cause: Cause::Other(err.into()),
        }
    }

    pub(crate) fn from_str(kind: ErrorKind, msg: &'static str) -> Self {
        Self {
            kind,
            cause: Cause::Msg(msg),
        }
    }

    pub(crate) fn from_io_error(kind: ErrorKind, err: io::Error) -> Self {
        Self {
            kind,
            cause: Cause::Io(err),
        }
    }
}

impl Debug for HttpClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut builder = f.debug_struct("HttpClientError");
        builder.field("ErrorKind", &self.kind);
        builder.field("Cause", &self.cause);
        builder.finish()
    }
}

impl Display for HttpClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.kind.as_str())?;
        write!(f, ": {}", self.cause)?;
        Ok(())
    }
}

impl error::Error for HttpClientError {}

/// Error kinds which can indicate the type of `HttpClientError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Errors for decoding response body.
    BodyDecode,

    /// Errors for transferring request body or response body.
    BodyTransfer,

    /// Errors for using various builders.
    Build,

    /// Errors for connecting to a server.
    Connect,

    /// Other error kinds.
    Other,

    /// Errors for sending a request.
    Request,

    /// User raised errors.
    UserAborted,
}

impl ErrorKind {
    /// Gets the string info of this `ErrorKind`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lumen_http_client::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::UserAborted.as_str(), "User Aborted Error");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BodyDecode => "Body Decode Error",
            Self::BodyTransfer => "Body Transfer Error",
            Self::Build => "Build Error",
            Self::Connect => "Connect Error",
            Self::Other => "Other Error",
            Self::Request => "Request Error",
            Self::UserAborted => "User Aborted Error",
        }
    }
}

pub(crate) enum Cause {
    NoReason,
    Io(io::Error),
    Msg(&'static str),
    Other(Box<dyn error::Error + Send + Sync>),
}

impl Debug for Cause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoReason => write!(f, "No reason"),
            Self::Io(err) => Debug::fmt(err, f),
            Self::Msg(msg) => write!(f, "{}", msg),
            Self::Other(err) => Debug::fmt(err, f),
        }
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoReason => write!(f, "No reason"),
            Self::Io(err) => Display::fmt(err, f),
            Self::Msg(msg) => write!(f, "{}", msg),
            Self::Other(err) => Display::fmt(err, f),
        }
    }
}

macro_rules! err_from_io {
    ($kind: ident, $err: expr) => {{
        use crate::error::{ErrorKind, HttpClientError};

        Err(HttpClientError::from_io_error(ErrorKind::$kind, $err))
    }};
}

macro_rules! err_from_msg {
    ($kind: ident, $msg: literal) => {{
        use crate::error::{ErrorKind, HttpClientError};

        Err(HttpClientError::from_str(ErrorKind::$kind, $msg))
    }};
}
