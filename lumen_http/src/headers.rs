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

//! HTTP [`Header`][header], which is called `Field` in [`RFC9110`].
//!
//! The module provides [`Header`], [`HeaderName`], [`HeaderValue`],
//! [`Headers`] and a number of types used for interacting with `Headers`.
//!
//! `Headers` preserves the insertion order of its fields, so a header list
//! serialized from it appears on the wire in the order the caller built it.
//!
//! [header]: https://httpwg.org/specs/rfc9110.html#fields
//! [`RFC9110`]: https://httpwg.org/specs/rfc9110.html
//!
//! # Examples
//!
//! ```
//! use lumen_http::headers::Headers;
//!
//! let mut headers = Headers::new();
//! headers.insert("Accept", "text/html").unwrap();
//! headers.insert("Content-Length", "3495").unwrap();
//!
//! assert_eq!(
//!     headers.get("accept").unwrap().to_string().unwrap(),
//!     "text/html"
//! );
//! ```

use core::convert::TryFrom;
use core::{fmt, slice, str};

use crate::error::{ErrorKind, HttpError};

/// HTTP `Header`, which consists of [`HeaderName`] and [`HeaderValue`].
///
/// # Examples
///
/// ```
/// use core::convert::TryFrom;
///
/// use lumen_http::headers::Header;
///
/// // This header name string will be normalized to lowercase.
/// let header = Header::try_from(("Example-Field", "Foo")).unwrap();
/// assert_eq!(header.name().as_bytes(), b"example-field");
/// assert_eq!(header.value().to_string().unwrap(), "Foo");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    name: HeaderName,
    value: HeaderValue,
}

impl Header {
    /// Combines a `HeaderName` and a `HeaderValue` into a `Header`.
    pub fn from_raw_parts(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }

    /// Gets a reference to the `HeaderName`.
    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    /// Gets a reference to the `HeaderValue`.
    pub fn value(&self) -> &HeaderValue {
        &self.value
    }

    /// Consumes this `Header` and returns its `HeaderName` and `HeaderValue`.
    pub fn into_parts(self) -> (HeaderName, HeaderValue) {
        (self.name, self.value)
    }
}

impl<N, V> TryFrom<(N, V)> for Header
where
    HeaderName: TryFrom<N>,
    <HeaderName as TryFrom<N>>::Error: Into<HttpError>,
    HeaderValue: TryFrom<V>,
    <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
{
    type Error = HttpError;

    fn try_from((name, value): (N, V)) -> Result<Self, Self::Error> {
        Ok(Header::from_raw_parts(
            HeaderName::try_from(name).map_err(Into::into)?,
            HeaderValue::try_from(value).map_err(Into::into)?,
        ))
    }
}

/// HTTP `Header Name`, which will be normalized to lowercase.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct HeaderName {
    name: String,
}

impl HeaderName {
    /// Converts a slice of bytes to a `HeaderName`. Uppercase letters are
    /// normalized to lowercase, all other bytes must be legal field-name
    /// characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_http::headers::HeaderName;
    ///
    /// let name = HeaderName::from_bytes(b"Example-Field").unwrap();
    /// assert_eq!(name.as_bytes(), b"example-field");
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HttpError> {
        Ok(Self {
            name: Self::normalize(bytes)?,
        })
    }

    /// Returns the `&str` representation of this `HeaderName`.
    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the byte representation of this `HeaderName`.
    pub fn as_bytes(&self) -> &[u8] {
        self.name.as_bytes()
    }

    pub(crate) fn into_string(self) -> String {
        self.name
    }

    fn normalize(bytes: &[u8]) -> Result<String, HttpError> {
        if bytes.is_empty() {
            return Err(ErrorKind::InvalidInput.into());
        }
        let mut name = Vec::with_capacity(bytes.len());
        for b in bytes {
            name.push(normalize_byte(*b)?);
        }
        // normalize_byte only outputs legal ascii.
        Ok(unsafe { String::from_utf8_unchecked(name) })
    }
}

// Field-name characters after lowercase normalization are the visible ascii
// characters excluding uppercase letters, that is `0x21..=0x40` and
// `0x5b..=0x7e`.
fn normalize_byte(b: u8) -> Result<u8, HttpError> {
    match b {
        b'A'..=b'Z' => Ok(b.to_ascii_lowercase()),
        0x21..=0x40 | 0x5b..=0x7e => Ok(b),
        _ => Err(ErrorKind::InvalidInput.into()),
    }
}

/// Checks whether every byte of `bytes` is a legal, already-normalized
/// field-name character.
pub fn is_legal_name(bytes: &[u8]) -> bool {
    !bytes.is_empty()
        && bytes
            .iter()
            .all(|&b| matches!(b, 0x21..=0x40 | 0x5b..=0x7e))
}

impl TryFrom<&str> for HeaderName {
    type Error = HttpError;

    fn try_from(str: &str) -> Result<Self, Self::Error> {
        Self::from_bytes(str.as_bytes())
    }
}

impl TryFrom<&[u8]> for HeaderName {
    type Error = HttpError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP `Header Value`, which may hold multiple values for one header name.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct HeaderValue {
    inner: Vec<Vec<u8>>,
}

/// An immutable iterator over `HeaderValue`.
pub type HeaderValueIter<'a> = slice::Iter<'a, Vec<u8>>;

/// A mutable iterator over `HeaderValue`.
pub type HeaderValueIterMut<'a> = slice::IterMut<'a, Vec<u8>>;

impl HeaderValue {
    /// Converts a slice of bytes to a `HeaderValue`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_http::headers::HeaderValue;
    ///
    /// let value = HeaderValue::from_bytes(b"text/html").unwrap();
    /// assert_eq!(value.to_string().unwrap(), "text/html");
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HttpError> {
        if !Self::is_legal(bytes) {
            return Err(ErrorKind::InvalidInput.into());
        }
        Ok(Self {
            inner: vec![bytes.to_vec()],
        })
    }

    /// Appends a new value to this `HeaderValue`.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), HttpError> {
        if !Self::is_legal(bytes) {
            return Err(ErrorKind::InvalidInput.into());
        }
        self.inner.push(bytes.to_vec());
        Ok(())
    }

    /// Outputs the content of this `HeaderValue` as a `String`. Multiple
    /// values are joined by `", "`. Returns `Err` if a value is not legal
    /// utf-8.
    pub fn to_string(&self) -> Result<String, HttpError> {
        let mut content = String::new();
        for (n, value) in self.inner.iter().enumerate() {
            if n != 0 {
                content.push_str(", ");
            }
            content.push_str(
                str::from_utf8(value).map_err(|_| HttpError::from(ErrorKind::InvalidInput))?,
            );
        }
        Ok(content)
    }

    /// Outputs the content of this `HeaderValue` as a `Vec<u8>`. Multiple
    /// values are joined by `", "`.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut content = Vec::new();
        for (n, value) in self.inner.iter().enumerate() {
            if n != 0 {
                content.extend_from_slice(b", ");
            }
            content.extend_from_slice(value);
        }
        content
    }

    /// Returns an iterator over the underlying values.
    pub fn iter(&self) -> HeaderValueIter<'_> {
        self.inner.iter()
    }

    /// Returns a mutable iterator over the underlying values.
    pub fn iter_mut(&mut self) -> HeaderValueIterMut<'_> {
        self.inner.iter_mut()
    }

    fn is_legal(bytes: &[u8]) -> bool {
        bytes.iter().all(|&b| matches!(b, 0x20..=0x7e | 0x09))
    }
}

impl TryFrom<&str> for HeaderValue {
    type Error = HttpError;

    fn try_from(str: &str) -> Result<Self, Self::Error> {
        Self::from_bytes(str.as_bytes())
    }
}

impl TryFrom<&[u8]> for HeaderValue {
    type Error = HttpError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

/// HTTP `Headers`, an ordered multimap from `HeaderName` to `HeaderValue`.
///
/// Iteration yields the headers in insertion order.
///
/// # Examples
///
/// ```
/// use lumen_http::headers::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("accept", "text/html").unwrap();
/// headers.append("accept", "text/plain").unwrap();
///
/// let accept = headers.get("accept").unwrap();
/// assert_eq!(accept.to_string().unwrap(), "text/html, text/plain");
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers {
    list: Vec<(HeaderName, HeaderValue)>,
}

/// An immutable iterator over `Headers`, in insertion order.
pub type HeadersIter<'a> = slice::Iter<'a, (HeaderName, HeaderValue)>;

/// A consuming iterator over `Headers`, in insertion order.
pub type HeadersIntoIter = std::vec::IntoIter<(HeaderName, HeaderValue)>;

impl Headers {
    /// Creates a new, empty `Headers`.
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Returns the number of header names in this `Headers`.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if this `Headers` is empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Gets the `HeaderValue` of a header name, if it is present.
    pub fn get<N>(&self, name: N) -> Option<&HeaderValue>
    where
        HeaderName: TryFrom<N>,
    {
        let name = HeaderName::try_from(name).ok()?;
        self.list
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Inserts a header. If the header name is already present, the previous
    /// value is replaced and the name keeps its original position.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> Result<(), HttpError>
    where
        HeaderName: TryFrom<N>,
        <HeaderName as TryFrom<N>>::Error: Into<HttpError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
    {
        let name = HeaderName::try_from(name).map_err(Into::into)?;
        let value = HeaderValue::try_from(value).map_err(Into::into)?;
        match self.list.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.list.push((name, value)),
        }
        Ok(())
    }

    /// Appends a header. If the header name is already present, the value is
    /// added to the existing `HeaderValue`.
    pub fn append<N, V>(&mut self, name: N, value: V) -> Result<(), HttpError>
    where
        HeaderName: TryFrom<N>,
        <HeaderName as TryFrom<N>>::Error: Into<HttpError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
    {
        let name = HeaderName::try_from(name).map_err(Into::into)?;
        let value = HeaderValue::try_from(value).map_err(Into::into)?;
        match self.list.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => {
                for bytes in value.iter() {
                    v.inner.push(bytes.clone());
                }
            }
            None => self.list.push((name, value)),
        }
        Ok(())
    }

    /// Removes a header name and its values. Returns the removed value, if
    /// it was present.
    pub fn remove<N>(&mut self, name: N) -> Option<HeaderValue>
    where
        HeaderName: TryFrom<N>,
    {
        let name = HeaderName::try_from(name).ok()?;
        let pos = self.list.iter().position(|(n, _)| *n == name)?;
        Some(self.list.remove(pos).1)
    }

    /// Returns an iterator over the headers in insertion order.
    pub fn iter(&self) -> HeadersIter<'_> {
        self.list.iter()
    }
}

impl IntoIterator for Headers {
    type Item = (HeaderName, HeaderValue);
    type IntoIter = HeadersIntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(
                f,
                "{}: {}",
                name.as_str(),
                value.to_string().map_err(|_| fmt::Error)?
            )?;
        }
        Ok(())
    }
}
