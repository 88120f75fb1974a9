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

use crate::headers::Headers;
use crate::pseudo::PseudoHeaders;

/// HTTP2 HEADERS frame payload implementation. A header block is one logical
/// HPACK-encoded header list, consisting of pseudo-header fields followed by
/// regular field lines.
#[derive(PartialEq, Eq, Clone, Default)]
pub struct Parts {
    pub(crate) pseudo: PseudoHeaders,
    pub(crate) map: Headers,
}

impl Parts {
    /// The constructor of `Parts`.
    pub fn new() -> Self {
        Self {
            pseudo: PseudoHeaders::new(),
            map: Headers::new(),
        }
    }

    /// Sets pseudo headers for `Parts`.
    pub fn set_pseudo(&mut self, pseudo: PseudoHeaders) {
        self.pseudo = pseudo;
    }

    /// Sets regular field lines for `Parts`.
    pub fn set_header_lines(&mut self, headers: Headers) {
        self.map = headers;
    }

    /// Returns pseudo headers and regular field lines as a tuple of
    /// references.
    pub fn parts(&self) -> (&PseudoHeaders, &Headers) {
        (&self.pseudo, &self.map)
    }

    /// Consumes this `Parts` and returns pseudo headers and regular field
    /// lines.
    pub fn into_parts(self) -> (PseudoHeaders, Headers) {
        (self.pseudo, self.map)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pseudo.is_empty() && self.map.is_empty()
    }
}

#[cfg(test)]
mod ut_parts {
    use super::*;

    /// UT test cases for `Parts`.
    ///
    /// # Brief
    /// 1. Creates a `Parts`, sets pseudo headers and field lines.
    /// 2. Checks `parts`, `into_parts` and `is_empty`.
    #[test]
    fn ut_parts() {
        let mut parts = Parts::new();
        assert!(parts.is_empty());

        let mut pseudo = PseudoHeaders::new();
        pseudo.set_status(Some(String::from("200")));
        parts.set_pseudo(pseudo);

        let mut headers = Headers::new();
        headers.insert("server", "lumen").unwrap();
        parts.set_header_lines(headers);

        assert!(!parts.is_empty());
        let (pseudo, map) = parts.parts();
        assert_eq!(pseudo.status(), Some("200"));
        assert_eq!(map.get("server").unwrap().to_string().unwrap(), "lumen");

        let (pseudo, map) = parts.into_parts();
        assert_eq!(pseudo.status(), Some("200"));
        assert_eq!(map.len(), 1);
    }
}
