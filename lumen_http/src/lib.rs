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

//! `lumen_http` provides various basic components that `HTTP` needs to use.
//! You can use these components to build a HTTP client.
//!
//! # Support HTTP Version
//! - `HTTP/2`

#[cfg(feature = "http2")]
pub mod h2;

#[cfg(feature = "http2")]
pub mod pseudo;

pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod version;
