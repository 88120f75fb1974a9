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

//! HTTP asynchronous client module.
//!
//! This module provides the asynchronous HTTP/2 connection components.
//!
//! - [`H2Connection`]: one multiplexed HTTP/2 connection over a
//!   caller-provided transport, carrying many concurrent exchanges.
//!
//! - [`Body`]: the request body source.
//!
//! - [`Response`]: the response with its streamed [`HttpBody`].

mod connection;
mod http_body;
mod request;
mod response;

pub(crate) mod conn;

pub use connection::H2Connection;
pub use http_body::HttpBody;
pub use request::Body;
pub use response::Response;
