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

//! [HTTP/2] Protocol Implementation.
//!
//! # Introduction
//! HTTP/2 allows interleaving of messages on the same connection and uses an
//! efficient coding for HTTP fields. Every HTTP/2 frame is a 9-byte header
//! followed by a typed payload; many logical request/response exchanges are
//! multiplexed over one transport as independently flow-controlled streams.
//!
//! This module provides the frame layer of the protocol: the typed frame
//! model ([`Frame`], [`Payload`]), a pull-style [`FrameDecoder`] and a
//! [`FrameEncoder`]. Header compression is delegated to the `hpack` crate;
//! the codec instances inside the encoder and decoder carry the
//! session-persistent dynamic table state.
//!
//! [HTTP/2]: https://httpwg.org/specs/rfc9113.html

mod decoder;
mod encoder;
mod error;
mod frame;
mod parts;

pub use decoder::{FrameDecoder, FrameKind, Frames, FramesIntoIter};
pub use encoder::FrameEncoder;
pub use error::{ErrorCode, H2Error};
pub use frame::{
    Data, Frame, FrameFlags, FrameType, Goaway, Headers, Payload, Ping, Priority, RstStream,
    Setting, Settings, SettingsBuilder, StreamId, WindowUpdate,
};
pub use parts::Parts;

pub use crate::pseudo::PseudoHeaders;
