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

//! Http2 Protocol module.
//!
//! A module that manages frame transport over the HTTP2 protocol.
//!
//! - [`SendData`] controls the io write half for sending frames.
//! - [`RecvData`] controls the io read half for receiving frames.
//! - [`Streams`] manages the state of the individual streams.
//! - [`ConnManager`] coordinates the request sending and response receiving
//!   of multiple streams.

mod buffer;
mod input;
mod manager;
mod output;
mod streams;

pub(crate) use buffer::FlowControl;
pub(crate) use input::SendData;
pub(crate) use manager::{ConnManager, StreamController};
pub(crate) use output::RecvData;
pub(crate) use streams::{RequestWrapper, Streams};

pub(crate) const MAX_FLOW_CONTROL_WINDOW: u32 = (1 << 31) - 1;
