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

//! Connection information.

use std::net::SocketAddr;

/// Detailed address information of a connection.
#[derive(Clone, Debug)]
pub struct ConnDetail {
    /// The local socket address.
    pub local: SocketAddr,
    /// The peer socket address.
    pub peer: SocketAddr,
    /// The host name the connection was established to.
    pub addr: String,
}

impl ConnDetail {
    /// Gets the local socket address of the connection.
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Gets the peer socket address of the connection.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
