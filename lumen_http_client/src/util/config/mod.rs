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

//! HTTP/2 connection configuration.

const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024;
const DEFAULT_MAX_HEADER_LIST_SIZE: u32 = 1 << 20;
const DEFAULT_HEADER_TABLE_SIZE: u32 = 4096;
const DEFAULT_MAX_CONCURRENT_STREAMS: u32 = 256;
// The initial flow-control window specified in RFC 9113, used for both the
// connection-level and the stream-level receive windows.
const DEFAULT_CONN_WINDOW_SIZE: u32 = 65535;
const DEFAULT_STREAM_WINDOW_SIZE: u32 = 65535;
const DEFAULT_MAX_BODY_SIZE: u64 = 1 << 30;
const DEFAULT_ALLOWED_CACHE_FRAME_SIZE: usize = 5;

/// Settings which can be used to configure an http2 connection.
///
/// # Examples
///
/// ```
/// use lumen_http_client::H2Config;
///
/// let config = H2Config::new();
/// ```
#[derive(Clone)]
pub struct H2Config {
    max_frame_size: u32,
    max_header_list_size: u32,
    header_table_size: u32,
    max_concurrent_streams: u32,
    init_conn_window_size: u32,
    init_stream_window_size: u32,
    max_body_size: u64,
    allowed_cache_frame_size: usize,
}

impl H2Config {
    /// `H2Config` constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the SETTINGS_MAX_FRAME_SIZE advertised to the peer.
    pub fn set_max_frame_size(&mut self, size: u32) {
        self.max_frame_size = size;
    }

    /// Sets the SETTINGS_MAX_HEADER_LIST_SIZE advertised to the peer, which
    /// also limits the accepted size of one inbound header block.
    pub fn set_max_header_list_size(&mut self, size: u32) {
        self.max_header_list_size = size;
    }

    /// Sets the SETTINGS_HEADER_TABLE_SIZE advertised to the peer.
    pub fn set_header_table_size(&mut self, size: u32) {
        self.header_table_size = size;
    }

    /// Sets the SETTINGS_MAX_CONCURRENT_STREAMS advertised to the peer.
    pub fn set_max_concurrent_streams(&mut self, num: u32) {
        self.max_concurrent_streams = num;
    }

    /// Sets the connection-level receive window size.
    pub fn set_conn_window_size(&mut self, size: u32) {
        self.init_conn_window_size = size;
    }

    /// Sets the stream-level receive window size advertised as
    /// SETTINGS_INITIAL_WINDOW_SIZE.
    pub fn set_stream_window_size(&mut self, size: u32) {
        self.init_stream_window_size = size;
    }

    /// Sets the maximum number of body bytes accepted on one stream.
    pub fn set_max_body_size(&mut self, size: u64) {
        self.max_body_size = size;
    }

    /// Sets the number of response frames cached per stream.
    pub fn set_allowed_cache_frame_size(&mut self, size: usize) {
        self.allowed_cache_frame_size = size;
    }

    /// Gets the SETTINGS_MAX_FRAME_SIZE.
    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    /// Gets the SETTINGS_MAX_HEADER_LIST_SIZE.
    pub fn max_header_list_size(&self) -> u32 {
        self.max_header_list_size
    }

    /// Gets the SETTINGS_HEADER_TABLE_SIZE.
    pub fn header_table_size(&self) -> u32 {
        self.header_table_size
    }

    /// Gets the SETTINGS_MAX_CONCURRENT_STREAMS.
    pub fn max_concurrent_streams(&self) -> u32 {
        self.max_concurrent_streams
    }

    /// Gets the connection-level receive window size.
    pub fn conn_window_size(&self) -> u32 {
        self.init_conn_window_size
    }

    /// Gets the stream-level receive window size.
    pub fn stream_window_size(&self) -> u32 {
        self.init_stream_window_size
    }

    /// Gets the maximum number of body bytes accepted on one stream.
    pub fn max_body_size(&self) -> u64 {
        self.max_body_size
    }

    /// Gets the number of response frames cached per stream.
    pub fn allowed_cache_frame_size(&self) -> usize {
        self.allowed_cache_frame_size
    }
}

impl Default for H2Config {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_header_list_size: DEFAULT_MAX_HEADER_LIST_SIZE,
            header_table_size: DEFAULT_HEADER_TABLE_SIZE,
            max_concurrent_streams: DEFAULT_MAX_CONCURRENT_STREAMS,
            init_conn_window_size: DEFAULT_CONN_WINDOW_SIZE,
            init_stream_window_size: DEFAULT_STREAM_WINDOW_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            allowed_cache_frame_size: DEFAULT_ALLOWED_CACHE_FRAME_SIZE,
        }
    }
}
