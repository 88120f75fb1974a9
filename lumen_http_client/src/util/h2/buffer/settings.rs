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

//! http2 connection flow control.

use lumen_http::h2::{Frame, H2Error};

use crate::util::h2::buffer::{RecvWindow, SendWindow};

pub(crate) struct FlowControl {
    recv_window: RecvWindow,
    send_window: SendWindow,
}

impl FlowControl {
    pub(crate) fn new(conn_recv_window: u32, conn_send_window: u32) -> Self {
        FlowControl {
            recv_window: RecvWindow::new(conn_recv_window as i32),
            send_window: SendWindow::new(conn_send_window as i32),
        }
    }

    pub(crate) fn check_conn_recv_window_update(&mut self) -> Option<Frame> {
        self.recv_window.check_window_update(0)
    }

    pub(crate) fn setup_recv_window(&mut self, size: u32) {
        let actual = self.recv_window.actual_size() as u32;
        if size > actual {
            self.recv_window.increase_actual(size - actual);
        } else {
            self.recv_window.reduce_actual(actual - size);
        }
    }

    pub(crate) fn increase_send_size(&mut self, size: u32) -> Result<(), H2Error> {
        self.send_window.increase_size(size)
    }

    pub(crate) fn send_size_available(&self) -> usize {
        self.send_window.size_available() as usize
    }

    pub(crate) fn recv_notification_size_available(&self) -> u32 {
        self.recv_window.notification_available()
    }

    pub(crate) fn send_data(&mut self, size: u32) {
        self.send_window.send_data(size)
    }

    pub(crate) fn recv_data(&mut self, size: u32) {
        self.recv_window.recv_data(size)
    }
}

#[cfg(test)]
mod ut_flow_control {
    use super::*;

    /// UT test case for `FlowControl::new`.
    ///
    /// # Brief
    /// 1. Creates a new `FlowControl` instance with specific receive and
    ///    send window sizes.
    /// 2. Checks that the initial sizes are correctly set in both windows.
    #[test]
    fn ut_fc_new() {
        let fc = FlowControl::new(100, 200);
        assert_eq!(fc.recv_notification_size_available(), 100);
        assert_eq!(fc.send_size_available(), 200);
    }

    /// UT test case for `FlowControl::setup_recv_window`.
    ///
    /// # Brief
    /// 1. Grows and shrinks the receive window.
    /// 2. Checks that a grown window produces a connection WINDOW_UPDATE.
    #[test]
    fn ut_fc_setup_recv_window() {
        let mut fc = FlowControl::new(100, 200);
        fc.setup_recv_window(300);
        let update = fc.check_conn_recv_window_update();
        assert!(update.is_some());
        let frame = update.unwrap();
        assert_eq!(frame.stream_id(), 0);

        let mut fc = FlowControl::new(100, 200);
        fc.setup_recv_window(100);
        assert!(fc.check_conn_recv_window_update().is_none());
    }

    /// UT test case for send and receive accounting.
    ///
    /// # Brief
    /// 1. Sends and receives data through the connection windows.
    /// 2. Checks the available sizes afterwards.
    #[test]
    fn ut_fc_send_and_recv_data() {
        let mut fc = FlowControl::new(100, 200);
        fc.send_data(50);
        fc.recv_data(50);
        assert_eq!(fc.send_size_available(), 150);
        assert_eq!(fc.recv_notification_size_available(), 50);

        let res = fc.increase_send_size(50);
        assert!(res.is_ok());
        assert_eq!(fc.send_size_available(), 200);
    }
}
