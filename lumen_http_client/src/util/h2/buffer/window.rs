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

//! http2 send and recv window definition.

use lumen_http::h2::{ErrorCode, Frame, FrameFlags, H2Error, Payload, StreamId, WindowUpdate};

use crate::util::h2::MAX_FLOW_CONTROL_WINDOW;

pub(crate) struct SendWindow {
    // As the sending window, the client retains only its visible window
    // size, and updates it only when SETTINGS and WINDOW_UPDATE frames are
    // received from the server. The counter may go negative when the peer
    // shrinks SETTINGS_INITIAL_WINDOW_SIZE below the bytes in flight.
    size: i32,
}

impl SendWindow {
    pub(crate) fn new(size: i32) -> Self {
        Self { size }
    }

    pub(crate) fn size_available(&self) -> u32 {
        if self.size < 0 {
            0
        } else {
            self.size as u32
        }
    }

    pub(crate) fn reduce_size(&mut self, size: u32) {
        self.size -= size as i32;
    }

    pub(crate) fn increase_size(&mut self, size: u32) -> Result<(), H2Error> {
        let (curr, overflow) = self.size.overflowing_add(size as i32);
        if overflow || curr > MAX_FLOW_CONTROL_WINDOW as i32 {
            return Err(H2Error::ConnectionError(ErrorCode::FlowControlError));
        }
        self.size = curr;
        Ok(())
    }

    pub(crate) fn send_data(&mut self, size: u32) {
        self.size -= size as i32;
    }
}

#[derive(Default)]
pub(crate) struct RecvWindow {
    // The window size visible to the server.
    // `notification` decreases when a DATA frame is received and increases
    // when a WINDOW_UPDATE is sent.
    notification: i32,
    // The window size visible to the client. `actual` remains unchanged
    // except for SETTINGS updates issued by the user.
    actual: i32,
}

impl RecvWindow {
    pub(crate) fn new(size: i32) -> Self {
        Self {
            notification: size,
            actual: size,
        }
    }

    // Returns the number of unreleased bytes once more than half of the
    // advertised window has been consumed.
    pub(crate) fn unreleased_size(&self) -> Option<u32> {
        let unreleased = self.actual - self.notification;
        if unreleased <= 0 {
            return None;
        }
        if unreleased * 2 > self.notification {
            Some(unreleased as u32)
        } else {
            None
        }
    }

    pub(crate) fn actual_size(&self) -> i32 {
        self.actual
    }

    pub(crate) fn notification_available(&self) -> u32 {
        if self.notification < 0 {
            0
        } else {
            self.notification as u32
        }
    }

    pub(crate) fn reduce_actual(&mut self, size: u32) {
        self.actual -= size as i32
    }

    pub(crate) fn increase_actual(&mut self, size: u32) {
        self.actual += size as i32
    }

    pub(crate) fn reduce_notification(&mut self, size: u32) {
        self.notification -= size as i32
    }

    pub(crate) fn increase_notification(&mut self, size: u32) {
        self.notification += size as i32
    }

    pub(crate) fn check_window_update(&mut self, id: StreamId) -> Option<Frame> {
        if let Some(size) = self.unreleased_size() {
            self.increase_notification(size);
            let window_update = WindowUpdate::new(size);
            let frame = Frame::new(id, FrameFlags::new(0), Payload::WindowUpdate(window_update));
            Some(frame)
        } else {
            None
        }
    }

    // The client receiving a DATA frame means that the server has less
    // visible window.
    pub(crate) fn recv_data(&mut self, size: u32) {
        self.notification -= size as i32;
    }
}

#[cfg(test)]
mod ut_send_window {
    use lumen_http::h2::{ErrorCode, H2Error};

    use super::*;

    /// UT test case for `SendWindow::size_available`.
    ///
    /// # Brief
    /// 1. Creates `SendWindow` instances with positive and negative sizes.
    /// 2. Checks that the available size is reported correctly.
    #[test]
    fn ut_sw_size_available() {
        let sw = SendWindow::new(100);
        assert_eq!(sw.size_available(), 100);
        let sw = SendWindow::new(-1);
        assert_eq!(sw.size_available(), 0);
    }

    /// UT test case for `SendWindow::increase_size`.
    ///
    /// # Brief
    /// 1. Increases the send window size.
    /// 2. Attempts to increase the window size beyond the maximum flow
    ///    control window.
    /// 3. Checks that the overflow is reported as FLOW_CONTROL_ERROR.
    #[test]
    fn ut_sw_increase_size() {
        let mut sw = SendWindow::new(100);
        assert!(sw.increase_size(50).is_ok());
        assert_eq!(sw.size_available(), 150);

        let mut sw = SendWindow::new(1);
        let res = sw.increase_size(MAX_FLOW_CONTROL_WINDOW);
        assert_eq!(
            res,
            Err(H2Error::ConnectionError(ErrorCode::FlowControlError))
        );

        let mut sw = SendWindow::new(i32::MAX);
        let res = sw.increase_size(1);
        assert_eq!(
            res,
            Err(H2Error::ConnectionError(ErrorCode::FlowControlError))
        );
    }

    /// UT test case for `SendWindow::{send_data,reduce_size}`.
    ///
    /// # Brief
    /// 1. Sends data and reduces the window size.
    /// 2. Checks that the size shrinks accordingly.
    #[test]
    fn ut_sw_send_data() {
        let mut sw = SendWindow::new(100);
        sw.send_data(50);
        assert_eq!(sw.size_available(), 50);
        sw.reduce_size(60);
        assert_eq!(sw.size_available(), 0);
    }
}
