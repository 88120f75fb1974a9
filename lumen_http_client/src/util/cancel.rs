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

//! Cooperative request cancellation.

use std::sync::Arc;

use crate::runtime::watch;

/// A one-shot cooperative cancellation signal.
///
/// Cloning a `Cancellation` yields handles observing the same signal, so one
/// clone can be kept by the caller while another travels with the request.
/// Once fired, the signal stays fired.
///
/// # Examples
///
/// ```
/// use lumen_http_client::Cancellation;
///
/// let cancel = Cancellation::new();
/// let handle = cancel.clone();
/// handle.cancel();
/// assert!(cancel.is_cancelled());
/// ```
pub struct Cancellation {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Cancellation {
    /// Creates a new, unfired `Cancellation`.
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Fires the signal. All clones observe the cancellation.
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }

    /// Checks whether the signal has been fired.
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes when the signal fires. Never completes if it is not fired.
    pub(crate) async fn cancelled(&mut self) {
        if *self.receiver.borrow() {
            return;
        }
        // The sender half lives inside every clone, so `changed` can only
        // fail once all clones are dropped, which this `&mut self` excludes.
        while self.receiver.changed().await.is_ok() {
            if *self.receiver.borrow() {
                return;
            }
        }
    }
}

impl Clone for Cancellation {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod ut_cancel {
    use super::Cancellation;

    /// UT test cases for `Cancellation`.
    ///
    /// # Brief
    /// 1. Creates a `Cancellation` and a clone of it.
    /// 2. Fires the clone and checks that both observe the signal.
    #[test]
    fn ut_cancellation_fires_all_clones() {
        let cancel = Cancellation::new();
        let handle = cancel.clone();
        assert!(!cancel.is_cancelled());
        handle.cancel();
        assert!(cancel.is_cancelled());
        assert!(handle.is_cancelled());
    }

    /// UT test cases for `Cancellation::cancelled`.
    ///
    /// # Brief
    /// 1. Fires a `Cancellation` and awaits `cancelled`.
    /// 2. Checks that the future completes.
    #[test]
    fn ut_cancellation_cancelled_completes() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            let mut cancel = Cancellation::new();
            cancel.cancel();
            cancel.cancelled().await;
        });
    }
}
