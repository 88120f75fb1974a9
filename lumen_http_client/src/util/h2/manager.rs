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

//! Streams manage task.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use lumen_http::h2::{
    ErrorCode, Frame, FrameFlags, Goaway, H2Error, Payload, Ping, RstStream, Setting, StreamId,
};

use crate::runtime::{BoundedReceiver, UnboundedReceiver, UnboundedSender};
use crate::util::dispatcher::http2::{
    DispatchErrorKind, ManagerSendFut, OnCloseList, OutputMessage, ReqMessage, RespMessage,
    SettingsState, SettingsSync,
};
use crate::util::h2::streams::{DataReadState, FrameRecvState, StreamEndState, Streams};

#[derive(Copy, Clone)]
enum ManagerState {
    Send,
    Receive,
    Exit(DispatchErrorKind),
}

/// The stream-table owner of one connection.
pub(crate) struct StreamController {
    // The connection close flag prevents new stream submissions once the
    // connection is closed.
    pub(crate) io_shutdown: Arc<AtomicBool>,
    // The senders of all connected stream channels of the responses.
    pub(crate) senders: HashMap<StreamId, crate::runtime::BoundedSender<RespMessage>>,
    pub(crate) curr_message: HashMap<StreamId, ManagerSendFut>,
    // Maps per-request cancellation tokens to allocated stream ids.
    pub(crate) tokens: HashMap<u64, StreamId>,
    stream_of_token: HashMap<StreamId, u64>,
    // Stream information on the connection.
    pub(crate) streams: Streams,
    // The last GOAWAY frame sent by the client.
    pub(crate) going_away: Option<Goaway>,
    // Callbacks fired exactly once when the connection closes.
    pub(crate) on_close: OnCloseList,
}

/// The frame processor of one connection: dispatches inbound frames, keeps
/// the stream table and the flow-control windows consistent, emits
/// administrative frames and pumps outbound request bodies.
pub(crate) struct ConnManager {
    state: ManagerState,
    next_state: ManagerState,
    // Synchronizes SETTINGS frames sent by the client.
    settings: Arc<Mutex<SettingsSync>>,
    // Channel transmitter between the manager and the io input.
    input_tx: UnboundedSender<Frame>,
    // Channel receiver between the manager and the io output.
    resp_rx: BoundedReceiver<OutputMessage>,
    // Channel receiver between the manager and the request tasks.
    req_rx: UnboundedReceiver<ReqMessage>,
    // No stream frames are emitted before the peer's first SETTINGS frame
    // has been processed.
    peer_settings_synced: bool,
    controller: StreamController,
}

impl Future for ConnManager {
    type Output = Result<(), DispatchErrorKind>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let manager = self.get_mut();
        loop {
            match manager.state {
                ManagerState::Send => {
                    if manager.poll_blocked_frames(cx).is_pending() {
                        return Poll::Pending;
                    }
                }
                ManagerState::Receive => {
                    match manager.resp_rx.poll_recv(cx) {
                        Poll::Ready(Some(message)) => match message {
                            OutputMessage::Output(frame) => {
                                if manager.poll_recv_message(cx, frame)?.is_pending() {
                                    return Poll::Pending;
                                }
                            }
                            // The io output produced an error.
                            OutputMessage::OutputExit(e) => {
                                if manager.manage_resp_error(cx, e)?.is_pending() {
                                    return Poll::Pending;
                                }
                            }
                        },
                        Poll::Ready(None) => {
                            return manager.poll_channel_closed_exit(cx);
                        }
                        Poll::Pending => {
                            return manager.manage_pending_state(cx);
                        }
                    }
                }
                ManagerState::Exit(e) => return Poll::Ready(Err(e)),
            }
        }
    }
}

impl ConnManager {
    pub(crate) fn new(
        settings: Arc<Mutex<SettingsSync>>,
        input_tx: UnboundedSender<Frame>,
        resp_rx: BoundedReceiver<OutputMessage>,
        req_rx: UnboundedReceiver<ReqMessage>,
        controller: StreamController,
    ) -> Self {
        Self {
            state: ManagerState::Receive,
            next_state: ManagerState::Receive,
            settings,
            input_tx,
            resp_rx,
            req_rx,
            peer_settings_synced: false,
            controller,
        }
    }

    /// Marks the connection closed and fires the on-close callbacks. Called
    /// by the task wrapper after the manager completes, whatever the exit
    /// path was.
    pub(crate) fn exit_cleanup(&mut self) {
        self.controller.shutdown();
        self.controller.fire_on_close();
    }

    fn manage_pending_state(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        if let Err(e) = self.poll_recv_request(cx) {
            return self.poll_manager_exit(cx, e);
        }
        if self.peer_settings_synced {
            if let Err(e) = self.poll_input_request(cx) {
                return self.poll_manager_exit(cx, e);
            }
        }
        Poll::Pending
    }

    fn poll_recv_request(&mut self, cx: &mut Context<'_>) -> Result<(), DispatchErrorKind> {
        loop {
            let message = match self.req_rx.poll_recv(cx) {
                Poll::Ready(Some(message)) => message,
                Poll::Ready(None) => return Err(DispatchErrorKind::ChannelClosed),
                Poll::Pending => break,
            };
            match message {
                ReqMessage::Request(task) => {
                    let id = match self.controller.streams.generate_id() {
                        Ok(id) => id,
                        Err(e) => {
                            let _ = task.sender.try_send(RespMessage::OutputExit(e));
                            break;
                        }
                    };
                    let headers = Frame::new(id, task.request.flag, task.request.payload);
                    let queued = self.controller.streams.reach_max_concurrency()
                        || !self.controller.streams.is_pending_concurrency_empty();
                    self.controller.senders.insert(id, task.sender);
                    self.controller.tokens.insert(task.token, id);
                    self.controller.stream_of_token.insert(id, task.token);
                    self.controller
                        .streams
                        .insert(id, headers, task.request.data);
                    // A stream queued on concurrency takes its slot later.
                    if queued {
                        self.controller.streams.push_pending_concurrency(id);
                    } else {
                        self.controller.streams.count_stream(id);
                        self.controller.streams.push_back_pending_send(id);
                    }
                }
                ReqMessage::Cancel(token) => {
                    if let Some(id) = self.controller.tokens.get(&token).copied() {
                        if let Poll::Ready(Err(e)) =
                            self.manage_stream_error(cx, id, ErrorCode::Cancel)
                        {
                            return Err(e);
                        }
                    }
                }
                ReqMessage::Close => {
                    // Graceful shutdown: announce the last open stream and
                    // fail everything still in flight with a disconnect
                    // error.
                    let last_id = self.controller.streams.max_open_stream_id();
                    let goaway = Goaway::new(ErrorCode::NoError.into_code(), last_id, vec![]);
                    self.controller.going_away = Some(goaway.clone());
                    let frame = Frame::new(0, FrameFlags::empty(), Payload::Goaway(goaway));
                    let _ = self.input_tx.send(frame);
                    return Err(DispatchErrorKind::Disconnect);
                }
            }
        }
        Ok(())
    }

    fn poll_manager_exit(
        &mut self,
        cx: &mut Context<'_>,
        error: DispatchErrorKind,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        if self.exit_with_error(cx, error) {
            self.state = ManagerState::Send;
            self.next_state = ManagerState::Exit(error);
            Poll::Pending
        } else {
            Poll::Ready(Err(error))
        }
    }

    fn poll_input_request(&mut self, cx: &mut Context<'_>) -> Result<(), DispatchErrorKind> {
        self.controller.streams.try_consume_pending_concurrency();
        let size = self.controller.streams.pending_stream_num();
        let mut index = 0;
        while index < size {
            match self.controller.streams.next_pending_stream() {
                None => {
                    break;
                }
                Some(id) => {
                    self.input_stream_frame(cx, id)?;
                }
            }
            index += 1;
        }
        Ok(())
    }

    fn input_stream_frame(
        &mut self,
        cx: &mut Context<'_>,
        id: StreamId,
    ) -> Result<(), DispatchErrorKind> {
        match self.controller.streams.headers(id)? {
            None => {}
            Some(header) => {
                let is_end_stream = header.flags().is_end_stream();
                self.poll_send_frame(header)?;
                // Prevents sending empty data frames after a bodyless
                // request.
                if is_end_stream {
                    return Ok(());
                }
            }
        }

        loop {
            match self.controller.streams.poll_read_body(cx, id) {
                Ok(state) => match state {
                    DataReadState::Closed => break,
                    DataReadState::Pending => break,
                    DataReadState::Ready(data) => self.poll_send_frame(data)?,
                    DataReadState::Finish(frame) => {
                        self.poll_send_frame(frame)?;
                        break;
                    }
                },
                Err(e) => return self.deal_poll_body_error(cx, e),
            }
        }
        Ok(())
    }

    // A body-read fault on one stream resets that stream only; other
    // pending streams keep sending.
    fn deal_poll_body_error(
        &mut self,
        cx: &mut Context<'_>,
        e: H2Error,
    ) -> Result<(), DispatchErrorKind> {
        match e {
            H2Error::StreamError(id, code) => match self.manage_stream_error(cx, id, code) {
                Poll::Ready(res) => res,
                Poll::Pending => Ok(()),
            },
            H2Error::ConnectionError(e) => Err(H2Error::ConnectionError(e).into()),
        }
    }

    fn poll_send_frame(&mut self, frame: Frame) -> Result<(), DispatchErrorKind> {
        match frame.payload() {
            Payload::Headers(_) => {
                if let FrameRecvState::Err(e) = self
                    .controller
                    .streams
                    .send_headers_frame(frame.stream_id(), frame.flags().is_end_stream())
                {
                    return Err(e.into());
                }
            }
            Payload::Data(_) => {
                if let FrameRecvState::Err(e) = self
                    .controller
                    .streams
                    .send_data_frame(frame.stream_id(), frame.flags().is_end_stream())
                {
                    return Err(e.into());
                }
            }
            _ => {}
        }
        self.input_tx
            .send(frame)
            .map_err(|_e| DispatchErrorKind::ChannelClosed)
    }

    fn poll_recv_message(
        &mut self,
        cx: &mut Context<'_>,
        frame: Frame,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        match self.poll_recv_frame(cx, frame) {
            Poll::Ready(Err(kind)) => self.manage_resp_error(cx, kind),
            Poll::Pending => {
                self.state = ManagerState::Send;
                self.next_state = ManagerState::Receive;
                Poll::Pending
            }
            Poll::Ready(Ok(_)) => Poll::Ready(Ok(())),
        }
    }

    fn poll_recv_frame(
        &mut self,
        cx: &mut Context<'_>,
        frame: Frame,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        match frame.payload() {
            Payload::Settings(_settings) => {
                self.recv_settings_frame(frame)?;
            }
            Payload::Ping(_ping) => {
                self.recv_ping_frame(frame)?;
            }
            Payload::Goaway(_go_away) => {
                return self.recv_go_away_frame(cx, frame);
            }
            Payload::RstStream(_reset) => {
                return self.recv_reset_frame(cx, frame).map_err(Into::into);
            }
            Payload::Headers(_headers) => {
                return self.recv_header_frame(cx, frame).map_err(Into::into);
            }
            Payload::Data(_data) => {
                return self.recv_data_frame(cx, frame);
            }
            Payload::WindowUpdate(_windows) => {
                self.recv_window_frame(frame)?;
            }
            // Priority is recorded but has no scheduling impact.
            Payload::Priority(_priority) => {}
        }
        Poll::Ready(Ok(()))
    }

    fn recv_settings_frame(&mut self, frame: Frame) -> Result<(), DispatchErrorKind> {
        let settings = if let Payload::Settings(settings) = frame.payload() {
            settings
        } else {
            // this will not happen.
            return Ok(());
        };

        if frame.flags().is_ack() {
            let mut connection = self.settings.lock().unwrap();
            if let SettingsState::Acknowledging(ref acknowledged) = connection.settings {
                for setting in acknowledged.get_settings() {
                    if let Setting::InitialWindowSize(size) = setting {
                        self.controller
                            .streams
                            .apply_recv_initial_window_size(*size);
                    }
                }
            }
            connection.settings = SettingsState::Synced;
            Ok(())
        } else {
            for setting in settings.get_settings() {
                match setting {
                    Setting::MaxConcurrentStreams(num) => {
                        self.controller.streams.apply_max_concurrent_streams(*num);
                    }
                    Setting::InitialWindowSize(size) => {
                        self.controller
                            .streams
                            .apply_send_initial_window_size(*size)?;
                    }
                    // The server must not enable push towards a client.
                    Setting::EnablePush(enabled) => {
                        if *enabled {
                            return Err(
                                H2Error::ConnectionError(ErrorCode::ProtocolError).into()
                            );
                        }
                    }
                    _ => {}
                }
            }

            // The payload is copied onto the ACK frame so that the io input
            // can reconfigure the frame encoder; the input empties the
            // payload when sending.
            let ack_settings = Frame::new(
                frame.stream_id(),
                FrameFlags::new(0x1),
                frame.payload().clone(),
            );
            self.input_tx
                .send(ack_settings)
                .map_err(|_e| DispatchErrorKind::ChannelClosed)?;

            self.peer_settings_synced = true;
            Ok(())
        }
    }

    fn recv_ping_frame(&mut self, frame: Frame) -> Result<(), DispatchErrorKind> {
        let ping = if let Payload::Ping(ping) = frame.payload() {
            ping
        } else {
            // this will not happen.
            return Ok(());
        };
        if frame.flags().is_ack() {
            // A response to a keepalive ping carries no state to apply.
            Ok(())
        } else {
            self.input_tx
                .send(Ping::ack(ping.clone()))
                .map_err(|_e| DispatchErrorKind::ChannelClosed)
        }
    }

    fn recv_go_away_frame(
        &mut self,
        cx: &mut Context<'_>,
        frame: Frame,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        let go_away = if let Payload::Goaway(goaway) = frame.payload() {
            goaway
        } else {
            // this will not happen.
            return Poll::Ready(Ok(()));
        };
        // Prevents the current connection from creating new streams.
        self.req_rx.close();
        let last_stream_id = go_away.get_last_stream_id();
        if self.controller.streams.max_recv_id < last_stream_id {
            return Poll::Ready(Err(
                H2Error::ConnectionError(ErrorCode::ProtocolError).into()
            ));
        }
        self.controller.streams.max_recv_id = last_stream_id;

        // Streams above the announced id were never processed by the peer
        // and may be retried by the caller on another connection.
        let retryable = self.controller.streams.get_goaway_streams(last_stream_id);
        let mut blocked = false;
        for stream_id in retryable {
            match self.controller.send_message_to_stream(
                cx,
                stream_id,
                RespMessage::OutputExit(DispatchErrorKind::Disconnect),
            ) {
                // Errors are ignored while going away.
                Poll::Ready(_) => {}
                Poll::Pending => {
                    blocked = true;
                }
            }
        }

        let code =
            ErrorCode::try_from(go_away.get_error_code()).unwrap_or(ErrorCode::ProtocolError);
        let error = DispatchErrorKind::H2(H2Error::ConnectionError(code));
        let exit_blocked = self.exit_with_error(cx, error);
        if blocked || exit_blocked {
            self.state = ManagerState::Send;
            self.next_state = ManagerState::Exit(error);
            Poll::Pending
        } else {
            Poll::Ready(Err(error))
        }
    }

    fn recv_reset_frame(
        &mut self,
        cx: &mut Context<'_>,
        frame: Frame,
    ) -> Poll<Result<(), H2Error>> {
        let id = frame.stream_id();
        match self.controller.streams.recv_remote_reset(id) {
            StreamEndState::OK => {
                match self
                    .controller
                    .send_message_to_stream(cx, id, RespMessage::Output(frame))
                {
                    Poll::Ready(_) => {
                        // The stream is already closed, so a gone request
                        // task does not need a reset of its own.
                        self.controller.forget_stream(id);
                        Poll::Ready(Ok(()))
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
            StreamEndState::Err(e) => Poll::Ready(Err(e)),
            StreamEndState::Ignore => Poll::Ready(Ok(())),
        }
    }

    fn recv_header_frame(
        &mut self,
        cx: &mut Context<'_>,
        frame: Frame,
    ) -> Poll<Result<(), H2Error>> {
        let id = frame.stream_id();
        let eos = frame.flags().is_end_stream();

        // A response head must carry `:status` and may declare a
        // `content-length` that is verified at END_STREAM.
        if let Payload::Headers(headers) = frame.payload() {
            let (pseudo, fields) = headers.parts();
            if pseudo.status().is_none() {
                return Poll::Ready(Err(H2Error::StreamError(id, ErrorCode::ProtocolError)));
            }
            if let Some(value) = fields.get("content-length") {
                match parse_content_length(value.to_vec().as_slice()) {
                    Some(length) => self.controller.streams.set_expected_length(id, length),
                    None => {
                        return Poll::Ready(Err(H2Error::StreamError(
                            id,
                            ErrorCode::ProtocolError,
                        )));
                    }
                }
            }
        }

        match self.controller.streams.recv_headers(id, eos) {
            FrameRecvState::OK => {
                match self
                    .controller
                    .send_message_to_stream(cx, id, RespMessage::Output(frame))
                {
                    Poll::Ready(Ok(())) => {
                        if eos {
                            self.controller.forget_stream(id);
                        }
                        Poll::Ready(Ok(()))
                    }
                    // The request task exited early; the stream is reset so
                    // the peer stops sending.
                    Poll::Ready(Err(e)) => {
                        if eos {
                            Poll::Ready(Ok(()))
                        } else {
                            Poll::Ready(Err(e))
                        }
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
            FrameRecvState::Err(e) => Poll::Ready(Err(e)),
            FrameRecvState::Ignore => Poll::Ready(Ok(())),
        }
    }

    fn recv_data_frame(
        &mut self,
        cx: &mut Context<'_>,
        frame: Frame,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        let data = if let Payload::Data(data) = frame.payload() {
            data
        } else {
            // this will not happen.
            return Poll::Ready(Ok(()));
        };
        let id = frame.stream_id();
        let len = data.size() as u32;
        let eos = frame.flags().is_end_stream();

        self.update_window(id, len)?;
        self.controller
            .streams
            .record_recv_data(id, len as u64, eos)?;

        match self.controller.streams.recv_data(id, eos) {
            FrameRecvState::OK => {
                match self
                    .controller
                    .send_message_to_stream(cx, id, RespMessage::Output(frame))
                {
                    Poll::Ready(Ok(())) => {
                        if eos {
                            self.controller.forget_stream(id);
                        }
                        Poll::Ready(Ok(()))
                    }
                    // The request task exited early; a non-final frame
                    // resets the stream so the peer stops sending.
                    Poll::Ready(Err(e)) => {
                        if eos {
                            Poll::Ready(Ok(()))
                        } else {
                            Poll::Ready(Err(e.into()))
                        }
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
            FrameRecvState::Ignore => Poll::Ready(Ok(())),
            FrameRecvState::Err(e) => Poll::Ready(Err(e.into())),
        }
    }

    fn recv_window_frame(&mut self, frame: Frame) -> Result<(), DispatchErrorKind> {
        let windows = if let Payload::WindowUpdate(windows) = frame.payload() {
            windows
        } else {
            // this will not happen.
            return Ok(());
        };
        let id = frame.stream_id();
        let increment = windows.get_increment();
        if id == 0 {
            self.controller
                .streams
                .increase_conn_send_window(increment)?;
            self.controller.streams.reassign_conn_send_window();
        } else {
            self.controller
                .streams
                .reassign_stream_send_window(id, increment)?;
        }
        Ok(())
    }

    fn manage_resp_error(
        &mut self,
        cx: &mut Context<'_>,
        kind: DispatchErrorKind,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        match kind {
            DispatchErrorKind::H2(h2) => match h2 {
                H2Error::StreamError(id, code) => self.manage_stream_error(cx, id, code),
                H2Error::ConnectionError(code) => self.manage_conn_error(cx, code),
            },
            other => self.poll_manager_exit(cx, other),
        }
    }

    // A stream-scoped fault: RST_STREAM goes out, the affected request is
    // failed, the connection stays usable.
    fn manage_stream_error(
        &mut self,
        cx: &mut Context<'_>,
        id: StreamId,
        code: ErrorCode,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        match self.controller.streams.send_local_reset(id) {
            StreamEndState::OK => {
                let rest_payload = RstStream::new(code.into_code());
                let frame = Frame::new(id, FrameFlags::empty(), Payload::RstStream(rest_payload));
                self.input_tx
                    .send(frame)
                    .map_err(|_e| DispatchErrorKind::ChannelClosed)?;

                let poll = self.controller.send_message_to_stream(
                    cx,
                    id,
                    RespMessage::OutputExit(DispatchErrorKind::H2(H2Error::StreamError(id, code))),
                );
                match poll {
                    Poll::Ready(_) => {
                        // A send error means the request task exited early;
                        // it is ignored so the manager stays alive.
                        self.controller.forget_stream(id);
                        Poll::Ready(Ok(()))
                    }
                    Poll::Pending => {
                        self.state = ManagerState::Send;
                        // A stream error does not terminate the manager.
                        self.next_state = ManagerState::Receive;
                        Poll::Pending
                    }
                }
            }
            StreamEndState::Ignore => Poll::Ready(Ok(())),
            StreamEndState::Err(e) => Poll::Ready(Err(e.into())),
        }
    }

    // A connection-scoped fault: GOAWAY goes out with the error code and
    // the last open stream id, every request is failed with the same error
    // and the connection closes.
    fn manage_conn_error(
        &mut self,
        cx: &mut Context<'_>,
        code: ErrorCode,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        let go_away_payload = Goaway::new(
            code.into_code(),
            self.controller.streams.max_open_stream_id(),
            vec![],
        );
        // Avoids sending the same GOAWAY frame multiple times.
        if let Some(ref go_away) = self.controller.going_away {
            if go_away.get_error_code() == go_away_payload.get_error_code()
                && go_away.get_last_stream_id() == go_away_payload.get_last_stream_id()
            {
                return Poll::Ready(Ok(()));
            }
        }
        self.controller.going_away = Some(go_away_payload.clone());
        let frame = Frame::new(0, FrameFlags::empty(), Payload::Goaway(go_away_payload));
        self.input_tx
            .send(frame)
            .map_err(|_e| DispatchErrorKind::ChannelClosed)?;

        self.poll_manager_exit(cx, DispatchErrorKind::H2(H2Error::ConnectionError(code)))
    }

    fn poll_channel_closed_exit(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), DispatchErrorKind>> {
        self.poll_manager_exit(cx, DispatchErrorKind::ChannelClosed)
    }

    fn poll_blocked_frames(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match self.controller.poll_blocked_message(cx, &self.input_tx) {
            Poll::Ready(_) => {
                self.state = self.next_state;
                // Resets the follow-up state.
                self.next_state = ManagerState::Receive;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }

    // Fails every unclosed stream with `error`. Returns whether one of the
    // result channels is full and the manager has to finish the sends on a
    // later tick.
    pub(crate) fn exit_with_error(
        &mut self,
        cx: &mut Context<'_>,
        error: DispatchErrorKind,
    ) -> bool {
        self.controller.shutdown();
        self.req_rx.close();
        self.controller.streams.clear_streams_states();

        let ids = self.controller.streams.get_all_unclosed_streams();
        let mut blocked = false;
        for stream_id in ids {
            match self.controller.send_message_to_stream(
                cx,
                stream_id,
                RespMessage::OutputExit(error),
            ) {
                // Errors are ignored while closing.
                Poll::Ready(_) => {}
                Poll::Pending => {
                    blocked = true;
                }
            }
        }
        blocked
    }

    pub(crate) fn update_window(
        &mut self,
        id: StreamId,
        len: u32,
    ) -> Result<(), DispatchErrorKind> {
        self.controller
            .streams
            .release_conn_recv_window(len, &self.input_tx)?;
        self.controller
            .streams
            .release_stream_recv_window(id, len, &self.input_tx)?;
        Ok(())
    }
}

impl StreamController {
    pub(crate) fn new(streams: Streams, shutdown: Arc<AtomicBool>, on_close: OnCloseList) -> Self {
        Self {
            io_shutdown: shutdown,
            senders: HashMap::new(),
            curr_message: HashMap::new(),
            tokens: HashMap::new(),
            stream_of_token: HashMap::new(),
            streams,
            going_away: None,
            on_close,
        }
    }

    pub(crate) fn shutdown(&self) {
        self.io_shutdown.store(true, Ordering::Release);
    }

    pub(crate) fn fire_on_close(&self) {
        let callbacks = self.on_close.lock().unwrap().take();
        if let Some(callbacks) = callbacks {
            for callback in callbacks {
                callback();
            }
        }
    }

    // Drops the result channel and the cancellation token of a finished
    // stream.
    pub(crate) fn forget_stream(&mut self, id: StreamId) {
        self.senders.remove(&id);
        if let Some(token) = self.stream_of_token.remove(&id) {
            self.tokens.remove(&token);
        }
    }

    pub(crate) fn send_message_to_stream(
        &mut self,
        cx: &mut Context<'_>,
        stream_id: StreamId,
        message: RespMessage,
    ) -> Poll<Result<(), H2Error>> {
        if let Some(sender) = self.senders.get(&stream_id) {
            // If the request task has exited, this frame is skipped.
            let mut tx = {
                let sender = sender.clone();
                let ft = async move { sender.send(message).await };
                Box::pin(ft)
            };

            match tx.as_mut().poll(cx) {
                Poll::Ready(Ok(_)) => Poll::Ready(Ok(())),
                // The request task exited prematurely.
                Poll::Ready(Err(_)) => {
                    self.forget_stream(stream_id);
                    Poll::Ready(Err(H2Error::StreamError(stream_id, ErrorCode::NoError)))
                }
                Poll::Pending => {
                    self.curr_message.insert(stream_id, tx);
                    Poll::Pending
                }
            }
        } else {
            Poll::Ready(Err(H2Error::StreamError(stream_id, ErrorCode::NoError)))
        }
    }

    pub(crate) fn poll_blocked_message(
        &mut self,
        cx: &mut Context<'_>,
        input_tx: &UnboundedSender<Frame>,
    ) -> Poll<()> {
        let keys: Vec<StreamId> = self.curr_message.keys().cloned().collect();
        let mut blocked = false;

        for key in keys {
            if let Some(mut task) = self.curr_message.remove(&key) {
                match task.as_mut().poll(cx) {
                    Poll::Ready(Ok(_)) => {}
                    // The request task exited prematurely; the stream is
                    // reset so the peer can release its resources.
                    Poll::Ready(Err(_)) => {
                        self.forget_stream(key);
                        if let StreamEndState::OK = self.streams.send_local_reset(key) {
                            let rest_payload = RstStream::new(ErrorCode::NoError.into_code());
                            let frame = Frame::new(
                                key,
                                FrameFlags::empty(),
                                Payload::RstStream(rest_payload),
                            );
                            // Send errors are ignored here to finish the
                            // remaining tasks.
                            let _ = input_tx.send(frame);
                        }
                    }
                    Poll::Pending => {
                        self.curr_message.insert(key, task);
                        blocked = true;
                    }
                }
            }
        }
        if blocked {
            Poll::Pending
        } else {
            Poll::Ready(())
        }
    }
}

// `content-length` values must be a plain decimal number without leading
// zeros.
fn parse_content_length(value: &[u8]) -> Option<u64> {
    if value.is_empty() || (value.len() > 1 && value[0] == b'0') {
        return None;
    }
    let mut length = 0u64;
    for byte in value {
        if !byte.is_ascii_digit() {
            return None;
        }
        length = length.checked_mul(10)?;
        length = length.checked_add(u64::from(byte - b'0'))?;
    }
    Some(length)
}
