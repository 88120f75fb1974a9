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

//! Streams operations utils.

use std::cmp::{min, Ordering};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::AtomicI64;
use std::sync::Arc;
use std::task::{Context, Poll};

use lumen_http::h2::{Data, ErrorCode, Frame, FrameFlags, H2Error, Payload, StreamId};

use crate::runtime::UnboundedSender;
use crate::util::data_ref::BodyDataRef;
use crate::util::dispatcher::http2::DispatchErrorKind;
use crate::util::h2::buffer::{FlowControl, RecvWindow, SendWindow};

const DEFAULT_MAX_STREAM_ID: StreamId = u32::MAX >> 1;
const DEFAULT_MAX_CONCURRENT_STREAMS: u32 = 100;

#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) enum FrameRecvState {
    OK,
    Ignore,
    Err(H2Error),
}

pub(crate) enum DataReadState {
    Closed,
    // Wait for poll_read or wait for window credit.
    Pending,
    Ready(Frame),
    Finish(Frame),
}

#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) enum StreamEndState {
    OK,
    Ignore,
    Err(H2Error),
}

//                              +--------+
//                              |        |
//                     ,--------|  idle  |--------.
//                    /         |        |         \
//                   v          +--------+          v
//            send H |                      recv H (not supported,
//                   |                       push is disabled)
//                   v
//               +--------+
//       recv ES |        | send ES
//      ,--------|  open  |--------.
//     /         |        |         \
//    v          +--------+          v
// +----------+      |           +----------+
// |   half   |      |           |   half   |
// |  closed  |      | send R /  |  closed  |
// | (remote) |      | recv R    | (local)  |
// +----------+      |           +----------+
//      |            v                |
//      | send ES /  +--------+       | recv ES /
//      | send R /   |        |       | send R /
//      | recv R     | closed |       | recv R
//      `----------->|        |<------'
//                   +--------+
#[derive(Copy, Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) enum H2StreamState {
    Idle,
    // The response does not have to wait for the request to finish
    // sending, so the sending and receiving sides keep their own states.
    Open {
        send: ActiveState,
        recv: ActiveState,
    },
    // The request is fully sent, waiting for the rest of the response.
    LocalHalfClosed(ActiveState),
    // The response is fully received while the request is still sending.
    RemoteHalfClosed(ActiveState),
    Closed(CloseReason),
}

#[derive(Copy, Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) enum CloseReason {
    LocalRst,
    RemoteRst,
    RemoteGoAway,
    LocalGoAway,
    EndStream,
}

#[derive(Copy, Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) enum ActiveState {
    WaitHeaders,
    WaitData,
}

pub(crate) struct Stream {
    pub(crate) recv_window: RecvWindow,
    pub(crate) send_window: SendWindow,
    pub(crate) state: H2StreamState,
    pub(crate) header: Option<Frame>,
    pub(crate) data: BodyDataRef,
    // Declared `content-length` of the response, verified at END_STREAM.
    pub(crate) expected_length: Option<u64>,
    pub(crate) received: u64,
    // Whether this stream currently occupies a concurrency slot.
    counted: bool,
}

pub(crate) struct RequestWrapper {
    pub(crate) flag: FrameFlags,
    pub(crate) payload: Payload,
    pub(crate) data: BodyDataRef,
}

pub(crate) struct Streams {
    // Records the received goaway last_stream_id.
    pub(crate) max_recv_id: StreamId,
    pub(crate) stream_recv_window_size: u32,
    pub(crate) stream_send_window_size: u32,
    max_body_size: u64,
    max_concurrent_streams: u32,
    current_concurrent_streams: u32,
    // Gauge shared with the connection handle, `max_concurrent_streams`
    // minus the occupied concurrency slots.
    remaining: Arc<AtomicI64>,
    flow_control: FlowControl,
    pending_concurrency: VecDeque<StreamId>,
    pending_stream_window: HashSet<StreamId>,
    pending_conn_window: VecDeque<StreamId>,
    pending_send: VecDeque<StreamId>,
    pub(crate) stream_map: HashMap<StreamId, Stream>,
    pub(crate) next_stream_id: StreamId,
}

macro_rules! change_stream_state {
    (Idle: $eos: expr, $state: expr) => {
        $state = if $eos {
            H2StreamState::RemoteHalfClosed(ActiveState::WaitHeaders)
        } else {
            H2StreamState::Open {
                send: ActiveState::WaitHeaders,
                recv: ActiveState::WaitData,
            }
        };
    };
    (Open: $eos: expr, $state: expr, $send: expr) => {
        $state = if $eos {
            H2StreamState::RemoteHalfClosed($send.clone())
        } else {
            H2StreamState::Open {
                send: $send.clone(),
                recv: ActiveState::WaitData,
            }
        };
    };
    (HalfClosed: $eos: expr, $state: expr) => {
        $state = if $eos {
            H2StreamState::Closed(CloseReason::EndStream)
        } else {
            H2StreamState::LocalHalfClosed(ActiveState::WaitData)
        };
    };
}

impl Streams {
    pub(crate) fn new(
        recv_window_size: u32,
        send_window_size: u32,
        max_body_size: u64,
        remaining: Arc<AtomicI64>,
        flow_control: FlowControl,
    ) -> Self {
        remaining.store(
            DEFAULT_MAX_CONCURRENT_STREAMS as i64,
            std::sync::atomic::Ordering::Relaxed,
        );
        Self {
            max_recv_id: DEFAULT_MAX_STREAM_ID,
            max_concurrent_streams: DEFAULT_MAX_CONCURRENT_STREAMS,
            current_concurrent_streams: 0,
            stream_recv_window_size: recv_window_size,
            stream_send_window_size: send_window_size,
            max_body_size,
            remaining,
            flow_control,
            pending_concurrency: VecDeque::new(),
            pending_stream_window: HashSet::new(),
            pending_conn_window: VecDeque::new(),
            pending_send: VecDeque::new(),
            stream_map: HashMap::new(),
            next_stream_id: 1,
        }
    }

    // Client stream identifiers are odd and strictly increasing, starting
    // from 1.
    pub(crate) fn generate_id(&mut self) -> Result<StreamId, DispatchErrorKind> {
        let id = self.next_stream_id;
        if self.next_stream_id < DEFAULT_MAX_STREAM_ID {
            self.next_stream_id += 2;
            Ok(id)
        } else {
            Err(DispatchErrorKind::H2(H2Error::ConnectionError(
                ErrorCode::ProtocolError,
            )))
        }
    }

    pub(crate) fn insert(&mut self, id: StreamId, headers: Frame, data: BodyDataRef) {
        let send_window = SendWindow::new(self.stream_send_window_size as i32);
        let recv_window = RecvWindow::new(self.stream_recv_window_size as i32);
        let stream = Stream::new(recv_window, send_window, headers, data);
        self.stream_map.insert(id, stream);
    }

    pub(crate) fn count_stream(&mut self, id: StreamId) {
        if let Some(stream) = self.stream_map.get_mut(&id) {
            if !stream.counted {
                stream.counted = true;
                self.current_concurrent_streams += 1;
                self.remaining
                    .fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
            }
        }
    }

    // Gives the concurrency slot of a finished stream back.
    fn uncount_stream(&mut self, id: StreamId) {
        if let Some(stream) = self.stream_map.get_mut(&id) {
            if stream.counted {
                stream.counted = false;
                self.current_concurrent_streams -= 1;
                self.remaining
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn reach_max_concurrency(&mut self) -> bool {
        self.current_concurrent_streams >= self.max_concurrent_streams
    }

    pub(crate) fn apply_max_concurrent_streams(&mut self, num: u32) {
        self.max_concurrent_streams = num;
        self.remaining.store(
            num as i64 - self.current_concurrent_streams as i64,
            std::sync::atomic::Ordering::Relaxed,
        );
    }

    pub(crate) fn apply_send_initial_window_size(&mut self, size: u32) -> Result<(), H2Error> {
        let current = self.stream_send_window_size;
        self.stream_send_window_size = size;

        match current.cmp(&size) {
            Ordering::Less => {
                let excess = size - current;
                for (_id, stream) in self.stream_map.iter_mut() {
                    stream.send_window.increase_size(excess)?;
                }
                for id in self.pending_stream_window.iter() {
                    self.pending_send.push_back(*id);
                }
                self.pending_stream_window.clear();
            }
            Ordering::Greater => {
                let excess = current - size;
                for (_id, stream) in self.stream_map.iter_mut() {
                    stream.send_window.reduce_size(excess);
                }
            }
            Ordering::Equal => {}
        }
        Ok(())
    }

    pub(crate) fn apply_recv_initial_window_size(&mut self, size: u32) {
        let current = self.stream_recv_window_size;
        self.stream_recv_window_size = size;
        match current.cmp(&size) {
            Ordering::Less => {
                let extra = size - current;
                for (_id, stream) in self.stream_map.iter_mut() {
                    stream.recv_window.increase_notification(extra);
                    stream.recv_window.increase_actual(extra);
                }
            }
            Ordering::Greater => {
                for (_id, stream) in self.stream_map.iter_mut() {
                    stream.recv_window.reduce_notification(current - size);
                }
            }
            Ordering::Equal => {}
        }
    }

    pub(crate) fn release_stream_recv_window(
        &mut self,
        id: StreamId,
        size: u32,
        sender: &UnboundedSender<Frame>,
    ) -> Result<(), DispatchErrorKind> {
        if let Some(stream) = self.stream_map.get_mut(&id) {
            if stream.recv_window.notification_available() < size {
                return Err(H2Error::StreamError(id, ErrorCode::FlowControlError).into());
            }
            stream.recv_window.recv_data(size);
            if stream.recv_window.unreleased_size().is_some() {
                if !stream.is_init_or_active_flow_control() {
                    return Ok(());
                }
                if let Some(window_update) = stream.recv_window.check_window_update(id) {
                    sender
                        .send(window_update)
                        .map_err(|_e| DispatchErrorKind::ChannelClosed)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn release_conn_recv_window(
        &mut self,
        size: u32,
        sender: &UnboundedSender<Frame>,
    ) -> Result<(), DispatchErrorKind> {
        if self.flow_control.recv_notification_size_available() < size {
            return Err(H2Error::ConnectionError(ErrorCode::FlowControlError).into());
        }
        self.flow_control.recv_data(size);
        if let Some(window_update) = self.flow_control.check_conn_recv_window_update() {
            sender
                .send(window_update)
                .map_err(|_e| DispatchErrorKind::ChannelClosed)?;
        }
        Ok(())
    }

    // Body byte accounting of one DATA frame: enforces the per-stream body
    // limit and verifies the declared `content-length` at END_STREAM.
    pub(crate) fn record_recv_data(
        &mut self,
        id: StreamId,
        size: u64,
        eos: bool,
    ) -> Result<(), H2Error> {
        if let Some(stream) = self.stream_map.get_mut(&id) {
            stream.received += size;
            if stream.received > self.max_body_size && !eos {
                return Err(H2Error::StreamError(id, ErrorCode::Cancel));
            }
            if eos {
                if let Some(expected) = stream.expected_length {
                    if expected != stream.received {
                        return Err(H2Error::StreamError(id, ErrorCode::ProtocolError));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn set_expected_length(&mut self, id: StreamId, length: u64) {
        if let Some(stream) = self.stream_map.get_mut(&id) {
            stream.expected_length = Some(length);
        }
    }

    pub(crate) fn stream_state(&self, id: StreamId) -> Option<H2StreamState> {
        self.stream_map.get(&id).map(|stream| stream.state)
    }

    pub(crate) fn push_back_pending_send(&mut self, id: StreamId) {
        self.pending_send.push_back(id);
    }

    pub(crate) fn push_pending_concurrency(&mut self, id: StreamId) {
        self.pending_concurrency.push_back(id);
    }

    pub(crate) fn is_pending_concurrency_empty(&self) -> bool {
        self.pending_concurrency.is_empty()
    }

    pub(crate) fn next_pending_stream(&mut self) -> Option<StreamId> {
        self.pending_send.pop_front()
    }

    pub(crate) fn pending_stream_num(&self) -> usize {
        self.pending_send.len()
    }

    pub(crate) fn try_consume_pending_concurrency(&mut self) {
        while !self.reach_max_concurrency() {
            match self.pending_concurrency.pop_front() {
                None => {
                    return;
                }
                Some(id) => {
                    self.count_stream(id);
                    self.push_back_pending_send(id);
                }
            }
        }
    }

    pub(crate) fn increase_conn_send_window(&mut self, size: u32) -> Result<(), H2Error> {
        self.flow_control.increase_send_size(size)
    }

    // Since the body is a stream whose total size is unknown, all streams
    // blocked on the connection window are queued for sending again.
    pub(crate) fn reassign_conn_send_window(&mut self) {
        loop {
            match self.pending_conn_window.pop_front() {
                None => break,
                Some(id) => {
                    self.push_back_pending_send(id);
                }
            }
        }
    }

    pub(crate) fn reassign_stream_send_window(
        &mut self,
        id: StreamId,
        size: u32,
    ) -> Result<(), H2Error> {
        if let Some(stream) = self.stream_map.get_mut(&id) {
            // A stream-scoped overflow only fails that stream.
            if stream.send_window.increase_size(size).is_err() {
                return Err(H2Error::StreamError(id, ErrorCode::FlowControlError));
            }
        }
        if self.pending_stream_window.take(&id).is_some() {
            self.pending_send.push_back(id);
        }
        Ok(())
    }

    pub(crate) fn headers(&mut self, id: StreamId) -> Result<Option<Frame>, H2Error> {
        match self.stream_map.get_mut(&id) {
            None => Err(H2Error::ConnectionError(ErrorCode::InternalError)),
            Some(stream) => match stream.state {
                H2StreamState::Closed(_) => Ok(None),
                _ => Ok(stream.header.take()),
            },
        }
    }

    pub(crate) fn poll_read_body(
        &mut self,
        cx: &mut Context<'_>,
        id: StreamId,
    ) -> Result<DataReadState, H2Error> {
        // DATA fragments never exceed the smallest legal
        // SETTINGS_MAX_FRAME_SIZE, so they stay valid whatever the peer
        // advertised.
        const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024;

        match self.stream_map.get_mut(&id) {
            None => Err(H2Error::ConnectionError(ErrorCode::InternalError)),
            Some(stream) => match stream.state {
                H2StreamState::Closed(_) => Ok(DataReadState::Closed),
                _ => {
                    let stream_send_vacant = stream.send_window.size_available() as usize;
                    if stream_send_vacant == 0 {
                        self.pending_stream_window.insert(id);
                        return Ok(DataReadState::Pending);
                    }
                    let conn_send_vacant = self.flow_control.send_size_available();
                    if conn_send_vacant == 0 {
                        self.pending_conn_window.push_back(id);
                        return Ok(DataReadState::Pending);
                    }

                    let available = min(stream_send_vacant, conn_send_vacant);
                    let len = min(available, DEFAULT_MAX_FRAME_SIZE);

                    let mut buf = [0u8; DEFAULT_MAX_FRAME_SIZE];
                    self.poll_sized_data(cx, id, &mut buf[..len])
                }
            },
        }
    }

    fn poll_sized_data(
        &mut self,
        cx: &mut Context<'_>,
        id: StreamId,
        buf: &mut [u8],
    ) -> Result<DataReadState, H2Error> {
        let stream = if let Some(stream) = self.stream_map.get_mut(&id) {
            stream
        } else {
            return Err(H2Error::ConnectionError(ErrorCode::InternalError));
        };
        match stream.data.poll_read(cx, buf) {
            Poll::Ready(Ok(size)) => {
                if size > 0 {
                    stream.send_window.send_data(size as u32);
                    self.flow_control.send_data(size as u32);
                    let data_vec = Vec::from(&buf[..size]);

                    Ok(DataReadState::Ready(Frame::new(
                        id,
                        FrameFlags::new(0),
                        Payload::Data(Data::new(data_vec)),
                    )))
                } else {
                    let mut flag = FrameFlags::empty();
                    flag.set_end_stream(true);
                    Ok(DataReadState::Finish(Frame::new(
                        id,
                        flag,
                        Payload::Data(Data::new(vec![])),
                    )))
                }
            }
            Poll::Ready(Err(_)) => Err(H2Error::StreamError(id, ErrorCode::InternalError)),
            Poll::Pending => {
                self.push_back_pending_send(id);
                Ok(DataReadState::Pending)
            }
        }
    }

    // Closes every stream above `last_stream_id` and returns their ids;
    // those streams are eligible for retry by the caller.
    pub(crate) fn get_goaway_streams(&mut self, last_stream_id: StreamId) -> Vec<StreamId> {
        let mut ids = vec![];
        for (id, stream) in self.stream_map.iter_mut() {
            if *id > last_stream_id {
                match stream.state {
                    H2StreamState::Closed(_) => {}
                    _ => {
                        stream.state = H2StreamState::Closed(CloseReason::RemoteGoAway);
                        stream.header = None;
                        stream.data.clear();
                        ids.push(*id);
                    }
                };
            }
        }
        for id in ids.iter() {
            self.uncount_stream(*id);
        }
        ids
    }

    pub(crate) fn get_all_unclosed_streams(&mut self) -> Vec<StreamId> {
        let mut ids = vec![];
        for (id, stream) in self.stream_map.iter_mut() {
            match stream.state {
                H2StreamState::Closed(_) => {}
                _ => {
                    stream.header = None;
                    stream.data.clear();
                    stream.state = H2StreamState::Closed(CloseReason::LocalGoAway);
                    ids.push(*id);
                }
            }
        }
        for id in ids.iter() {
            self.uncount_stream(*id);
        }
        ids
    }

    // The largest identifier of a stream that is not yet closed, 0 if all
    // streams are closed.
    pub(crate) fn max_open_stream_id(&self) -> StreamId {
        self.stream_map
            .iter()
            .filter(|(_, stream)| !matches!(stream.state, H2StreamState::Closed(_)))
            .map(|(id, _)| *id)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn clear_streams_states(&mut self) {
        self.pending_stream_window.clear();
        self.pending_send.clear();
        self.pending_conn_window.clear();
        self.pending_concurrency.clear();
    }

    pub(crate) fn send_local_reset(&mut self, id: StreamId) -> StreamEndState {
        match self.stream_map.get_mut(&id) {
            None => StreamEndState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
            Some(stream) => match stream.state {
                H2StreamState::Closed(
                    CloseReason::LocalRst
                    | CloseReason::LocalGoAway
                    | CloseReason::RemoteRst
                    | CloseReason::RemoteGoAway,
                ) => StreamEndState::Ignore,
                H2StreamState::Closed(CloseReason::EndStream) => {
                    stream.state = H2StreamState::Closed(CloseReason::LocalRst);
                    StreamEndState::Ignore
                }
                _ => {
                    stream.state = H2StreamState::Closed(CloseReason::LocalRst);
                    stream.header = None;
                    stream.data.clear();
                    self.uncount_stream(id);
                    StreamEndState::OK
                }
            },
        }
    }

    pub(crate) fn send_headers_frame(&mut self, id: StreamId, eos: bool) -> FrameRecvState {
        match self.stream_map.get_mut(&id) {
            None => return FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
            Some(stream) => match &stream.state {
                H2StreamState::Idle => {
                    stream.state = if eos {
                        H2StreamState::LocalHalfClosed(ActiveState::WaitHeaders)
                    } else {
                        H2StreamState::Open {
                            send: ActiveState::WaitData,
                            recv: ActiveState::WaitHeaders,
                        }
                    };
                }
                H2StreamState::RemoteHalfClosed(ActiveState::WaitHeaders) => {
                    if eos {
                        stream.state = H2StreamState::Closed(CloseReason::EndStream);
                        self.uncount_stream(id);
                    } else {
                        stream.state = H2StreamState::RemoteHalfClosed(ActiveState::WaitData);
                    }
                }
                _ => {
                    return FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
            },
        }
        FrameRecvState::OK
    }

    pub(crate) fn send_data_frame(&mut self, id: StreamId, eos: bool) -> FrameRecvState {
        match self.stream_map.get_mut(&id) {
            None => return FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
            Some(stream) => match &stream.state {
                H2StreamState::Open {
                    send: ActiveState::WaitData,
                    recv,
                } => {
                    if eos {
                        stream.state = H2StreamState::LocalHalfClosed(*recv);
                    }
                }
                H2StreamState::RemoteHalfClosed(ActiveState::WaitData) => {
                    if eos {
                        stream.state = H2StreamState::Closed(CloseReason::EndStream);
                        self.uncount_stream(id);
                    }
                }
                _ => {
                    return FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
            },
        }
        FrameRecvState::OK
    }

    pub(crate) fn recv_remote_reset(&mut self, id: StreamId) -> StreamEndState {
        if id > self.max_recv_id {
            return StreamEndState::Ignore;
        }
        match self.stream_map.get_mut(&id) {
            None => StreamEndState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
            Some(stream) => match stream.state {
                H2StreamState::Closed(..) => StreamEndState::Ignore,
                _ => {
                    stream.state = H2StreamState::Closed(CloseReason::RemoteRst);
                    stream.header = None;
                    stream.data.clear();
                    self.uncount_stream(id);
                    StreamEndState::OK
                }
            },
        }
    }

    pub(crate) fn recv_headers(&mut self, id: StreamId, eos: bool) -> FrameRecvState {
        if id > self.max_recv_id {
            return FrameRecvState::Ignore;
        }

        match self.stream_map.get_mut(&id) {
            None => return FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
            Some(stream) => match &stream.state {
                H2StreamState::Idle => {
                    change_stream_state!(Idle: eos, stream.state);
                }
                H2StreamState::Open {
                    send,
                    recv: ActiveState::WaitHeaders,
                } => {
                    change_stream_state!(Open: eos, stream.state, send);
                }
                H2StreamState::LocalHalfClosed(ActiveState::WaitHeaders) => {
                    change_stream_state!(HalfClosed: eos, stream.state);
                    if eos {
                        self.uncount_stream(id);
                    }
                }
                // A second response head on the same stream.
                H2StreamState::Open {
                    recv: ActiveState::WaitData,
                    ..
                }
                | H2StreamState::LocalHalfClosed(ActiveState::WaitData) => {
                    return FrameRecvState::Err(H2Error::StreamError(id, ErrorCode::ProtocolError));
                }
                H2StreamState::RemoteHalfClosed(_)
                | H2StreamState::Closed(CloseReason::EndStream) => {
                    return FrameRecvState::Err(H2Error::StreamError(id, ErrorCode::StreamClosed));
                }
                H2StreamState::Closed(CloseReason::LocalGoAway | CloseReason::LocalRst) => {
                    return FrameRecvState::Ignore;
                }
                _ => {
                    return FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
            },
        }
        FrameRecvState::OK
    }

    pub(crate) fn recv_data(&mut self, id: StreamId, eos: bool) -> FrameRecvState {
        if id > self.max_recv_id {
            return FrameRecvState::Ignore;
        }
        match self.stream_map.get_mut(&id) {
            None => return FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
            Some(stream) => match &stream.state {
                H2StreamState::Open {
                    send,
                    recv: ActiveState::WaitData,
                } => {
                    if eos {
                        stream.state = H2StreamState::RemoteHalfClosed(*send);
                    }
                }
                H2StreamState::LocalHalfClosed(ActiveState::WaitData) => {
                    if eos {
                        stream.state = H2StreamState::Closed(CloseReason::EndStream);
                        self.uncount_stream(id);
                    }
                }
                // DATA after the remote side already closed the stream.
                H2StreamState::RemoteHalfClosed(_)
                | H2StreamState::Closed(CloseReason::EndStream) => {
                    return FrameRecvState::Err(H2Error::StreamError(id, ErrorCode::StreamClosed));
                }
                H2StreamState::Closed(CloseReason::LocalGoAway | CloseReason::LocalRst) => {
                    return FrameRecvState::Ignore;
                }
                _ => {
                    return FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
            },
        }
        FrameRecvState::OK
    }
}

impl Stream {
    pub(crate) fn new(
        recv_window: RecvWindow,
        send_window: SendWindow,
        headers: Frame,
        data: BodyDataRef,
    ) -> Self {
        Self {
            recv_window,
            send_window,
            state: H2StreamState::Idle,
            header: Some(headers),
            data,
            expected_length: None,
            received: 0,
            counted: false,
        }
    }

    pub(crate) fn is_init_or_active_flow_control(&self) -> bool {
        matches!(
            self.state,
            H2StreamState::Idle
                | H2StreamState::Open {
                    recv: ActiveState::WaitData,
                    ..
                }
                | H2StreamState::LocalHalfClosed(ActiveState::WaitData)
        )
    }
}

#[cfg(test)]
mod ut_streams {
    use std::sync::atomic::Ordering as AtomicOrdering;

    use super::*;
    use crate::async_impl::Body;

    fn streams(recv: u32, send: u32) -> Streams {
        Streams::new(
            recv,
            send,
            1 << 30,
            Arc::new(AtomicI64::new(0)),
            FlowControl::new(65535, 65535),
        )
    }

    fn stream_new(state: H2StreamState) -> Stream {
        Stream {
            send_window: SendWindow::new(100),
            recv_window: RecvWindow::new(100),
            state,
            header: None,
            data: BodyDataRef::new(Body::empty()),
            expected_length: None,
            received: 0,
            counted: false,
        }
    }

    /// UT test case for `Streams::generate_id`.
    ///
    /// # Brief
    /// 1. Generates several stream ids.
    /// 2. Checks that they are odd and strictly increasing.
    #[test]
    fn ut_streams_generate_id() {
        let mut streams = streams(100, 100);
        let mut last = 0;
        for _ in 0..4 {
            let id = streams.generate_id().unwrap();
            assert_eq!(id % 2, 1);
            assert!(id > last);
            last = id;
        }
    }

    /// UT test case for concurrency accounting.
    ///
    /// # Brief
    /// 1. Applies a maximum of 2 concurrent streams.
    /// 2. Counts two streams and checks the shared remaining gauge.
    /// 3. Resets one stream and checks that its slot is restored exactly
    ///    once.
    #[test]
    fn ut_streams_concurrency_accounting() {
        let remaining = Arc::new(AtomicI64::new(0));
        let mut streams = Streams::new(
            100,
            100,
            1 << 30,
            remaining.clone(),
            FlowControl::new(100, 100),
        );
        streams.apply_max_concurrent_streams(2);
        assert_eq!(remaining.load(AtomicOrdering::Relaxed), 2);

        streams.stream_map.insert(1, stream_new(H2StreamState::Idle));
        streams.stream_map.insert(3, stream_new(H2StreamState::Idle));
        streams.count_stream(1);
        streams.count_stream(3);
        assert!(streams.reach_max_concurrency());
        assert_eq!(remaining.load(AtomicOrdering::Relaxed), 0);

        assert_eq!(streams.send_local_reset(1), StreamEndState::OK);
        assert_eq!(remaining.load(AtomicOrdering::Relaxed), 1);
        // A second reset of the same stream must not restore the slot
        // again.
        assert_eq!(streams.send_local_reset(1), StreamEndState::Ignore);
        assert_eq!(remaining.load(AtomicOrdering::Relaxed), 1);
    }

    /// UT test case for `Streams::apply_send_initial_window_size` and
    /// `Streams::apply_recv_initial_window_size`.
    ///
    /// # Brief
    /// 1. Adjusts the initial send and recv window sizes.
    /// 2. Checks the per-stream window sizes afterwards.
    #[test]
    fn ut_streams_apply_initial_window_size() {
        let mut streams = streams(100, 100);
        streams.stream_map.insert(1, stream_new(H2StreamState::Idle));

        assert!(streams.apply_send_initial_window_size(200).is_ok());
        let stream = streams.stream_map.get(&1).unwrap();
        assert_eq!(stream.send_window.size_available(), 200);

        assert!(streams.apply_send_initial_window_size(50).is_ok());
        let stream = streams.stream_map.get(&1).unwrap();
        assert_eq!(stream.send_window.size_available(), 50);

        streams.apply_recv_initial_window_size(200);
        let stream = streams.stream_map.get(&1).unwrap();
        assert_eq!(stream.recv_window.notification_available(), 200);

        streams.apply_recv_initial_window_size(50);
        let stream = streams.stream_map.get(&1).unwrap();
        assert_eq!(stream.recv_window.notification_available(), 50);
    }

    /// UT test case for `Streams::record_recv_data`.
    ///
    /// # Brief
    /// 1. Declares a content length and feeds matching data.
    /// 2. Feeds data exceeding the body limit without END_STREAM.
    /// 3. Feeds an END_STREAM short of the declared length.
    /// 4. Checks each produced error.
    #[test]
    fn ut_streams_record_recv_data() {
        let mut streams = Streams::new(
            100,
            100,
            10,
            Arc::new(AtomicI64::new(0)),
            FlowControl::new(100, 100),
        );
        streams.stream_map.insert(1, stream_new(H2StreamState::Idle));
        streams.set_expected_length(1, 8);
        assert!(streams.record_recv_data(1, 4, false).is_ok());
        assert!(streams.record_recv_data(1, 4, true).is_ok());

        streams.stream_map.insert(3, stream_new(H2StreamState::Idle));
        assert_eq!(
            streams.record_recv_data(3, 11, false),
            Err(H2Error::StreamError(3, ErrorCode::Cancel))
        );

        streams.stream_map.insert(5, stream_new(H2StreamState::Idle));
        streams.set_expected_length(5, 8);
        assert_eq!(
            streams.record_recv_data(5, 4, true),
            Err(H2Error::StreamError(5, ErrorCode::ProtocolError))
        );
    }

    /// UT test case for `Streams::get_goaway_streams`.
    ///
    /// # Brief
    /// 1. Inserts streams with different states and receives a goaway with
    ///    a last stream id.
    /// 2. Checks that only unclosed streams above the last id are closed
    ///    and returned.
    #[test]
    fn ut_streams_get_goaway_streams() {
        let mut streams = streams(100, 100);
        streams.stream_map.insert(1, stream_new(H2StreamState::Idle));
        streams.stream_map.insert(
            3,
            stream_new(H2StreamState::Open {
                send: ActiveState::WaitHeaders,
                recv: ActiveState::WaitData,
            }),
        );
        streams
            .stream_map
            .insert(5, stream_new(H2StreamState::Closed(CloseReason::EndStream)));

        let goaway_streams = streams.get_goaway_streams(1);
        assert_eq!(goaway_streams, [3]);
        assert_eq!(
            streams.stream_state(3).unwrap(),
            H2StreamState::Closed(CloseReason::RemoteGoAway)
        );
        assert_eq!(streams.stream_state(1).unwrap(), H2StreamState::Idle);
    }

    /// UT test case for `Streams::max_open_stream_id`.
    ///
    /// # Brief
    /// 1. Checks the id on an empty table.
    /// 2. Inserts open and closed streams and checks the maximum open id.
    #[test]
    fn ut_streams_max_open_stream_id() {
        let mut streams = streams(100, 100);
        assert_eq!(streams.max_open_stream_id(), 0);
        streams.stream_map.insert(1, stream_new(H2StreamState::Idle));
        streams
            .stream_map
            .insert(3, stream_new(H2StreamState::LocalHalfClosed(ActiveState::WaitData)));
        streams
            .stream_map
            .insert(5, stream_new(H2StreamState::Closed(CloseReason::EndStream)));
        assert_eq!(streams.max_open_stream_id(), 3);
    }

    /// UT test case for `Streams::send_headers_frame` and
    /// `Streams::send_data_frame`.
    ///
    /// # Brief
    /// 1. Sends a headers frame and a data frame on a stream.
    /// 2. Checks the state transitions of the sending side.
    #[test]
    fn ut_streams_send_frames() {
        let mut streams = streams(100, 100);
        streams.stream_map.insert(1, stream_new(H2StreamState::Idle));
        assert_eq!(streams.send_headers_frame(1, false), FrameRecvState::OK);
        assert_eq!(
            streams.stream_state(1).unwrap(),
            H2StreamState::Open {
                send: ActiveState::WaitData,
                recv: ActiveState::WaitHeaders,
            }
        );
        assert_eq!(streams.send_data_frame(1, true), FrameRecvState::OK);
        assert_eq!(
            streams.stream_state(1).unwrap(),
            H2StreamState::LocalHalfClosed(ActiveState::WaitHeaders)
        );

        let mut streams = streams_with_eos_headers();
        assert_eq!(streams.send_headers_frame(1, true), FrameRecvState::OK);
        assert_eq!(
            streams.stream_state(1).unwrap(),
            H2StreamState::LocalHalfClosed(ActiveState::WaitHeaders)
        );
        let res = streams.send_headers_frame(1, true);
        assert_eq!(
            res,
            FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError))
        );
    }

    fn streams_with_eos_headers() -> Streams {
        let mut streams = streams(100, 100);
        streams.stream_map.insert(1, stream_new(H2StreamState::Idle));
        streams
    }

    /// UT test case for `Streams::recv_headers` and `Streams::recv_data`.
    ///
    /// # Brief
    /// 1. Receives headers and data on a stream.
    /// 2. Receives a second response head on the same stream.
    /// 3. Receives data after END_STREAM.
    /// 4. Checks the error level of every transition.
    #[test]
    fn ut_streams_recv_frames() {
        let mut streams = streams(100, 100);
        streams.stream_map.insert(
            1,
            stream_new(H2StreamState::LocalHalfClosed(ActiveState::WaitHeaders)),
        );
        assert_eq!(streams.recv_headers(1, false), FrameRecvState::OK);
        assert_eq!(
            streams.stream_state(1).unwrap(),
            H2StreamState::LocalHalfClosed(ActiveState::WaitData)
        );

        // A duplicate response head is a stream-level protocol error.
        assert_eq!(
            streams.recv_headers(1, false),
            FrameRecvState::Err(H2Error::StreamError(1, ErrorCode::ProtocolError))
        );

        assert_eq!(streams.recv_data(1, true), FrameRecvState::OK);
        assert_eq!(
            streams.stream_state(1).unwrap(),
            H2StreamState::Closed(CloseReason::EndStream)
        );

        // Data on a closed stream is a stream-level STREAM_CLOSED error.
        assert_eq!(
            streams.recv_data(1, false),
            FrameRecvState::Err(H2Error::StreamError(1, ErrorCode::StreamClosed))
        );

        // Data on an unknown stream is a connection-level protocol error.
        assert_eq!(
            streams.recv_data(9, false),
            FrameRecvState::Err(H2Error::ConnectionError(ErrorCode::ProtocolError))
        );
    }

    /// UT test case for `Streams::recv_remote_reset`.
    ///
    /// # Brief
    /// 1. Receives a remote reset on an open stream and again on the same
    ///    stream.
    /// 2. Checks the results.
    #[test]
    fn ut_streams_recv_remote_reset() {
        let mut streams = streams(100, 100);
        streams.stream_map.insert(
            1,
            stream_new(H2StreamState::Open {
                send: ActiveState::WaitData,
                recv: ActiveState::WaitHeaders,
            }),
        );
        assert_eq!(streams.recv_remote_reset(1), StreamEndState::OK);
        assert_eq!(
            streams.stream_state(1).unwrap(),
            H2StreamState::Closed(CloseReason::RemoteRst)
        );
        assert_eq!(streams.recv_remote_reset(1), StreamEndState::Ignore);
    }
}
