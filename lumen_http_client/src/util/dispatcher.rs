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

//! HTTP2-based connection dispatcher. The dispatcher owns the connection
//! tasks and hands out per-request handles.

pub(crate) mod http2 {
    use std::collections::HashMap;
    use std::future::Future;
    use std::marker::PhantomData;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};

    use lumen_http::error::HttpError;
    use lumen_http::h2::{
        ErrorCode, Frame, FrameDecoder, FrameEncoder, FrameFlags, H2Error, Payload, Settings,
        SettingsBuilder,
    };

    use crate::runtime::{
        bounded_channel, split, unbounded_channel, AsyncRead, AsyncWrite, AsyncWriteExt,
        BoundedReceiver, BoundedSender, SendError, UnboundedSender, WriteHalf,
    };
    use crate::util::config::H2Config;
    use crate::util::h2::{
        ConnManager, FlowControl, RecvData, RequestWrapper, SendData, StreamController, Streams,
    };
    use crate::util::information::ConnDetail;
    use crate::{ErrorKind, HttpClientError};

    const DEFAULT_MAX_FRAME_SIZE: usize = 2 << 13;
    const DEFAULT_WINDOW_SIZE: u32 = 65535;

    pub(crate) type ManagerSendFut =
        Pin<Box<dyn Future<Output = Result<(), SendError<RespMessage>>> + Send>>;

    pub(crate) type OnCloseList = Arc<Mutex<Option<Vec<Box<dyn FnOnce() + Send + 'static>>>>>;

    pub(crate) enum RespMessage {
        Output(Frame),
        OutputExit(DispatchErrorKind),
    }

    pub(crate) enum OutputMessage {
        Output(Frame),
        OutputExit(DispatchErrorKind),
    }

    pub(crate) enum ReqMessage {
        Request(RequestTask),
        Cancel(u64),
        Close,
    }

    pub(crate) struct RequestTask {
        pub(crate) token: u64,
        pub(crate) sender: BoundedSender<RespMessage>,
        pub(crate) request: RequestWrapper,
    }

    #[derive(Debug, Eq, PartialEq, Copy, Clone)]
    pub(crate) enum DispatchErrorKind {
        H2(H2Error),
        Io(std::io::ErrorKind),
        ChannelClosed,
        Disconnect,
    }

    // HTTP2-based connection dispatcher, which owns the reader, writer and
    // manager tasks of one connection and dispatches per-request handles.
    pub(crate) struct Http2Dispatcher<S> {
        pub(crate) detail: ConnDetail,
        pub(crate) allowed_cache: usize,
        pub(crate) sender: UnboundedSender<ReqMessage>,
        pub(crate) next_token: Arc<AtomicU64>,
        pub(crate) remaining_streams: Arc<AtomicI64>,
        pub(crate) io_shutdown: Arc<AtomicBool>,
        pub(crate) on_close: OnCloseList,
        pub(crate) handles: Mutex<Vec<crate::runtime::JoinHandle<()>>>,
        pub(crate) _mark: PhantomData<S>,
    }

    pub(crate) struct Http2Conn<S> {
        pub(crate) token: u64,
        pub(crate) allow_cached_frames: usize,
        // Sends frames to the stream controller.
        pub(crate) sender: UnboundedSender<ReqMessage>,
        pub(crate) receiver: RespReceiver,
        pub(crate) _mark: PhantomData<S>,
    }

    #[derive(Default)]
    pub(crate) struct SettingsSync {
        pub(crate) settings: SettingsState,
    }

    #[derive(Default, Clone)]
    pub(crate) enum SettingsState {
        Acknowledging(Settings),
        #[default]
        Synced,
    }

    #[derive(Default)]
    pub(crate) struct RespReceiver {
        receiver: Option<BoundedReceiver<RespMessage>>,
    }

    impl<S> Http2Dispatcher<S>
    where
        S: AsyncRead + AsyncWrite + Sync + Send + Unpin + 'static,
    {
        pub(crate) fn new(detail: ConnDetail, config: H2Config, io: S) -> Self {
            let mut flow = FlowControl::new(DEFAULT_WINDOW_SIZE, DEFAULT_WINDOW_SIZE);
            flow.setup_recv_window(config.conn_window_size());

            let remaining_streams = Arc::new(AtomicI64::new(0));
            let streams = Streams::new(
                config.stream_window_size(),
                DEFAULT_WINDOW_SIZE,
                config.max_body_size(),
                remaining_streams.clone(),
                flow,
            );
            let shutdown_flag = Arc::new(AtomicBool::new(false));
            let on_close: OnCloseList = Arc::new(Mutex::new(Some(Vec::new())));
            let mut controller =
                StreamController::new(streams, shutdown_flag.clone(), on_close.clone());

            let (input_tx, input_rx) = unbounded_channel();
            let (req_tx, req_rx) = unbounded_channel();

            let settings = create_initial_settings(&config);

            let mut handles = Vec::with_capacity(3);
            // Sends the initial SETTINGS frame and replenishes the
            // connection receive window before the first request.
            if input_tx.send(settings).is_ok()
                && controller
                    .streams
                    .release_conn_recv_window(0, &input_tx)
                    .is_ok()
            {
                Self::launch(
                    config.allowed_cache_frame_size(),
                    controller,
                    (input_tx, input_rx),
                    req_rx,
                    &mut handles,
                    io,
                );
            }
            Self {
                detail,
                allowed_cache: config.allowed_cache_frame_size(),
                sender: req_tx,
                next_token: Arc::new(AtomicU64::new(1)),
                remaining_streams,
                io_shutdown: shutdown_flag,
                on_close,
                handles: Mutex::new(handles),
                _mark: PhantomData,
            }
        }

        fn launch(
            allow_num: usize,
            controller: StreamController,
            input_channel: (UnboundedSender<Frame>, crate::runtime::UnboundedReceiver<Frame>),
            req_rx: crate::runtime::UnboundedReceiver<ReqMessage>,
            handles: &mut Vec<crate::runtime::JoinHandle<()>>,
            io: S,
        ) {
            let (resp_tx, resp_rx) = bounded_channel(allow_num);
            let (read, write) = split(io);
            let settings_sync = Arc::new(Mutex::new(SettingsSync::default()));
            let send_settings_sync = settings_sync.clone();
            let send = crate::runtime::spawn(async move {
                let mut writer = write;
                if async_send_preface(&mut writer).await.is_ok() {
                    let encoder = FrameEncoder::new(DEFAULT_MAX_FRAME_SIZE);
                    let mut send =
                        SendData::new(encoder, send_settings_sync, writer, input_channel.1);
                    let _ = Pin::new(&mut send).await;
                }
            });
            handles.push(send);

            let recv_settings_sync = settings_sync.clone();
            let recv = crate::runtime::spawn(async move {
                let decoder = FrameDecoder::new();
                let mut recv = RecvData::new(decoder, recv_settings_sync, read, resp_tx);
                let _ = Pin::new(&mut recv).await;
            });
            handles.push(recv);

            let manager = crate::runtime::spawn(async move {
                let mut conn_manager =
                    ConnManager::new(settings_sync, input_channel.0, resp_rx, req_rx, controller);
                let _ = Pin::new(&mut conn_manager).await;
                conn_manager.exit_cleanup();
            });
            handles.push(manager);
        }

        pub(crate) fn dispatch(&self) -> Http2Conn<S> {
            let token = self.next_token.fetch_add(1, Ordering::Relaxed);
            Http2Conn::new(token, self.allowed_cache, self.sender.clone())
        }

        pub(crate) fn is_shutdown(&self) -> bool {
            self.io_shutdown.load(Ordering::Relaxed)
        }

        pub(crate) fn is_busy(&self) -> bool {
            self.remaining_streams.load(Ordering::Relaxed) <= 0 || self.is_shutdown()
        }

        pub(crate) fn on_close<F>(&self, callback: F)
        where
            F: FnOnce() + Send + 'static,
        {
            let mut list = self.on_close.lock().unwrap();
            match list.as_mut() {
                Some(callbacks) => callbacks.push(Box::new(callback)),
                // The connection is already closed, the callback fires
                // immediately.
                None => {
                    drop(list);
                    callback()
                }
            }
        }

        // Performs a graceful shutdown: the manager sends GOAWAY, fails the
        // remaining streams and exits; the writer drains its queue before
        // shutting the transport down.
        pub(crate) async fn close(&self) {
            let _ = self.sender.send(ReqMessage::Close);
            let handles: Vec<_> = { self.handles.lock().unwrap().drain(..).collect() };
            if handles.is_empty() {
                return;
            }
            let mut iter = handles.into_iter();
            let send = iter.next();
            let recv = iter.next();
            let manager = iter.next();
            if let Some(manager) = manager {
                let _ = manager.await;
            }
            if let Some(send) = send {
                let _ = send.await;
            }
            if let Some(recv) = recv {
                recv.abort();
            }
        }
    }

    impl<S> Drop for Http2Dispatcher<S> {
        fn drop(&mut self) {
            for handle in self.handles.lock().unwrap().iter() {
                handle.abort();
            }
        }
    }

    impl<S> Http2Conn<S> {
        pub(crate) fn new(
            token: u64,
            allow_cached_num: usize,
            sender: UnboundedSender<ReqMessage>,
        ) -> Self {
            Self {
                token,
                allow_cached_frames: allow_cached_num,
                sender,
                receiver: RespReceiver::default(),
                _mark: PhantomData,
            }
        }

        pub(crate) fn send_frame_to_controller(
            &mut self,
            request: RequestWrapper,
        ) -> Result<(), HttpClientError> {
            let (tx, rx) = bounded_channel::<RespMessage>(self.allow_cached_frames);
            self.receiver.set_receiver(rx);
            self.sender
                .send(ReqMessage::Request(RequestTask {
                    token: self.token,
                    sender: tx,
                    request,
                }))
                .map_err(|_| {
                    HttpClientError::from_str(ErrorKind::Request, "Request Sender Closed !")
                })
        }

    }

    impl RespReceiver {
        pub(crate) fn set_receiver(&mut self, receiver: BoundedReceiver<RespMessage>) {
            self.receiver = Some(receiver);
        }

        pub(crate) async fn recv(&mut self) -> Result<Frame, HttpClientError> {
            match self.receiver {
                Some(ref mut receiver) => match receiver.recv().await {
                    None => err_from_msg!(Request, "Response Sender Closed !"),
                    Some(message) => match message {
                        RespMessage::Output(frame) => Ok(frame),
                        RespMessage::OutputExit(e) => Err(dispatch_client_error(e)),
                    },
                },
                // this will not happen.
                None => Err(HttpClientError::from_str(
                    ErrorKind::Request,
                    "Invalid Frame Receiver !",
                )),
            }
        }

        pub(crate) fn poll_recv(
            &mut self,
            cx: &mut Context<'_>,
        ) -> Poll<Result<Frame, HttpClientError>> {
            if let Some(ref mut receiver) = self.receiver {
                match receiver.poll_recv(cx) {
                    Poll::Ready(None) => {
                        Poll::Ready(err_from_msg!(Request, "Response Sender Closed !"))
                    }
                    Poll::Ready(Some(message)) => match message {
                        RespMessage::Output(frame) => Poll::Ready(Ok(frame)),
                        RespMessage::OutputExit(e) => Poll::Ready(Err(dispatch_client_error(e))),
                    },
                    Poll::Pending => Poll::Pending,
                }
            } else {
                Poll::Ready(err_from_msg!(Request, "Invalid Frame Receiver !"))
            }
        }
    }

    async fn async_send_preface<S>(writer: &mut WriteHalf<S>) -> Result<(), DispatchErrorKind>
    where
        S: AsyncWrite + Unpin,
    {
        const PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";
        writer
            .write_all(PREFACE)
            .await
            .map_err(|e| DispatchErrorKind::Io(e.kind()))
    }

    pub(crate) fn create_initial_settings(config: &H2Config) -> Frame {
        let settings = SettingsBuilder::new()
            .header_table_size(config.header_table_size())
            .enable_push(false)
            .max_concurrent_streams(config.max_concurrent_streams())
            .initial_window_size(config.stream_window_size())
            .max_frame_size(config.max_frame_size())
            .max_header_list_size(config.max_header_list_size())
            .build();

        Frame::new(0, FrameFlags::new(0), Payload::Settings(settings))
    }

    impl From<std::io::Error> for DispatchErrorKind {
        fn from(value: std::io::Error) -> Self {
            DispatchErrorKind::Io(value.kind())
        }
    }

    impl From<H2Error> for DispatchErrorKind {
        fn from(err: H2Error) -> Self {
            DispatchErrorKind::H2(err)
        }
    }

    pub(crate) fn dispatch_client_error(dispatch_error: DispatchErrorKind) -> HttpClientError {
        match dispatch_error {
            DispatchErrorKind::H2(H2Error::StreamError(_, ErrorCode::Cancel)) => {
                HttpClientError::user_aborted()
            }
            DispatchErrorKind::H2(e) => {
                HttpClientError::from_error(ErrorKind::Request, HttpError::from(e))
            }
            DispatchErrorKind::Io(e) => {
                HttpClientError::from_io_error(ErrorKind::Request, std::io::Error::from(e))
            }
            DispatchErrorKind::ChannelClosed => {
                HttpClientError::from_str(ErrorKind::Request, "Coroutine channel closed.")
            }
            DispatchErrorKind::Disconnect => {
                HttpClientError::from_str(ErrorKind::Request, "remote peer closed.")
            }
        }
    }
}
