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

use std::mem::take;

use crate::h2::error::ErrorCode;
use crate::h2::frame::{
    Data, Frame, FrameFlags, Goaway, Ping, Priority, RstStream, WindowUpdate, END_HEADERS_MASK,
    HEADERS_PRIORITY_MASK, PADDED_MASK,
};
use crate::h2::frame::{Setting, Settings, StreamId};
use crate::h2::{frame, H2Error, Parts};
use crate::headers::{is_legal_name, Headers};
use crate::pseudo::PseudoHeaders;

const FRAME_HEADER_LENGTH: usize = 9;
const DEFAULT_MAX_FRAME_SIZE: u32 = 2 << 13;
const MAX_ALLOWED_MAX_FRAME_SIZE: u32 = (2 << 23) - 1;
const DEFAULT_MAX_HEADER_BLOCK_SIZE: usize = 1 << 20;
const MAX_INITIAL_WINDOW_SIZE: u64 = (1 << 31) - 1;
// A SETTINGS payload is limited to ten 6-byte entries.
const MAX_SETTINGS_PAYLOAD_LENGTH: usize = 60;

/// A set of consecutive decode results produced by one `decode` call.
///
/// A HEADERS or CONTINUATION frame whose header block is not yet complete is
/// represented as [`FrameKind::Partial`]. A stream-scoped protocol fault is
/// represented as [`FrameKind::StreamFault`]; the offending payload has been
/// consumed, so the byte stream stays aligned and decoding can continue.
///
/// # Examples
///
/// ```
/// use lumen_http::h2::FrameDecoder;
///
/// let mut decoder = FrameDecoder::new();
/// let data_frame_bytes = &[0, 0, 5, 0, 0, 0, 0, 0, 1, b'h', b'e', b'l', b'l', b'o'];
/// let decoded_frames = decoder.decode(data_frame_bytes).unwrap();
/// assert_eq!(decoded_frames.len(), 1);
/// ```
pub struct Frames {
    list: Vec<FrameKind>,
}

/// An iterator of `Frames`.
pub struct FramesIter<'a> {
    iter: core::slice::Iter<'a, FrameKind>,
}

/// A consuming iterator of `Frames`.
pub struct FramesIntoIter {
    into_iter: std::vec::IntoIter<FrameKind>,
}

/// One decode result.
pub enum FrameKind {
    /// A frame was decoded completely.
    Complete(Frame),
    /// Part of a header block was consumed; more CONTINUATION frames are
    /// expected.
    Partial,
    /// A stream-scoped fault. The payload has been consumed; the caller
    /// should reset the stream and keep the connection alive.
    StreamFault(H2Error),
}

impl Frames {
    fn new() -> Self {
        Frames { list: vec![] }
    }

    fn push(&mut self, kind: FrameKind) {
        self.list.push(kind)
    }

    /// Returns an iterator over `Frames`.
    pub fn iter(&self) -> FramesIter<'_> {
        FramesIter {
            iter: self.list.iter(),
        }
    }

    /// Returns the size of `Frames`.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Checks if the `Frames` is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> Iterator for FramesIter<'a> {
    type Item = &'a FrameKind;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

impl Iterator for FramesIntoIter {
    type Item = FrameKind;

    fn next(&mut self) -> Option<Self::Item> {
        self.into_iter.next()
    }
}

impl IntoIterator for Frames {
    type Item = FrameKind;
    type IntoIter = FramesIntoIter;

    fn into_iter(self) -> Self::IntoIter {
        FramesIntoIter {
            into_iter: self.list.into_iter(),
        }
    }
}

/// Frame bytes sequence decoder, supporting fragment deserialization of
/// frames.
///
/// The decoder is a pull state machine over byte chunks: callers feed it
/// whatever the transport produced and receive zero or more complete decode
/// results per call.
///
/// # Examples
///
/// ```
/// use lumen_http::h2::FrameDecoder;
///
/// let mut decoder = FrameDecoder::new();
/// let data_frame_bytes = &[0, 0, 5, 0, 0, 0, 0, 0, 1, b'h', b'e', b'l', b'l', b'o'];
/// let decoded_frames = decoder.decode(&data_frame_bytes[..9]).unwrap();
/// assert_eq!(decoded_frames.len(), 0);
/// let decoded_frames = decoder.decode(&data_frame_bytes[9..]).unwrap();
/// assert_eq!(decoded_frames.len(), 1);
/// ```
pub struct FrameDecoder {
    buffer: Vec<u8>,
    // Number of bytes of the current frame already moved into `buffer`.
    offset: usize,
    max_frame_size: u32,
    max_header_block_size: usize,
    stage: Stage,
    // 9-byte header information of the current frame.
    header: FrameHeader,
    hpack: HpackDecoderLayer,
    // The HEADERS frame information is saved to ensure the continuity
    // between HEADERS frames and CONTINUATION frames.
    continuations: Continuations,
}

enum Stage {
    Header,
    Payload,
}

struct HpackDecoderLayer {
    hpack: hpack::Decoder<'static>,
}

#[derive(Default)]
struct FrameHeader {
    stream_id: StreamId,
    flags: u8,
    frame_type: u8,
    payload_length: usize,
}

struct Continuations {
    flags: u8,
    stream_id: StreamId,
    // `true` means no header block is in progress.
    is_end_headers: bool,
    block: Vec<u8>,
    fault: Option<H2Error>,
}

impl HpackDecoderLayer {
    fn new() -> Self {
        Self {
            hpack: hpack::Decoder::new(),
        }
    }

    // Decodes a complete header block and validates the decoded pairs:
    // field names must be legal lowercase tokens, pseudo-header fields must
    // precede regular fields, appear at most once each, and only `:status`
    // is defined on responses.
    fn decode_block(&mut self, block: &[u8]) -> Result<Parts, H2Error> {
        let decoded = self
            .hpack
            .decode(block)
            .map_err(|_| H2Error::ConnectionError(ErrorCode::CompressionError))?;

        let mut pseudo = PseudoHeaders::new();
        let mut map = Headers::new();
        let mut regular_seen = false;
        for (name, value) in decoded.iter() {
            if let Some(stripped) = name.strip_prefix(b":") {
                if regular_seen {
                    return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
                if stripped != &b"status"[..] || pseudo.contains_status() {
                    return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
                let status = String::from_utf8(value.clone())
                    .map_err(|_| H2Error::ConnectionError(ErrorCode::ProtocolError))?;
                pseudo.set_status(Some(status));
            } else {
                regular_seen = true;
                if !is_legal_name(name) {
                    return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
                map.append(name.as_slice(), value.as_slice())
                    .map_err(|_| H2Error::ConnectionError(ErrorCode::ProtocolError))?;
            }
        }
        let mut parts = Parts::new();
        parts.set_pseudo(pseudo);
        parts.set_header_lines(map);
        Ok(parts)
    }
}

impl FrameHeader {
    fn reset(&mut self) {
        self.stream_id = 0;
        self.flags = 0;
        self.frame_type = 0;
        self.payload_length = 0
    }

    fn is_padded(&self) -> bool {
        PADDED_MASK & self.flags == PADDED_MASK
    }

    fn is_end_headers(&self) -> bool {
        END_HEADERS_MASK & self.flags == END_HEADERS_MASK
    }

    fn is_headers_priority(&self) -> bool {
        HEADERS_PRIORITY_MASK & self.flags == HEADERS_PRIORITY_MASK
    }

    fn is_ack(&self) -> bool {
        frame::ACK_MASK & self.flags == frame::ACK_MASK
    }
}

impl Continuations {
    fn new() -> Self {
        Continuations {
            flags: 0,
            stream_id: 0,
            is_end_headers: true,
            block: Vec::new(),
            fault: None,
        }
    }

    fn reset(&mut self) {
        self.flags = 0;
        self.stream_id = 0;
        self.is_end_headers = true;
        self.block.clear();
        self.fault = None;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        FrameDecoder {
            buffer: vec![],
            offset: 0,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_header_block_size: DEFAULT_MAX_HEADER_BLOCK_SIZE,
            stage: Stage::Header,
            header: FrameHeader::default(),
            hpack: HpackDecoderLayer::new(),
            continuations: Continuations::new(),
        }
    }
}

impl FrameDecoder {
    /// `FrameDecoder` constructor.
    pub fn new() -> Self {
        FrameDecoder::default()
    }

    /// Updates the SETTINGS_MAX_FRAME_SIZE used for inbound length checks.
    pub fn set_max_frame_size(&mut self, size: u32) -> Result<(), H2Error> {
        if !(DEFAULT_MAX_FRAME_SIZE..=MAX_ALLOWED_MAX_FRAME_SIZE).contains(&size) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        self.max_frame_size = size;
        Ok(())
    }

    /// Updates the maximum accepted header block size. A block larger than
    /// this limit yields a stream fault with `ENHANCE_YOUR_CALM`.
    pub fn set_max_header_block_size(&mut self, size: usize) {
        self.max_header_block_size = size;
    }

    /// Frames deserialization interface, supporting segmented decode.
    pub fn decode(&mut self, buf: &[u8]) -> Result<Frames, H2Error> {
        let mut frames = Frames::new();
        let mut buffer = buf;
        loop {
            match self.stage {
                Stage::Header => match self.decode_frame_header(buffer)? {
                    Some(remain) => {
                        buffer = remain;
                        self.stage = Stage::Payload;
                    }
                    None => break,
                },
                Stage::Payload => match self.decode_frame_payload(buffer)? {
                    Some((remain, frame)) => {
                        if let Some(kind) = frame {
                            frames.push(kind);
                        }
                        buffer = remain;
                        self.stage = Stage::Header;
                    }
                    None => break,
                },
            }
        }
        Ok(frames)
    }

    fn decode_frame_header<'a>(&mut self, buf: &'a [u8]) -> Result<Option<&'a [u8]>, H2Error> {
        let payload_pos = FRAME_HEADER_LENGTH - self.offset;
        if buf.len() < payload_pos {
            self.offset += buf.len();
            self.buffer.extend_from_slice(buf);
            return Ok(None);
        }
        let joined;
        let header_buffer = if self.offset == 0 {
            buf
        } else {
            let mut bytes = take(&mut self.buffer);
            bytes.extend_from_slice(&buf[..payload_pos]);
            self.offset = 0;
            joined = bytes;
            joined.as_slice()
        };
        let payload_length = ((header_buffer[0] as usize) << 16)
            + ((header_buffer[1] as usize) << 8)
            + (header_buffer[2] as usize);
        if payload_length > self.max_frame_size as usize {
            return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
        }
        self.header = FrameHeader {
            stream_id: get_stream_id(&header_buffer[5..9]),
            flags: header_buffer[4],
            frame_type: header_buffer[3],
            payload_length,
        };
        Ok(Some(&buf[payload_pos..]))
    }

    #[allow(clippy::type_complexity)]
    fn decode_frame_payload<'a>(
        &mut self,
        buf: &'a [u8],
    ) -> Result<Option<(&'a [u8], Option<FrameKind>)>, H2Error> {
        // Frames of other types or streams are not allowed between a HEADERS
        // frame and its CONTINUATION frames.
        if !self.continuations.is_end_headers
            && (self.header.stream_id != self.continuations.stream_id
                || self.header.frame_type != 9)
        {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }

        let frame_end_index = self.header.payload_length - self.offset;
        if buf.len() < frame_end_index {
            self.offset += buf.len();
            self.buffer.extend_from_slice(buf);
            return Ok(None);
        }
        let joined;
        let payload = if self.offset == 0 {
            &buf[..frame_end_index]
        } else {
            let mut bytes = take(&mut self.buffer);
            bytes.extend_from_slice(&buf[..frame_end_index]);
            self.offset = 0;
            joined = bytes;
            joined.as_slice()
        };
        let frame = self.decode_typed_payload(payload)?;
        self.header.reset();
        Ok(Some((&buf[frame_end_index..], frame)))
    }

    fn decode_typed_payload(&mut self, payload: &[u8]) -> Result<Option<FrameKind>, H2Error> {
        match self.header.frame_type {
            0 => self.decode_data_payload(payload).map(Some),
            1 => self.decode_headers_payload(payload).map(Some),
            2 => self.decode_priority_payload(payload).map(Some),
            3 => self.decode_reset_payload(payload).map(Some),
            4 => self.decode_settings_payload(payload).map(Some),
            // ENABLE_PUSH is advertised as 0, any PUSH_PROMISE receipt is a
            // connection error regardless of its contents.
            5 => Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
            6 => self.decode_ping_payload(payload).map(Some),
            7 => self.decode_goaway_payload(payload).map(Some),
            8 => self.decode_window_update_payload(payload).map(Some),
            9 => self.decode_continuation_payload(payload).map(Some),
            // Unknown frame types are consumed and discarded.
            _ => Ok(None),
        }
    }

    fn decode_data_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        if is_connection_frame(self.header.stream_id) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        let data = if self.header.is_padded() {
            if payload.is_empty() {
                return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
            }
            let padded_length = payload[0] as usize;
            if self.header.payload_length <= padded_length {
                return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
            }
            payload[1..self.header.payload_length - padded_length].to_vec()
        } else {
            payload.to_vec()
        };
        Ok(FrameKind::Complete(Frame::new(
            self.header.stream_id,
            FrameFlags::new(self.header.flags),
            frame::Payload::Data(Data::new(data)),
        )))
    }

    fn decode_headers_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        if is_connection_frame(self.header.stream_id) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        let mut fragment_start_index = 0;
        let mut fragment_end_index = self.header.payload_length;
        if self.header.is_padded() {
            if payload.is_empty() {
                return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
            }
            let padded_length = payload[0] as usize;
            if self.header.payload_length <= padded_length {
                return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
            }
            fragment_start_index += 1;
            fragment_end_index -= padded_length;
        }
        let mut fault = None;
        if self.header.is_headers_priority() {
            if fragment_end_index - fragment_start_index < 5 {
                return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
            }
            let dependency = get_stream_id(&payload[fragment_start_index..fragment_start_index + 4]);
            if dependency == self.header.stream_id {
                fault = Some(H2Error::StreamError(
                    self.header.stream_id,
                    ErrorCode::ProtocolError,
                ));
            }
            fragment_start_index += 5;
        }
        if fragment_start_index > fragment_end_index {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }

        self.continuations.stream_id = self.header.stream_id;
        self.continuations.flags = self.header.flags;
        self.continuations.fault = fault;
        self.continuations.is_end_headers = self.header.is_end_headers();
        self.accumulate_block(&payload[fragment_start_index..fragment_end_index]);
        if self.header.is_end_headers() {
            self.finish_header_block()
        } else {
            self.continuations.is_end_headers = false;
            Ok(FrameKind::Partial)
        }
    }

    fn decode_continuation_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        if is_connection_frame(self.header.stream_id) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        // CONTINUATION is only permitted immediately after a HEADERS frame
        // on the same stream.
        if self.continuations.is_end_headers {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        self.accumulate_block(payload);
        if self.header.is_end_headers() {
            self.continuations.is_end_headers = true;
            self.finish_header_block()
        } else {
            Ok(FrameKind::Partial)
        }
    }

    fn accumulate_block(&mut self, fragment: &[u8]) {
        self.continuations.block.extend_from_slice(fragment);
        if self.continuations.block.len() > self.max_header_block_size
            && self.continuations.fault.is_none()
        {
            self.continuations.fault = Some(H2Error::StreamError(
                self.continuations.stream_id,
                ErrorCode::EnhanceYourCalm,
            ));
        }
    }

    fn finish_header_block(&mut self) -> Result<FrameKind, H2Error> {
        let block = take(&mut self.continuations.block);
        let id = self.continuations.stream_id;
        let flags = self.continuations.flags;
        let fault = self.continuations.fault.take();
        self.continuations.reset();
        // The block is decoded even when faulted so that the dynamic table
        // of the compression context stays synchronized.
        let parts = self.hpack.decode_block(&block)?;
        if let Some(e) = fault {
            return Ok(FrameKind::StreamFault(e));
        }
        Ok(FrameKind::Complete(Frame::new(
            id,
            FrameFlags::new(flags),
            frame::Payload::Headers(frame::Headers::new(parts)),
        )))
    }

    fn decode_priority_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        const EXCLUSIVE_MASK: u8 = 0x80;

        if is_connection_frame(self.header.stream_id) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        if self.header.payload_length != 5 {
            return Ok(FrameKind::StreamFault(H2Error::StreamError(
                self.header.stream_id,
                ErrorCode::FrameSizeError,
            )));
        }
        let exclusive = payload[0] & EXCLUSIVE_MASK == EXCLUSIVE_MASK;
        let stream_dependency = get_stream_id(&payload[..4]);
        if stream_dependency == self.header.stream_id {
            return Ok(FrameKind::StreamFault(H2Error::StreamError(
                self.header.stream_id,
                ErrorCode::ProtocolError,
            )));
        }
        let weight = payload[4];
        Ok(FrameKind::Complete(Frame::new(
            self.header.stream_id,
            FrameFlags::new(self.header.flags),
            frame::Payload::Priority(Priority::new(exclusive, stream_dependency, weight)),
        )))
    }

    fn decode_reset_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        if is_connection_frame(self.header.stream_id) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        if self.header.payload_length != 4 {
            return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
        }
        let code = get_code_value(&payload[..4]);
        Ok(FrameKind::Complete(Frame::new(
            self.header.stream_id,
            FrameFlags::new(self.header.flags),
            frame::Payload::RstStream(RstStream::new(code)),
        )))
    }

    fn decode_settings_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        if !is_connection_frame(self.header.stream_id) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        if self.header.is_ack() {
            if self.header.payload_length != 0 {
                return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
            }
            return Ok(FrameKind::Complete(Frame::new(
                self.header.stream_id,
                FrameFlags::new(self.header.flags),
                frame::Payload::Settings(Settings::new(vec![])),
            )));
        }
        if self.header.payload_length % 6 != 0 {
            return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
        }
        if self.header.payload_length > MAX_SETTINGS_PAYLOAD_LENGTH {
            return Err(H2Error::ConnectionError(ErrorCode::EnhanceYourCalm));
        }
        let mut settings = vec![];
        for chunk in payload.chunks(6) {
            if let Some(setting) = split_token_to_setting(chunk)? {
                settings.push(setting);
            }
        }
        Ok(FrameKind::Complete(Frame::new(
            self.header.stream_id,
            FrameFlags::new(self.header.flags),
            frame::Payload::Settings(Settings::new(settings)),
        )))
    }

    fn decode_ping_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        if !is_connection_frame(self.header.stream_id) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        if self.header.payload_length != 8 {
            return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
        }
        let mut opaque_data = [0; 8];
        opaque_data.copy_from_slice(payload);
        Ok(FrameKind::Complete(Frame::new(
            self.header.stream_id,
            FrameFlags::new(self.header.flags),
            frame::Payload::Ping(Ping::new(opaque_data)),
        )))
    }

    fn decode_goaway_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        if !is_connection_frame(self.header.stream_id) {
            return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
        }
        if self.header.payload_length < 8 {
            return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
        }
        let last_stream_id = get_stream_id(&payload[..4]);
        let error_code = get_code_value(&payload[4..8]);
        Ok(FrameKind::Complete(Frame::new(
            self.header.stream_id,
            FrameFlags::new(self.header.flags),
            frame::Payload::Goaway(Goaway::new(error_code, last_stream_id, payload[8..].to_vec())),
        )))
    }

    // WINDOW_UPDATE applies to a stream or to the whole connection.
    fn decode_window_update_payload(&mut self, payload: &[u8]) -> Result<FrameKind, H2Error> {
        if self.header.payload_length != 4 {
            return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
        }
        let increment = get_stream_id(&payload[..4]);
        if increment == 0 {
            if is_connection_frame(self.header.stream_id) {
                return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
            }
            return Ok(FrameKind::StreamFault(H2Error::StreamError(
                self.header.stream_id,
                ErrorCode::ProtocolError,
            )));
        }
        Ok(FrameKind::Complete(Frame::new(
            self.header.stream_id,
            FrameFlags::new(self.header.flags),
            frame::Payload::WindowUpdate(WindowUpdate::new(increment)),
        )))
    }
}

fn is_connection_frame(id: StreamId) -> bool {
    id == 0
}

fn get_stream_id(token: &[u8]) -> StreamId {
    (((token[0] & 0x7f) as u32) << 24)
        | ((token[1] as u32) << 16)
        | ((token[2] as u32) << 8)
        | (token[3] as u32)
}

fn get_code_value(token: &[u8]) -> u32 {
    ((token[0] as u32) << 24)
        | ((token[1] as u32) << 16)
        | ((token[2] as u32) << 8)
        | (token[3] as u32)
}

fn split_token_to_setting(token: &[u8]) -> Result<Option<Setting>, H2Error> {
    let id = u16::from(token[0]) << 8 | u16::from(token[1]);
    let value = get_code_value(&token[2..6]);
    get_setting(id, value)
}

pub(crate) fn get_setting(id: u16, value: u32) -> Result<Option<Setting>, H2Error> {
    match id {
        1 => Ok(Some(Setting::HeaderTableSize(value))),
        2 => {
            let enable_push = match value {
                0 => false,
                1 => true,
                _ => return Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
            };
            Ok(Some(Setting::EnablePush(enable_push)))
        }
        3 => Ok(Some(Setting::MaxConcurrentStreams(value))),
        4 => {
            if u64::from(value) > MAX_INITIAL_WINDOW_SIZE {
                return Err(H2Error::ConnectionError(ErrorCode::FlowControlError));
            }
            Ok(Some(Setting::InitialWindowSize(value)))
        }
        5 => {
            if !(DEFAULT_MAX_FRAME_SIZE..=MAX_ALLOWED_MAX_FRAME_SIZE).contains(&value) {
                return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
            }
            Ok(Some(Setting::MaxFrameSize(value)))
        }
        6 => Ok(Some(Setting::MaxHeaderListSize(value))),
        _ => Ok(None),
    }
}
