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

use crate::h2::error::ErrorCode;
use crate::h2::frame::{Frame, Payload, END_HEADERS_MASK, END_STREAM_MASK};
use crate::h2::{H2Error, Parts};

const FRAME_HEADER_LENGTH: usize = 9;

/// Frame serialization encoder.
///
/// A frame is staged with [`FrameEncoder::set_frame`] and then drained with
/// repeated [`FrameEncoder::encode`] calls into caller-provided buffers. One
/// staged frame may serialize into several wire frames: a HEADERS payload
/// whose header block exceeds the peer's SETTINGS_MAX_FRAME_SIZE is split
/// into a HEADERS frame followed by CONTINUATION frames (END_HEADERS only on
/// the last one, END_STREAM only on the first one), and a DATA payload is
/// split into DATA frames with END_STREAM only on the last fragment.
///
/// The HPACK encoder inside is a single session-persistent instance, so all
/// header blocks of a connection must be staged through the same
/// `FrameEncoder`.
///
/// # Examples
///
/// ```
/// use lumen_http::h2::{Frame, FrameEncoder, FrameFlags, Payload, Ping};
///
/// let mut encoder = FrameEncoder::new(16384);
/// let ping = Frame::new(0, FrameFlags::new(0), Payload::Ping(Ping::new([0; 8])));
/// encoder.set_frame(ping).unwrap();
/// let mut buf = [0u8; 1024];
/// let size = encoder.encode(&mut buf).unwrap();
/// assert_eq!(size, 17);
/// ```
pub struct FrameEncoder {
    hpack: hpack::Encoder<'static>,
    max_frame_size: usize,
    buffer: Vec<u8>,
    cursor: usize,
}

impl FrameEncoder {
    /// `FrameEncoder` constructor. `max_frame_size` is the peer-advertised
    /// SETTINGS_MAX_FRAME_SIZE.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            hpack: hpack::Encoder::new(),
            max_frame_size,
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    /// Updates the SETTINGS_MAX_FRAME_SIZE used for outbound
    /// fragmentation.
    pub fn update_max_frame_size(&mut self, size: usize) {
        self.max_frame_size = size;
    }

    /// Stages the next frame for serialization. The previous frame must be
    /// fully drained first.
    pub fn set_frame(&mut self, frame: Frame) -> Result<(), H2Error> {
        if self.cursor < self.buffer.len() {
            return Err(H2Error::ConnectionError(ErrorCode::InternalError));
        }
        self.buffer.clear();
        self.cursor = 0;
        self.serialize(frame)
    }

    /// Writes serialized frame bytes into `buf`. Returns the number of
    /// bytes written; `0` means the staged frame is fully drained.
    pub fn encode(&mut self, buf: &mut [u8]) -> Result<usize, H2Error> {
        let remaining = self.buffer.len() - self.cursor;
        let size = remaining.min(buf.len());
        buf[..size].copy_from_slice(&self.buffer[self.cursor..self.cursor + size]);
        self.cursor += size;
        Ok(size)
    }

    fn serialize(&mut self, frame: Frame) -> Result<(), H2Error> {
        let id = frame.stream_id();
        let flags = frame.flags().bits();
        match frame.payload() {
            Payload::Headers(headers) => {
                let block = self.encode_header_block(&headers.get_parts())?;
                self.write_header_block(id, flags, &block);
            }
            Payload::Data(data) => self.write_data(id, flags, data.data()),
            Payload::Settings(settings) => {
                let mut payload = Vec::with_capacity(settings.encoded_len());
                for setting in settings.get_settings() {
                    let identifier = setting.setting_identifier();
                    payload.extend_from_slice(&identifier.to_be_bytes());
                    payload.extend_from_slice(&setting.value().to_be_bytes());
                }
                self.write_frame_header(payload.len(), 0x4, flags, id);
                self.buffer.extend_from_slice(&payload);
            }
            Payload::Ping(ping) => {
                self.write_frame_header(8, 0x6, flags, id);
                self.buffer.extend_from_slice(&ping.data());
            }
            Payload::RstStream(reset) => {
                self.write_frame_header(4, 0x3, flags, id);
                self.buffer.extend_from_slice(&reset.error_code().to_be_bytes());
            }
            Payload::Goaway(goaway) => {
                self.write_frame_header(goaway.encoded_len(), 0x7, flags, id);
                self.buffer
                    .extend_from_slice(&(goaway.get_last_stream_id() & 0x7fff_ffff).to_be_bytes());
                self.buffer
                    .extend_from_slice(&goaway.get_error_code().to_be_bytes());
                self.buffer.extend_from_slice(goaway.get_debug_data());
            }
            Payload::WindowUpdate(update) => {
                self.write_frame_header(4, 0x8, flags, id);
                self.buffer
                    .extend_from_slice(&(update.get_increment() & 0x7fff_ffff).to_be_bytes());
            }
            Payload::Priority(priority) => {
                self.write_frame_header(5, 0x2, flags, id);
                let mut dependency = priority.get_stream_dependency() & 0x7fff_ffff;
                if priority.get_exclusive() {
                    dependency |= 0x8000_0000;
                }
                self.buffer.extend_from_slice(&dependency.to_be_bytes());
                self.buffer.push(priority.get_weight());
            }
        }
        Ok(())
    }

    // Serializes pseudo-header fields ahead of the regular field lines, in
    // the order the caller inserted them.
    fn encode_header_block(&mut self, parts: &Parts) -> Result<Vec<u8>, H2Error> {
        let (pseudo, map) = parts.parts();
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        if let Some(method) = pseudo.method() {
            pairs.push((b":method".to_vec(), method.as_bytes().to_vec()));
        }
        if let Some(scheme) = pseudo.scheme() {
            pairs.push((b":scheme".to_vec(), scheme.as_bytes().to_vec()));
        }
        if let Some(authority) = pseudo.authority() {
            pairs.push((b":authority".to_vec(), authority.as_bytes().to_vec()));
        }
        if let Some(path) = pseudo.path() {
            pairs.push((b":path".to_vec(), path.as_bytes().to_vec()));
        }
        if let Some(status) = pseudo.status() {
            pairs.push((b":status".to_vec(), status.as_bytes().to_vec()));
        }
        for (name, value) in map.iter() {
            for bytes in value.iter() {
                pairs.push((name.as_bytes().to_vec(), bytes.clone()));
            }
        }
        let mut block = Vec::new();
        self.hpack
            .encode_into(
                pairs.iter().map(|(n, v)| (n.as_slice(), v.as_slice())),
                &mut block,
            )
            .map_err(|_| H2Error::ConnectionError(ErrorCode::InternalError))?;
        Ok(block)
    }

    fn write_header_block(&mut self, id: u32, flags: u8, block: &[u8]) {
        let end_stream = flags & END_STREAM_MASK;
        let mut chunks: Vec<&[u8]> = block.chunks(self.max_frame_size).collect();
        if chunks.is_empty() {
            chunks.push(&[]);
        }
        let last = chunks.len() - 1;
        for (n, chunk) in chunks.iter().enumerate() {
            let frame_type = if n == 0 { 0x1 } else { 0x9 };
            let mut frame_flags = 0;
            if n == 0 {
                frame_flags |= end_stream;
            }
            if n == last {
                frame_flags |= END_HEADERS_MASK;
            }
            self.write_frame_header(chunk.len(), frame_type, frame_flags, id);
            self.buffer.extend_from_slice(chunk);
        }
    }

    fn write_data(&mut self, id: u32, flags: u8, data: &[u8]) {
        let end_stream = flags & END_STREAM_MASK;
        let mut chunks: Vec<&[u8]> = data.chunks(self.max_frame_size).collect();
        if chunks.is_empty() {
            chunks.push(&[]);
        }
        let last = chunks.len() - 1;
        for (n, chunk) in chunks.iter().enumerate() {
            let frame_flags = if n == last { end_stream } else { 0 };
            self.write_frame_header(chunk.len(), 0x0, frame_flags, id);
            self.buffer.extend_from_slice(chunk);
        }
    }

    fn write_frame_header(&mut self, length: usize, frame_type: u8, flags: u8, id: u32) {
        self.buffer.reserve(FRAME_HEADER_LENGTH + length);
        self.buffer.push((length >> 16) as u8);
        self.buffer.push((length >> 8) as u8);
        self.buffer.push(length as u8);
        self.buffer.push(frame_type);
        self.buffer.push(flags);
        self.buffer
            .extend_from_slice(&(id & 0x7fff_ffff).to_be_bytes());
    }
}

#[cfg(test)]
mod ut_frame_encoder {
    use super::*;
    use crate::h2::frame::{
        Data, FrameFlags, Goaway, Ping, RstStream, Settings, SettingsBuilder, WindowUpdate,
    };
    use crate::h2::{FrameDecoder, FrameKind};
    use crate::headers::Headers;
    use crate::pseudo::PseudoHeaders;

    fn drain(encoder: &mut FrameEncoder) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 37];
        loop {
            let size = encoder.encode(&mut buf).unwrap();
            if size == 0 {
                break;
            }
            out.extend_from_slice(&buf[..size]);
        }
        out
    }

    /// UT test cases for `FrameEncoder` with control frames.
    ///
    /// # Brief
    /// 1. Stages PING, RST_STREAM, WINDOW_UPDATE, GOAWAY and SETTINGS
    ///    frames.
    /// 2. Checks the serialized bytes of each.
    #[test]
    fn ut_frame_encoder_control_frames() {
        let mut encoder = FrameEncoder::new(16384);

        let ping = Frame::new(0, FrameFlags::new(0), Payload::Ping(Ping::new(*b"pingtest")));
        encoder.set_frame(ping).unwrap();
        let bytes = drain(&mut encoder);
        assert_eq!(&bytes[..9], &[0, 0, 8, 6, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[9..], b"pingtest");

        let reset = Frame::new(3, FrameFlags::new(0), Payload::RstStream(RstStream::new(8)));
        encoder.set_frame(reset).unwrap();
        assert_eq!(drain(&mut encoder), [0, 0, 4, 3, 0, 0, 0, 0, 3, 0, 0, 0, 8]);

        let update = Frame::new(
            1,
            FrameFlags::new(0),
            Payload::WindowUpdate(WindowUpdate::new(10)),
        );
        encoder.set_frame(update).unwrap();
        assert_eq!(drain(&mut encoder), [0, 0, 4, 8, 0, 0, 0, 0, 1, 0, 0, 0, 10]);

        let goaway = Frame::new(
            0,
            FrameFlags::new(0),
            Payload::Goaway(Goaway::new(0, 5, b"bye".to_vec())),
        );
        encoder.set_frame(goaway).unwrap();
        assert_eq!(
            drain(&mut encoder),
            [0, 0, 11, 7, 0, 0, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 0, b'b', b'y', b'e']
        );

        let settings = Frame::new(
            0,
            FrameFlags::new(0),
            Payload::Settings(SettingsBuilder::new().initial_window_size(10).build()),
        );
        encoder.set_frame(settings).unwrap();
        assert_eq!(
            drain(&mut encoder),
            [0, 0, 6, 4, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 10]
        );

        let ack = Settings::ack();
        encoder.set_frame(ack).unwrap();
        assert_eq!(drain(&mut encoder), [0, 0, 0, 4, 1, 0, 0, 0, 0]);
    }

    /// UT test cases for DATA fragmentation.
    ///
    /// # Brief
    /// 1. Stages a DATA frame larger than the maximum frame size with
    ///    END_STREAM set.
    /// 2. Checks that fragments are contiguous and only the last one
    ///    carries END_STREAM.
    #[test]
    fn ut_frame_encoder_data_fragmentation() {
        let mut encoder = FrameEncoder::new(4);
        let mut flags = FrameFlags::empty();
        flags.set_end_stream(true);
        let data = Frame::new(1, flags, Payload::Data(Data::new(b"abcdefgh-".to_vec())));
        encoder.set_frame(data).unwrap();
        let bytes = drain(&mut encoder);
        // Three DATA frames: 4 + 4 + 1 bytes.
        assert_eq!(&bytes[..9], &[0, 0, 4, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&bytes[9..13], b"abcd");
        assert_eq!(&bytes[13..22], &[0, 0, 4, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&bytes[22..26], b"efgh");
        assert_eq!(&bytes[26..35], &[0, 0, 1, 0, 1, 0, 0, 0, 1]);
        assert_eq!(&bytes[35..], b"-");
    }

    /// UT test cases for HEADERS fragmentation into CONTINUATION frames.
    ///
    /// # Brief
    /// 1. Stages a HEADERS frame whose block exceeds the maximum frame
    ///    size.
    /// 2. Checks that the first frame is HEADERS without END_HEADERS and
    ///    the last a CONTINUATION with END_HEADERS.
    /// 3. Round-trips the result through a `FrameDecoder`.
    #[test]
    fn ut_frame_encoder_headers_fragmentation() {
        let mut encoder = FrameEncoder::new(8);
        let mut pseudo = PseudoHeaders::new();
        pseudo.set_status(Some(String::from("200")));
        let mut map = Headers::new();
        map.insert("field-one", "value-one").unwrap();
        map.insert("field-two", "value-two").unwrap();
        let mut parts = crate::h2::Parts::new();
        parts.set_pseudo(pseudo);
        parts.set_header_lines(map);

        let mut flags = FrameFlags::empty();
        flags.set_end_headers(true);
        let frame = Frame::new(
            1,
            flags,
            Payload::Headers(crate::h2::frame::Headers::new(parts)),
        );
        encoder.set_frame(frame).unwrap();
        let bytes = drain(&mut encoder);

        // First frame must be HEADERS without END_HEADERS.
        assert_eq!(bytes[3], 0x1);
        assert_eq!(bytes[4] & 0x4, 0);

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&bytes).unwrap();
        let mut status = None;
        let mut fields = 0;
        for kind in frames.iter() {
            if let FrameKind::Complete(frame) = kind {
                if let Payload::Headers(headers) = frame.payload() {
                    let (pseudo, map) = headers.parts();
                    status = pseudo.status().map(String::from);
                    fields = map.len();
                }
            }
        }
        assert_eq!(status.as_deref(), Some("200"));
        assert_eq!(fields, 2);
    }

    /// UT test cases for staging order enforcement.
    ///
    /// # Brief
    /// 1. Stages a frame and tries to stage another before draining.
    /// 2. Checks that the second staging fails.
    #[test]
    fn ut_frame_encoder_set_frame_order() {
        let mut encoder = FrameEncoder::new(16384);
        let ping = Frame::new(0, FrameFlags::new(0), Payload::Ping(Ping::new([0; 8])));
        encoder.set_frame(ping.clone()).unwrap();
        assert!(encoder.set_frame(ping).is_err());
    }
}
