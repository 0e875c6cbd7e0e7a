//! Scripted codec collaborators for pipeline tests
//!
//! Every fake is one-in/one-out with no internal latency, so the group
//! loop's backpressure handling is exercised deterministically: the
//! encoder answers `Pending` until it has been fed, the decoder answers
//! `Pending` until a packet arrives, and the source drains permanently.

use std::collections::VecDeque;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::util::picture;
use ffmpeg_next::{frame, packet, Packet};
use pairgen_codec::{
    PacketSource, PixelConvert, Pull, Session, SessionFactory, VideoDecode, VideoEncode,
};
use pairgen_common::Result;

pub struct FakeSource {
    packets: VecDeque<Packet>,
}

impl FakeSource {
    /// One compressed packet per decodable source frame
    pub fn with_frames(count: usize) -> Self {
        let packets = (0..count)
            .map(|i| {
                let mut packet = Packet::copy(&[0u8; 4]);
                packet.set_pts(Some(i as i64));
                packet
            })
            .collect();
        Self { packets }
    }
}

impl PacketSource for FakeSource {
    fn read(&mut self) -> Result<Option<Packet>> {
        Ok(self.packets.pop_front())
    }
}

/// Decoder that turns each sent packet into exactly one frame carrying the
/// packet's pts. Serves both the source-decode and reconstruction roles.
pub struct FakeDecoder {
    ready: VecDeque<frame::Video>,
}

impl FakeDecoder {
    pub fn new() -> Self {
        Self {
            ready: VecDeque::new(),
        }
    }
}

impl VideoDecode for FakeDecoder {
    fn send(&mut self, packet: &Packet) -> Result<()> {
        let mut frame = frame::Video::new(Pixel::YUV420P, 16, 16);
        frame.set_pts(packet.pts());
        self.ready.push_back(frame);
        Ok(())
    }

    fn receive(&mut self) -> Result<Pull<frame::Video>> {
        Ok(match self.ready.pop_front() {
            Some(frame) => Pull::Ready(frame),
            None => Pull::Pending,
        })
    }
}

/// Encoder that emits one packet per frame, keyed iff the frame was marked
/// as an I picture. Optionally emits a stray keyless packet ahead of its
/// first real output, imitating encode latency from a previous group.
pub struct FakeEncoder {
    ready: VecDeque<Packet>,
    stray_before_first_key: bool,
    sent: usize,
}

impl FakeEncoder {
    pub fn new(stray_before_first_key: bool) -> Self {
        Self {
            ready: VecDeque::new(),
            stray_before_first_key,
            sent: 0,
        }
    }
}

impl VideoEncode for FakeEncoder {
    fn send(&mut self, frame: &frame::Video) -> Result<()> {
        if self.sent == 0 && self.stray_before_first_key {
            let mut stray = Packet::copy(&[0xEE; 8]);
            stray.set_pts(Some(-1));
            self.ready.push_back(stray);
        }
        let mut packet = Packet::copy(&[0xAB; 8]);
        packet.set_pts(frame.pts());
        if frame.kind() == picture::Type::I {
            packet.set_flags(packet::Flags::KEY);
        }
        self.ready.push_back(packet);
        self.sent += 1;
        Ok(())
    }

    fn receive(&mut self) -> Result<Pull<Packet>> {
        Ok(match self.ready.pop_front() {
            Some(packet) => Pull::Ready(packet),
            None => Pull::Pending,
        })
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Converter that reallocates to the destination geometry, preserves pts,
/// and writes the frame's pts value into every row of plane 0. Row
/// padding beyond the tight width is filled with a sentinel byte, so any
/// copy that reads past the row surfaces in content assertions.
pub struct FakeConverter {
    format: Pixel,
    width: u32,
    height: u32,
    fill_from_pts: bool,
}

impl FakeConverter {
    /// Working-format stand-in, content left untouched
    pub fn working() -> Self {
        Self {
            format: Pixel::YUV420P,
            width: 16,
            height: 16,
            fill_from_pts: false,
        }
    }

    /// Output-format stand-in with pts-derived content
    pub fn rgba(width: u32, height: u32) -> Self {
        Self {
            format: Pixel::RGBA,
            width,
            height,
            fill_from_pts: true,
        }
    }
}

impl PixelConvert for FakeConverter {
    fn convert(&mut self, src: &frame::Video) -> Result<frame::Video> {
        let mut dst = frame::Video::new(self.format, self.width, self.height);
        dst.set_pts(src.pts());
        if self.fill_from_pts {
            let value = src.pts().unwrap_or(0) as u8;
            let stride = dst.stride(0);
            let row = self.width as usize * 4;
            let height = self.height as usize;
            let data = dst.data_mut(0);
            // 0xEE marks alignment padding; it must never reach a batch
            data.fill(0xEE);
            for y in 0..height {
                data[y * stride..y * stride + row].fill(value);
            }
        }
        Ok(dst)
    }
}

/// A complete scripted session over `frames` decodable source frames,
/// producing `width`x`height` RGBA output pairs.
pub fn fake_session(frames: usize, width: u32, height: u32) -> Session {
    Session {
        source: Box::new(FakeSource::with_frames(frames)),
        source_decoder: Box::new(FakeDecoder::new()),
        encoder: Box::new(FakeEncoder::new(false)),
        recon_decoder: Box::new(FakeDecoder::new()),
        working_converter: Box::new(FakeConverter::working()),
        output_converter: Box::new(FakeConverter::rgba(width, height)),
    }
}

/// Like [`fake_session`] but the encoder leaks one keyless packet before
/// its first keyframe
pub fn session_with_stray_packet(frames: usize, width: u32, height: u32) -> Session {
    Session {
        encoder: Box::new(FakeEncoder::new(true)),
        ..fake_session(frames, width, height)
    }
}

/// Factory producing identical scripted sessions, for reset tests
pub struct FakeSessionFactory {
    pub frames_per_session: usize,
    pub width: u32,
    pub height: u32,
}

impl SessionFactory for FakeSessionFactory {
    fn open(&mut self) -> Result<Session> {
        Ok(fake_session(
            self.frames_per_session,
            self.width,
            self.height,
        ))
    }
}
