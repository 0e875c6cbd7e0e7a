//! Contracts between the pipeline core and its codec collaborators
//!
//! The pipeline never touches FFmpeg directly; it drives these traits.
//! Tests substitute scripted implementations for every seam.

use std::collections::VecDeque;

use ffmpeg_next::{frame, Packet};
use pairgen_common::Result;

/// Outcome of one non-blocking pull against a codec context.
///
/// `Pending` means "needs more input" and is never a failure; `Eos` means
/// the context has been flushed and will produce nothing further.
#[derive(Debug)]
pub enum Pull<T> {
    Ready(T),
    Pending,
    Eos,
}

/// Demuxed compressed packets for one selected stream.
///
/// `None` is permanent: once the underlying source is exhausted, every
/// subsequent call returns `None`.
pub trait PacketSource {
    fn read(&mut self) -> Result<Option<Packet>>;
}

/// Push-packet / pull-frame decoding context
pub trait VideoDecode {
    fn send(&mut self, packet: &Packet) -> Result<()>;
    fn receive(&mut self) -> Result<Pull<frame::Video>>;

    /// Drain every frame the context can currently produce
    fn drain_into(&mut self, frames: &mut VecDeque<frame::Video>) -> Result<()> {
        while let Pull::Ready(frame) = self.receive()? {
            frames.push_back(frame);
        }
        Ok(())
    }
}

/// Push-frame / pull-packet encoding context
pub trait VideoEncode {
    fn send(&mut self, frame: &frame::Video) -> Result<()>;
    fn receive(&mut self) -> Result<Pull<Packet>>;

    /// Signal end-of-input so remaining output can be drained
    fn flush(&mut self) -> Result<()>;
}

/// Pixel format / resolution conversion
pub trait PixelConvert {
    fn convert(&mut self, src: &frame::Video) -> Result<frame::Video>;
}

/// One complete set of collaborators for a generation run.
///
/// The pipeline owns its session outright; `reset` discards the whole
/// bundle and obtains a fresh one from the factory.
pub struct Session {
    pub source: Box<dyn PacketSource>,
    pub source_decoder: Box<dyn VideoDecode>,
    pub encoder: Box<dyn VideoEncode>,
    pub recon_decoder: Box<dyn VideoDecode>,
    pub working_converter: Box<dyn PixelConvert>,
    pub output_converter: Box<dyn PixelConvert>,
}

/// Builds fresh collaborator bundles.
///
/// Construction failures (missing codec, open failure) are fatal and must
/// not be retried internally.
pub trait SessionFactory {
    fn open(&mut self) -> Result<Session>;
}
