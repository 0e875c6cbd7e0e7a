//! Codec collaborators for the pair-generation pipeline
//!
//! Thin RAII wrappers over `FFmpeg` (demux, decode, encode, pixel
//! conversion) plus the trait contracts the pipeline core consumes them
//! through. The wrappers translate FFmpeg's EAGAIN/EOF handshake into the
//! explicit [`Pull`] tri-state so the core never interprets errno values.

use ffmpeg_next as ffmpeg;

pub mod convert;
pub mod decode;
pub mod demux;
pub mod encode;
pub mod session;
pub mod traits;

pub use convert::Converter;
pub use decode::StreamDecoder;
pub use demux::Demuxer;
pub use encode::LowLatencyEncoder;
pub use session::FileSessionFactory;
pub use traits::{PacketSource, PixelConvert, Pull, Session, SessionFactory, VideoDecode, VideoEncode};

use pairgen_common::PixelLayout;

/// Initialize the `FFmpeg` library
pub(crate) fn init_ffmpeg() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        ffmpeg::init().expect("Failed to initialize FFmpeg");
    });
}

/// Map a pixel layout to the `FFmpeg` pixel format
#[must_use]
pub fn pixel_format(layout: PixelLayout) -> ffmpeg::format::Pixel {
    match layout {
        PixelLayout::Yuv420p => ffmpeg::format::Pixel::YUV420P,
        PixelLayout::Rgba => ffmpeg::format::Pixel::RGBA,
    }
}
