/// Common types shared across the pair-generation pipeline
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline errors
///
/// Source exhaustion is deliberately absent here: running out of input is
/// an ordinary outcome and travels as `Ok(None)` through every layer.
#[derive(Debug, Error)]
pub enum PairGenError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Codec unavailable: {0}")]
    CodecUnavailable(String),

    #[error("No original frame recorded for pts {pts}")]
    MissingOriginal { pts: i64 },

    #[error("Buffered frame is missing a presentation timestamp")]
    MissingTimestamp,

    #[error("Batch tensor shape error: {0}")]
    BatchShape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PairGenError>;

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// YUV 4:2:0 planar, the working format fed to the encoder
    Yuv420p,
    /// Packed 8-bit RGBA, the output format of every pair
    Rgba,
}

impl PixelLayout {
    /// Bytes per pixel in plane 0
    #[must_use]
    pub fn channel_count(self) -> usize {
        match self {
            PixelLayout::Yuv420p => 1,
            PixelLayout::Rgba => 4,
        }
    }
}

/// Codec configuration applied once at encoder construction
///
/// Field set mirrors the recognized options of the codec context:
/// pixel format, framerate, timebase, geometry, bitrate, GOP shape,
/// reference count, and the low-delay flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecSettings {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelLayout,
    pub bitrate: usize,
    /// Frames per second as a rational (numerator, denominator)
    pub framerate: (i32, i32),
    pub timebase: (i32, i32),
    pub gop_size: u32,
    pub keyint_min: i32,
    pub max_b_frames: usize,
    pub refs: i32,
    pub low_delay: bool,
}

impl CodecSettings {
    /// Low-latency re-encode settings: frames go in and come out one at a
    /// time, keyframes only where the pipeline forces them. The GOP and
    /// keyint values are effectively infinite so the encoder never inserts
    /// keyframes on its own.
    #[must_use]
    pub fn low_latency(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_format: PixelLayout::Yuv420p,
            bitrate: 5_000_000,
            framerate: (1, 1),
            timebase: (1, 1),
            gop_size: 1_000_000,
            keyint_min: 1_000_000,
            max_b_frames: 0,
            refs: 1,
            low_delay: true,
        }
    }
}

/// Output geometry and batch size for the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub width: u32,
    pub height: u32,
    pub batch_size: usize,
}

impl GeneratorConfig {
    /// Tight row stride of one output image, in bytes
    #[must_use]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * PixelLayout::Rgba.channel_count()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            batch_size: 32,
        }
    }
}
