//! Pixel format and resolution conversion

use ffmpeg_next as ffmpeg;
use pairgen_common::{PairGenError, PixelLayout, Result};

use crate::traits::PixelConvert;

struct Scaler {
    ctx: ffmpeg::software::scaling::Context,
    src_format: ffmpeg::format::Pixel,
    src_width: u32,
    src_height: u32,
}

impl Scaler {
    fn new(
        src: &ffmpeg::frame::Video,
        format: ffmpeg::format::Pixel,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let ctx = ffmpeg::software::scaling::Context::get(
            src.format(),
            src.width(),
            src.height(),
            format,
            width,
            height,
            ffmpeg::software::scaling::Flags::BICUBIC,
        )
        .map_err(|e| PairGenError::Ffmpeg(format!("Failed to create scaler: {e}")))?;

        Ok(Self {
            ctx,
            src_format: src.format(),
            src_width: src.width(),
            src_height: src.height(),
        })
    }

    fn matches(&self, src: &ffmpeg::frame::Video) -> bool {
        self.src_format == src.format()
            && self.src_width == src.width()
            && self.src_height == src.height()
    }
}

/// Converter to a fixed destination format and size.
///
/// The scale context is cached and rebuilt only when the source geometry
/// changes, so per-frame conversion is a single `sws_scale`.
pub struct Converter {
    format: ffmpeg::format::Pixel,
    width: u32,
    height: u32,
    scaler: Option<Scaler>,
}

impl Converter {
    #[must_use]
    pub fn new(layout: PixelLayout, width: u32, height: u32) -> Self {
        Self {
            format: crate::pixel_format(layout),
            width,
            height,
            scaler: None,
        }
    }
}

impl PixelConvert for Converter {
    fn convert(&mut self, src: &ffmpeg::frame::Video) -> Result<ffmpeg::frame::Video> {
        let scaler = match &mut self.scaler {
            Some(scaler) if scaler.matches(src) => scaler,
            slot => slot.insert(Scaler::new(src, self.format, self.width, self.height)?),
        };

        let mut dst = ffmpeg::frame::Video::empty();
        scaler
            .ctx
            .run(src, &mut dst)
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to convert frame: {e}")))?;
        dst.set_pts(src.pts());
        Ok(dst)
    }
}
