//! Low-latency H.264 re-encoding context

use ffmpeg_next as ffmpeg;
use pairgen_common::{CodecSettings, PairGenError, Result};
use tracing::debug;

use crate::traits::{Pull, VideoEncode};

const ENCODER_NAME: &str = "libx264";

/// Encoder wrapper configured for one-in/one-out operation.
///
/// Keyframes appear only where the pipeline forces them by marking a frame
/// as an I picture; `forced-idr` makes those full IDRs with in-band
/// parameter sets, which is what lets the reconstruction decoder start
/// from any group boundary.
pub struct LowLatencyEncoder {
    encoder: ffmpeg::encoder::video::Encoder,
}

impl LowLatencyEncoder {
    /// Find, configure and open the encoder. Failures here are fatal.
    pub fn open(settings: &CodecSettings) -> Result<Self> {
        crate::init_ffmpeg();

        let codec = ffmpeg::encoder::find_by_name(ENCODER_NAME)
            .ok_or_else(|| PairGenError::CodecUnavailable(ENCODER_NAME.to_string()))?;

        let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to create encoder context: {e}")))?;

        encoder.set_width(settings.width);
        encoder.set_height(settings.height);
        encoder.set_format(crate::pixel_format(settings.pixel_format));
        encoder.set_time_base(ffmpeg::Rational(settings.timebase.0, settings.timebase.1));
        encoder.set_frame_rate(Some(ffmpeg::Rational(
            settings.framerate.0,
            settings.framerate.1,
        )));
        encoder.set_bit_rate(settings.bitrate);
        encoder.set_gop(settings.gop_size);
        encoder.set_max_b_frames(settings.max_b_frames);
        if settings.low_delay {
            encoder.set_flags(ffmpeg::codec::Flags::LOW_DELAY);
        }

        // keyint_min and refs have no safe accessors in ffmpeg-next
        unsafe {
            (*encoder.as_mut_ptr()).keyint_min = settings.keyint_min;
            (*encoder.as_mut_ptr()).refs = settings.refs;
        }

        let mut options = ffmpeg::Dictionary::new();
        options.set("tune", "zerolatency");
        options.set("preset", "veryfast");
        options.set("forced-idr", "1");

        let encoder = encoder
            .open_with(options)
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to open {ENCODER_NAME}: {e}")))?;

        debug!(
            "Opened {} at {}x{}, {} bps",
            ENCODER_NAME, settings.width, settings.height, settings.bitrate
        );

        Ok(Self { encoder })
    }
}

impl VideoEncode for LowLatencyEncoder {
    fn send(&mut self, frame: &ffmpeg::frame::Video) -> Result<()> {
        self.encoder
            .send_frame(frame)
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to send frame to encoder: {e}")))
    }

    fn receive(&mut self) -> Result<Pull<ffmpeg::Packet>> {
        let mut packet = ffmpeg::Packet::empty();
        match self.encoder.receive_packet(&mut packet) {
            Ok(()) => Ok(Pull::Ready(packet)),
            Err(ffmpeg::Error::Other {
                errno: ffmpeg::util::error::EAGAIN,
            }) => Ok(Pull::Pending),
            Err(ffmpeg::Error::Eof) => Ok(Pull::Eos),
            Err(e) => Err(PairGenError::Ffmpeg(format!(
                "Failed to receive packet from encoder: {e}"
            ))),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.encoder
            .send_eof()
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to flush encoder: {e}")))
    }
}
