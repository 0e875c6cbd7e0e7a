//! Video decoding contexts with non-blocking receive semantics

use ffmpeg_next as ffmpeg;
use pairgen_common::{PairGenError, Result};

use crate::traits::{Pull, VideoDecode};

/// Decoder wrapper over an opened `FFmpeg` video decoding context.
///
/// Two construction paths: from demuxed stream parameters (source
/// decoding) or from a bare codec id (reconstruction decoding, where
/// parameter sets arrive in-band with the packets).
pub struct StreamDecoder {
    decoder: ffmpeg::decoder::Video,
}

impl StreamDecoder {
    /// Decoder configured from the selected stream's codec parameters
    pub fn from_parameters(parameters: ffmpeg::codec::Parameters) -> Result<Self> {
        crate::init_ffmpeg();

        let decoder = ffmpeg::codec::context::Context::from_parameters(parameters)
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to create decoder context: {e}")))?
            .decoder()
            .video()
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to open decoder: {e}")))?;

        Ok(Self { decoder })
    }

    /// Decoder opened from a bare codec id
    pub fn from_codec(id: ffmpeg::codec::Id) -> Result<Self> {
        crate::init_ffmpeg();

        let codec = ffmpeg::decoder::find(id)
            .ok_or_else(|| PairGenError::CodecUnavailable(format!("decoder for {id:?}")))?;

        let decoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .decoder()
            .video()
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to open {id:?} decoder: {e}")))?;

        Ok(Self { decoder })
    }
}

impl VideoDecode for StreamDecoder {
    fn send(&mut self, packet: &ffmpeg::Packet) -> Result<()> {
        self.decoder
            .send_packet(packet)
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to send packet to decoder: {e}")))
    }

    fn receive(&mut self) -> Result<Pull<ffmpeg::frame::Video>> {
        let mut frame = ffmpeg::frame::Video::empty();
        match self.decoder.receive_frame(&mut frame) {
            Ok(()) => Ok(Pull::Ready(frame)),
            Err(ffmpeg::Error::Other {
                errno: ffmpeg::util::error::EAGAIN,
            }) => Ok(Pull::Pending),
            Err(ffmpeg::Error::Eof) => Ok(Pull::Eos),
            Err(e) => Err(PairGenError::Ffmpeg(format!(
                "Failed to receive frame from decoder: {e}"
            ))),
        }
    }
}
