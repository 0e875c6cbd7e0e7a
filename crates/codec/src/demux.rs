//! Container demuxing restricted to the best video stream

use std::path::Path;

use ffmpeg_next as ffmpeg;
use pairgen_common::{PairGenError, Result};
use tracing::debug;

use crate::traits::PacketSource;

/// File demuxer filtered to one video stream
pub struct Demuxer {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    exhausted: bool,
}

impl Demuxer {
    /// Open a container and select its best video stream
    pub fn open(path: &Path) -> Result<Self> {
        crate::init_ffmpeg();

        let input = ffmpeg::format::input(&path)
            .map_err(|e| PairGenError::Ffmpeg(format!("Failed to open input {path:?}: {e}")))?;

        let stream_index = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(PairGenError::NoVideoStream)?
            .index();

        debug!("Opened {:?}, video stream index {}", path, stream_index);

        Ok(Self {
            input,
            stream_index,
            exhausted: false,
        })
    }

    /// Codec parameters of the selected stream, for decoder construction
    pub fn stream_parameters(&self) -> Result<ffmpeg::codec::Parameters> {
        self.input
            .streams()
            .find(|s| s.index() == self.stream_index)
            .map(|s| s.parameters())
            .ok_or(PairGenError::NoVideoStream)
    }
}

impl PacketSource for Demuxer {
    fn read(&mut self) -> Result<Option<ffmpeg::Packet>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut packet = ffmpeg::Packet::empty();
        loop {
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        return Ok(Some(packet));
                    }
                    // other streams are not our concern
                }
                Err(ffmpeg::Error::Eof) => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Err(ffmpeg::Error::Other {
                    errno: ffmpeg::util::error::EAGAIN,
                }) => {}
                Err(e) => {
                    return Err(PairGenError::Ffmpeg(format!("Failed to read packet: {e}")));
                }
            }
        }
    }
}
