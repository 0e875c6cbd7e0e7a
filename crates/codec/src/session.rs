//! File-backed collaborator sessions

use std::path::PathBuf;

use ffmpeg_next as ffmpeg;
use pairgen_common::{CodecSettings, PixelLayout, Result};
use tracing::info;

use crate::convert::Converter;
use crate::decode::StreamDecoder;
use crate::demux::Demuxer;
use crate::encode::LowLatencyEncoder;
use crate::traits::{Session, SessionFactory};

/// Builds complete codec sessions for one source file.
///
/// Every `open` produces a fresh demuxer, both decoders, the encoder and
/// both converters, so a pipeline reset discards all buffered codec state
/// at once.
pub struct FileSessionFactory {
    path: PathBuf,
    settings: CodecSettings,
}

impl FileSessionFactory {
    pub fn new(path: impl Into<PathBuf>, settings: CodecSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }
}

impl SessionFactory for FileSessionFactory {
    fn open(&mut self) -> Result<Session> {
        let demuxer = Demuxer::open(&self.path)?;
        let source_decoder = StreamDecoder::from_parameters(demuxer.stream_parameters()?)?;
        let encoder = LowLatencyEncoder::open(&self.settings)?;
        let recon_decoder = StreamDecoder::from_codec(ffmpeg::codec::Id::H264)?;
        let working_converter = Converter::new(
            self.settings.pixel_format,
            self.settings.width,
            self.settings.height,
        );
        let output_converter = Converter::new(
            PixelLayout::Rgba,
            self.settings.width,
            self.settings.height,
        );

        info!("Codec session ready for {:?}", self.path);

        Ok(Session {
            source: Box::new(demuxer),
            source_decoder: Box::new(source_decoder),
            encoder: Box::new(encoder),
            recon_decoder: Box::new(recon_decoder),
            working_converter: Box::new(working_converter),
            output_converter: Box::new(output_converter),
        })
    }
}
