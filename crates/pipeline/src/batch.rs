//! Batch assembly into dense image tensors

use ffmpeg_next::frame;
use ndarray::Array4;
use pairgen_codec::SessionFactory;
use pairgen_common::{GeneratorConfig, PairGenError, PixelLayout, Result};
use tracing::{debug, info};

use crate::pipeline::PairPipeline;
use crate::sizer::GroupSizer;

/// One full batch of paired images, shaped `[batch, height, width, 4]`
pub struct PairBatch {
    pub distorted: Array4<u8>,
    pub original: Array4<u8>,
}

/// Drives the pipeline to produce full batches of pairs.
///
/// Owns the session factory so `reset` can tear down and rebuild every
/// codec collaborator atomically.
pub struct BatchGenerator {
    factory: Box<dyn SessionFactory>,
    pipeline: PairPipeline,
    config: GeneratorConfig,
}

impl BatchGenerator {
    /// Build the first session and the pipeline around it
    pub fn open(
        mut factory: Box<dyn SessionFactory>,
        sizer: Box<dyn GroupSizer>,
        config: GeneratorConfig,
    ) -> Result<Self> {
        if config.width == 0 || config.height == 0 || config.batch_size == 0 {
            return Err(PairGenError::BatchShape(format!(
                "degenerate generator geometry: {}x{}, batch {}",
                config.width, config.height, config.batch_size
            )));
        }
        let session = factory.open()?;
        Ok(Self {
            factory,
            pipeline: PairPipeline::new(session, sizer),
            config,
        })
    }

    /// Rebuild all collaborators, clear both frame buffers and restart
    /// timestamp numbering at 0
    pub fn reset(&mut self) -> Result<()> {
        let session = self.factory.open()?;
        self.pipeline.reset(session);
        info!("generator reset");
        Ok(())
    }

    /// Produce one full batch, or `None` once the source cannot yield
    /// `batch_size` more pairs. Never returns a partial batch: work done
    /// for an unfinishable batch is discarded.
    pub fn generate_batch(&mut self) -> Result<Option<PairBatch>> {
        let height = self.config.height as usize;
        let row = self.config.row_bytes();
        let image = height * row;
        let batch = self.config.batch_size;

        let mut distorted = vec![0u8; batch * image];
        let mut original = vec![0u8; batch * image];

        for slot in 0..batch {
            let Some(pair) = self.pipeline.next_pair()? else {
                debug!(filled = slot, batch, "source exhausted mid-batch");
                return Ok(None);
            };
            let at = slot * image;
            copy_rows(&pair.distorted, &mut distorted[at..at + image], height, row)?;
            copy_rows(&pair.original, &mut original[at..at + image], height, row)?;
        }

        let shape = (
            batch,
            height,
            self.config.width as usize,
            PixelLayout::Rgba.channel_count(),
        );
        let distorted = Array4::from_shape_vec(shape, distorted)
            .map_err(|e| PairGenError::BatchShape(e.to_string()))?;
        let original = Array4::from_shape_vec(shape, original)
            .map_err(|e| PairGenError::BatchShape(e.to_string()))?;

        Ok(Some(PairBatch {
            distorted,
            original,
        }))
    }
}

/// Copy `height` rows of plane 0 into `dst`, reading at the frame's own
/// row stride (which may carry codec alignment padding) and writing at the
/// tight output stride `row`.
fn copy_rows(frame: &frame::Video, dst: &mut [u8], height: usize, row: usize) -> Result<()> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    if stride < row || data.len() < (height - 1) * stride + row {
        return Err(PairGenError::BatchShape(format!(
            "frame plane {}x{} (stride {stride}) cannot fill {row}-byte rows",
            frame.width(),
            frame.height(),
        )));
    }
    for y in 0..height {
        let src = y * stride;
        dst[y * row..(y + 1) * row].copy_from_slice(&data[src..src + row]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeSessionFactory;
    use crate::sizer::FixedGroupSizer;

    // 6-pixel rows are 24 bytes tight, below the frame allocator's row
    // alignment, so every fake output frame carries padded strides
    const WIDTH: u32 = 6;
    const HEIGHT: u32 = 4;

    fn generator(frames: usize, batch_size: usize) -> BatchGenerator {
        BatchGenerator::open(
            Box::new(FakeSessionFactory {
                frames_per_session: frames,
                width: WIDTH,
                height: HEIGHT,
            }),
            Box::new(FixedGroupSizer::new(5)),
            GeneratorConfig {
                width: WIDTH,
                height: HEIGHT,
                batch_size,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_batch_shape_and_content() {
        // 12 source frames with N=5 groups yield pairs at pts 3 and 8
        let mut generator = generator(12, 2);
        let batch = generator.generate_batch().unwrap().unwrap();

        assert_eq!(batch.distorted.shape(), &[2, 4, 6, 4]);
        assert_eq!(batch.original.shape(), &[2, 4, 6, 4]);

        // fake converter floods each image with its pts value
        assert!(batch.distorted.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 3));
        assert!(batch.original.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 3));
        assert!(batch.distorted.index_axis(ndarray::Axis(0), 1).iter().all(|&v| v == 8));
    }

    #[test]
    fn test_padded_source_strides_are_trimmed_to_tight_rows() {
        // the premise: RGBA frames at this width allocate wider than the
        // 24-byte tight row
        let allocated = frame::Video::new(ffmpeg_next::format::Pixel::RGBA, WIDTH, HEIGHT);
        assert!(allocated.stride(0) > WIDTH as usize * 4);

        // the fake converter writes a sentinel into the padding bytes;
        // only the pts value may appear in the packed tensors
        let mut generator = generator(12, 1);
        let batch = generator.generate_batch().unwrap().unwrap();
        assert!(batch.distorted.iter().all(|&v| v == 3));
        assert!(batch.original.iter().all(|&v| v == 3));
    }

    #[test]
    fn test_zero_height_config_is_rejected() {
        let result = BatchGenerator::open(
            Box::new(FakeSessionFactory {
                frames_per_session: 12,
                width: WIDTH,
                height: 0,
            }),
            Box::new(FixedGroupSizer::new(5)),
            GeneratorConfig {
                width: WIDTH,
                height: 0,
                batch_size: 2,
            },
        );
        assert!(matches!(result, Err(PairGenError::BatchShape(_))));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        // 12 frames produce only 2 pairs; a 4-pair batch must be refused
        let mut generator = generator(12, 4);
        assert!(generator.generate_batch().unwrap().is_none());
        // and deterministically so on every subsequent call
        assert!(generator.generate_batch().unwrap().is_none());
    }

    #[test]
    fn test_exhaustion_then_reset_replays() {
        let mut generator = generator(12, 2);
        assert!(generator.generate_batch().unwrap().is_some());
        assert!(generator.generate_batch().unwrap().is_none());

        generator.reset().unwrap();
        let batch = generator.generate_batch().unwrap().unwrap();
        // numbering restarted at 0: first pair is at pts 3 again
        assert!(batch.distorted.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 3));
    }

    #[test]
    fn test_short_source_never_fills_any_batch() {
        let mut generator = generator(3, 4);
        for _ in 0..3 {
            assert!(generator.generate_batch().unwrap().is_none());
        }
    }
}
