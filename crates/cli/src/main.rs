//! pairgen - distorted/original training-pair generation from video
//!
//! Streams batches of paired images out of a source video: each pair is a
//! frame reconstructed through a lossy low-latency re-encode and its
//! pristine original, aligned by timestamp.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context as _, Result};
use clap::Parser;
use image::RgbaImage;
use ndarray::Axis;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pairgen_codec::FileSessionFactory;
use pairgen_common::{CodecSettings, GeneratorConfig};
use pairgen_pipeline::{
    BatchGenerator, FixedGroupSizer, GroupSizer, PairBatch, UniformGroupSizer,
};

#[derive(Parser)]
#[command(
    name = "pairgen",
    version,
    about = "Generate distorted/original training pairs from a source video",
    long_about = "Re-encodes a source video through a lossy low-latency codec round trip\n\
                  and emits dense [batch, height, width, 4] u8 tensors of paired images,\n\
                  suitable as (x, y) samples for training a restoration model."
)]
struct Cli {
    /// Source video file
    input: PathBuf,

    /// Output frame width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Output frame height
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Pairs per batch
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Stop after this many batches instead of running to exhaustion
    #[arg(long)]
    max_batches: Option<usize>,

    /// Seed the group-size sampler for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Fix every group to this size instead of sampling
    #[arg(long, conflicts_with = "seed")]
    group_size: Option<usize>,

    /// Dump the first pair of each batch as PNGs into this directory
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install logging subscriber")?;

    let config = GeneratorConfig {
        width: cli.width,
        height: cli.height,
        batch_size: cli.batch_size,
    };
    let settings = CodecSettings::low_latency(cli.width, cli.height);
    let factory = FileSessionFactory::new(&cli.input, settings);

    let sizer: Box<dyn GroupSizer> = match (cli.group_size, cli.seed) {
        (Some(size), _) => Box::new(FixedGroupSizer::new(size)),
        (None, Some(seed)) => Box::new(UniformGroupSizer::seeded(seed)),
        (None, None) => Box::new(UniformGroupSizer::new()),
    };

    let mut generator = BatchGenerator::open(Box::new(factory), sizer, config.clone())
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;

    if let Some(dir) = &cli.dump_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let started = Instant::now();
    let mut batches = 0usize;
    while let Some(batch) = generator.generate_batch()? {
        batches += 1;
        info!(batch = batches, pairs = config.batch_size, "batch ready");
        if let Some(dir) = &cli.dump_dir {
            dump_first_pair(&batch, &config, dir, batches)?;
        }
        if cli.max_batches.is_some_and(|max| batches >= max) {
            break;
        }
    }

    info!(
        "Generated {} batches ({} pairs) in {:.2?}",
        batches,
        batches * config.batch_size,
        started.elapsed()
    );
    Ok(())
}

/// Write the first pair of a batch as two PNGs for visual inspection
fn dump_first_pair(
    batch: &PairBatch,
    config: &GeneratorConfig,
    dir: &Path,
    index: usize,
) -> Result<()> {
    for (name, tensor) in [
        ("distorted", &batch.distorted),
        ("original", &batch.original),
    ] {
        let pixels: Vec<u8> = tensor.index_axis(Axis(0), 0).iter().copied().collect();
        let image = RgbaImage::from_raw(config.width, config.height, pixels)
            .context("Batch tensor does not match the configured geometry")?;
        let path = dir.join(format!("batch{index:04}_{name}.png"));
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
