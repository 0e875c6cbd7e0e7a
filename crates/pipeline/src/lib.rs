//! Pair-generation pipeline core
//!
//! Re-encodes a source video through a lossy low-latency codec round trip
//! and aligns each reconstructed frame with its pristine original by
//! timestamp. Three layers, each pulling from the one below:
//!
//! 1. group construction ([`PairPipeline::build_group`]) — one bounded
//!    decode→encode→decode round with a deliberate mid-group decode gap;
//! 2. frame pairing ([`PairPipeline::next_pair`]) — locates the timestamp
//!    discontinuity the gap produced and matches it against the original;
//! 3. batch assembly ([`BatchGenerator::generate_batch`]) — packs pairs
//!    into dense image tensors, atomically.

pub mod batch;
pub mod pipeline;
pub mod sizer;

#[cfg(test)]
mod fakes;

pub use batch::{BatchGenerator, PairBatch};
pub use pipeline::{FramePair, GroupOutcome, PairPipeline};
pub use sizer::{FixedGroupSizer, GroupSizer, UniformGroupSizer, GROUP_SIZE_RANGE};
