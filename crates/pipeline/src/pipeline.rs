//! Group construction and frame pairing

use std::collections::VecDeque;

use ffmpeg_next::util::picture;
use ffmpeg_next::{frame, Packet};
use pairgen_codec::{Pull, Session};
use pairgen_common::{PairGenError, Result};
use tracing::{debug, trace};

use crate::sizer::GroupSizer;

/// Outcome of one group-construction round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    /// A group was re-encoded and its selected packets decoded
    Built,
    /// The source ran out before the group could make progress. This is
    /// the pipeline's single termination signal, not an error.
    Exhausted,
}

/// One validated distorted/original correspondence, both frames already in
/// the output pixel layout and carrying equal timestamps
pub struct FramePair {
    pub distorted: frame::Video,
    pub original: frame::Video,
}

impl FramePair {
    /// Shared presentation timestamp of the pair
    #[must_use]
    pub fn pts(&self) -> Option<i64> {
        self.distorted.pts()
    }
}

/// Decode-selection predicate for one group: decode packet `index` unless
/// it falls in the `skip`-wide window ending two packets before the end.
/// Saturating arithmetic keeps degenerate group sizes (`kept < skip + 2`)
/// from underflowing.
fn selected_for_decode(index: usize, kept: usize, skip: usize) -> bool {
    let tail = kept.saturating_sub(2);
    let head = tail.saturating_sub(skip);
    index < head || index >= tail
}

fn frame_pts(frame: &frame::Video) -> Result<i64> {
    frame.pts().ok_or(PairGenError::MissingTimestamp)
}

/// The generation state machine.
///
/// Owns the codec session, the Reconstructed and Original frame buffers,
/// and the running timestamp counter. Nothing outside this type observes
/// or mutates the buffers.
pub struct PairPipeline {
    session: Session,
    sizer: Box<dyn GroupSizer>,
    /// Frames decoded from the selected subset of each group's packets
    reconstructed: VecDeque<frame::Video>,
    /// Every source frame fed to the encoder, in feed order
    originals: VecDeque<frame::Video>,
    next_pts: i64,
}

impl PairPipeline {
    #[must_use]
    pub fn new(session: Session, sizer: Box<dyn GroupSizer>) -> Self {
        Self {
            session,
            sizer,
            reconstructed: VecDeque::new(),
            originals: VecDeque::new(),
            next_pts: 0,
        }
    }

    /// Replace the codec session and discard all buffered state.
    /// Timestamp numbering restarts at 0.
    pub fn reset(&mut self, session: Session) {
        self.session = session;
        self.reconstructed.clear();
        self.originals.clear();
        self.next_pts = 0;
    }

    /// Produce one group: re-encode a bounded run of source frames, then
    /// decode a selected subset of the resulting packets into the
    /// Reconstructed buffer. Every frame fed to the encoder is stamped
    /// with the next timestamp and appended to the Original buffer.
    pub fn build_group(&mut self) -> Result<GroupOutcome> {
        let target = self.sizer.sample_group_size();
        let skip = (target / 5).max(1);

        let mut packets: Vec<Packet> = Vec::with_capacity(target);
        let mut seen_key = false;
        let mut first = true;

        loop {
            if let Pull::Ready(packet) = self.session.encoder.receive()? {
                // Output predating the encoder's first keyframe is encode
                // latency left over from before this group; drop it. Once
                // a keyframe is kept the group accepts everything.
                if seen_key || packet.is_key() {
                    packets.push(packet);
                    seen_key = true;
                }
                continue;
            }

            if packets.len() >= target {
                break;
            }

            if let Pull::Ready(decoded) = self.session.source_decoder.receive()? {
                let mut frame = self.session.working_converter.convert(&decoded)?;
                frame.set_pts(Some(self.next_pts));
                self.next_pts += 1;
                frame.set_kind(if first {
                    picture::Type::I
                } else {
                    picture::Type::P
                });
                first = false;
                self.session.encoder.send(&frame)?;
                self.originals.push_back(frame);
                continue;
            }

            match self.session.source.read()? {
                Some(packet) => self.session.source_decoder.send(&packet)?,
                None => {
                    debug!(
                        kept = packets.len(),
                        target, "source exhausted, aborting group"
                    );
                    return Ok(GroupOutcome::Exhausted);
                }
            }
        }

        let kept = packets.len();
        for (index, packet) in packets.iter().enumerate() {
            if selected_for_decode(index, kept, skip) {
                self.session.recon_decoder.send(packet)?;
                self.session
                    .recon_decoder
                    .drain_into(&mut self.reconstructed)?;
            }
        }

        debug!(target, kept, skip, "group built");
        Ok(GroupOutcome::Built)
    }

    /// Produce one pair, or `None` once the source is exhausted.
    ///
    /// Builds groups until the Reconstructed buffer contains a timestamp
    /// discontinuity, matches the frame after the gap against the Original
    /// buffer, converts both to the output layout, and consumes both
    /// buffer prefixes through the match.
    pub fn next_pair(&mut self) -> Result<Option<FramePair>> {
        let gap = loop {
            if let Some(index) = self.find_discontinuity()? {
                break index;
            }
            if self.build_group()? == GroupOutcome::Exhausted {
                return Ok(None);
            }
        };

        let pts = frame_pts(&self.reconstructed[gap])?;
        // Every timestamp fed to the encoder is retained in the Original
        // buffer, so a reconstructed frame without a match means the
        // bookkeeping is corrupted. Abort, do not retry.
        let matched = self
            .originals
            .iter()
            .position(|f| f.pts() == Some(pts))
            .ok_or(PairGenError::MissingOriginal { pts })?;

        let distorted = self
            .session
            .output_converter
            .convert(&self.reconstructed[gap])?;
        let original = self.session.output_converter.convert(&self.originals[matched])?;

        self.reconstructed.drain(..=gap);
        self.originals.drain(..=matched);

        trace!(pts, "pair emitted");
        Ok(Some(FramePair { distorted, original }))
    }

    /// First index `i > 0` whose timestamp leaves a gap of 2 or more
    /// behind its predecessor
    fn find_discontinuity(&self) -> Result<Option<usize>> {
        for i in 1..self.reconstructed.len() {
            let prev = frame_pts(&self.reconstructed[i - 1])?;
            let next = frame_pts(&self.reconstructed[i])?;
            if prev + 1 < next {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}
