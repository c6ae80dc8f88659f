//! Alignment of the producer's byte stream into fixed-size frames.

use super::pool::{Frame, FramePool};
use crate::constants::{FRAME_SIZE, MAX_ACCUMULATOR};

/// Collects arbitrary-length producer writes and cuts them into
/// [`FRAME_SIZE`]-aligned frames.
///
/// The caller (the engine handle) serialises access with a single lock;
/// the scheduler thread never touches this type.
pub struct FrameAccumulator {
    scratch: Vec<u8>,
    silence: u8,
}

impl FrameAccumulator {
    /// Creates an accumulator which pads flushed tails with `silence`.
    pub fn new(silence: u8) -> Self {
        Self {
            scratch: Vec::with_capacity(2 * FRAME_SIZE),
            silence,
        }
    }

    /// Appends producer bytes, handing every completed frame to `sink` in
    /// order. The sub-frame tail stays behind for the next call.
    ///
    /// Input is consumed in slices no larger than the free scratch space,
    /// so even an oversized write never grows the scratch past
    /// [`MAX_ACCUMULATOR`].
    pub fn buffer(&mut self, mut bytes: &[u8], pool: &FramePool, mut sink: impl FnMut(Frame)) {
        while !bytes.is_empty() {
            let room = MAX_ACCUMULATOR - self.scratch.len();
            let take = bytes.len().min(room);

            self.scratch.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];

            self.extract(pool, &mut sink);
        }
    }

    /// Pads the pending tail with the codec's silence byte and emits it as
    /// one final frame. No-op when no tail is pending.
    pub fn flush(&mut self, pool: &FramePool, mut sink: impl FnMut(Frame)) {
        if self.scratch.is_empty() {
            return;
        }

        let mut frame = pool.rent_filled(self.silence);
        frame[..self.scratch.len()].copy_from_slice(&self.scratch);
        self.scratch.clear();

        sink(frame);
    }

    /// Discards the pending tail. Used during barge-in.
    pub fn reset(&mut self) {
        self.scratch.clear();
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.scratch.len()
    }

    fn extract(&mut self, pool: &FramePool, sink: &mut impl FnMut(Frame)) {
        let mut start = 0;

        while self.scratch.len() - start >= FRAME_SIZE {
            let mut frame = pool.rent();
            frame.copy_from_slice(&self.scratch[start..start + FRAME_SIZE]);
            start += FRAME_SIZE;

            sink(frame);
        }

        if start > 0 {
            let tail = self.scratch.len() - start;
            self.scratch.copy_within(start.., 0);
            self.scratch.truncate(tail);
        }
    }
}
