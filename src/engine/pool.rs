//! Fixed-size frame buffers recycled between the producer and scheduler.

use crate::constants::{FRAME_SIZE, MAX_QUEUE};
use parking_lot::Mutex;

/// One frame of G.711 audio: exactly [`FRAME_SIZE`] opaque bytes.
///
/// Ownership is exclusive — a frame is in the accumulator, the queue, the
/// scheduler's hands, or the pool, never shared.
pub type Frame = Box<[u8; FRAME_SIZE]>;

/// Freelist of frame buffers, bounded so a drained backlog cannot pin
/// memory for the rest of the session.
pub struct FramePool {
    free: Mutex<Vec<Frame>>,
    cap: usize,
}

impl FramePool {
    /// Creates a pool with `prealloc` buffers ready to rent.
    pub fn new(prealloc: usize) -> Self {
        let cap = MAX_QUEUE + 16;
        let prealloc = prealloc.min(cap);

        let mut free = Vec::with_capacity(prealloc);
        free.resize_with(prealloc, || Box::new([0u8; FRAME_SIZE]));

        Self {
            free: Mutex::new(free),
            cap,
        }
    }

    /// Rents a frame with unspecified contents.
    pub fn rent(&self) -> Frame {
        self.free
            .lock()
            .pop()
            .unwrap_or_else(|| Box::new([0u8; FRAME_SIZE]))
    }

    /// Rents a frame pre-filled with `byte`.
    pub fn rent_filled(&self, byte: u8) -> Frame {
        let mut frame = self.rent();
        frame.fill(byte);
        frame
    }

    /// Returns a frame to the freelist, dropping it when the pool is full.
    pub fn give(&self, frame: Frame) {
        let mut free = self.free.lock();
        if free.len() < self.cap {
            free.push(frame);
        }
    }

    #[cfg(test)]
    pub(crate) fn free_len(&self) -> usize {
        self.free.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_and_give_recycle_buffers() {
        let pool = FramePool::new(2);
        assert_eq!(pool.free_len(), 2);

        let a = pool.rent();
        let b = pool.rent();
        let c = pool.rent();
        assert_eq!(pool.free_len(), 0);

        pool.give(a);
        pool.give(b);
        pool.give(c);
        assert_eq!(pool.free_len(), 3);
    }

    #[test]
    fn rent_filled_sets_every_byte() {
        let pool = FramePool::new(1);
        let frame = pool.rent_filled(0xD5);
        assert!(frame.iter().all(|&b| b == 0xD5));
    }

    #[test]
    fn pool_never_grows_past_cap() {
        let pool = FramePool::new(0);
        for _ in 0..(MAX_QUEUE + 64) {
            pool.give(Box::new([0u8; FRAME_SIZE]));
        }
        assert_eq!(pool.free_len(), MAX_QUEUE + 16);
    }
}
