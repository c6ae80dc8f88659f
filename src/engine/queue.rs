//! Epoch-stamped jitter queue between the producer and the scheduler.

use super::pool::{Frame, FramePool};
use crate::constants::{MAX_QUEUE, TRIM_TARGET};
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Overflow policy applied when the jitter queue reaches [`MAX_QUEUE`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum TrimPolicy {
    /// Drop the oldest queued frames down to [`TRIM_TARGET`], keeping the
    /// freshest audio.
    CapTrim,
    /// Drop the incoming frame, keeping what is already queued.
    Reject,
}

/// A frame awaiting playout, stamped with the barge-in epoch current at
/// enqueue time.
pub(crate) struct QueuedFrame {
    pub payload: Frame,
    pub epoch: u64,
}

/// Bounded FIFO of [`QueuedFrame`]s with a lock-free length mirror for the
/// scheduler's per-tick peek.
pub(crate) struct JitterQueue {
    inner: Mutex<VecDeque<QueuedFrame>>,
    len: AtomicUsize,
    policy: TrimPolicy,
}

impl JitterQueue {
    pub fn new(policy: TrimPolicy) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(64)),
            len: AtomicUsize::new(0),
            policy,
        }
    }

    /// Enqueues one frame. Returns the number of frames shed by the
    /// overflow policy (0 in the common case).
    pub fn push(&self, payload: Frame, epoch: u64, pool: &FramePool) -> usize {
        let mut inner = self.inner.lock();
        let mut shed = 0;

        if inner.len() >= MAX_QUEUE {
            match self.policy {
                TrimPolicy::CapTrim => {
                    while inner.len() > TRIM_TARGET {
                        if let Some(old) = inner.pop_front() {
                            pool.give(old.payload);
                            shed += 1;
                        }
                    }
                },
                TrimPolicy::Reject => {
                    pool.give(payload);
                    return 1;
                },
            }
        }

        inner.push_back(QueuedFrame { payload, epoch });
        self.len.store(inner.len(), Ordering::Release);

        shed
    }

    /// Removes and returns the queue head, if any.
    pub fn pop(&self) -> Option<QueuedFrame> {
        let mut inner = self.inner.lock();
        let out = inner.pop_front();
        self.len.store(inner.len(), Ordering::Release);
        out
    }

    /// Drops head frames whose epoch stamp does not match `epoch`,
    /// returning their count. Stops at the first current-epoch frame.
    pub fn drain_stale(&self, epoch: u64, pool: &FramePool) -> usize {
        let mut inner = self.inner.lock();
        let mut dropped = 0;

        while matches!(inner.front(), Some(head) if head.epoch != epoch) {
            if let Some(stale) = inner.pop_front() {
                pool.give(stale.payload);
                dropped += 1;
            }
        }

        self.len.store(inner.len(), Ordering::Release);
        dropped
    }

    /// Snapshot of the queue length without taking the lock.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns every queued frame to the pool. Used on barge-in and on
    /// session stop.
    pub fn drain_all(&self, pool: &FramePool) -> usize {
        let mut inner = self.inner.lock();
        let drained = inner.len();

        for frame in inner.drain(..) {
            pool.give(frame.payload);
        }
        self.len.store(0, Ordering::Release);

        drained
    }
}
