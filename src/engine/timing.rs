//! Interruptible high-resolution tick waiting.

use crate::constants::{MAX_SLEEP, SPIN_HANDOVER};
use parking_lot::{Condvar, Mutex};
use spin_sleep::SpinSleeper;
use std::time::Instant;

/// Deadline sleeper for the scheduler thread.
///
/// The bulk of each wait parks on a condvar so barge-in can interrupt it
/// immediately; the final sub-2 ms region hands over to a spin sleeper for
/// sub-millisecond wake accuracy. Wakes are latched, so a `notify` landing
/// just before `wait_until` is never lost.
pub(crate) struct Waiter {
    wake_pending: Mutex<bool>,
    cond: Condvar,
    sleeper: SpinSleeper,
}

impl Waiter {
    pub fn new() -> Self {
        Self {
            wake_pending: Mutex::new(false),
            cond: Condvar::new(),
            sleeper: SpinSleeper::default(),
        }
    }

    /// Wakes the waiting scheduler thread immediately.
    pub fn notify(&self) {
        let mut pending = self.wake_pending.lock();
        *pending = true;
        self.cond.notify_one();
    }

    /// Sleeps until `deadline` (clamped to [`MAX_SLEEP`] from now) or until
    /// notified, whichever comes first. Returns `true` when woken by
    /// [`notify`].
    ///
    /// [`notify`]: Self::notify
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        let deadline = deadline.min(now + MAX_SLEEP);
        let coarse = deadline.checked_sub(SPIN_HANDOVER).unwrap_or(now);

        {
            let mut pending = self.wake_pending.lock();
            loop {
                if *pending {
                    *pending = false;
                    return true;
                }
                if Instant::now() >= coarse {
                    break;
                }
                // Spurious wakes are fine: the loop re-checks flag and clock.
                let _ = self.cond.wait_until(&mut pending, coarse);
            }
            if *pending {
                *pending = false;
                return true;
            }
        }

        let now = Instant::now();
        if deadline > now {
            self.sleeper.sleep(deadline - now);
        }

        let mut pending = self.wake_pending.lock();
        if *pending {
            *pending = false;
            true
        } else {
            false
        }
    }
}
