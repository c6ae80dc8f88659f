//! The playout engine: a paced scheduler thread over a jitter queue.
//!
//! The engine is a mixed-threading system, using:
//!  * Producer threads (e.g., the AI transport reader) which write raw
//!    G.711 bytes, flush, and barge-in. These calls are infallible and
//!    never block beyond a short accumulator lock.
//!  * A dedicated synchronous scheduler thread which emits exactly one
//!    160-byte frame onto the transport every 20 ms, buffering, filling,
//!    and purging as the state machine dictates.
//!
//! This splits up work according to its nature, preventing frame emission
//! from being delayed past its deadline by producer-side work.

mod accumulator;
mod breaker;
mod fill;
mod jitter;
mod pool;
mod queue;
mod state;
#[cfg(test)]
pub(crate) mod test_impls;
mod timing;

pub use queue::TrimPolicy;

/// Internals exposed for the criterion benches.
#[cfg(feature = "internals")]
pub mod bench_internals {
    pub use super::{
        accumulator::FrameAccumulator,
        fill::TypingFiller,
        pool::{Frame, FramePool},
    };
}

use crate::{
    config::Config,
    constants::*,
    events::{EventSink, PlayoutEvent},
    transport::Transport,
};
use accumulator::FrameAccumulator;
use jitter::JitterStats;
use parking_lot::Mutex;
use pool::FramePool;
use queue::JitterQueue;
use rand::random;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use timing::Waiter;
use tracing::{debug, warn};

/// State shared between the engine handle (producer side) and the
/// scheduler thread.
pub(crate) struct Shared {
    pub config: Config,
    pub accumulator: Mutex<FrameAccumulator>,
    pub queue: JitterQueue,
    pub pool: FramePool,
    pub epoch: AtomicU64,
    pub clear_requested: AtomicBool,
    pub running: AtomicBool,
    pub has_played_audio: AtomicBool,
    pub had_played_before_clear: AtomicBool,
    pub interrupted: AtomicBool,
    pub typing_sounds: AtomicBool,
    pub adaptive_resume: AtomicUsize,
    pub send_errors: AtomicU32,
    pub rtp_timestamp: AtomicU32,
    pub jitter: Mutex<JitterStats>,
    pub waiter: Waiter,
}

/// The control object for one session's outbound audio, handling frame
/// accumulation, jitter buffering, paced emission, and barge-in.
///
/// All methods may be called from any thread. Producer-facing operations
/// (`write`, `flush`, `clear`) are infallible best-effort: overflow is
/// shed by policy and surfaced through [`PlayoutEvent::EngineLog`].
pub struct PlayoutEngine {
    shared: Arc<Shared>,
    transport: Arc<Mutex<Box<dyn Transport>>>,
    sink: Arc<dyn EventSink>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PlayoutEngine {
    /// Creates a new engine over the given transport and event sink.
    ///
    /// The scheduler thread is not spawned until [`start`].
    ///
    /// [`start`]: Self::start
    pub fn new<T, S>(config: Config, transport: T, sink: S) -> Self
    where
        T: Transport + 'static,
        S: EventSink + 'static,
    {
        let shared = Arc::new(Shared {
            accumulator: Mutex::new(FrameAccumulator::new(config.codec.silence_byte())),
            queue: JitterQueue::new(config.trim_policy),
            pool: FramePool::new(config.preallocated_frames),
            epoch: AtomicU64::new(0),
            clear_requested: AtomicBool::new(false),
            running: AtomicBool::new(false),
            has_played_audio: AtomicBool::new(false),
            had_played_before_clear: AtomicBool::new(false),
            interrupted: AtomicBool::new(false),
            typing_sounds: AtomicBool::new(config.typing_sounds),
            adaptive_resume: AtomicUsize::new(MIN_RESUME_THRESHOLD),
            send_errors: AtomicU32::new(0),
            rtp_timestamp: AtomicU32::new(random::<u32>()),
            jitter: Mutex::new(JitterStats::new()),
            waiter: Waiter::new(),
            config,
        });

        Self {
            shared,
            transport: Arc::new(Mutex::new(Box::new(transport))),
            sink: Arc::new(sink),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the scheduler thread. Idempotent while already running.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let transport = Arc::clone(&self.transport);
        let sink = Arc::clone(&self.sink);

        let handle = thread::Builder::new()
            .name("warbler-playout".into())
            .spawn(move || state::runner(shared, transport, sink))
            .expect("Failed to spawn playout scheduler thread.");

        *self.worker.lock() = Some(handle);
    }

    /// Stops the scheduler thread and drains the queue. Idempotent.
    ///
    /// The thread is joined with a bounded wait; a wedged transport cannot
    /// hang the caller for longer than [`STOP_JOIN_TIMEOUT`].
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        self.shared.waiter.notify();

        if let Some(handle) = self.worker.lock().take() {
            let deadline = Instant::now() + STOP_JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }

            if handle.is_finished() {
                drop(handle.join());
            } else {
                warn!("Playout scheduler did not stop within {:?}; detaching.", STOP_JOIN_TIMEOUT);
            }
        }

        let drained = self.shared.queue.drain_all(&self.shared.pool);
        if drained > 0 {
            debug!("Stop drained {} queued frame(s).", drained);
        }
    }

    /// Producer entry point: appends raw G.711 bytes, enqueueing every
    /// completed 160-byte frame. Sub-frame tails wait for the next write.
    pub fn write(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let threshold = self.shared.jitter.lock().observe(Instant::now());
        self.shared
            .adaptive_resume
            .store(threshold, Ordering::Release);

        let mut shed = 0;
        {
            let shared = &self.shared;
            let mut accumulator = shared.accumulator.lock();
            accumulator.buffer(bytes, &shared.pool, |frame| {
                let epoch = shared.epoch.load(Ordering::Acquire);
                shed += shared.queue.push(frame, epoch, &shared.pool);
            });
        }

        if shed > 0 {
            self.log_overflow(shed);
        }
    }

    /// Pads and enqueues the pending sub-frame tail, if any.
    pub fn flush(&self) {
        let mut shed = 0;
        {
            let shared = &self.shared;
            let mut accumulator = shared.accumulator.lock();
            accumulator.flush(&shared.pool, |frame| {
                let epoch = shared.epoch.load(Ordering::Acquire);
                shed += shared.queue.push(frame, epoch, &shared.pool);
            });
        }

        if shed > 0 {
            self.log_overflow(shed);
        }
    }

    /// Atomic barge-in: all audio accepted before this call is purged and
    /// will never reach the transport after the scheduler services the
    /// clear (within one wake, ≤ 2 ms).
    pub fn clear(&self) {
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        self.shared.accumulator.lock().reset();
        self.shared.clear_requested.store(true, Ordering::Release);
        self.shared.waiter.notify();
    }

    /// Enables or disables typing-sound fill during cold start.
    pub fn set_typing_sounds(&self, enabled: bool) {
        self.shared.typing_sounds.store(enabled, Ordering::Release);
    }

    /// Snapshot of queued, unplayed frames (telemetry).
    #[must_use]
    pub fn queued_frames(&self) -> usize {
        self.shared.queue.len()
    }

    /// Current consecutive send-failure count (telemetry).
    #[must_use]
    pub fn send_error_count(&self) -> u32 {
        self.shared.send_errors.load(Ordering::Acquire)
    }

    fn log_overflow(&self, shed: usize) {
        warn!("Jitter queue overflow: shed {} frame(s).", shed);
        self.sink.dispatch(PlayoutEvent::EngineLog(format!(
            "queue overflow: shed {} frame(s)",
            shed
        )));
    }
}

impl Drop for PlayoutEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
