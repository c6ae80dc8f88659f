//! Per-tick playout decisions and the scheduler thread itself.

use super::{
    breaker::CircuitBreaker,
    fill::{silence_frame, TypingFiller},
    Shared,
};
use crate::{
    constants::*,
    events::{EventSink, PlayoutEvent},
    transport::Transport,
};
use parking_lot::Mutex;
use std::{
    sync::{atomic::Ordering, Arc},
    time::Instant,
};
use tracing::{debug, error, instrument, trace};

#[cfg(test)]
use super::test_impls::TickStyle;

/// Consumer-side playback state.
///
/// The engine starts `Buffering` and returns there after every underrun
/// and every barge-in; `Playing` drains one queued frame per tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PlayoutState {
    Buffering,
    Playing,
}

pub(crate) struct PlayoutTask {
    shared: Arc<Shared>,
    transport: Arc<Mutex<Box<dyn Transport>>>,
    sink: Arc<dyn EventSink>,
    state: PlayoutState,
    silence: [u8; FRAME_SIZE],
    filler: TypingFiller,
    breaker: CircuitBreaker,
    timestamp: u32,
    payload_type: u8,
    next_tick: Instant,
}

impl PlayoutTask {
    fn new(
        shared: Arc<Shared>,
        transport: Arc<Mutex<Box<dyn Transport>>>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let codec = shared.config.codec;

        Self {
            state: PlayoutState::Buffering,
            silence: silence_frame(codec),
            filler: TypingFiller::new(codec),
            breaker: CircuitBreaker::new(),
            timestamp: shared.rtp_timestamp.load(Ordering::Relaxed),
            payload_type: codec.payload_type(),
            next_tick: Instant::now(),
            shared,
            transport,
            sink,
        }
    }

    fn run(&mut self) {
        #[cfg(test)]
        {
            if let TickStyle::UntimedWithExecLimit(ticks, done) =
                self.shared.config.tick_style.clone()
            {
                self.run_scripted(&ticks, &done);
                return;
            }
        }

        self.run_timed();
    }

    fn run_timed(&mut self) {
        self.next_tick = Instant::now();

        while self.shared.running.load(Ordering::Acquire) {
            if self.shared.clear_requested.load(Ordering::Acquire) {
                self.execute_clear();
            }

            // Park until the tick deadline, servicing any barge-in that
            // lands mid-wait without losing the remaining sleep.
            loop {
                if Instant::now() >= self.next_tick {
                    break;
                }
                self.shared.waiter.wait_until(self.next_tick);

                if !self.shared.running.load(Ordering::Acquire) {
                    return;
                }
                if self.shared.clear_requested.load(Ordering::Acquire) {
                    self.execute_clear();
                }
            }

            self.tick_once();
            self.next_tick += TIMESTEP_LENGTH;

            let now = Instant::now();
            if now.saturating_duration_since(self.next_tick) > MAX_DRIFT {
                debug!("Playout fell behind by over {:?}: resynchronising.", MAX_DRIFT);
                self.next_tick = now + TIMESTEP_LENGTH;
            }
        }
    }

    /// Scripted execution for tests: ticks run back-to-back on demand, and
    /// each executed batch is acknowledged so tests stay deterministic.
    #[cfg(test)]
    fn run_scripted(&mut self, ticks: &flume::Receiver<u64>, done: &flume::Sender<u64>) {
        use std::time::Duration;

        while self.shared.running.load(Ordering::Acquire) {
            match ticks.recv_timeout(Duration::from_millis(20)) {
                Ok(n) => {
                    for _ in 0..n {
                        if self.shared.clear_requested.load(Ordering::Acquire) {
                            self.execute_clear();
                        }
                        self.tick_once();
                    }
                    drop(done.send(n));
                },
                Err(flume::RecvTimeoutError::Timeout) => {},
                Err(flume::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn tick_once(&mut self) {
        let epoch = self.shared.epoch.load(Ordering::Acquire);

        let stale = self.shared.queue.drain_stale(epoch, &self.shared.pool);
        if stale > 0 {
            debug!("Dropped {} stale frame(s) at the playout head.", stale);
        }

        let queue_len = self.shared.queue.len();

        if self.state == PlayoutState::Buffering {
            let threshold = if self.shared.has_played_audio.load(Ordering::Acquire)
                || self.shared.had_played_before_clear.load(Ordering::Acquire)
            {
                self.shared.adaptive_resume.load(Ordering::Acquire)
            } else {
                COLD_START_THRESHOLD
            };

            if queue_len < threshold {
                self.emit_fill();
                return;
            }

            trace!("Buffered {} frame(s) (threshold {}): playing.", queue_len, threshold);
            self.state = PlayoutState::Playing;
            self.shared.has_played_audio.store(true, Ordering::Release);
        }

        match self.shared.queue.pop() {
            Some(frame) if frame.epoch != epoch => {
                // Lost a race with a barge-in between the drain above and
                // this pop; treat the frame as already purged.
                self.shared.pool.give(frame.payload);
                let silence = self.silence;
                self.emit(&silence);
            },
            Some(frame) => {
                self.emit(&frame.payload);
                self.shared.pool.give(frame.payload);

                if self.shared.queue.len() == 0 {
                    trace!("Jitter queue ran dry: rebuffering.");
                    self.state = PlayoutState::Buffering;
                    self.sink.dispatch(PlayoutEvent::QueueEmpty);
                }
            },
            None => {
                self.state = PlayoutState::Buffering;
                let silence = self.silence;
                self.emit(&silence);

                if self.shared.has_played_audio.load(Ordering::Acquire) {
                    self.sink.dispatch(PlayoutEvent::QueueEmpty);
                }
            },
        }
    }

    fn emit_fill(&mut self) {
        let typing = self.shared.typing_sounds.load(Ordering::Acquire)
            && !self.shared.has_played_audio.load(Ordering::Acquire)
            && (self.shared.config.typing_after_interrupt
                || !self.shared.interrupted.load(Ordering::Acquire));

        if typing {
            let mut frame = self.silence;
            self.filler.next_frame(&mut frame);
            self.emit(&frame);
        } else {
            let silence = self.silence;
            self.emit(&silence);
        }
    }

    /// Hands one frame to the transport, advancing the RTP timestamp only
    /// on success so the timestamp clock stays aligned with wall time.
    fn emit(&mut self, payload: &[u8; FRAME_SIZE]) {
        if self.breaker.is_tripped() {
            return;
        }

        let result = self
            .transport
            .lock()
            .send_frame(payload, self.timestamp, self.payload_type);

        match result {
            Ok(()) => {
                self.breaker.record_success();
                self.shared.send_errors.store(0, Ordering::Release);

                self.timestamp = self.timestamp.wrapping_add(TIMESTAMP_STEP);
                self.shared.rtp_timestamp.store(self.timestamp, Ordering::Relaxed);
            },
            Err(e) => {
                error!("Frame send failed: {}", e);
                let tripped = self.breaker.record_failure();
                self.shared
                    .send_errors
                    .store(self.breaker.failures(), Ordering::Release);

                if tripped {
                    let message = format!(
                        "circuit breaker tripped after {} consecutive send failures",
                        MAX_SEND_ERRORS
                    );
                    error!("{}", message);
                    self.sink
                        .dispatch(PlayoutEvent::CircuitBreakerTripped(message));
                }
            },
        }
    }

    /// Barge-in servicing, run on the scheduler thread. The caller already
    /// bumped the epoch and reset the accumulator before raising the flag.
    ///
    /// The barge-in markers live in [`Shared`] so a `stop()`/`start()`
    /// restart of the same session cannot re-arm the typing filler or
    /// regress to cold-start thresholds.
    fn execute_clear(&mut self) {
        let has_played = self.shared.has_played_audio.swap(false, Ordering::AcqRel);
        self.shared
            .had_played_before_clear
            .fetch_or(has_played, Ordering::AcqRel);
        self.shared.interrupted.store(true, Ordering::Release);

        let drained = self.shared.queue.drain_all(&self.shared.pool);
        self.filler.reset();
        self.state = PlayoutState::Buffering;
        self.shared.clear_requested.store(false, Ordering::Release);

        debug!("Barge-in clear: drained {} queued frame(s).", drained);
    }
}

/// The playout scheduler is a synchronous context due to its hard 20 ms
/// deadline: it owns the transport and the playback-side state for the
/// lifetime of one `start()`/`stop()` run.
#[instrument(skip(shared, transport, sink))]
pub(crate) fn runner(
    shared: Arc<Shared>,
    transport: Arc<Mutex<Box<dyn Transport>>>,
    sink: Arc<dyn EventSink>,
) {
    trace!("Playout scheduler started.");

    let mut task = PlayoutTask::new(shared, transport, sink);
    task.run();

    trace!("Playout scheduler stopped.");
}
