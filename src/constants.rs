//! Constants affecting framing, pacing, and playout thresholds.

use std::time::Duration;

/// Sample rate of G.711 telephony audio.
pub const SAMPLE_RATE_RAW: usize = 8_000;

/// Number of audio frames/packets to be sent per second.
pub const AUDIO_FRAME_RATE: usize = 50;

/// Length of time between any two audio frames.
pub const TIMESTEP_LENGTH: Duration = Duration::from_millis(1000 / AUDIO_FRAME_RATE as u64);

/// Length (in milliseconds) of any audio frame.
pub const FRAME_LEN_MS: usize = 1000 / AUDIO_FRAME_RATE;

/// Number of bytes in one complete frame of G.711 audio.
///
/// G.711 carries one byte per sample, so this is equally the number of
/// samples per frame and the RTP timestamp step per frame.
pub const FRAME_SIZE: usize = SAMPLE_RATE_RAW / AUDIO_FRAME_RATE;

/// RTP timestamp units to advance per emitted frame.
pub const TIMESTAMP_STEP: u32 = FRAME_SIZE as u32;

/// Maximum number of frames held in the jitter queue (~8s of audio).
pub const MAX_QUEUE: usize = 400;

/// Low-water mark restored by the cap-trim overflow policy.
pub const TRIM_TARGET: usize = 200;

/// Maximum number of unframed bytes held by the accumulator.
pub const MAX_ACCUMULATOR: usize = 65_536;

/// Queued frames required before the first audio emission of a session.
pub const COLD_START_THRESHOLD: usize = 4;

/// Minimum queued frames required to resume after a mid-call underrun.
pub const MIN_RESUME_THRESHOLD: usize = 5;

/// Ceiling on the adaptive resume threshold.
pub const MAX_RESUME_THRESHOLD: usize = 10;

/// Consecutive send failures after which the circuit breaker trips.
pub const MAX_SEND_ERRORS: u32 = 10;

/// Smoothing factor for the producer inter-arrival jitter EWMA.
pub const JITTER_EWMA_ALPHA: f64 = 0.15;

/// Hard ceiling on any single scheduler sleep.
pub const MAX_SLEEP: Duration = Duration::from_millis(100);

/// Drift past the tick deadline after which the scheduler resynchronises
/// to the wall clock rather than trying to catch up.
pub const MAX_DRIFT: Duration = Duration::from_millis(100);

/// Time allowed for the scheduler thread to exit during `stop()`.
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Margin before each tick deadline where the condvar wait hands over to
/// the spin sleeper. Must stay below the 2 ms barge-in wake budget.
pub(crate) const SPIN_HANDOVER: Duration = Duration::from_micros(1_500);
