//! Producer inter-arrival jitter tracking.

use crate::constants::{
    FRAME_LEN_MS,
    JITTER_EWMA_ALPHA,
    MAX_RESUME_THRESHOLD,
    MIN_RESUME_THRESHOLD,
};
use std::time::Instant;

/// EWMA of how far producer arrivals deviate from the ideal 20 ms cadence,
/// feeding the adaptive resume threshold: the choppier the producer, the
/// deeper the buffer required before playback resumes.
pub(crate) struct JitterStats {
    last_arrival: Option<Instant>,
    ewma_ms: f64,
}

impl JitterStats {
    pub fn new() -> Self {
        Self {
            last_arrival: None,
            ewma_ms: 0.0,
        }
    }

    /// Feeds one producer arrival; returns the updated resume threshold in
    /// frames.
    pub fn observe(&mut self, now: Instant) -> usize {
        if let Some(last) = self.last_arrival.replace(now) {
            let delta_ms = now.saturating_duration_since(last).as_secs_f64() * 1_000.0;
            let deviation = (delta_ms - FRAME_LEN_MS as f64).abs();

            self.ewma_ms =
                JITTER_EWMA_ALPHA * deviation + (1.0 - JITTER_EWMA_ALPHA) * self.ewma_ms;
        }

        self.adaptive_threshold()
    }

    /// Current resume threshold: one extra frame of buffer per 10 ms of
    /// smoothed deviation, clamped to the configured band.
    pub fn adaptive_threshold(&self) -> usize {
        let extra = (self.ewma_ms / 10.0) as usize;

        (MIN_RESUME_THRESHOLD + extra).min(MAX_RESUME_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn steady_cadence_keeps_the_minimum_threshold() {
        let mut stats = JitterStats::new();
        let start = Instant::now();

        for i in 0..50u64 {
            let threshold = stats.observe(start + Duration::from_millis(20 * i));
            assert_eq!(threshold, MIN_RESUME_THRESHOLD);
        }
    }

    #[test]
    fn bursty_arrivals_raise_the_threshold() {
        let mut stats = JitterStats::new();
        let start = Instant::now();

        // Frames delivered in pairs: 0 ms then 40 ms gaps, 20 ms deviation each.
        let mut now = start;
        let mut threshold = MIN_RESUME_THRESHOLD;
        for i in 0..40u64 {
            now += Duration::from_millis(if i % 2 == 0 { 0 } else { 40 });
            threshold = stats.observe(now);
        }

        assert!(threshold > MIN_RESUME_THRESHOLD);
        assert!(threshold <= MAX_RESUME_THRESHOLD);
    }

    #[test]
    fn threshold_never_exceeds_the_ceiling() {
        let mut stats = JitterStats::new();
        let start = Instant::now();

        for i in 0..20u64 {
            let threshold = stats.observe(start + Duration::from_millis(500 * i));
            assert!(threshold <= MAX_RESUME_THRESHOLD);
        }
        assert_eq!(stats.adaptive_threshold(), MAX_RESUME_THRESHOLD);
    }

    #[test]
    fn first_arrival_has_no_deviation() {
        let mut stats = JitterStats::new();
        assert_eq!(stats.observe(Instant::now()), MIN_RESUME_THRESHOLD);
    }
}
