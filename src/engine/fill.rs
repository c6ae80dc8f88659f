//! Silence and typing-sound fill frames.
//!
//! During cold-start buffering the engine still owes the RTP session one
//! frame per tick. Plain silence is always safe; optionally the filler
//! below models a subtle keyboard rhythm so early callers hear "someone
//! typing" rather than dead air while the remote AI composes its reply.

use crate::{codec::Codec, constants::FRAME_SIZE};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Base peak amplitude of one key tap, PCM16 scale.
const TAP_AMPLITUDE: f32 = 1_200.0;

/// Geometric decay applied per sample within a tap.
const TAP_DECAY: f32 = 0.65;

/// Builds the pre-computed all-silence frame for a codec variant.
pub(crate) fn silence_frame(codec: Codec) -> [u8; FRAME_SIZE] {
    [codec.silence_byte(); FRAME_SIZE]
}

enum FillerPhase {
    /// The next frame renders one tap; `taps_left` includes it.
    Tap { taps_left: u8, amplitude: f32 },
    /// Silent frames between taps of one burst.
    BetweenClicks {
        frames_left: u8,
        taps_left: u8,
        amplitude: f32,
    },
    /// Silent frames between bursts.
    Pausing { frames_left: u8 },
}

/// Finite-state generator of G.711-encoded typing-sound frames.
///
/// A burst carries 2–4 taps of 8–12 samples each, decaying geometrically
/// and modulated by white noise; bursts are separated by 20–35 silent
/// frames, taps within a burst by 5–8.
pub struct TypingFiller {
    codec: Codec,
    silence: u8,
    rng: SmallRng,
    phase: FillerPhase,
}

impl TypingFiller {
    pub(crate) fn new(codec: Codec) -> Self {
        Self::with_rng(codec, SmallRng::from_entropy())
    }

    /// Deterministic construction for tests and benches.
    #[cfg(any(test, feature = "internals"))]
    pub fn seeded(codec: Codec, seed: u64) -> Self {
        Self::with_rng(codec, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(codec: Codec, rng: SmallRng) -> Self {
        let mut filler = Self {
            codec,
            silence: codec.silence_byte(),
            rng,
            phase: FillerPhase::Pausing { frames_left: 0 },
        };
        filler.reset();

        filler
    }

    /// Restarts the rhythm from a short lead-in of silence.
    pub fn reset(&mut self) {
        let frames_left = self.rng.gen_range(2..=6);
        self.phase = FillerPhase::Pausing { frames_left };
    }

    /// Renders the next 20 ms filler frame into `out`.
    pub fn next_frame(&mut self, out: &mut [u8; FRAME_SIZE]) {
        out.fill(self.silence);

        let phase = std::mem::replace(&mut self.phase, FillerPhase::Pausing { frames_left: 0 });
        self.phase = match phase {
            FillerPhase::Tap {
                taps_left,
                amplitude,
            } => {
                self.render_tap(out, amplitude);

                let taps_left = taps_left - 1;
                if taps_left == 0 {
                    FillerPhase::Pausing {
                        frames_left: self.rng.gen_range(20..=35),
                    }
                } else {
                    FillerPhase::BetweenClicks {
                        frames_left: self.rng.gen_range(5..=8),
                        taps_left,
                        amplitude,
                    }
                }
            },
            FillerPhase::BetweenClicks {
                frames_left,
                taps_left,
                amplitude,
            } => {
                if frames_left > 1 {
                    FillerPhase::BetweenClicks {
                        frames_left: frames_left - 1,
                        taps_left,
                        amplitude,
                    }
                } else {
                    FillerPhase::Tap {
                        taps_left,
                        amplitude,
                    }
                }
            },
            FillerPhase::Pausing { frames_left } => {
                if frames_left > 1 {
                    FillerPhase::Pausing {
                        frames_left: frames_left - 1,
                    }
                } else {
                    FillerPhase::Tap {
                        taps_left: self.rng.gen_range(2..=4),
                        amplitude: TAP_AMPLITUDE * self.rng.gen_range(0.8..=1.2),
                    }
                }
            },
        };
    }

    fn render_tap(&mut self, out: &mut [u8; FRAME_SIZE], amplitude: f32) {
        let tap_len = self.rng.gen_range(8..=12);

        let mut level = amplitude;
        for slot in out.iter_mut().take(tap_len) {
            let noise: f32 = self.rng.gen_range(-1.0..=1.0);
            *slot = self.codec.encode_pcm16((level * noise) as i16);
            level *= TAP_DECAY;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_silence(frame: &[u8; FRAME_SIZE], silence: u8) -> bool {
        frame.iter().all(|&b| b == silence)
    }

    #[test]
    fn taps_appear_after_the_lead_in() {
        let mut filler = TypingFiller::seeded(Codec::Pcmu, 7);
        let mut frame = [0u8; FRAME_SIZE];

        let mut saw_tap = false;
        for _ in 0..8 {
            filler.next_frame(&mut frame);
            saw_tap |= !is_silence(&frame, 0xFF);
        }

        assert!(saw_tap, "a burst should start within the lead-in + 1 frame");
    }

    #[test]
    fn taps_touch_only_the_frame_head() {
        let mut filler = TypingFiller::seeded(Codec::Pcma, 11);
        let mut frame = [0u8; FRAME_SIZE];

        for _ in 0..64 {
            filler.next_frame(&mut frame);
            assert!(
                frame[12..].iter().all(|&b| b == 0xD5),
                "tap energy is confined to the first 12 samples"
            );
        }
    }

    #[test]
    fn reset_restarts_the_rhythm() {
        let mut a = TypingFiller::seeded(Codec::Pcmu, 3);
        let mut b = TypingFiller::seeded(Codec::Pcmu, 3);

        let mut frame = [0u8; FRAME_SIZE];
        for _ in 0..10 {
            a.next_frame(&mut frame);
        }

        // Burn the same number of RNG draws out of both, then re-seed
        // expectations by only checking structural behaviour: after reset
        // the generator is silent for its whole lead-in.
        a.reset();
        b.reset();

        a.next_frame(&mut frame);
        assert!(is_silence(&frame, 0xFF));
        b.next_frame(&mut frame);
        assert!(is_silence(&frame, 0xFF));
    }

    #[test]
    fn bursts_are_separated_by_long_pauses() {
        let mut filler = TypingFiller::seeded(Codec::Pcmu, 99);
        let mut frame = [0u8; FRAME_SIZE];

        // Find the end of the first burst, then count silence until the next tap.
        let mut last_tap_at = None;
        let mut gaps = Vec::new();
        for i in 0..400usize {
            filler.next_frame(&mut frame);
            if !is_silence(&frame, 0xFF) {
                if let Some(last) = last_tap_at {
                    gaps.push(i - last - 1);
                }
                last_tap_at = Some(i);
            }
        }

        assert!(gaps.iter().any(|&g| g >= 20), "inter-burst pauses exist");
        assert!(gaps.iter().all(|&g| g >= 5), "taps never run back-to-back");
    }
}
