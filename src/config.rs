use crate::{codec::Codec, engine::TrimPolicy};

#[cfg(test)]
use crate::engine::test_impls::TickStyle;

/// Configuration for a playout engine instance.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
    /// Negotiated G.711 variant for the session.
    ///
    /// Fixes the silence byte and the RTP payload type stamped on every
    /// outbound frame.
    ///
    /// Defaults to [`Codec::Pcmu`].
    pub codec: Codec,
    /// Whether the cold-start fill frames use the typing-sound generator
    /// rather than plain silence.
    ///
    /// Can also be toggled at runtime via
    /// [`PlayoutEngine::set_typing_sounds`].
    ///
    /// Defaults to `true`.
    ///
    /// [`PlayoutEngine::set_typing_sounds`]: crate::PlayoutEngine::set_typing_sounds
    pub typing_sounds: bool,
    /// Whether typing-sound fill may resume after a barge-in.
    ///
    /// The strict (default) behaviour plays the typing filler only before
    /// any real audio and before any interruption; legacy call flows which
    /// expect filler between AI turns can loosen this.
    ///
    /// Defaults to `false`.
    pub typing_after_interrupt: bool,
    /// Overflow policy applied when the jitter queue reaches its cap.
    ///
    /// Defaults to [`TrimPolicy::CapTrim`].
    pub trim_policy: TrimPolicy,
    /// Number of frame buffers to preallocate in the pool.
    ///
    /// This should sit at, or just above, the steady-state queue depth you
    /// expect; exceeding it merely costs a heap allocation per extra frame.
    ///
    /// Defaults to `32`.
    pub preallocated_frames: usize,

    // Test only attributes
    #[cfg(test)]
    /// Test config to offer precise control over scheduler tick rate/count.
    pub(crate) tick_style: TickStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            codec: Codec::Pcmu,
            typing_sounds: true,
            typing_after_interrupt: false,
            trim_policy: TrimPolicy::CapTrim,
            preallocated_frames: 32,
            #[cfg(test)]
            tick_style: TickStyle::Timed,
        }
    }
}

impl Config {
    /// Sets this `Config`'s G.711 codec variant.
    #[must_use]
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Sets this `Config`'s initial typing-sound enablement.
    #[must_use]
    pub fn typing_sounds(mut self, typing_sounds: bool) -> Self {
        self.typing_sounds = typing_sounds;
        self
    }

    /// Sets this `Config`'s post-barge-in typing-sound behaviour.
    #[must_use]
    pub fn typing_after_interrupt(mut self, typing_after_interrupt: bool) -> Self {
        self.typing_after_interrupt = typing_after_interrupt;
        self
    }

    /// Sets this `Config`'s queue overflow policy.
    #[must_use]
    pub fn trim_policy(mut self, trim_policy: TrimPolicy) -> Self {
        self.trim_policy = trim_policy;
        self
    }

    /// Sets this `Config`'s number of preallocated frame buffers.
    #[must_use]
    pub fn preallocated_frames(mut self, preallocated_frames: usize) -> Self {
        self.preallocated_frames = preallocated_frames;
        self
    }
}

// Test only attributes
#[cfg(test)]
impl Config {
    #![allow(missing_docs)]

    #[must_use]
    pub(crate) fn tick_style(mut self, tick_style: TickStyle) -> Self {
        self.tick_style = tick_style;
        self
    }
}
