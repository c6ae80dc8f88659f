//! Outbound frame transport.
//!
//! The engine never constructs RTP headers or touches sockets itself; it
//! hands each paced frame to a [`Transport`]. The [`UdpRtpTransport`]
//! here is the reference implementation; SIP stacks which own their own
//! RTP session implement the trait instead.

mod udp;

pub use udp::UdpRtpTransport;

use crate::{constants::FRAME_SIZE, error::SendResult};

/// Sink for paced, frame-aligned G.711 payloads.
///
/// The engine guarantees exactly one complete frame per call, from a
/// single scheduler thread, and advances `timestamp` by
/// [`TIMESTAMP_STEP`] only when a send reports success.
///
/// [`TIMESTAMP_STEP`]: crate::constants::TIMESTAMP_STEP
pub trait Transport: Send {
    /// Emits one 20 ms frame stamped with the given RTP timestamp units
    /// and payload type (0 = PCMU, 8 = PCMA).
    ///
    /// Failures are counted toward the engine's circuit breaker; the
    /// frame itself is never retried.
    fn send_frame(&mut self, payload: &[u8; FRAME_SIZE], timestamp: u32, payload_type: u8)
        -> SendResult;
}
