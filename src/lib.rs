#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
//! Warbler is a real-time playout engine for SIP-connected voice calls,
//! written in Rust. The library offers:
//!  * A jitter-buffered playout core which emits exactly one 20 ms G.711
//!    frame per 20 ms of wall-clock time, however irregularly audio
//!    arrives from its producer.
//!  * Instantaneous barge-in: queued audio is purged epoch-wise without
//!    clicks or timing drift when the caller starts speaking.
//!  * Adaptive buffering, typing-sound fill for cold starts, and a
//!    circuit breaker over transport failures.
//!  * A reference RTP-over-UDP [`Transport`], with the trait left open
//!    for SIP stacks that own their own packetisation.
//!
//! ## Threading
//! One dedicated scheduler thread owns pacing and the transport; any
//! number of producer threads may call [`PlayoutEngine::write`],
//! [`PlayoutEngine::clear`], and friends. See the [`engine`] module docs
//! for the full model.
//!
//! ## Codec support
//! G.711 µ-law (PCMU) and A-law (PCMA), 8 kHz mono, one byte per sample.
//! Frames are treated as opaque 160-byte blocks throughout the core.

#![warn(clippy::pedantic, rust_2018_idioms)]
#![allow(
    // Allowed as they are too pedantic
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod codec;
mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod transport;

pub use crate::{
    codec::Codec,
    config::Config,
    engine::{PlayoutEngine, TrimPolicy},
    error::{SendError, SendResult},
    events::{EventSink, NullSink, PlayoutEvent},
    transport::{Transport, UdpRtpTransport},
};
