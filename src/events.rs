//! Events emitted by the playout engine toward the session layer.

/// Classes of event fired by the scheduler thread.
///
/// Events are advisory: the engine keeps running after every one of them,
/// leaving teardown decisions (e.g., ending the SIP dialog after a breaker
/// trip) to the session layer.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PlayoutEvent {
    /// The jitter queue ran dry while audio was playing; the engine has
    /// returned to buffering and is emitting fill frames.
    QueueEmpty,
    /// The circuit breaker latched after too many consecutive send
    /// failures. Fired once per trip; `stop()` + `start()` rearms it.
    CircuitBreakerTripped(String),
    /// Advisory engine log line — overflow shedding and similar policy
    /// decisions the session layer may want to surface.
    EngineLog(String),
}

/// Receiver of [`PlayoutEvent`]s, implemented by the session layer.
///
/// Dispatch happens on the scheduler thread between frame deadlines:
/// implementations **must not block**, or audio pacing will suffer.
pub trait EventSink: Send + Sync {
    /// Respond to one engine event.
    fn dispatch(&self, event: PlayoutEvent);
}

/// Channel-backed sink: events are forwarded to a [`flume`] receiver held
/// by the session layer, decoupling handling from the scheduler thread.
impl EventSink for flume::Sender<PlayoutEvent> {
    fn dispatch(&self, event: PlayoutEvent) {
        // Other side may not be listening: this is fine.
        drop(self.send(event));
    }
}

/// Sink which discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn dispatch(&self, _event: PlayoutEvent) {}
}
