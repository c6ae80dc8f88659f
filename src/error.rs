//! Transport and engine error handling.

use std::{error::Error, fmt, io::Error as IoError};

/// Error returned when a [`Transport`] fails to emit a frame.
///
/// The engine never retries a failed frame — pacing integrity is paramount —
/// but counts consecutive failures toward the circuit breaker.
///
/// [`Transport`]: crate::Transport
#[derive(Debug)]
#[non_exhaustive]
pub enum SendError {
    /// Underlying socket or I/O fault.
    Io(IoError),
    /// The transport has been closed by its owner and will accept no
    /// further frames.
    Closed,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to send frame: ")?;
        match self {
            SendError::Io(e) => write!(f, "i/o error {}.", e),
            SendError::Closed => write!(f, "transport closed."),
        }
    }
}

impl Error for SendError {}

impl From<IoError> for SendError {
    fn from(e: IoError) -> Self {
        SendError::Io(e)
    }
}

/// Convenience type for transport error handling.
pub type SendResult = Result<(), SendError>;
