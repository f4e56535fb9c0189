use crate::State;
use thiserror::Error;

/// Errors that can occur when driving or reading an invocation [`Handle`](crate::Handle).
#[derive(Error, Debug)]
pub enum RolegateInvocationError {
    /// A raw state value outside of the defined states.
    #[error("Unknown handle state: {0}")]
    InvalidState(u8),

    /// An attempt to move a handle back to an earlier state.
    #[error("Handle cannot move from {from} back to {to}")]
    Rollback {
        /// The handle's current state.
        from: State,
        /// The rejected state.
        to: State,
    },

    /// A result was read before the service completed.
    #[error("Service has not yet completed (currently {state})")]
    NotCompleted {
        /// The handle's current state.
        state: State,
    },

    /// A result was published after the service completed.
    #[error("Service has already completed")]
    AlreadyCompleted,

    /// The service completed without publishing a result, or the result
    /// has already been read.
    #[error("Service provided no results")]
    NoResult,

    /// The declared size of the result does not match the requested type.
    #[error("Service results are not {expected} bytes (declared {declared})")]
    WrongWidth {
        /// Width of the requested type in bytes.
        expected: usize,
        /// Declared size of the result; `-1` for a stream of unknown size.
        declared: i64,
    },

    /// The handle has no transport connected.
    #[error("Handle has no {0} stream connected")]
    NotConnected(&'static str),

    /// The result is not valid UTF-8.
    #[error("Service results are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Reading the result or a stream failed.
    #[error("Stream error: {0}")]
    Io(#[from] std::io::Error),

    /// The runner was unable to start the service body.
    #[error("Unable to start service '{service}': {reason}")]
    Spawn {
        /// Name of the service.
        service: String,
        /// Description of the failure.
        reason: String,
    },
}

/// Errors reported by a service body.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The body misused its handle.
    #[error(transparent)]
    Invocation(#[from] RolegateInvocationError),

    /// The body's transport failed.
    #[error("Service I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The body gave up for a reason of its own.
    #[error("Service failed: {0}")]
    Failed(String),
}
