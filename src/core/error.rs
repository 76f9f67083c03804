//! Exposes the fencepost error type

use std::sync::PoisonError;

use thiserror::Error;

use crate::core::queue::QueueType;

/// Error type that fencepost can return.
#[derive(Error, Debug)]
pub enum Error {
    /// The device already has the maximum number of live events. Creating more would exhaust the
    /// configured budget.
    #[error("Event limit of {0} live events reached.")]
    EventLimitReached(usize),
    /// A finite, non-zero timeout was passed to a wait while the device is configured with
    /// [`TimeoutMode::Unsupported`](crate::TimeoutMode::Unsupported).
    #[error("Finite wait timeout of {0} ms is not supported.")]
    UnsupportedTimeout(u32),
    /// No queue was found for the requested type. Did you forget to request it?
    #[error("No queue of type {0:?} found. Did you forget a queue request on initialization?")]
    NoCapableQueue(QueueType),
    /// The device settings are inconsistent.
    #[error("Invalid settings: `{0}`")]
    InvalidSettings(&'static str),
    /// Spawning the worker thread of a queue failed.
    #[error("Failed to spawn queue worker thread: `{0}`")]
    ThreadSpawn(#[from] std::io::Error),
    /// Tried to submit to a queue that is shutting down.
    #[error("Queue is shutting down and no longer accepts submissions.")]
    QueueShutDown,
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
