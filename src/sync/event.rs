//! Auto-reset events backed by a mutex and a condition variable.
//!
//! An [`Event`] is a waitable boolean. [`Event::signal`] sets it and wakes at most one blocked
//! waiter, [`Event::wait`] consumes it. A burst of signals with nobody waiting collapses into a
//! single pending wake-up.
//!
//! # Example
//! ```
//! # use fencepost::*;
//! # let device = Device::new(&DeviceSettings::default())?;
//! let event = Event::new(&device)?;
//! assert_eq!(event.wait(Timeout::IMMEDIATE)?, WaitStatus::TimedOut);
//! event.signal()?;
//! assert_eq!(event.wait(Timeout::IMMEDIATE)?, WaitStatus::Signaled);
//! assert_eq!(event.wait(Timeout::IMMEDIATE)?, WaitStatus::TimedOut);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;

use crate::{Device, Error, TimeoutMode};

/// How long a call to [`Event::wait`] may block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Timeout {
    /// Block until the event is signaled.
    Infinite,
    /// Block for at most this many milliseconds. Zero never blocks.
    ///
    /// Unlike [`Timeout::from_millis`], `Millis(u32::MAX)` is a finite wait of roughly 49 days and
    /// not [`Timeout::Infinite`].
    Millis(u32),
}

impl Timeout {
    /// Poll the event without blocking.
    pub const IMMEDIATE: Timeout = Timeout::Millis(0);

    /// Interpret a raw millisecond value, where `u32::MAX` means infinite. Every other value,
    /// including zero, becomes [`Timeout::Millis`].
    pub fn from_millis(ms: u32) -> Self {
        if ms == u32::MAX {
            Timeout::Infinite
        } else {
            Timeout::Millis(ms)
        }
    }
}

impl From<Duration> for Timeout {
    fn from(value: Duration) -> Self {
        Timeout::Millis(u32::try_from(value.as_millis()).unwrap_or(u32::MAX - 1))
    }
}

/// Outcome of a successful [`Event::wait`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WaitStatus {
    /// The event was signaled, and the signal has been consumed.
    Signaled,
    /// The timeout elapsed without the event being signaled.
    TimedOut,
}

#[derive(Derivative)]
#[derivative(Debug)]
struct EventInner {
    #[derivative(Debug = "ignore")]
    device: Device,
    id: u64,
    signaled: Mutex<bool>,
    #[derivative(Debug = "ignore")]
    cond: Condvar,
}

/// Auto-reset event. This is a handle to shared state and is safe to clone; all clones refer to
/// the same event. The event is destroyed when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    /// Create a new event in the unsignaled state.
    /// # Errors
    /// * Fails with [`Error::EventLimitReached`] if the device already has `max_events` live events.
    pub fn new(device: &Device) -> Result<Self> {
        device.acquire_event_slot()?;
        let id = device.next_object_id();
        #[cfg(feature = "log-objects")]
        trace!("Created new event #{id}");
        Ok(Event {
            inner: Arc::new(EventInner {
                device: device.clone(),
                id,
                signaled: Mutex::new(false),
                cond: Condvar::new(),
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<bool>, Error> {
        Ok(self.inner.signaled.lock()?)
    }

    /// Wait for the event to become signaled, consuming the signal.
    ///
    /// A zero timeout never blocks, and an already signaled event returns immediately regardless of
    /// the timeout. Finite non-zero timeouts are only honored when the device uses
    /// [`TimeoutMode::Timed`].
    /// # Errors
    /// * Fails with [`Error::UnsupportedTimeout`] if a finite timeout is given under [`TimeoutMode::Unsupported`].
    /// * Fails with [`Error::PoisonError`] if the internal lock is poisoned.
    pub fn wait(&self, timeout: Timeout) -> Result<WaitStatus> {
        let mut signaled = self.lock()?;
        if *signaled || timeout == Timeout::IMMEDIATE {
            return Ok(consume(&mut signaled));
        }

        match timeout {
            Timeout::Infinite => {
                let mut signaled = self
                    .inner
                    .cond
                    .wait_while(signaled, |signaled| !*signaled)
                    .map_err(|_| Error::PoisonError)?;
                Ok(consume(&mut signaled))
            }
            Timeout::Millis(ms) => match self.inner.device.timeout_mode() {
                TimeoutMode::Unsupported => Err(Error::UnsupportedTimeout(ms).into()),
                TimeoutMode::Timed => {
                    let (mut signaled, _) = self
                        .inner
                        .cond
                        .wait_timeout_while(signaled, Duration::from_millis(ms as u64), |signaled| !*signaled)
                        .map_err(|_| Error::PoisonError)?;
                    Ok(consume(&mut signaled))
                }
            },
        }
    }

    /// Set the event and wake at most one blocked waiter.
    /// # Errors
    /// * Fails with [`Error::PoisonError`] if the internal lock is poisoned.
    pub fn signal(&self) -> Result<()> {
        let mut signaled = self.lock()?;
        *signaled = true;
        self.inner.cond.notify_one();
        Ok(())
    }

    /// Explicitly release this handle. Other clones of the event stay valid.
    pub fn destroy(self) {
        drop(self);
    }

    /// Returns true if both handles refer to the same event.
    pub fn ptr_eq(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Unique id of this event within its device.
    pub fn id(&self) -> u64 {
        self.inner.id
    }
}

fn consume(signaled: &mut MutexGuard<bool>) -> WaitStatus {
    if std::mem::replace(&mut **signaled, false) {
        WaitStatus::Signaled
    } else {
        WaitStatus::TimedOut
    }
}

impl Drop for EventInner {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying event #{}", self.id);
        self.device.release_event_slot();
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};
    use std::thread;

    use futures::task::{waker, ArcWake};

    use super::*;
    use crate::{DeviceSettings, Fence};

    struct Flag(AtomicBool);

    impl ArcWake for Flag {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.0.store(true, Ordering::SeqCst);
        }
    }

    fn poison(event: &Event) {
        let event = event.clone();
        let _ = thread::spawn(move || {
            let _guard = event.inner.signaled.lock();
            panic!("poisoning event lock");
        })
        .join();
    }

    #[test]
    fn poisoned_waiter_does_not_starve_fence_signal() -> Result<()> {
        let device = Device::new(&DeviceSettings::default())?;
        let fence = Fence::new(&device, 0)?;
        let broken = Event::new(&device)?;
        let first = Event::new(&device)?;
        let second = Event::new(&device)?;
        fence.set_event_on_completion(1, &broken)?;
        fence.set_event_on_completion(1, &first)?;
        fence.set_event_on_completion(2, &second)?;
        poison(&broken);

        let flag = Arc::new(Flag(AtomicBool::new(false)));
        let observer_waker = waker(flag.clone());
        let mut observer = Box::pin(fence.wait_async(2));
        assert!(observer.as_mut().poll(&mut Context::from_waker(&observer_waker)).is_pending());

        let err = fence.signal(2).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::PoisonError)));

        assert_eq!(fence.completed_value()?, 2);
        assert_eq!(fence.pending_waiters()?, 0);
        assert_eq!(first.wait(Timeout::IMMEDIATE)?, WaitStatus::Signaled);
        assert_eq!(second.wait(Timeout::IMMEDIATE)?, WaitStatus::Signaled);
        assert!(flag.0.load(Ordering::SeqCst), "Async observers should still be woken.");
        assert_eq!(fence.wait_until(2)?, 2);
        assert!(matches!(
            observer.as_mut().poll(&mut Context::from_waker(&observer_waker)),
            Poll::Ready(Ok(2))
        ));
        Ok(())
    }
}
