//! Completion fences. A [`Fence`] holds a 64-bit completed value and any number of
//! `(target value, event)` waiters.
//!
//! Signaling a fence *overwrites* its value, it is not clamped to the previous value. Signaling
//! to 10 and then to 0 leaves the fence at 0. Every waiter whose target is reached by a signal
//! has its event signaled exactly once and is then removed.
//!
//! # Example
//! ```
//! # use fencepost::*;
//! # let device = Device::new(&DeviceSettings::default())?;
//! let fence = Fence::new(&device, 0)?;
//! let event = Event::new(&device)?;
//! fence.set_event_on_completion(5, &event)?;
//! assert_eq!(event.wait(Timeout::IMMEDIATE)?, WaitStatus::TimedOut);
//! fence.signal(5)?;
//! assert_eq!(event.wait(Timeout::IMMEDIATE)?, WaitStatus::Signaled);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use anyhow::Result;
use futures::future::FusedFuture;
use multimap::MultiMap;

use crate::{Device, Error, Event};

#[derive(Derivative)]
#[derivative(Debug)]
struct FenceState {
    completed_value: u64,
    waiters: MultiMap<u64, Event>,
    /// Wakers of pending [`FenceWait`] futures, keyed by future id.
    #[derivative(Debug = "ignore")]
    wakers: HashMap<u64, (u64, Waker)>,
    next_wait_id: u64,
}

#[derive(Derivative)]
#[derivative(Debug)]
struct FenceInner {
    id: u64,
    state: Mutex<FenceState>,
    #[derivative(Debug = "ignore")]
    changed: Condvar,
}

/// A 64-bit completion counter with registrable per-value waiters. This is a handle to shared
/// state and is safe to clone. The value can only be changed through [`Fence::signal`].
#[derive(Debug, Clone)]
pub struct Fence {
    inner: Arc<FenceInner>,
}

impl Fence {
    /// Create a new fence with the given initial completed value.
    pub fn new(device: &Device, initial_value: u64) -> Result<Self> {
        let id = device.next_object_id();
        #[cfg(feature = "log-objects")]
        trace!("Created new fence #{id} (initial value = {initial_value})");
        Ok(Fence {
            inner: Arc::new(FenceInner {
                id,
                state: Mutex::new(FenceState {
                    completed_value: initial_value,
                    waiters: MultiMap::new(),
                    wakers: HashMap::new(),
                    next_wait_id: 0,
                }),
                changed: Condvar::new(),
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<FenceState>, Error> {
        Ok(self.inner.state.lock()?)
    }

    /// Get the current completed value. The read is ordered with all signals and registrations.
    pub fn completed_value(&self) -> Result<u64> {
        Ok(self.lock()?.completed_value)
    }

    /// Set the completed value to `value`, firing every waiter whose target value is reached.
    ///
    /// This is a plain overwrite. Signaling to a lower value than the current one is allowed and
    /// the fence will report exactly that value afterwards.
    /// # Errors
    /// * Fails with [`Error::PoisonError`] if the fence or a waiting event has a poisoned lock. A
    /// failing event does not keep the other waiters or observers from being woken; the first
    /// error is returned after everything else has been signaled.
    pub fn signal(&self, value: u64) -> Result<()> {
        let mut first_error = None;
        let wakers = {
            let mut state = self.lock()?;
            state.completed_value = value;

            let mut reached = state
                .waiters
                .keys()
                .copied()
                .filter(|target| *target <= value)
                .collect::<Vec<_>>();
            reached.sort_unstable();
            for target in reached {
                if let Some(events) = state.waiters.remove(&target) {
                    for event in events {
                        if let Err(err) = event.signal() {
                            first_error.get_or_insert(err);
                        }
                    }
                }
            }

            self.inner.changed.notify_all();

            let ready = state
                .wakers
                .iter()
                .filter(|(_, (target, _))| *target <= value)
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();
            let mut wakers = Vec::with_capacity(ready.len());
            for id in ready {
                if let Some((_, waker)) = state.wakers.remove(&id) {
                    wakers.push(waker);
                }
            }
            wakers
        };

        for waker in wakers {
            waker.wake();
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Signal `event` once the completed value reaches `value`. If it already has, the event is
    /// signaled immediately and nothing is registered.
    ///
    /// Registering the same event multiple times is allowed. Since events are auto-reset, multiple
    /// fires before the event is waited on result in a single wake-up.
    pub fn set_event_on_completion(&self, value: u64, event: &Event) -> Result<()> {
        let mut state = self.lock()?;
        if state.completed_value >= value {
            event.signal()?;
        } else {
            state.waiters.insert(value, event.clone());
        }
        Ok(())
    }

    /// Amount of registered waiters that have not fired yet.
    pub fn pending_waiters(&self) -> Result<usize> {
        let state = self.lock()?;
        let count: usize = state.waiters.iter_all().map(|(_, events)| events.len()).sum();
        Ok(count)
    }

    /// Block the calling thread until the completed value is at least `value`, without using an
    /// event. Returns the completed value that satisfied the wait.
    pub fn wait_until(&self, value: u64) -> Result<u64> {
        let state = self.lock()?;
        let state = self
            .inner
            .changed
            .wait_while(state, |state| state.completed_value < value)
            .map_err(|_| Error::PoisonError)?;
        Ok(state.completed_value)
    }

    /// Returns a future that resolves once the completed value is at least `value`.
    ///
    /// # Example
    /// ```
    /// # use fencepost::*;
    /// # let device = Device::new(&DeviceSettings::default())?;
    /// let fence = Fence::new(&device, 0)?;
    /// fence.signal(3)?;
    /// let value = futures::executor::block_on(fence.wait_async(2))?;
    /// assert_eq!(value, 3);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn wait_async(&self, value: u64) -> FenceWait {
        FenceWait {
            fence: self.clone(),
            target: value,
            slot: None,
            terminated: false,
        }
    }

    /// Returns true if both handles refer to the same fence.
    pub fn ptr_eq(&self, other: &Fence) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }
}

impl Drop for FenceInner {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying fence #{}", self.id);
    }
}

/// Future returned by [`Fence::wait_async`]. Resolves to the completed value that satisfied the
/// wait.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct FenceWait {
    fence: Fence,
    target: u64,
    slot: Option<u64>,
    terminated: bool,
}

impl Future for FenceWait {
    type Output = Result<u64>;

    fn poll(mut self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let mut state = match this.fence.lock() {
            Ok(state) => state,
            Err(err) => {
                this.terminated = true;
                return Poll::Ready(Err(err.into()));
            }
        };

        if state.completed_value >= this.target {
            if let Some(slot) = this.slot.take() {
                state.wakers.remove(&slot);
            }
            this.terminated = true;
            return Poll::Ready(Ok(state.completed_value));
        }

        let slot = match this.slot {
            Some(slot) => slot,
            None => {
                let slot = state.next_wait_id;
                state.next_wait_id += 1;
                this.slot = Some(slot);
                slot
            }
        };
        state.wakers.insert(slot, (this.target, ctx.waker().clone()));
        Poll::Pending
    }
}

impl FusedFuture for FenceWait {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl Drop for FenceWait {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            if let Ok(mut state) = self.fence.lock() {
                state.wakers.remove(&slot);
            }
        }
    }
}
