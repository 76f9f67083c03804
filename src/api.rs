//! Flat handle-based interface over events and fences.
//!
//! These functions mirror the usual C-style surface of a graphics API: waits report a
//! [`WaitResult`] instead of an error, and signaling an event reports success as a `bool`. The
//! cause of a failure is logged.
//!
//! # Example
//! ```
//! use fencepost::api::*;
//! # use fencepost::{Device, DeviceSettings};
//! # let device = Device::new(&DeviceSettings::default())?;
//! let fence = fence_create(&device, 0)?;
//! let event = create_event(&device)?;
//! fence_signal(&fence, 100)?;
//! fence_set_event_on_completion(&fence, 50, &event)?;
//! assert_eq!(wait_event(&event, 0), WaitResult::Signaled);
//! destroy_event(event);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Result;

use crate::{Device, Event, Fence, Timeout, WaitStatus};

pub type EventHandle = Event;
pub type FenceHandle = Fence;

/// Pass as `timeout_ms` to [`wait_event`] to wait without a timeout.
pub const INFINITE: u32 = u32::MAX;

/// Outcome of [`wait_event`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WaitResult {
    Signaled,
    TimedOut,
    /// The wait could not be performed, either because the timeout mode is unsupported or because
    /// the event's lock is poisoned.
    Failed,
}

impl From<WaitStatus> for WaitResult {
    fn from(value: WaitStatus) -> Self {
        match value {
            WaitStatus::Signaled => WaitResult::Signaled,
            WaitStatus::TimedOut => WaitResult::TimedOut,
        }
    }
}

pub fn create_event(device: &Device) -> Result<EventHandle> {
    Event::new(device)
}

/// Wait on an event. `timeout_ms` is `0` to poll, [`INFINITE`] to block, anything else for a
/// finite timeout.
pub fn wait_event(event: &EventHandle, timeout_ms: u32) -> WaitResult {
    match event.wait(Timeout::from_millis(timeout_ms)) {
        Ok(status) => status.into(),
        Err(err) => {
            warn!("Waiting on event #{} failed: {err}", event.id());
            WaitResult::Failed
        }
    }
}

pub fn signal_event(event: &EventHandle) -> bool {
    match event.signal() {
        Ok(()) => true,
        Err(err) => {
            warn!("Signaling event #{} failed: {err}", event.id());
            false
        }
    }
}

pub fn destroy_event(event: EventHandle) {
    event.destroy()
}

pub fn fence_create(device: &Device, initial_value: u64) -> Result<FenceHandle> {
    Fence::new(device, initial_value)
}

pub fn fence_get_completed_value(fence: &FenceHandle) -> Result<u64> {
    fence.completed_value()
}

pub fn fence_signal(fence: &FenceHandle, value: u64) -> Result<()> {
    fence.signal(value)
}

pub fn fence_set_event_on_completion(fence: &FenceHandle, value: u64, event: &EventHandle) -> Result<()> {
    fence.set_event_on_completion(value, event)
}
