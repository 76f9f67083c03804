//! The device owns the settings every event, fence and queue is created with, and keeps track of
//! how many events are alive.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::{DeviceSettings, Error, TimeoutMode};

#[derive(Debug)]
struct DeviceInner {
    settings: DeviceSettings,
    live_events: AtomicUsize,
    next_object_id: AtomicU64,
}

/// Explicit owner of the configuration shared by all synchronization objects. Internal state is
/// wrapped in an `Arc<DeviceInner>`, so this is safe to clone.
#[derive(Debug, Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    /// Create a new device from the given settings.
    /// # Errors
    /// * Fails with [`Error::InvalidSettings`] if `max_events` is set to zero.
    pub fn new(settings: &DeviceSettings) -> Result<Self> {
        if settings.max_events == Some(0) {
            return Err(Error::InvalidSettings("max_events must be at least one").into());
        }

        info!(
            "Created device `{}` (timeout mode: {:?}, max events: {:?})",
            settings.name, settings.timeout_mode, settings.max_events
        );

        Ok(Device {
            inner: Arc::new(DeviceInner {
                settings: settings.clone(),
                live_events: AtomicUsize::new(0),
                next_object_id: AtomicU64::new(1),
            }),
        })
    }

    /// Get the settings this device was created with.
    pub fn settings(&self) -> &DeviceSettings {
        &self.inner.settings
    }

    pub fn timeout_mode(&self) -> TimeoutMode {
        self.inner.settings.timeout_mode
    }

    /// Amount of events created from this device that are still alive.
    pub fn live_events(&self) -> usize {
        self.inner.live_events.load(Ordering::Acquire)
    }

    /// Reserve a slot for a new event, failing if the budget is exhausted.
    pub(crate) fn acquire_event_slot(&self) -> Result<(), Error> {
        let limit = self.inner.settings.max_events;
        self.inner
            .live_events
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| match limit {
                Some(max) if live >= max => None,
                _ => Some(live + 1),
            })
            .map(|_| ())
            .map_err(|_| Error::EventLimitReached(limit.unwrap_or(usize::MAX)))
    }

    pub(crate) fn release_event_slot(&self) {
        self.inner.live_events.fetch_sub(1, Ordering::AcqRel);
    }

    /// Unique id for object logging.
    pub(crate) fn next_object_id(&self) -> u64 {
        self.inner.next_object_id.fetch_add(1, Ordering::Relaxed)
    }
}
