//! Exposes all structs needed to store initialization parameters.

use crate::core::queue::QueueType;

/// Structure holding a queue to request from the device. Each request results in one
/// [`Queue`](crate::Queue) with its own worker thread.
///
/// # Example
/// ```
/// # use fencepost::*;
/// let copy = QueueRequest {
///     queue_type: QueueType::Transfer,
///     label: Some(String::from("uploads")),
/// };
///
/// let graphics = QueueRequest {
///     queue_type: QueueType::Graphics,
///     label: None,
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueueRequest {
    /// Kind of work this queue is meant for. Queues are looked up by this type.
    pub queue_type: QueueType,
    /// Optional label, used to name the worker thread. Defaults to `"{queue_type:?}#{index}"`.
    pub label: Option<String>,
}

/// Behavior of event waits given a finite, non-zero timeout.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TimeoutMode {
    /// Finite timeouts fail with [`Error::UnsupportedTimeout`](crate::Error::UnsupportedTimeout).
    /// Only a zero timeout (poll) and an infinite timeout are accepted.
    #[default]
    Unsupported,
    /// Finite timeouts block on the condition variable for at most the given duration.
    Timed,
}

/// Settings used to initialize a [`Device`](crate::Device).
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    /// Device name, only used for diagnostics.
    pub name: String,
    /// How event waits treat finite timeouts.
    pub timeout_mode: TimeoutMode,
    /// Maximum amount of events alive at the same time. `None` means no limit.
    pub max_events: Option<usize>,
    /// Queues to create when initializing through [`initialize`](crate::initialize).
    pub queues: Vec<QueueRequest>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        SettingsBuilder::new().build()
    }
}

/// The settings builder is a convenience struct to easily create [`DeviceSettings`].
///
/// For information about each of the fields, see [`DeviceSettings`]
/// # Example
/// ```
/// # use fencepost::*;
/// let settings = SettingsBuilder::new()
///     .name("My fencepost device")
///     .timeout_mode(TimeoutMode::Timed)
///     .max_events(1024)
///     .queue(QueueType::Graphics)
///     .build();
/// ```
pub struct SettingsBuilder {
    inner: DeviceSettings,
}

impl SettingsBuilder {
    /// Create a new settings builder with default settings.
    pub fn new() -> Self {
        SettingsBuilder {
            inner: DeviceSettings {
                name: String::from(""),
                timeout_mode: TimeoutMode::Unsupported,
                max_events: None,
                queues: vec![],
            },
        }
    }

    /// Sets the device name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    /// Sets how finite wait timeouts are handled.
    pub fn timeout_mode(mut self, mode: TimeoutMode) -> Self {
        self.inner.timeout_mode = mode;
        self
    }

    /// Limit the amount of events that can be alive at once.
    pub fn max_events(mut self, count: usize) -> Self {
        self.inner.max_events = Some(count);
        self
    }

    /// Request an unlabeled queue of the given type.
    pub fn queue(mut self, queue_type: QueueType) -> Self {
        self.inner.queues.push(QueueRequest {
            queue_type,
            label: None,
        });
        self
    }

    /// Replace all queue requests.
    pub fn queues(mut self, queues: impl Into<Vec<QueueRequest>>) -> Self {
        self.inner.queues = queues.into();
        self
    }

    /// Build the resulting device settings.
    pub fn build(self) -> DeviceSettings {
        self.inner
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
