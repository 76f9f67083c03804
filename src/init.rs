//! Convenience initialization of a device together with its queues.

use anyhow::Result;

use crate::{Device, DeviceSettings, ExecutionManager};

/// Create a [`Device`] and an [`ExecutionManager`] with all queues requested in `settings`.
///
/// # Example
/// ```
/// use fencepost::*;
/// let settings = SettingsBuilder::new()
///     .name("renderer")
///     .queue(QueueType::Graphics)
///     .queue(QueueType::Compute)
///     .build();
/// let (device, exec) = initialize(&settings)?;
/// assert!(exec.get_queue(QueueType::Compute).is_some());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn initialize(settings: &DeviceSettings) -> Result<(Device, ExecutionManager)> {
    let device = Device::new(settings)?;
    let exec = ExecutionManager::new(device.clone())?;
    Ok((device, exec))
}
