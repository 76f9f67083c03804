#![allow(dead_code)]

use std::time::Duration;

use anyhow::Result;

use fencepost::{initialize, Device, DeviceSettings, ExecutionManager, QueueRequest, QueueType, SettingsBuilder};

/// Upper bound for anything a test waits on another thread for.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct Context {
    pub exec: ExecutionManager,
    pub device: Device,
}

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// Creates a device with default settings and no queues
pub fn make_device() -> Result<Device> {
    make_device_with_settings(|settings| settings)
}

pub fn make_device_with_settings<F: FnOnce(SettingsBuilder) -> SettingsBuilder>(callback: F) -> Result<Device> {
    init_logging();
    let settings = callback(SettingsBuilder::new().name("fencepost test framework")).build();
    Device::new(&settings)
}

/// Creates a device with a single graphics queue
pub fn make_context() -> Result<Context> {
    make_context_with_queues([QueueRequest {
        queue_type: QueueType::Graphics,
        label: None,
    }])
}

/// Create a device and request some queues
pub fn make_context_with_queues(queues: impl Into<Vec<QueueRequest>>) -> Result<Context> {
    init_logging();
    let settings: DeviceSettings = SettingsBuilder::new()
        .name("fencepost test framework")
        .queues(queues)
        .build();
    let (device, exec) = initialize(&settings)?;
    Ok(Context { exec, device })
}
