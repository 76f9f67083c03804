//! The core module holds the device, its settings, the error type and queues.

pub mod app_info;
pub mod device;
pub mod error;
pub mod queue;
