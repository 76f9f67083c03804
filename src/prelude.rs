pub use crate::core::app_info::*;
pub use crate::core::device::Device;
pub use crate::core::error::Error;
pub use crate::core::queue::{Queue, QueueInfo, QueueType, Work};

pub use crate::sync::event::*;
pub use crate::sync::execution_manager::ExecutionManager;
pub use crate::sync::fence::*;

pub use crate::init::initialize;
