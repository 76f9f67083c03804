//! Auto-reset events, completion fences and ordered queue signalling.
//!
//! Fencepost provides the CPU-side synchronization objects a command-queue based API needs:
//! threads block on [`Event`]s, [`Fence`]s track a 64-bit completion value and signal events
//! registered at target values, and [`Queue`]s run submitted work in order and signal fences once
//! all earlier work has retired.
//!
//! To get started, simply
//! ```
//! use fencepost::prelude::*;
//! ```
//!
//! # Example
//!
//! First, we define the [`DeviceSettings`] using the [`SettingsBuilder`]. The settings are
//! threaded through every object created from the device.
//! ```
//! use fencepost::*;
//!
//! let settings = SettingsBuilder::new()
//!     .name("fencepost demo")
//!     .timeout_mode(TimeoutMode::Unsupported)
//!     .queue(QueueType::Graphics)
//!     .build();
//! let (device, exec) = initialize(&settings)?;
//!
//! let fence = Fence::new(&device, 0)?;
//! let event = Event::new(&device)?;
//! fence.set_event_on_completion(1, &event)?;
//!
//! exec.submit(QueueType::Graphics, || {
//!     // Record and execute some work here.
//!     Ok(())
//! })?;
//! exec.signal(QueueType::Graphics, &fence, 1)?;
//!
//! // Block until the queue has retired the work.
//! assert_eq!(event.wait(Timeout::Infinite)?, WaitStatus::Signaled);
//! assert_eq!(fence.completed_value()?, 1);
//! # Ok::<(), anyhow::Error>(())
//! ```
//! For further details, check out the following modules
//! - [`sync`] for events, fences and the execution manager.
//! - [`api`] for the flat handle-based interface.
//! - [`core`] for the device, settings, errors and queues.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod api;
pub mod core;
pub mod init;
pub mod sync;

static_assertions::assert_impl_all!(Device: Send, Sync, Clone);
static_assertions::assert_impl_all!(Event: Send, Sync, Clone);
static_assertions::assert_impl_all!(Fence: Send, Sync, Clone);
static_assertions::assert_impl_all!(Queue: Send, Sync);
static_assertions::assert_impl_all!(ExecutionManager: Send, Sync, Clone);
static_assertions::assert_impl_all!(FenceWait: Send, Unpin);
