//! The sync module provides the synchronization primitives.
//!
//! - The [`event`] module provides auto-reset events, the object threads block on.
//! - The [`fence`] module provides completion fences with registrable `(value, event)` waiters,
//! as well as a [`Future`](std::future::Future) that resolves when a fence reaches a value.
//! - The [`execution_manager`] module owns the device queues and sequences fence signals behind
//! submitted work. Most of the time, submissions should go through here.

pub mod event;
pub mod execution_manager;
pub mod fence;
