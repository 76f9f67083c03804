use std::sync::mpsc;
use std::thread;

use anyhow::Result;

use fencepost::api::*;
use fencepost::{QueueType, TimeoutMode};

mod framework;

#[test]
pub fn signal_then_consume() -> Result<()> {
    let device = framework::make_device()?;
    let fence = fence_create(&device, 0)?;
    let event = create_event(&device)?;

    fence_set_event_on_completion(&fence, 5, &event)?;
    assert_eq!(wait_event(&event, 0), WaitResult::TimedOut);
    fence_signal(&fence, 5)?;
    assert_eq!(wait_event(&event, 0), WaitResult::Signaled);
    assert_eq!(wait_event(&event, 0), WaitResult::TimedOut);
    destroy_event(event);
    assert_eq!(device.live_events(), 0);
    Ok(())
}

#[test]
pub fn late_registration_fires_immediately() -> Result<()> {
    let device = framework::make_device()?;
    let fence = fence_create(&device, 0)?;
    let event = create_event(&device)?;

    fence_signal(&fence, 100)?;
    fence_set_event_on_completion(&fence, 50, &event)?;
    assert_eq!(wait_event(&event, 0), WaitResult::Signaled);
    assert_eq!(fence_get_completed_value(&fence)?, 100);
    Ok(())
}

#[test]
pub fn infinite_wait_across_threads() -> Result<()> {
    let device = framework::make_device()?;
    let fence = fence_create(&device, 0)?;
    let (registered_tx, registered_rx) = mpsc::channel();

    let waiter = {
        let fence = fence.clone();
        let device = device.clone();
        thread::spawn(move || {
            let event = create_event(&device).unwrap();
            fence_set_event_on_completion(&fence, 1, &event).unwrap();
            registered_tx.send(()).unwrap();
            wait_event(&event, INFINITE)
        })
    };

    registered_rx.recv_timeout(framework::TEST_TIMEOUT)?;
    fence_signal(&fence, 1)?;
    assert_eq!(waiter.join().unwrap(), WaitResult::Signaled);
    Ok(())
}

#[test]
pub fn duplicate_registration_single_observation() -> Result<()> {
    let device = framework::make_device()?;
    let fence = fence_create(&device, 0)?;
    let event = create_event(&device)?;

    fence_signal(&fence, 3)?;
    fence_set_event_on_completion(&fence, 1, &event)?;
    fence_set_event_on_completion(&fence, 1, &event)?;
    fence_signal(&fence, 4)?;
    assert_eq!(wait_event(&event, 0), WaitResult::Signaled);
    assert_eq!(wait_event(&event, 0), WaitResult::TimedOut);
    Ok(())
}

#[test]
pub fn overwrite_not_max() -> Result<()> {
    let device = framework::make_device()?;
    let fence = fence_create(&device, 0)?;
    fence_signal(&fence, 10)?;
    fence_signal(&fence, 0)?;
    assert_eq!(fence_get_completed_value(&fence)?, 0);
    Ok(())
}

#[test]
pub fn finite_timeout_fails() -> Result<()> {
    let device = framework::make_device()?;
    let event = create_event(&device)?;
    assert_eq!(wait_event(&event, 250), WaitResult::Failed);
    assert!(signal_event(&event));
    // A pending signal satisfies the wait before the timeout is looked at.
    assert_eq!(wait_event(&event, 250), WaitResult::Signaled);
    Ok(())
}

#[test]
pub fn finite_timeout_in_timed_mode() -> Result<()> {
    let device = framework::make_device_with_settings(|settings| settings.timeout_mode(TimeoutMode::Timed))?;
    let event = create_event(&device)?;
    assert_eq!(wait_event(&event, 10), WaitResult::TimedOut);
    assert!(signal_event(&event));
    assert_eq!(wait_event(&event, 10), WaitResult::Signaled);
    Ok(())
}

#[test]
pub fn queue_signal_through_handles() -> Result<()> {
    let context = framework::make_context()?;
    let fence = fence_create(&context.device, 0)?;
    let event = create_event(&context.device)?;
    fence_set_event_on_completion(&fence, 2, &event)?;

    context.exec.submit(QueueType::Graphics, || Ok(()))?;
    context.exec.signal(QueueType::Graphics, &fence, 2)?;
    assert_eq!(wait_event(&event, INFINITE), WaitResult::Signaled);
    Ok(())
}
