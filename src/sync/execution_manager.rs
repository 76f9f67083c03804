//! Exposes the [`ExecutionManager`], used to look up queues and submit work and signals to them.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::core::queue::{Queue, QueueInfo, QueueType};
use crate::{Device, Error, Fence, QueueRequest};

/// The execution manager owns every queue of a device. Queues are created from the
/// [`QueueRequest`]s in the device settings and looked up by [`QueueType`]. When multiple queues of
/// the same type exist, the first one is used.
///
/// # Example
/// ```
/// use fencepost::*;
/// let settings = SettingsBuilder::new().queue(QueueType::Transfer).build();
/// let (device, exec) = initialize(&settings)?;
/// let fence = Fence::new(&device, 0)?;
/// exec.submit(QueueType::Transfer, || {
///     // Upload some data
///     Ok(())
/// })?;
/// // Signal the fence once the upload has retired.
/// exec.signal(QueueType::Transfer, &fence, 1)?;
/// fence.wait_until(1)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionManager {
    device: Device,
    queues: Arc<Vec<Queue>>,
}

impl ExecutionManager {
    /// Create a new execution manager with one queue for each request in the device settings.
    pub fn new(device: Device) -> Result<Self> {
        Self::with_queues(device.clone(), &device.settings().queues)
    }

    /// Create a new execution manager with one queue for each given request.
    pub fn with_queues(device: Device, requests: &[QueueRequest]) -> Result<Self> {
        let mut counts = HashMap::new();
        let queues = requests
            .iter()
            .enumerate()
            .map(|(index, request)| -> Result<Queue> {
                let count = counts.entry(request.queue_type).or_insert(0u32);
                let label = request
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("{:?}#{}", request.queue_type, *count));
                *count += 1;
                Queue::new(QueueInfo {
                    queue_type: request.queue_type,
                    index: index as u32,
                    label,
                })
            })
            .collect::<Result<Vec<Queue>>>()?;

        info!("Created queues for device `{}`:", device.settings().name);
        for queue in &queues {
            let info = queue.info();
            info!("Queue #{}: {:?} (`{}`)", info.index, info.queue_type, info.label);
        }

        Ok(ExecutionManager {
            device,
            queues: Arc::new(queues),
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Obtain a reference to the first queue of the given type.
    pub fn get_queue(&self, queue_type: QueueType) -> Option<&Queue> {
        self.queues.iter().find(|queue| queue.info().queue_type == queue_type)
    }

    /// Obtain a reference to the first queue of the given type, or fail with
    /// [`Error::NoCapableQueue`].
    pub fn queue(&self, queue_type: QueueType) -> Result<&Queue> {
        Ok(self.get_queue(queue_type).ok_or(Error::NoCapableQueue(queue_type))?)
    }

    /// All queues, in request order.
    pub fn queues(&self) -> &[Queue] {
        self.queues.as_slice()
    }

    /// Submit a unit of work to the queue of the given type.
    pub fn submit(&self, queue_type: QueueType, work: impl FnOnce() -> Result<()> + Send + 'static) -> Result<()> {
        self.queue(queue_type)?.submit(work)
    }

    /// Signal `fence` to `value` after all work submitted so far to the queue of the given type.
    /// See [`Queue::signal`].
    pub fn signal(&self, queue_type: QueueType, fence: &Fence, value: u64) -> Result<()> {
        self.queue(queue_type)?.signal(fence, value)
    }

    /// Make the queue of the given type wait for `fence` to reach `value`. See [`Queue::wait`].
    pub fn wait(&self, queue_type: QueueType, fence: &Fence, value: u64) -> Result<()> {
        self.queue(queue_type)?.wait(fence, value)
    }

    /// Block until every queue is idle.
    pub fn wait_idle(&self) -> Result<()> {
        self.queues.iter().try_for_each(|queue| queue.wait_idle())
    }

    /// Stop every queue from accepting new commands. Pending commands still run. See
    /// [`Queue::shut_down`].
    pub fn shut_down(&self) -> Result<()> {
        self.queues.iter().try_for_each(|queue| queue.shut_down())
    }
}
