use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use anyhow::Result;

use crate::{Error, Fence};

/// Kind of work a queue is meant for. Queues behave identically; the type is only used to look a
/// queue up in the [`ExecutionManager`](crate::ExecutionManager).
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash)]
pub enum QueueType {
    #[default]
    Graphics,
    Compute,
    Transfer,
}

/// Stores all information about a queue.
#[derive(Default, Debug, Clone)]
pub struct QueueInfo {
    /// Functionality that this queue provides.
    pub queue_type: QueueType,
    /// Index of this queue in the execution manager.
    pub index: u32,
    /// Name of the worker thread.
    pub label: String,
}

/// Opaque unit of work. Errors are logged by the queue and do not stop later commands.
pub type Work = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

#[derive(Derivative)]
#[derivative(Debug)]
enum Command {
    Execute(#[derivative(Debug = "ignore")] Work),
    Signal(Fence, u64),
    Wait(Fence, u64),
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Command>,
    /// The worker is currently running a command without holding the lock.
    busy: bool,
    shutdown: bool,
    retired: u64,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && !self.busy
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
struct QueueShared {
    info: QueueInfo,
    state: Mutex<QueueState>,
    #[derivative(Debug = "ignore")]
    work_available: Condvar,
    #[derivative(Debug = "ignore")]
    idle: Condvar,
}

impl QueueShared {
    fn lock(&self) -> Result<MutexGuard<QueueState>, Error> {
        Ok(self.state.lock()?)
    }
}

/// Exposes a command queue backed by a worker thread. Commands run strictly in submission order.
///
/// Fence signals are sequenced behind all previously submitted work: when the queue is idle,
/// [`Queue::signal`] signals the fence synchronously, otherwise the signal runs on the worker
/// right after the last earlier command retires.
///
/// Dropping the queue, or calling [`Queue::shut_down`], still runs every pending command. The
/// worker thread is joined on drop, unless the last handle is dropped by a command running on that
/// same worker.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Queue {
    shared: Arc<QueueShared>,
    #[derivative(Debug = "ignore")]
    worker: Option<JoinHandle<()>>,
}

impl Queue {
    pub(crate) fn new(info: QueueInfo) -> Result<Self> {
        let shared = Arc::new(QueueShared {
            info,
            state: Mutex::new(QueueState::default()),
            work_available: Condvar::new(),
            idle: Condvar::new(),
        });

        let worker = {
            let shared = shared.clone();
            std::thread::Builder::new()
                .name(shared.info.label.clone())
                .spawn(move || run_worker(&shared))
                .map_err(Error::from)?
        };

        #[cfg(feature = "log-objects")]
        trace!("Created new queue `{}`", shared.info.label);

        Ok(Queue {
            shared,
            worker: Some(worker),
        })
    }

    /// Lock the queue state, failing if the queue no longer accepts commands.
    fn lock_open(&self) -> Result<MutexGuard<QueueState>> {
        let state = self.shared.lock()?;
        if state.shutdown {
            return Err(Error::QueueShutDown.into());
        }
        Ok(state)
    }

    fn push(&self, mut state: MutexGuard<QueueState>, command: Command) -> Result<()> {
        state.pending.push_back(command);
        self.shared.work_available.notify_one();
        Ok(())
    }

    /// Submit a unit of work to the queue. It runs after all previously submitted commands.
    pub fn submit(&self, work: impl FnOnce() -> Result<()> + Send + 'static) -> Result<()> {
        let state = self.lock_open()?;
        self.push(state, Command::Execute(Box::new(work)))
    }

    /// Signal `fence` to `value` once all previously submitted work has retired.
    ///
    /// If nothing is pending or running, the fence is signaled before this function returns.
    pub fn signal(&self, fence: &Fence, value: u64) -> Result<()> {
        let state = self.lock_open()?;
        if state.is_idle() {
            // Signal under the queue lock so that it cannot be overtaken by a later submission.
            fence.signal(value)?;
            return Ok(());
        }
        self.push(state, Command::Signal(fence.clone(), value))
    }

    /// Make all commands submitted after this call wait until `fence` reaches `value`.
    ///
    /// Note that waiting on a value that is only signaled later on this same queue deadlocks the
    /// queue.
    pub fn wait(&self, fence: &Fence, value: u64) -> Result<()> {
        let state = self.lock_open()?;
        if state.is_idle() && fence.completed_value()? >= value {
            return Ok(());
        }
        self.push(state, Command::Wait(fence.clone(), value))
    }

    /// Stop accepting new commands. Commands that are already pending still run, after which the
    /// worker thread exits. Later calls to [`Queue::submit`], [`Queue::signal`] and [`Queue::wait`]
    /// fail with [`Error::QueueShutDown`].
    pub fn shut_down(&self) -> Result<()> {
        let mut state = self.shared.lock()?;
        state.shutdown = true;
        self.shared.work_available.notify_one();
        Ok(())
    }

    /// Block until all submitted commands have retired.
    pub fn wait_idle(&self) -> Result<()> {
        let state = self.shared.lock()?;
        let _state = self
            .shared
            .idle
            .wait_while(state, |state| !state.is_idle())
            .map_err(|_| Error::PoisonError)?;
        Ok(())
    }

    /// Returns true if no command is pending or running.
    pub fn is_idle(&self) -> Result<bool> {
        Ok(self.shared.lock()?.is_idle())
    }

    /// Amount of commands that have retired on the worker. Signals performed synchronously on an
    /// idle queue are not counted.
    pub fn retired(&self) -> Result<u64> {
        Ok(self.shared.lock()?.retired)
    }

    pub fn info(&self) -> &QueueInfo {
        &self.shared.info
    }
}

fn run_worker(shared: &QueueShared) {
    if let Err(err) = worker_loop(shared) {
        error!("Queue `{}` stopped: {err}", shared.info.label);
    }
}

fn worker_loop(shared: &QueueShared) -> Result<()> {
    let mut state = shared.lock()?;
    loop {
        let Some(command) = state.pending.pop_front() else {
            if state.shutdown {
                return Ok(());
            }
            state = shared.work_available.wait(state).map_err(|_| Error::PoisonError)?;
            continue;
        };

        match command {
            Command::Signal(fence, value) => {
                if let Err(err) = fence.signal(value) {
                    error!("Queue `{}` failed to signal fence #{} to {value}: {err}", shared.info.label, fence.id());
                }
            }
            Command::Execute(work) => {
                state.busy = true;
                drop(state);
                match catch_unwind(AssertUnwindSafe(work)) {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => error!("Work on queue `{}` failed: {err:#}", shared.info.label),
                    Err(_) => error!("Work on queue `{}` panicked", shared.info.label),
                }
                state = shared.lock()?;
                state.busy = false;
            }
            Command::Wait(fence, value) => {
                state.busy = true;
                drop(state);
                if let Err(err) = fence.wait_until(value) {
                    error!("Queue `{}` failed to wait for fence #{} to reach {value}: {err}", shared.info.label, fence.id());
                }
                state = shared.lock()?;
                state.busy = false;
            }
        }

        state.retired += 1;
        if state.is_idle() {
            shared.idle.notify_all();
        }
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        if let Err(err) = self.shut_down() {
            error!("Failed to shut down queue `{}`: {err}", self.shared.info.label);
        }
        if let Some(worker) = self.worker.take() {
            // Dropped from inside a command on this queue. The worker drains the remaining
            // commands and exits on its own.
            if worker.thread().id() == std::thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                error!("Worker thread of queue `{}` panicked", self.shared.info.label);
            }
        }
        #[cfg(feature = "log-objects")]
        trace!("Destroying queue `{}`", self.shared.info.label);
    }
}
