use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Zero-argument work item executed once on the render thread.
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// Returned when the queue that a sender feeds has been dropped.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("render thread queue is closed")]
pub struct SubmitError;

/// Producer handle. Cheap to clone, safe to move to any thread, never blocks.
#[derive(Debug, Clone)]
pub struct DeferredSender {
    tx: Sender<DeferredTask>,
}

impl DeferredSender {
    pub fn submit<F>(&self, task: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(task)).map_err(|_| SubmitError)
    }
}

/// Unbounded multi-producer, single-consumer FIFO of [`DeferredTask`]s.
///
/// The queue keeps one sender of its own, so it never reports disconnection
/// while it is alive.
#[derive(Debug)]
pub struct DeferredQueue {
    tx: Sender<DeferredTask>,
    rx: Receiver<DeferredTask>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Returns a producer handle for other threads.
    pub fn sender(&self) -> DeferredSender {
        DeferredSender {
            tx: self.tx.clone(),
        }
    }

    /// Enqueues `task`. Infallible while the queue exists.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // The receiver lives in `self`, so the channel cannot be closed here.
        let _ = self.tx.send(Box::new(task));
    }

    /// Runs queued tasks in submission order until the queue is first seen empty.
    ///
    /// Tasks that land before that point, including ones submitted by tasks run
    /// in this drain, execute now. Anything racing the final empty check waits
    /// for the next drain. A task that resubmits itself every time it runs keeps
    /// the drain going forever. Returns the number of tasks executed.
    ///
    /// Must be called on the render thread.
    pub fn drain_once(&self) -> usize {
        let mut executed = 0;
        loop {
            match self.rx.try_recv() {
                Ok(task) => {
                    task();
                    executed += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        executed
    }
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}
