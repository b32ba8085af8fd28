use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use crate::traits::dispatch_context::{DispatchContext, Task};

/// Cooperative single-threaded dispatch context.
///
/// Tasks are queued on an unbounded FIFO and run by whichever thread drains
/// the loop. Drain from one thread only; that thread becomes the listener's
/// execution context.
///
/// ```text
/// [native thread] ──post──→ [FIFO] ──run_pending / run──→ [owner thread]
/// ```
pub struct EventLoop {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
    // Held shared across check-and-send in post(), exclusively by close().
    closed: RwLock<bool>,
}

impl EventLoop {
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Arc::new(Self {
            sender,
            receiver,
            closed: RwLock::new(false),
        })
    }

    /// Run every task queued so far without waiting. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Run tasks as they arrive until `deadline` passes.
    pub fn run_until(&self, deadline: Instant) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.recv_deadline(deadline) {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return ran,
            }
        }
    }

    pub fn run_for(&self, duration: Duration) -> usize {
        self.run_until(Instant::now() + duration)
    }

    /// Run tasks until the loop is closed and drained.
    pub fn run(&self) {
        while let Ok(task) = self.receiver.recv() {
            task();
            if self.is_closed() && self.receiver.is_empty() {
                break;
            }
        }
    }

    /// Stop accepting tasks. Already queued tasks still run.
    pub fn close(&self) {
        let mut closed = self.closed.write();
        *closed = true;
        // wake a thread parked in run(); queued after every accepted task
        let _ = self.sender.send(Box::new(|| {}));
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl DispatchContext for EventLoop {
    fn post(&self, task: Task) -> bool {
        let closed = self.closed.read();
        if *closed {
            return false;
        }
        self.sender.send(task).is_ok()
    }
}
