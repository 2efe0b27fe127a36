//! Single-threaded dispatch for designer mutations.
//!
//! The form model is not thread-safe; every mutation runs on the designer's
//! UI thread. Background work hands closures over via a queue that the UI
//! loop pumps. Calls made from the UI thread itself run directly, so
//! re-entrant dispatch never deadlocks.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, ThreadId};

type Task = Box<dyn FnOnce() + Send>;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("the dispatcher was dropped before the task ran")]
    Disconnected,
}

/// Owns the task queue. Created on the UI thread; [`pump`](Self::pump) must
/// be called from that thread.
pub struct Dispatcher {
    ui_thread: ThreadId,
    tx: Sender<Task>,
    rx: Receiver<Task>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            ui_thread: thread::current().id(),
            tx,
            rx,
        }
    }

    /// A cloneable handle for queueing work from any thread.
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            ui_thread: self.ui_thread,
            tx: self.tx.clone(),
        }
    }

    /// Runs every queued task. Returns how many ran.
    pub fn pump(&self) -> usize {
        debug_assert_eq!(thread::current().id(), self.ui_thread);
        let mut count = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            count += 1;
        }
        count
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct DispatchHandle {
    ui_thread: ThreadId,
    tx: Sender<Task>,
}

impl DispatchHandle {
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    /// Queues `f` to run on the next pump. Fire-and-forget.
    pub fn invoke_later(
        &self,
        f: impl FnOnce() + Send + 'static,
    ) -> Result<(), DispatchError> {
        self.tx
            .send(Box::new(f))
            .map_err(|_| DispatchError::Disconnected)
    }

    /// Runs `f` on the UI thread and returns its result. On the UI thread
    /// the closure runs immediately; elsewhere the caller blocks until the
    /// UI loop pumps the task.
    pub fn invoke_and_wait<R: Send + 'static>(
        &self,
        f: impl FnOnce() -> R + Send + 'static,
    ) -> Result<R, DispatchError> {
        if self.is_ui_thread() {
            return Ok(f());
        }
        let (done_tx, done_rx) = channel();
        self.tx
            .send(Box::new(move || {
                // The waiter may have given up; a dead receiver is fine.
                let _ = done_tx.send(f());
            }))
            .map_err(|_| DispatchError::Disconnected)?;
        done_rx.recv().map_err(|_| DispatchError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn ui_thread_calls_run_immediately() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        // No pump has happened, yet the result is already here.
        let result = handle.invoke_and_wait(|| 7).unwrap();
        assert_eq!(result, 7);
    }

    #[test]
    fn queued_tasks_run_in_order_on_pump() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = Arc::clone(&log);
            handle.invoke_later(move || log.lock().unwrap().push(i)).unwrap();
        }
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(dispatcher.pump(), 3);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn cross_thread_wait_returns_the_result() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        let worker = thread::spawn(move || handle.invoke_and_wait(|| 41 + 1).unwrap());
        // Spin-pump until the worker's task lands.
        while !worker.is_finished() {
            dispatcher.pump();
            thread::yield_now();
        }
        assert_eq!(worker.join().unwrap(), 42);
    }
}
