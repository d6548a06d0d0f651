//! Periodic task runner backing the deadline sweeper.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};

/// Runs a closure at a fixed cadence on a dedicated thread until stopped.
pub(crate) struct Sweeper {
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Sweeper {
    pub(crate) fn spawn(interval: Duration, mut tick: impl FnMut() + Send + 'static) -> Self {
        let (shutdown, signal) = channel::bounded(1);
        let thread = std::thread::spawn(move || loop {
            match signal.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        Self {
            shutdown,
            thread: Some(thread),
        }
    }

    /// Stop the thread and wait for it to exit. Idempotent.
    pub(crate) fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.shutdown.try_send(());
            let _ = thread.join();
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
