//! TTL Sweeper Task
//!
//! Background thread that periodically removes expired cache entries.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::CacheEngine;
use crate::error::{CacheError, Result};

// == Sweeper ==
/// Handle to the background sweep thread.
///
/// The thread waits on a stop channel with the sweep interval as timeout, so a
/// stop request interrupts the wait immediately. Dropping the handle without
/// calling [`Sweeper::shutdown`] also stops the loop, without waiting.
#[derive(Debug)]
pub struct Sweeper {
    stop_tx: Option<Sender<()>>,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns a sweeper running `cleanup()` on the shared engine.
    pub fn for_engine<V>(engine: Arc<Mutex<CacheEngine<V>>>, interval: Duration) -> Result<Self>
    where
        V: Send + 'static,
    {
        Self::spawn(interval, move || engine.lock().cleanup())
    }

    /// Spawns a thread calling `sweep` once per `interval` until stopped.
    ///
    /// `sweep` returns the number of entries it removed. A panicking sweep is
    /// logged and the loop keeps going.
    pub fn spawn<F>(interval: Duration, mut sweep: F) -> Result<Self>
    where
        F: FnMut() -> usize + Send + 'static,
    {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("quickcache-sweeper".to_string())
            .spawn(move || {
                info!(
                    "Starting TTL sweeper with interval of {} ms",
                    interval.as_millis()
                );

                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    run_sweep(&mut sweep);
                }

                debug!("TTL sweeper loop exited");
                let _ = done_tx.send(());
            })
            .map_err(|e| CacheError::Internal(format!("failed to spawn sweeper thread: {}", e)))?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            done_rx,
            handle: Some(handle),
        })
    }

    /// True until the sweep thread has exited.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Signals stop and waits up to `timeout` for the thread to finish.
    ///
    /// Returns `false` if the thread was still busy when the timeout elapsed;
    /// it is then detached and exits after its current sweep.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        match self.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("TTL sweeper thread terminated abnormally");
                }
                info!("TTL sweeper stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "TTL sweeper did not stop within {} ms, continuing shutdown",
                    timeout.as_millis()
                );
                false
            }
        }
    }
}

/// Runs one sweep, containing any panic.
fn run_sweep<F>(sweep: &mut F)
where
    F: FnMut() -> usize,
{
    match panic::catch_unwind(AssertUnwindSafe(|| sweep())) {
        Ok(0) => debug!("TTL cleanup: no expired entries found"),
        Ok(removed) => info!("TTL cleanup: removed {} expired entries", removed),
        Err(e) => {
            let panic_msg = if let Some(s) = e.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = e.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            error!(panic = %panic_msg, "TTL sweep panicked");
        }
    }
}
