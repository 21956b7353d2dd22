use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

/// Shared flag telling a [`Ticker`] callback that its ticker was stopped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// A background thread that calls a closure at a fixed interval until it
/// is cancelled.
///
/// Stopping is two steps so callers can split them around their own locks:
/// [`Ticker::cancel`] flips the token and closes the wake-up channel so the
/// thread never starts another tick, and [`Ticker::join`] waits for a tick
/// already in flight to finish.
pub struct Ticker {
    token: CancelToken,
    wake: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<F>(name: &str, interval: Duration, mut on_tick: F) -> Result<Self>
    where
        F: FnMut(&CancelToken) + Send + 'static,
    {
        let token = CancelToken::default();
        let (wake, wake_rx) = mpsc::channel::<()>();
        let worker_token = token.clone();

        let worker = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let mut next_tick = Instant::now() + interval;
                loop {
                    let wait = next_tick.saturating_duration_since(Instant::now());
                    match wake_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    if worker_token.is_cancelled() {
                        break;
                    }

                    on_tick(&worker_token);

                    next_tick += interval;
                    let now = Instant::now();
                    if next_tick <= now {
                        // Fell behind; drop the missed ticks.
                        next_tick = now + interval;
                    }
                }
            })
            .with_context(|| format!("failed to spawn {name} thread"))?;

        Ok(Self {
            token,
            wake: Some(wake),
            worker: Some(worker),
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Prevents any further tick from starting. Does not block.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.wake.take();
    }

    /// Cancels, then blocks until the thread has exited.
    ///
    /// Called from inside a tick (the ticker's own thread) this only
    /// cancels, since a thread cannot wait for itself.
    pub fn join(mut self) -> Result<()> {
        self.cancel();
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        if worker.thread().id() == thread::current().id() {
            return Ok(());
        }
        worker
            .join()
            .map_err(|_| anyhow!("ticker thread panicked"))
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
