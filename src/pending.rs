use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

/// Signal from the host telling whether intention requests are still in flight.
///
/// [`IntentionPanel::reset`](crate::IntentionPanel::reset) waits on this before
/// reading the settings source.
pub trait PendingWork {
    /// Returns `true` while requests are outstanding.
    fn has_active_requests(&self) -> bool;

    /// Blocks until no request is outstanding.
    ///
    /// The default implementation polls every `poll`. With `timeout = None` the
    /// wait is unbounded.
    fn wait_until_idle(&self, poll: Duration, timeout: Option<Duration>) -> Result<()> {
        let started = Instant::now();
        while self.has_active_requests() {
            if let Some(limit) = timeout
                && started.elapsed() >= limit
            {
                warn!("pending intention requests still active after {limit:?}");
                return Err(Error::PendingTimeout(limit));
            }
            thread::sleep(poll);
        }
        Ok(())
    }
}

/// Host without asynchronous work.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPendingWork;

impl PendingWork for NoPendingWork {
    fn has_active_requests(&self) -> bool {
        false
    }

    fn wait_until_idle(&self, _poll: Duration, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}

/// Counter of in-flight requests with a wait/notify handshake.
///
/// Producers hold a [`RequestGuard`] for the lifetime of a request; waiters are
/// woken when the last guard drops instead of polling.
#[derive(Debug, Default)]
pub struct IdleSignal {
    active: Mutex<usize>,
    idle: Condvar,
}

impl IdleSignal {
    /// Creates an idle signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request; it stays active until the guard is dropped.
    pub fn begin(&self) -> RequestGuard<'_> {
        *self.active.lock() += 1;
        RequestGuard { signal: self }
    }

    /// Number of requests currently in flight.
    pub fn active(&self) -> usize {
        *self.active.lock()
    }

    fn finish(&self) {
        let mut active = self.active.lock();
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.idle.notify_all();
        }
    }
}

impl PendingWork for IdleSignal {
    fn has_active_requests(&self) -> bool {
        self.active() > 0
    }

    fn wait_until_idle(&self, _poll: Duration, timeout: Option<Duration>) -> Result<()> {
        let mut active = self.active.lock();
        if *active > 0 {
            debug!("waiting for {} pending intention requests", *active);
        }
        match timeout {
            None => self.idle.wait_while(&mut active, |active| *active > 0),
            Some(limit) => {
                let result = self
                    .idle
                    .wait_while_for(&mut active, |active| *active > 0, limit);
                if result.timed_out() && *active > 0 {
                    warn!("pending intention requests still active after {limit:?}");
                    return Err(Error::PendingTimeout(limit));
                }
            }
        }
        Ok(())
    }
}

/// Marks one in-flight request on an [`IdleSignal`].
#[must_use = "the request ends when the guard is dropped"]
#[derive(Debug)]
pub struct RequestGuard<'a> {
    signal: &'a IdleSignal,
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.signal.finish();
    }
}
