//! Shared poll-until-terminal machinery for orders and challenges.
//!
//! Polls sleep 5 seconds apart but are bounded by an overall timeout so a
//! wedged CA can't hang the process forever.

use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const POLL_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Tracks the 10-minute ceiling for one poll loop (one order, or one
/// challenge). Call [`Deadline::check`] before each wait.
pub struct Deadline {
    start: Instant,
    timeout: Duration,
    what: String,
}

impl Deadline {
    pub fn start(what: impl Into<String>) -> Self {
        Self::start_with_timeout(what, POLL_TIMEOUT)
    }

    /// Like [`Deadline::start`] but with a caller-chosen ceiling; used by
    /// tests that need to observe a timeout without waiting the full 10
    /// minutes.
    pub fn start_with_timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Deadline {
            start: Instant::now(),
            timeout,
            what: what.into(),
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.start.elapsed() > self.timeout {
            Err(Error::PollTimeout(self.what.clone()))
        } else {
            Ok(())
        }
    }

    pub fn wait(&self) -> Result<()> {
        self.check()?;
        sleep(POLL_INTERVAL);
        Ok(())
    }
}
