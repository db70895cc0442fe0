//! Per-call deadline and cancellation options.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{CompanionError, CompanionResult};

/// A shareable flag a caller flips to abandon an outstanding call.
///
/// Clones observe the same flag. The transport checks it before sending and
/// between streamed fragments; a blocking read already in progress is bounded
/// by the deadline instead.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options that bound a single call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overall time budget for the call. `None` uses the transport default.
    pub timeout: Option<Duration>,
    pub cancellation: Option<CancellationFlag>,
}

impl CallOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancellation: None,
        }
    }

    pub fn cancellable(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Start the clock for one call.
    pub fn start(&self) -> CallGuard<'_> {
        CallGuard {
            options: self,
            started: Instant::now(),
        }
    }
}

/// Tracks elapsed time for one in-flight call.
#[derive(Debug)]
pub struct CallGuard<'a> {
    options: &'a CallOptions,
    started: Instant,
}

impl CallGuard<'_> {
    /// Time left before the deadline, if one is set. Zero once expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.options
            .timeout
            .map(|t| t.saturating_sub(self.started.elapsed()))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail if the caller cancelled or the deadline passed.
    pub fn check(&self) -> CompanionResult<()> {
        if let Some(flag) = &self.options.cancellation {
            if flag.is_cancelled() {
                return Err(CompanionError::Cancelled);
            }
        }
        if let Some(timeout) = self.options.timeout {
            if self.started.elapsed() >= timeout {
                return Err(CompanionError::Timeout {
                    elapsed_ms: self.started.elapsed().as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}
