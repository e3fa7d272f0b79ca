//! Cancellation and progress reporting shared by the decoder, encoder and loader.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancel flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 0 to 100.
    pub percent: u8,
    pub message: String,
}

impl Progress {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
        }
    }

    /// Percentage of `done` out of `total`, clamped to 100.
    #[must_use]
    pub fn ratio(done: u64, total: u64) -> u8 {
        if total == 0 {
            return 100;
        }
        let percent = done.saturating_mul(100) / total;
        u8::try_from(percent.min(100)).unwrap_or(100)
    }
}

/// Progress callback installed on the decoder or encoder.
pub type ProgressFn = Box<dyn FnMut(Progress) + Send>;
