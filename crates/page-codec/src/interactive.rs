//! Task queue for the interactive thread.
//!
//! Workers never touch the widget host directly. They post boxed tasks through
//! a [`UiHandle`]; the thread that owns the [`InteractiveQueue`] runs them
//! with a [`UiThread`] token, which cannot leave that thread.
//!
//! ```text
//! [parser] --> [resources] --UiHandle::post--> [InteractiveQueue::run_pending]
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use crate::error::{CodecError, Result};

/// Thread name reported when the interactive side has gone away.
pub const INTERACTIVE_THREAD: &str = "interactive";

/// Proof that code runs on the interactive thread.
///
/// Only [`InteractiveQueue`] creates one, and it is neither `Send` nor `Sync`.
pub struct UiThread {
    _not_send: PhantomData<*const ()>,
}

impl UiThread {
    fn new() -> Self {
        Self {
            _not_send: PhantomData,
        }
    }
}

impl fmt::Debug for UiThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UiThread")
    }
}

/// Work posted to the interactive thread.
pub type UiTask<H> = Box<dyn FnOnce(&UiThread, &mut H) + Send>;

/// Sending side, cloned into workers.
pub struct UiHandle<H> {
    sender: Sender<UiTask<H>>,
}

impl<H> Clone for UiHandle<H> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<H> fmt::Debug for UiHandle<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHandle").finish_non_exhaustive()
    }
}

impl<H: 'static> UiHandle<H> {
    /// Queue `task` for the interactive thread.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::WorkerStopped`] if the queue has been dropped.
    pub fn post(&self, task: impl FnOnce(&UiThread, &mut H) + Send + 'static) -> Result<()> {
        self.sender
            .send(Box::new(task))
            .map_err(|_| CodecError::WorkerStopped {
                worker: INTERACTIVE_THREAD.to_string(),
            })
    }
}

/// Receiving side. Owns the host and stays on the thread that created it.
pub struct InteractiveQueue<H> {
    host: H,
    token: UiThread,
    sender: Sender<UiTask<H>>,
    receiver: Receiver<UiTask<H>>,
}

impl<H: 'static> InteractiveQueue<H> {
    pub fn new(host: H) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            host,
            token: UiThread::new(),
            sender,
            receiver,
        }
    }

    #[must_use]
    pub fn handle(&self) -> UiHandle<H> {
        UiHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// The token, for running interactive-only code directly.
    pub fn ui(&self) -> &UiThread {
        &self.token
    }

    /// Run `f` directly on this thread with the token and the host.
    pub fn with_host<R>(&mut self, f: impl FnOnce(&UiThread, &mut H) -> R) -> R {
        f(&self.token, &mut self.host)
    }

    /// Run everything queued so far without blocking. Returns the number of
    /// tasks run.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task(&self.token, &mut self.host);
                    ran += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if ran > 0 {
            tracing::debug!(ran, "interactive tasks run");
        }
        ran
    }

    /// Block until one task arrives or `timeout` elapses, then run it along
    /// with anything queued behind it.
    pub fn run_next(&mut self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                task(&self.token, &mut self.host);
                1 + self.run_pending()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }
}

impl<H> fmt::Debug for InteractiveQueue<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractiveQueue").finish_non_exhaustive()
    }
}
