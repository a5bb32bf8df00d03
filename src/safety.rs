//! Shutdown guard.
//!
//! Process termination can arrive while either loop is mid-poll.  The
//! guard makes the "outputs off before exit" step unconditional and
//! independent of the supervisor state.
//!
//! ## Shutdown lifecycle
//!
//! 1. `main` creates the [`ShutdownGuard`] and registers one cleanup per
//!    output (force gas valve off, force igniter off).
//! 2. Both loops receive the guard's [`CancelToken`].
//! 3. The signal handler calls [`ShutdownHandle::trigger`]: the token is
//!    cancelled and every cleanup runs right away, on the handler thread.
//! 4. The loops notice the token within one sleep slice, run their own
//!    `shutdown()` and return.
//! 5. Dropping the guard runs the cleanups once more.
//!
//! Cleanups must be idempotent; they can run several times.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};

// ── Cancellation ──────────────────────────────────────────────

/// Cooperative stop signal shared by the control loops.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

// ── Guard ─────────────────────────────────────────────────────

type CleanupFn = Box<dyn Fn() + Send + Sync>;

struct Cleanup {
    label: &'static str,
    action: CleanupFn,
}

struct Inner {
    token: CancelToken,
    cleanups: Mutex<Vec<Cleanup>>,
    requested: AtomicBool,
}

impl Inner {
    fn run_cleanups(&self) {
        let cleanups = self.cleanups.lock().unwrap_or_else(PoisonError::into_inner);
        for cleanup in cleanups.iter() {
            debug!("shutdown: {}", cleanup.label);
            (cleanup.action)();
        }
    }
}

/// Owns the cancellation token and the guaranteed-run cleanup steps.
pub struct ShutdownGuard {
    inner: Arc<Inner>,
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownGuard")
            .field("cancelled", &self.inner.token.is_cancelled())
            .field("requested", &self.inner.requested.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancelToken::new(),
                cleanups: Mutex::new(Vec::new()),
                requested: AtomicBool::new(false),
            }),
        }
    }

    /// Token to hand to each control loop.
    pub fn token(&self) -> CancelToken {
        self.inner.token.clone()
    }

    /// Handle for the signal handler.
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Register a cleanup step.  Steps run in registration order.
    pub fn register(&self, label: &'static str, action: impl Fn() + Send + Sync + 'static) {
        self.inner
            .cleanups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Cleanup {
                label,
                action: Box::new(action),
            });
    }

    /// Cancel the loops and run every cleanup now.
    pub fn run_cleanups(&self) {
        self.inner.token.cancel();
        self.inner.run_cleanups();
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.run_cleanups();
    }
}

/// Cloneable trigger for the shutdown path.
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<Inner>,
}

impl ShutdownHandle {
    /// Request shutdown: cancel the loops and force the outputs off.
    ///
    /// Returns `true` on the first request.
    pub fn trigger(&self) -> bool {
        let first = !self.inner.requested.swap(true, Ordering::AcqRel);
        if first {
            warn!("Termination requested: forcing gas valve and igniter off");
        }
        self.inner.token.cancel();
        self.inner.run_cleanups();
        first
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Acquire)
    }
}
