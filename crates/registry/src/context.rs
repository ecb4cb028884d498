//! USB context ownership
//!
//! The context owns the backend instance. It is a cheap-clone shared handle;
//! devices and device lists hold a clone, so the backend provably outlives
//! everything derived from it without manual reference counting.

use std::sync::Arc;

use backend::{LogLevel, UsbBackend};
use tracing::debug;

use crate::error::{Error, Result};

/// Shared handle to one initialized USB backend.
pub struct Context<B: UsbBackend> {
    inner: Arc<ContextInner<B>>,
}

struct ContextInner<B> {
    backend: B,
}

impl<B: UsbBackend> std::fmt::Debug for Context<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

impl<B: UsbBackend> Clone for Context<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: UsbBackend> Context<B> {
    /// Initialize the backend and wrap it in a new context.
    ///
    /// Fails with [`Error::Init`] when the backend is unavailable, e.g.
    /// without USB subsystem access.
    pub fn new() -> Result<Self> {
        let backend = B::init().map_err(Error::Init)?;
        debug!("USB context created");
        Ok(Self {
            inner: Arc::new(ContextInner { backend }),
        })
    }

    /// Wrap an already-initialized backend.
    ///
    /// This is the seam tests use to hand a pre-populated
    /// [`MockBackend`](backend::mock::MockBackend) to the registry while
    /// keeping their own clone for topology changes.
    pub fn from_backend(backend: B) -> Self {
        Self {
            inner: Arc::new(ContextInner { backend }),
        }
    }

    /// Set backend log verbosity. Applies to subsequent backend operations;
    /// never fails.
    pub fn set_log_level(&self, level: LogLevel) {
        self.inner.backend.set_log_level(level);
    }

    pub(crate) fn backend(&self) -> &B {
        &self.inner.backend
    }
}
