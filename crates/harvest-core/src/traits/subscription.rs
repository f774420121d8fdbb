//! Subscription guard returned by live document subscriptions.

use std::fmt;

/// Handle to a live subscription
///
/// The listener (a backend snapshot listener or a polling task) stays alive
/// until [`Subscription::unsubscribe`] is called or the guard is dropped.
/// `unsubscribe` consumes the guard, so the release runs exactly once.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    /// Wrap a release closure
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Release the underlying listener
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
