//! Cooperative cancellation for work owned by a scope.
//!
//! A [`CancellationTrigger`] belongs to the owner (the view model); each
//! piece of work it starts gets a [`CancellationToken`]. Firing the trigger
//! is sticky: tokens created afterwards observe it too.

use crate::error::{NewsError, Result};
use std::future::Future;
use tokio::sync::watch;

/// Observer half. Cheap to clone.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: watch::Receiver<bool>,
}

/// Owner half.
#[derive(Debug)]
pub struct CancellationTrigger {
    cancelled: watch::Sender<bool>,
}

impl CancellationToken {
    /// Fresh token and its trigger.
    pub fn new() -> (Self, CancellationTrigger) {
        let (tx, rx) = watch::channel(false);
        (
            CancellationToken { cancelled: rx },
            CancellationTrigger { cancelled: tx },
        )
    }

    /// A token that never fires.
    pub fn never() -> Self {
        Self::new().0
    }

    /// Whether the trigger has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the trigger fires. Never resolves if the trigger is
    /// dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Run `work`, abandoning it with [`NewsError::Cancelled`] if the trigger fires first.
    ///
    /// # Examples
    ///
    /// ```
    /// use news_sources::error::NewsError;
    /// use news_sources::scope::CancellationToken;
    ///
    /// # tokio_test::block_on(async {
    /// let (token, trigger) = CancellationToken::new();
    /// trigger.cancel();
    /// let result = token.guard(std::future::pending::<news_sources::Result<()>>()).await;
    /// assert!(matches!(result, Err(NewsError::Cancelled)));
    /// # });
    /// ```
    pub async fn guard<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(NewsError::Cancelled),
            result = work => result,
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::never()
    }
}

impl CancellationTrigger {
    /// Fire. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    /// Whether [`CancellationTrigger::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// New token observing this trigger.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            cancelled: self.cancelled.subscribe(),
        }
    }
}
