//! Cancellation tied to the lifetime of the flow that asked for an image.

use std::sync::{Arc, Weak};

use tokio::sync::watch;

/// Owned by the report draft. Cancels every token when fired or dropped.
#[derive(Debug)]
pub struct CancelHandle {
  tx: Arc<watch::Sender<bool>>,
}

/// A detached trigger for a [`CancelHandle`], usable while the owner of the
/// handle is busy. It does not keep the handle alive.
#[derive(Debug, Clone)]
pub struct Canceller {
  tx: Weak<watch::Sender<bool>>,
}

/// Observed by the pipeline between and during tiers.
#[derive(Debug, Clone)]
pub struct CancelToken {
  rx: watch::Receiver<bool>,
}

impl CancelHandle {
  pub fn new() -> Self {
    let (tx, _) = watch::channel(false);
    Self { tx: Arc::new(tx) }
  }

  pub fn token(&self) -> CancelToken { CancelToken { rx: self.tx.subscribe() } }

  pub fn canceller(&self) -> Canceller { Canceller { tx: Arc::downgrade(&self.tx) } }

  pub fn cancel(&self) { self.tx.send_replace(true); }
}

impl Canceller {
  /// Fire the handle. A no-op once the handle is gone.
  pub fn cancel(&self) {
    if let Some(tx) = self.tx.upgrade() {
      tx.send_replace(true);
    }
  }
}

impl Default for CancelHandle {
  fn default() -> Self { Self::new() }
}

impl CancelToken {
  pub fn is_cancelled(&self) -> bool {
    // A dropped handle counts as cancelled.
    *self.rx.borrow() || self.rx.has_changed().is_err()
  }

  /// Resolves once the handle is fired or dropped.
  pub async fn cancelled(&self) {
    let mut rx = self.rx.clone();
    loop {
      if *rx.borrow_and_update() {
        return;
      }
      if rx.changed().await.is_err() {
        return;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn fire_cancels_tokens() {
    let handle = CancelHandle::new();
    let token = handle.token();
    assert!(!token.is_cancelled());
    handle.cancel();
    assert!(token.is_cancelled());
    tokio::time::timeout(Duration::from_secs(1), token.cancelled())
      .await
      .expect("cancelled() resolves");
  }

  #[tokio::test]
  async fn drop_cancels_tokens() {
    let handle = CancelHandle::new();
    let token = handle.token();
    let waiter = tokio::spawn({
      let token = token.clone();
      async move { token.cancelled().await }
    });
    drop(handle);
    assert!(token.is_cancelled());
    tokio::time::timeout(Duration::from_secs(1), waiter)
      .await
      .expect("waiter finishes")
      .unwrap();
  }

  #[tokio::test]
  async fn canceller_fires_from_another_task_without_owning_the_handle() {
    let handle = CancelHandle::new();
    let token = handle.token();
    let canceller = handle.canceller();
    tokio::spawn(async move { canceller.cancel() }).await.unwrap();
    assert!(token.is_cancelled());

    let handle = CancelHandle::new();
    let token = handle.token();
    let canceller = handle.canceller();
    drop(handle);
    assert!(token.is_cancelled());
    canceller.cancel();
  }

  #[tokio::test]
  async fn live_handle_does_not_cancel() {
    let handle = CancelHandle::new();
    let token = handle.token();
    let waited = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
    assert!(waited.is_err());
    assert!(!handle.token().is_cancelled());
  }
}
