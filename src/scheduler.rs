//! Debounced persistence scheduling.
//!
//! Rapid successive mutations would otherwise trigger one network save each;
//! the saver coalesces them so the remote store only ever observes the
//! latest snapshot of a burst.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::AppData;

type SaveFn = Box<dyn Fn(AppData) -> BoxFuture<'static, ()> + Send + Sync>;

enum Msg {
  Schedule(AppData),
  Cancel,
}

/// Coalesces bursts of mutations into a single save after a quiet period.
///
/// Each `schedule` call re-arms the timer with the given snapshot; only the
/// most recent snapshot of a burst survives. A save already in flight is
/// never cancelled — mutations arriving during it arm the next window.
pub struct DebouncedSaver {
  tx: mpsc::UnboundedSender<Msg>,
  worker: JoinHandle<()>,
}

impl DebouncedSaver {
  pub fn new<F, Fut>(quiet: Duration, save: F) -> Self
  where
    F: Fn(AppData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let save: SaveFn = Box::new(move |data| Box::pin(save(data)));
    let (tx, rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(run(quiet, save, rx));

    Self { tx, worker }
  }

  /// Arm (or re-arm) the quiet-period timer with the latest snapshot.
  pub fn schedule(&self, data: AppData) {
    let _ = self.tx.send(Msg::Schedule(data));
  }

  /// Disarm a pending timer. An in-flight save is unaffected.
  pub fn cancel(&self) {
    let _ = self.tx.send(Msg::Cancel);
  }
}

impl Drop for DebouncedSaver {
  fn drop(&mut self) {
    self.worker.abort();
  }
}

async fn run(quiet: Duration, save: SaveFn, mut rx: mpsc::UnboundedReceiver<Msg>) {
  while let Some(msg) = rx.recv().await {
    let mut pending = match msg {
      Msg::Schedule(data) => data,
      Msg::Cancel => continue,
    };

    // Quiet-period window; every new snapshot restarts it.
    let fire = loop {
      tokio::select! {
        _ = tokio::time::sleep(quiet) => break true,
        msg = rx.recv() => match msg {
          Some(Msg::Schedule(data)) => pending = data,
          Some(Msg::Cancel) => break false,
          None => break false,
        },
      }
    };

    if fire {
      save(pending).await;
    }
  }
}
