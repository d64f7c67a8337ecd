//! Persistence adapter for the aggregate dataset.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::SnapshotStorage;
use crate::config::RetryConfig;
use crate::model::AppData;

use super::api_types::ApiAppData;
use super::transport::DataTransport;

/// Durable read/write of the aggregate against the remote endpoint.
///
/// Network failures never escape this type: reads degrade to the fallback
/// cache (or the built-in defaults), writes resolve to a boolean.
pub struct RemoteStore {
  transport: Arc<dyn DataTransport>,
  cache: Arc<dyn SnapshotStorage>,
  retry: RetryConfig,
  /// Guards the one-time write of the built-in defaults
  seeded: AtomicBool,
}

impl RemoteStore {
  pub fn new(
    transport: Arc<dyn DataTransport>,
    cache: Arc<dyn SnapshotStorage>,
    retry: RetryConfig,
  ) -> Self {
    Self {
      transport,
      cache,
      retry,
      seeded: AtomicBool::new(false),
    }
  }

  /// Fetch the full dataset, retrying with backoff. Falls back to the last
  /// cached snapshot, then to the built-in defaults.
  pub async fn fetch_all(&self) -> AppData {
    for attempt in 1..=self.retry.max_attempts {
      match self.transport.fetch().await {
        Ok(body) => {
          let data = body.into_app_data(Utc::now());
          self.cache_set(&data);
          return data;
        }
        Err(e) => {
          warn!(attempt, error = %e, "fetch attempt failed");
          if attempt < self.retry.max_attempts {
            tokio::time::sleep(self.retry.delay_for(attempt)).await;
          }
        }
      }
    }

    match self.cache.get() {
      Ok(Some(snapshot)) => {
        debug!("serving last known-good snapshot");
        snapshot
      }
      Ok(None) => self.serve_defaults().await,
      Err(e) => {
        warn!(error = %e, "fallback cache unreadable");
        self.serve_defaults().await
      }
    }
  }

  /// Persist the full dataset. Returns whether the write was accepted.
  pub async fn save_all(&self, data: &AppData) -> bool {
    let body = ApiAppData::from(data);
    for attempt in 1..=self.retry.max_attempts {
      match self.transport.store(body.clone()).await {
        Ok(response) if response.success => {
          self.cache_set(data);
          return true;
        }
        Ok(response) => {
          warn!(attempt, error = ?response.error, "store rejected the write");
        }
        Err(e) => {
          warn!(attempt, error = %e, "save attempt failed");
        }
      }
      if attempt < self.retry.max_attempts {
        tokio::time::sleep(self.retry.delay_for(attempt)).await;
      }
    }
    false
  }

  /// Nothing remote, nothing cached: hand out the built-in dataset, and seed
  /// the remote with it the first time so later sessions start from the same
  /// state.
  async fn serve_defaults(&self) -> AppData {
    let defaults = AppData::defaults();
    if !self.seeded.swap(true, Ordering::SeqCst) {
      if !self.save_all(&defaults).await {
        warn!("failed to seed remote store with default dataset");
      }
    }
    defaults
  }

  fn cache_set(&self, data: &AppData) {
    // Cache faults degrade to a miss; they must not fail the adapter call.
    if let Err(e) = self.cache.set(data) {
      warn!(error = %e, "failed to update fallback cache");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;
  use crate::model::Project;
  use crate::remote::api_types::ApiSaveResponse;
  use crate::remote::testing::ScriptedTransport;
  use color_eyre::eyre::eyre;

  fn remote(
    transport: Arc<ScriptedTransport>,
    cache: Arc<dyn SnapshotStorage>,
  ) -> RemoteStore {
    RemoteStore::new(transport, cache, RetryConfig::default())
  }

  fn sample_body() -> ApiAppData {
    serde_json::from_str(r#"{"projects": [{"id": "1-abc", "name": "Alpha"}]}"#).unwrap()
  }

  #[tokio::test(start_paused = true)]
  async fn test_fetch_succeeds_after_two_failures() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_fetch(Err(eyre!("timeout")));
    transport.push_fetch(Err(eyre!("HTTP error 502")));
    transport.push_fetch(Ok(sample_body()));

    let store = remote(Arc::clone(&transport), Arc::new(MemoryStorage::default()));
    let data = store.fetch_all().await;

    assert_eq!(data.projects.len(), 1);
    assert_eq!(data.projects[0].name, "Alpha");
  }

  #[tokio::test(start_paused = true)]
  async fn test_fetch_falls_back_to_cache() {
    let cached = AppData {
      projects: vec![Project {
        id: "7-xyz".to_string(),
        name: "Cached".to_string(),
      }],
      ..AppData::default()
    };
    let cache = Arc::new(MemoryStorage::default());
    cache.set(&cached).unwrap();

    // Script is empty: every fetch attempt fails
    let transport = Arc::new(ScriptedTransport::new());
    let store = remote(Arc::clone(&transport), cache);

    let data = store.fetch_all().await;
    assert_eq!(data, cached);
    // The fallback path must not write anything to the remote
    assert_eq!(transport.stored_count(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_fetch_serves_and_seeds_defaults_once() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = remote(Arc::clone(&transport), Arc::new(MemoryStorage::default()));

    let data = store.fetch_all().await;
    assert_eq!(data, AppData::defaults());
    assert_eq!(transport.stored_count(), 1);

    // Seeding the defaults populated the cache, so the second exhausted
    // fetch serves the cache and does not seed again.
    let data = store.fetch_all().await;
    assert_eq!(data, AppData::defaults());
    assert_eq!(transport.stored_count(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_successful_fetch_updates_cache() {
    let cache = Arc::new(MemoryStorage::default());
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_fetch(Ok(sample_body()));

    let store = RemoteStore::new(
      Arc::clone(&transport) as Arc<dyn DataTransport>,
      Arc::clone(&cache) as Arc<dyn SnapshotStorage>,
      RetryConfig::default(),
    );
    let data = store.fetch_all().await;

    assert_eq!(cache.get().unwrap(), Some(data));
  }

  #[tokio::test(start_paused = true)]
  async fn test_save_updates_cache_on_success() {
    let cache = Arc::new(MemoryStorage::default());
    let transport = Arc::new(ScriptedTransport::new());

    let store = RemoteStore::new(
      Arc::clone(&transport) as Arc<dyn DataTransport>,
      Arc::clone(&cache) as Arc<dyn SnapshotStorage>,
      RetryConfig::default(),
    );

    let data = AppData::defaults();
    assert!(store.save_all(&data).await);
    assert_eq!(cache.get().unwrap(), Some(data));
  }

  #[tokio::test(start_paused = true)]
  async fn test_save_reports_rejection_after_retries() {
    let transport = Arc::new(ScriptedTransport::new());
    for _ in 0..3 {
      transport.push_store(Ok(ApiSaveResponse {
        success: false,
        error: Some("disk full".to_string()),
      }));
    }

    let cache = Arc::new(MemoryStorage::default());
    let store = RemoteStore::new(
      Arc::clone(&transport) as Arc<dyn DataTransport>,
      Arc::clone(&cache) as Arc<dyn SnapshotStorage>,
      RetryConfig::default(),
    );

    assert!(!store.save_all(&AppData::defaults()).await);
    assert_eq!(transport.stored_count(), 3);
    assert!(cache.get().unwrap().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_save_retries_transport_errors() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_store(Err(eyre!("connection reset")));
    // Second attempt hits the end of the script and is accepted

    let store = remote(Arc::clone(&transport), Arc::new(MemoryStorage::default()));
    assert!(store.save_all(&AppData::defaults()).await);
    assert_eq!(transport.stored_count(), 2);
  }
}
