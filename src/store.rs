//! The application store: canonical in-memory collections and mutations.
//!
//! The store owns the dataset exclusively. Mutations apply synchronously in
//! memory, emit a notice, and arm the debounced saver; persistence failures
//! never roll anything back. Uniqueness invariants (employee/machine id,
//! project name) are enforced here, at the mutation boundary.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use color_eyre::Result;
use tokio::sync::mpsc;
use tracing::warn;

use crate::cache::{MemoryStorage, SnapshotStorage, SqliteStorage};
use crate::config::Config;
use crate::model::{
  default_employees, default_machines, operation_token, project_token, slug_id, AppData, Employee,
  Machine, MachineIcon, Operation, Project,
};
use crate::notify::{notice_channel, Notice, NoticeSender};
use crate::remote::{HttpTransport, RemoteStore};
use crate::scheduler::DebouncedSaver;

/// Loading state of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
  Uninitialized,
  Loading,
  Ready,
}

/// Fields for a new operation; id and creation time are assigned by the
/// store. Time-range validation is a UI concern and is not enforced here.
#[derive(Debug, Clone)]
pub struct NewOperation {
  pub employee: String,
  pub machine: String,
  pub project: Option<String>,
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
  pub quantity: u32,
}

pub struct AppStore {
  state: StoreState,
  data: AppData,
  remote: Arc<RemoteStore>,
  saver: DebouncedSaver,
  notices: NoticeSender,
}

impl AppStore {
  /// Build a store over an already-constructed adapter.
  pub fn new(remote: Arc<RemoteStore>, quiet: Duration, notices: NoticeSender) -> Self {
    let saver = {
      let remote = Arc::clone(&remote);
      let notices = notices.clone();
      DebouncedSaver::new(quiet, move |data: AppData| {
        let remote = Arc::clone(&remote);
        let notices = notices.clone();
        async move {
          if !remote.save_all(&data).await {
            notices.send(Notice::SaveFailed);
          }
        }
      })
    };

    Self {
      state: StoreState::Uninitialized,
      data: AppData::default(),
      remote,
      saver,
      notices,
    }
  }

  /// Wire the full stack from configuration: transport, cache variant,
  /// adapter, saver, and the notice channel for the hosting UI.
  pub fn from_config(config: &Config) -> Result<(Self, mpsc::UnboundedReceiver<Notice>)> {
    let transport = Arc::new(HttpTransport::new(&config.api.base_url)?);

    let cache: Arc<dyn SnapshotStorage> = if config.cache.durable {
      match &config.cache.path {
        Some(path) => Arc::new(SqliteStorage::open_at(path)?),
        None => Arc::new(SqliteStorage::open()?),
      }
    } else {
      Arc::new(MemoryStorage::default())
    };

    let remote = Arc::new(RemoteStore::new(transport, cache, config.retry.clone()));
    let (notices, rx) = notice_channel();

    Ok((Self::new(remote, config.save.quiet_period(), notices), rx))
  }

  /// Fetch the dataset and transition to `Ready`. Empty employee and machine
  /// collections are seeded with the built-in defaults; operations and
  /// projects legitimately start empty.
  pub async fn load(&mut self) {
    self.state = StoreState::Loading;
    let mut data = self.remote.fetch_all().await;
    if data.employees.is_empty() {
      data.employees = default_employees();
    }
    if data.machines.is_empty() {
      data.machines = default_machines();
    }
    self.data = data;
    self.state = StoreState::Ready;
  }

  pub fn state(&self) -> StoreState {
    self.state
  }

  pub fn is_ready(&self) -> bool {
    self.state == StoreState::Ready
  }

  pub fn is_loading(&self) -> bool {
    self.state == StoreState::Loading
  }

  pub fn data(&self) -> &AppData {
    &self.data
  }

  pub fn operations(&self) -> &[Operation] {
    &self.data.operations
  }

  pub fn employees(&self) -> &[Employee] {
    &self.data.employees
  }

  pub fn machines(&self) -> &[Machine] {
    &self.data.machines
  }

  pub fn projects(&self) -> &[Project] {
    &self.data.projects
  }

  /// Record a new work session.
  pub fn add_operation(&mut self, fields: NewOperation) -> bool {
    if !self.gate() {
      return false;
    }

    let now = Utc::now();
    let operation = Operation {
      id: operation_token(now),
      employee: fields.employee,
      machine: fields.machine,
      project: fields.project,
      start_time: fields.start_time,
      end_time: fields.end_time,
      quantity: fields.quantity,
      created_at: now,
    };

    self.notices.send(Notice::OperationAdded {
      employee: operation.employee.clone(),
      machine: operation.machine.clone(),
      quantity: operation.quantity,
    });
    self.data.operations.push(operation);
    self.persist();
    true
  }

  /// Drop the whole history. Idempotent.
  pub fn clear_operations(&mut self) -> bool {
    if !self.gate() {
      return false;
    }

    self.data.operations.clear();
    self.notices.send(Notice::OperationsCleared);
    self.persist();
    true
  }

  pub fn add_employee(&mut self, name: &str) -> bool {
    if !self.gate() {
      return false;
    }

    let name = name.trim();
    let id = slug_id(name);
    if self.data.employees.iter().any(|e| e.id == id) {
      self.notices.send(Notice::DuplicateEmployee {
        name: name.to_string(),
      });
      return false;
    }

    self.data.employees.push(Employee {
      id,
      name: name.to_string(),
    });
    self.notices.send(Notice::EmployeeAdded {
      name: name.to_string(),
    });
    self.persist();
    true
  }

  /// Remove by id. Operations referencing the employee keep their raw id;
  /// there is no cascade.
  pub fn remove_employee(&mut self, id: &str) -> bool {
    if !self.gate() {
      return false;
    }

    self.data.employees.retain(|e| e.id != id);
    self.notices.send(Notice::EmployeeRemoved { id: id.to_string() });
    self.persist();
    true
  }

  pub fn add_machine(&mut self, name: &str, icon: Option<MachineIcon>) -> bool {
    if !self.gate() {
      return false;
    }

    let name = name.trim();
    let id = slug_id(name);
    if self.data.machines.iter().any(|m| m.id == id) {
      self.notices.send(Notice::DuplicateMachine {
        name: name.to_string(),
      });
      return false;
    }

    self.data.machines.push(Machine {
      id,
      name: name.to_string(),
      icon,
    });
    self.notices.send(Notice::MachineAdded {
      name: name.to_string(),
    });
    self.persist();
    true
  }

  pub fn remove_machine(&mut self, id: &str) -> bool {
    if !self.gate() {
      return false;
    }

    self.data.machines.retain(|m| m.id != id);
    self.notices.send(Notice::MachineRemoved { id: id.to_string() });
    self.persist();
    true
  }

  /// Project names are unique case-insensitively.
  pub fn add_project(&mut self, name: &str) -> bool {
    if !self.gate() {
      return false;
    }

    let name = name.trim();
    if self.has_project_named(name) {
      self.notices.send(Notice::DuplicateProject {
        name: name.to_string(),
      });
      return false;
    }

    self.data.projects.push(Project {
      id: project_token(Utc::now()),
      name: name.to_string(),
    });
    self.notices.send(Notice::ProjectAdded {
      name: name.to_string(),
    });
    self.persist();
    true
  }

  pub fn remove_project(&mut self, id: &str) -> bool {
    if !self.gate() {
      return false;
    }

    self.data.projects.retain(|p| p.id != id);
    self.notices.send(Notice::ProjectRemoved { id: id.to_string() });
    self.persist();
    true
  }

  /// Bulk insert from an externally-parsed sheet. Names colliding with an
  /// existing project (or an earlier entry of the same batch) are dropped
  /// and counted, not errors.
  pub fn import_projects(&mut self, names: &[String]) -> bool {
    if !self.gate() {
      return false;
    }

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for name in names {
      let name = name.trim();
      if self.has_project_named(name) {
        skipped += 1;
        continue;
      }
      self.data.projects.push(Project {
        id: project_token(Utc::now()),
        name: name.to_string(),
      });
      imported += 1;
    }

    if skipped > 0 {
      self.notices.send(Notice::ProjectsSkipped { skipped });
    }
    self.notices.send(Notice::ProjectsImported { imported });
    self.persist();
    true
  }

  /// Disarm any pending save; hosts call this on teardown.
  pub fn shutdown(&self) {
    self.saver.cancel();
  }

  fn has_project_named(&self, name: &str) -> bool {
    let lower = name.to_lowercase();
    self
      .data
      .projects
      .iter()
      .any(|p| p.name.to_lowercase() == lower)
  }

  fn gate(&self) -> bool {
    if self.is_ready() {
      return true;
    }
    warn!(state = ?self.state, "mutation rejected before initial load completed");
    false
  }

  /// Snapshot the collections and arm the debounced save.
  fn persist(&self) {
    self.saver.schedule(self.data.clone());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::RetryConfig;
  use crate::notify::NoticeLevel;
  use crate::remote::testing::ScriptedTransport;
  use crate::remote::ApiAppData;
  use tokio::sync::mpsc::UnboundedReceiver;

  const QUIET: Duration = Duration::from_millis(500);

  async fn ready_store() -> (AppStore, Arc<ScriptedTransport>, UnboundedReceiver<Notice>) {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_fetch(Ok(ApiAppData::default()));

    let remote = Arc::new(RemoteStore::new(
      Arc::clone(&transport) as Arc<dyn crate::remote::DataTransport>,
      Arc::new(MemoryStorage::default()),
      RetryConfig::default(),
    ));
    let (notices, rx) = notice_channel();
    let mut store = AppStore::new(remote, QUIET, notices);
    store.load().await;
    (store, transport, rx)
  }

  fn sample_operation() -> NewOperation {
    let start = Utc::now();
    NewOperation {
      employee: "aneta".to_string(),
      machine: "drukarka".to_string(),
      project: Some("X".to_string()),
      start_time: start,
      end_time: start + chrono::Duration::hours(1),
      quantity: 50,
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_load_seeds_defaults_into_empty_collections() {
    let (store, _, _rx) = ready_store().await;
    assert!(store.is_ready());
    assert_eq!(store.employees().len(), 4);
    assert_eq!(store.machines().len(), 3);
    assert!(store.operations().is_empty());
    assert!(store.projects().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_mutations_rejected_before_load() {
    let transport = Arc::new(ScriptedTransport::new());
    let remote = Arc::new(RemoteStore::new(
      Arc::clone(&transport) as Arc<dyn crate::remote::DataTransport>,
      Arc::new(MemoryStorage::default()),
      RetryConfig::default(),
    ));
    let (notices, _rx) = notice_channel();
    let mut store = AppStore::new(remote, QUIET, notices);

    assert!(!store.add_employee("Jan"));
    assert!(store.employees().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_add_operation_assigns_id_and_created_at() {
    let (mut store, _, mut rx) = ready_store().await;
    let before = Utc::now();

    assert!(store.add_operation(sample_operation()));

    assert_eq!(store.operations().len(), 1);
    let op = &store.operations()[0];
    assert!(!op.id.is_empty());
    assert_eq!(op.quantity, 50);
    assert!(op.created_at >= before);
    assert_eq!(
      crate::report::format_duration(op.start_time, op.end_time),
      "1h 0m"
    );

    let notice = rx.try_recv().unwrap();
    assert_eq!(
      notice,
      Notice::OperationAdded {
        employee: "aneta".to_string(),
        machine: "drukarka".to_string(),
        quantity: 50,
      }
    );
    assert_eq!(notice.level(), NoticeLevel::Success);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_operations_is_idempotent() {
    let (mut store, _, _rx) = ready_store().await;
    store.add_operation(sample_operation());

    assert!(store.clear_operations());
    assert!(store.operations().is_empty());
    assert!(store.clear_operations());
    assert!(store.operations().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_duplicate_employee_is_rejected() {
    let (mut store, _, mut rx) = ready_store().await;

    assert!(store.add_employee("Jan Kowalski"));
    let count = store.employees().len();

    // Same id after normalization
    assert!(!store.add_employee("  jan   KOWALSKI "));
    assert_eq!(store.employees().len(), count);

    // Ids stay unique across the collection
    let mut ids: Vec<_> = store.employees().iter().map(|e| e.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), store.employees().len());

    assert_eq!(rx.try_recv().unwrap().level(), NoticeLevel::Success);
    assert_eq!(rx.try_recv().unwrap().level(), NoticeLevel::Error);
  }

  #[tokio::test(start_paused = true)]
  async fn test_duplicate_machine_is_rejected() {
    let (mut store, _, _rx) = ready_store().await;

    assert!(store.add_machine("Sztanca", Some(MachineIcon::Scissors)));
    assert!(!store.add_machine("sztanca", None));
    assert_eq!(
      store.machines().iter().filter(|m| m.id == "sztanca").count(),
      1
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_remove_employee_keeps_referencing_operations() {
    let (mut store, _, _rx) = ready_store().await;
    let fields = NewOperation {
      employee: "adam".to_string(),
      ..sample_operation()
    };
    store.add_operation(fields);

    assert!(store.remove_employee("adam"));
    assert!(store.employees().iter().all(|e| e.id != "adam"));
    assert_eq!(store.operations()[0].employee, "adam");
  }

  #[tokio::test(start_paused = true)]
  async fn test_duplicate_project_name_is_case_insensitive() {
    let (mut store, _, _rx) = ready_store().await;

    assert!(store.add_project("Alpha"));
    assert!(!store.add_project("ALPHA"));
    assert_eq!(store.projects().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_import_drops_and_counts_duplicates() {
    let (mut store, _, mut rx) = ready_store().await;

    let names = vec![
      "Alpha".to_string(),
      "Alpha".to_string(),
      "Beta".to_string(),
    ];
    assert!(store.import_projects(&names));

    assert_eq!(store.projects().len(), 2);
    let names: Vec<_> = store.projects().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);

    assert_eq!(rx.try_recv().unwrap(), Notice::ProjectsSkipped { skipped: 1 });
    assert_eq!(
      rx.try_recv().unwrap(),
      Notice::ProjectsImported { imported: 2 }
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_imported_projects_get_distinct_ids() {
    let (mut store, _, _rx) = ready_store().await;

    let names: Vec<String> = (0..20).map(|i| format!("Project {}", i)).collect();
    store.import_projects(&names);

    let mut ids: Vec<_> = store.projects().iter().map(|p| p.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
  }

  #[tokio::test(start_paused = true)]
  async fn test_burst_of_mutations_persists_once() {
    let (mut store, transport, _rx) = ready_store().await;

    for i in 0..10 {
      store.add_project(&format!("Project {}", i));
    }
    tokio::time::sleep(QUIET + Duration::from_millis(100)).await;

    assert_eq!(transport.stored_count(), 1);
    let stored = transport.stored.lock().unwrap();
    assert_eq!(stored[0].projects.len(), 10);
  }

  #[tokio::test(start_paused = true)]
  async fn test_save_failure_emits_notice_and_keeps_state() {
    let (mut store, transport, mut rx) = ready_store().await;
    for _ in 0..3 {
      transport.push_store(Err(color_eyre::eyre::eyre!("connection refused")));
    }

    store.add_project("Alpha");
    // Quiet period, then three failing attempts with backoff in between
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(transport.stored_count(), 3);
    assert_eq!(store.projects().len(), 1);

    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
      notices.push(notice);
    }
    assert!(notices.contains(&Notice::SaveFailed));
  }
}
