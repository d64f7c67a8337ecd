//! User-facing notices emitted by store mutations.
//!
//! The store never blocks on the consumer: notices go over an unbounded
//! channel and sends to a dropped receiver are silently discarded.

use std::fmt;
use tokio::sync::mpsc;

/// Severity of a notice; maps to toast styling in the hosting UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Success,
  Info,
  Warning,
  Error,
}

/// A transient notification for the hosting UI to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  OperationAdded {
    employee: String,
    machine: String,
    quantity: u32,
  },
  OperationsCleared,
  EmployeeAdded { name: String },
  DuplicateEmployee { name: String },
  EmployeeRemoved { id: String },
  MachineAdded { name: String },
  DuplicateMachine { name: String },
  MachineRemoved { id: String },
  ProjectAdded { name: String },
  DuplicateProject { name: String },
  ProjectRemoved { id: String },
  /// Bulk import dropped entries whose names already existed
  ProjectsSkipped { skipped: usize },
  ProjectsImported { imported: usize },
  SaveFailed,
}

impl Notice {
  pub fn level(&self) -> NoticeLevel {
    match self {
      Notice::OperationAdded { .. }
      | Notice::EmployeeAdded { .. }
      | Notice::MachineAdded { .. }
      | Notice::ProjectAdded { .. }
      | Notice::ProjectsImported { .. } => NoticeLevel::Success,
      Notice::OperationsCleared
      | Notice::EmployeeRemoved { .. }
      | Notice::MachineRemoved { .. }
      | Notice::ProjectRemoved { .. } => NoticeLevel::Info,
      Notice::ProjectsSkipped { .. } => NoticeLevel::Warning,
      Notice::DuplicateEmployee { .. }
      | Notice::DuplicateMachine { .. }
      | Notice::DuplicateProject { .. }
      | Notice::SaveFailed => NoticeLevel::Error,
    }
  }
}

impl fmt::Display for Notice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Notice::OperationAdded {
        employee,
        machine,
        quantity,
      } => write!(
        f,
        "Operation recorded: {} produced {} pcs on {}",
        employee, quantity, machine
      ),
      Notice::OperationsCleared => write!(f, "All operations removed"),
      Notice::EmployeeAdded { name } => write!(f, "Employee {} added", name),
      Notice::DuplicateEmployee { name } => {
        write!(f, "An employee named {} already exists", name)
      }
      Notice::EmployeeRemoved { id } => write!(f, "Employee {} removed", id),
      Notice::MachineAdded { name } => write!(f, "Machine {} added", name),
      Notice::DuplicateMachine { name } => {
        write!(f, "A machine named {} already exists", name)
      }
      Notice::MachineRemoved { id } => write!(f, "Machine {} removed", id),
      Notice::ProjectAdded { name } => write!(f, "Project {} added", name),
      Notice::DuplicateProject { name } => {
        write!(f, "A project named {} already exists", name)
      }
      Notice::ProjectRemoved { id } => write!(f, "Project {} removed", id),
      Notice::ProjectsSkipped { skipped } => {
        write!(f, "Skipped {} duplicate project(s)", skipped)
      }
      Notice::ProjectsImported { imported } => {
        write!(f, "Imported {} project(s)", imported)
      }
      Notice::SaveFailed => write!(f, "Saving failed; changes are kept locally"),
    }
  }
}

/// Sending half of the notice channel, held by the store.
#[derive(Clone)]
pub struct NoticeSender {
  tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
  pub fn send(&self, notice: Notice) {
    // The UI may already be gone; that is not the store's problem.
    let _ = self.tx.send(notice);
  }
}

/// Create the notice channel: sender for the store, receiver for whatever
/// surfaces toasts.
pub fn notice_channel() -> (NoticeSender, mpsc::UnboundedReceiver<Notice>) {
  let (tx, rx) = mpsc::unbounded_channel();
  (NoticeSender { tx }, rx)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_levels() {
    assert_eq!(
      Notice::ProjectsSkipped { skipped: 2 }.level(),
      NoticeLevel::Warning
    );
    assert_eq!(Notice::SaveFailed.level(), NoticeLevel::Error);
    assert_eq!(Notice::OperationsCleared.level(), NoticeLevel::Info);
  }

  #[test]
  fn test_send_without_receiver_is_silent() {
    let (tx, rx) = notice_channel();
    drop(rx);
    tx.send(Notice::OperationsCleared);
  }
}
