//! Domain types for the production log dataset.
//!
//! The aggregate [`AppData`] is the unit of persistence: every save and every
//! cache replacement operates on the whole dataset, never on a single
//! collection.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single recorded production work session.
///
/// `employee` and `machine` are soft references: plain strings compared
/// against entity ids. Removing the referenced entity leaves them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
  pub id: String,
  pub employee: String,
  pub machine: String,
  /// Free-text project name, not a strict foreign key
  pub project: Option<String>,
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
  pub quantity: u32,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub id: String,
  pub name: String,
}

/// Glyph tag for machine rows; the hosting UI maps these to icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineIcon {
  Printer,
  Package,
  Scissors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<MachineIcon>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub id: String,
  pub name: String,
}

/// The aggregate dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppData {
  pub operations: Vec<Operation>,
  pub employees: Vec<Employee>,
  pub machines: Vec<Machine>,
  pub projects: Vec<Project>,
}

impl AppData {
  /// Built-in dataset served when neither the remote store nor the fallback
  /// cache has anything: the shop's standing crew and machines.
  pub fn defaults() -> Self {
    Self {
      operations: Vec::new(),
      employees: default_employees(),
      machines: default_machines(),
      projects: Vec::new(),
    }
  }
}

/// The default crew.
pub fn default_employees() -> Vec<Employee> {
  ["Aneta", "Adam", "Magda", "Piotr"]
    .iter()
    .map(|name| Employee {
      id: slug_id(name),
      name: (*name).to_string(),
    })
    .collect()
}

/// The shop's standing machines.
pub fn default_machines() -> Vec<Machine> {
  vec![
    Machine {
      id: slug_id("Drukarka"),
      name: "Drukarka".to_string(),
      icon: Some(MachineIcon::Printer),
    },
    Machine {
      id: slug_id("Autobox"),
      name: "Autobox".to_string(),
      icon: Some(MachineIcon::Package),
    },
    Machine {
      id: slug_id("Bigówka"),
      name: "Bigówka".to_string(),
      icon: Some(MachineIcon::Scissors),
    },
  ]
}

/// Derive a stable entity id from a display name: trimmed, lowercased,
/// internal whitespace collapsed to single hyphens.
pub fn slug_id(name: &str) -> String {
  let lower = name.trim().to_lowercase();
  lower.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Millisecond-timestamp id for new operations. Uniqueness is not
/// cryptographic; collisions are negligible at human entry rates.
pub fn operation_token(now: DateTime<Utc>) -> String {
  now.timestamp_millis().to_string()
}

/// Token for projects: timestamp plus random suffix, so bulk imports landing
/// in the same millisecond cannot collide.
pub fn project_token(now: DateTime<Utc>) -> String {
  let suffix: String = rand::thread_rng()
    .sample_iter(&rand::distributions::Alphanumeric)
    .take(7)
    .map(|b| (b as char).to_ascii_lowercase())
    .collect();
  format!("{}-{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_slug_collapses_whitespace() {
    assert_eq!(slug_id("  Jan   Kowalski "), "jan-kowalski");
  }

  #[test]
  fn test_slug_lowercases() {
    assert_eq!(slug_id("ANETA"), "aneta");
    assert_eq!(slug_id("Bigówka"), "bigówka");
  }

  #[test]
  fn test_defaults_shape() {
    let data = AppData::defaults();
    assert_eq!(data.employees.len(), 4);
    assert_eq!(data.machines.len(), 3);
    assert!(data.operations.is_empty());
    assert!(data.projects.is_empty());
    assert!(data.employees.iter().any(|e| e.id == "aneta"));
    assert!(data.machines.iter().any(|m| m.id == "drukarka"));
  }

  #[test]
  fn test_project_token_shape() {
    let now = Utc::now();
    let token = project_token(now);
    let (stamp, suffix) = token.split_once('-').expect("token has a suffix");
    assert_eq!(stamp, now.timestamp_millis().to_string());
    assert_eq!(suffix.len(), 7);
  }
}
