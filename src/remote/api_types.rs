//! Serde wire types for the remote data endpoint.
//!
//! These are separate from domain types so the read path can be lenient:
//! collections that are missing or not arrays become empty, malformed
//! elements are dropped, and timestamps that fail to parse fall back to the
//! current time instead of failing the whole payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{AppData, Employee, Machine, Operation, Project};

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOperation {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub employee: String,
  #[serde(default)]
  pub machine: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project: Option<String>,
  #[serde(default)]
  pub start_time: String,
  #[serde(default)]
  pub end_time: String,
  #[serde(default)]
  pub quantity: u32,
  #[serde(default)]
  pub created_at: String,
}

/// The aggregate as it travels over the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiAppData {
  #[serde(default, deserialize_with = "lenient_seq")]
  pub operations: Vec<ApiOperation>,
  #[serde(default, deserialize_with = "lenient_seq")]
  pub employees: Vec<Employee>,
  #[serde(default, deserialize_with = "lenient_seq")]
  pub machines: Vec<Machine>,
  #[serde(default, deserialize_with = "lenient_seq")]
  pub projects: Vec<Project>,
}

/// Body of a save response. An unparseable body on a 2xx still counts as
/// success, so every field is defaulted.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSaveResponse {
  #[serde(default = "default_true")]
  pub success: bool,
  #[serde(default)]
  pub error: Option<String>,
}

impl Default for ApiSaveResponse {
  fn default() -> Self {
    Self {
      success: true,
      error: None,
    }
  }
}

fn default_true() -> bool {
  true
}

/// Accept anything in a collection slot: non-arrays become empty, malformed
/// elements are dropped.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: serde::de::DeserializeOwned,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  match value {
    serde_json::Value::Array(items) => Ok(
      items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect(),
    ),
    _ => Ok(Vec::new()),
  }
}

// ============================================================================
// Conversions to and from domain types
// ============================================================================

impl ApiOperation {
  /// Convert to the domain type; `now` replaces timestamps that are missing
  /// or unparseable.
  pub fn into_operation(self, now: DateTime<Utc>) -> Operation {
    Operation {
      id: self.id,
      employee: self.employee,
      machine: self.machine,
      project: self.project,
      start_time: parse_timestamp(&self.start_time, now),
      end_time: parse_timestamp(&self.end_time, now),
      quantity: self.quantity,
      created_at: parse_timestamp(&self.created_at, now),
    }
  }
}

impl From<&Operation> for ApiOperation {
  fn from(op: &Operation) -> Self {
    ApiOperation {
      id: op.id.clone(),
      employee: op.employee.clone(),
      machine: op.machine.clone(),
      project: op.project.clone(),
      start_time: op.start_time.to_rfc3339(),
      end_time: op.end_time.to_rfc3339(),
      quantity: op.quantity,
      created_at: op.created_at.to_rfc3339(),
    }
  }
}

impl ApiAppData {
  pub fn into_app_data(self, now: DateTime<Utc>) -> AppData {
    AppData {
      operations: self
        .operations
        .into_iter()
        .map(|op| op.into_operation(now))
        .collect(),
      employees: self.employees,
      machines: self.machines,
      projects: self.projects,
    }
  }
}

impl From<&AppData> for ApiAppData {
  fn from(data: &AppData) -> Self {
    ApiAppData {
      operations: data.operations.iter().map(ApiOperation::from).collect(),
      employees: data.employees.clone(),
      machines: data.machines.clone(),
      projects: data.projects.clone(),
    }
  }
}

/// RFC 3339 first; fall back to `now` rather than rejecting the record.
fn parse_timestamp(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
  raw.parse::<DateTime<Utc>>().unwrap_or(now)
}
