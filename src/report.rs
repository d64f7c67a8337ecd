//! Aggregations over the recorded operations for the reporting views.
//!
//! Pure functions; the hosting UI renders the results. Employee and machine
//! ids resolve through the current collections and fall back to the raw id
//! when the entity has since been removed.

use chrono::{DateTime, Utc};

use crate::model::{AppData, Employee, Machine, Operation};

/// Label used for operations recorded without a project.
pub const NO_PROJECT_LABEL: &str = "Brak projektu";

/// Totals for one employee or machine, keyed by the raw id the operations
/// referenced.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageTotals {
  pub id: String,
  pub operations: usize,
  pub quantity: u64,
  pub minutes: f64,
}

impl UsageTotals {
  /// Worked time in hours, one decimal.
  pub fn hours(&self) -> f64 {
    round1(self.minutes / 60.0)
  }
}

/// Overall dataset totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverallTotals {
  pub quantity: u64,
  /// Worked hours, one decimal
  pub hours: f64,
}

impl OverallTotals {
  /// Average produced quantity per worked hour, rounded.
  pub fn avg_per_hour(&self) -> u64 {
    if self.hours == 0.0 {
      return 0;
    }
    (self.quantity as f64 / self.hours).round() as u64
  }
}

/// Production rate for one project/machine combination.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRate {
  pub project: String,
  pub machine: String,
  pub hours: f64,
  pub quantity: u64,
}

impl ProductionRate {
  pub fn per_hour(&self) -> f64 {
    if self.hours > 0.0 {
      self.quantity as f64 / self.hours
    } else {
      0.0
    }
  }
}

/// One row of the spreadsheet export, with ids resolved to display names.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
  pub employee: String,
  pub machine: String,
  pub project: String,
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
  pub duration: String,
  pub quantity: u32,
}

/// Per-employee totals, in first-seen order.
pub fn employee_totals(operations: &[Operation]) -> Vec<UsageTotals> {
  totals_by(operations, |op| op.employee.as_str())
}

/// Per-machine totals, in first-seen order.
pub fn machine_totals(operations: &[Operation]) -> Vec<UsageTotals> {
  totals_by(operations, |op| op.machine.as_str())
}

fn totals_by<'a>(
  operations: &'a [Operation],
  key: impl Fn(&'a Operation) -> &'a str,
) -> Vec<UsageTotals> {
  let mut totals: Vec<UsageTotals> = Vec::new();
  for op in operations {
    let id = key(op);
    let idx = match totals.iter().position(|t| t.id == id) {
      Some(idx) => idx,
      None => {
        totals.push(UsageTotals {
          id: id.to_string(),
          operations: 0,
          quantity: 0,
          minutes: 0.0,
        });
        totals.len() - 1
      }
    };
    let entry = &mut totals[idx];
    entry.operations += 1;
    entry.quantity += u64::from(op.quantity);
    entry.minutes += duration_minutes(op);
  }
  totals
}

pub fn overall_totals(operations: &[Operation]) -> OverallTotals {
  let quantity = operations.iter().map(|op| u64::from(op.quantity)).sum();
  let minutes: f64 = operations.iter().map(duration_minutes).sum();
  OverallTotals {
    quantity,
    hours: round1(minutes / 60.0),
  }
}

/// Quantity per hour for each project/machine combination, in first-seen
/// order.
pub fn production_rates(operations: &[Operation]) -> Vec<ProductionRate> {
  let mut rates: Vec<ProductionRate> = Vec::new();
  for op in operations {
    let project = op.project.as_deref().unwrap_or(NO_PROJECT_LABEL);
    let idx = match rates
      .iter()
      .position(|r| r.project == project && r.machine == op.machine)
    {
      Some(idx) => idx,
      None => {
        rates.push(ProductionRate {
          project: project.to_string(),
          machine: op.machine.clone(),
          hours: 0.0,
          quantity: 0,
        });
        rates.len() - 1
      }
    };
    let entry = &mut rates[idx];
    entry.hours += duration_minutes(op) / 60.0;
    entry.quantity += u64::from(op.quantity);
  }
  rates
}

/// Display name for an employee id; the raw id when the employee is gone.
pub fn employee_name<'a>(employees: &'a [Employee], id: &'a str) -> &'a str {
  employees
    .iter()
    .find(|e| e.id == id)
    .map(|e| e.name.as_str())
    .unwrap_or(id)
}

/// Display name for a machine id; the raw id when the machine is gone.
pub fn machine_name<'a>(machines: &'a [Machine], id: &'a str) -> &'a str {
  machines
    .iter()
    .find(|m| m.id == id)
    .map(|m| m.name.as_str())
    .unwrap_or(id)
}

/// "1h 0m" style duration, floored to whole minutes.
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
  let minutes = (end - start).num_minutes().max(0);
  format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Rows for the spreadsheet-export collaborator.
pub fn export_rows(data: &AppData) -> Vec<ExportRow> {
  data
    .operations
    .iter()
    .map(|op| ExportRow {
      employee: employee_name(&data.employees, &op.employee).to_string(),
      machine: machine_name(&data.machines, &op.machine).to_string(),
      project: op
        .project
        .clone()
        .unwrap_or_else(|| NO_PROJECT_LABEL.to_string()),
      start_time: op.start_time,
      end_time: op.end_time,
      duration: format_duration(op.start_time, op.end_time),
      quantity: op.quantity,
    })
    .collect()
}

fn duration_minutes(op: &Operation) -> f64 {
  (op.end_time - op.start_time).num_milliseconds() as f64 / 60_000.0
}

fn round1(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}
