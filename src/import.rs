//! Project import boundary.
//!
//! The spreadsheet reader hands over rows as plain column->value maps; this
//! module locates the project name column and produces the name list for
//! [`crate::store::AppStore::import_projects`]. Malformed input is rejected
//! here, before any store state changes.

use std::collections::HashMap;

use thiserror::Error;

/// Column spellings accepted for the project name, checked in order.
const NAME_COLUMNS: [&str; 4] = ["nazwa", "Nazwa", "name", "Name"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
  #[error("the sheet contains no rows")]
  EmptySheet,
  #[error("no project name column found (expected nazwa, Nazwa, name or Name)")]
  MissingNameColumn,
  #[error("no usable project names in the sheet")]
  NoProjects,
}

/// Extract trimmed project names from parsed sheet rows.
///
/// Every row must carry a non-empty value under one of the accepted column
/// spellings; names that are blank after trimming are dropped. Any failure
/// yields no names at all.
pub fn extract_project_names(
  rows: &[HashMap<String, String>],
) -> Result<Vec<String>, ImportError> {
  if rows.is_empty() {
    return Err(ImportError::EmptySheet);
  }

  let mut names = Vec::new();
  for row in rows {
    let value = NAME_COLUMNS
      .iter()
      .find_map(|col| row.get(*col).filter(|v| !v.is_empty()))
      .ok_or(ImportError::MissingNameColumn)?;

    let name = value.trim();
    if !name.is_empty() {
      names.push(name.to_string());
    }
  }

  if names.is_empty() {
    return Err(ImportError::NoProjects);
  }

  Ok(names)
}
