//! Network persistence of the aggregate dataset.
//!
//! The adapter retries with exponential backoff and degrades to the local
//! fallback cache instead of surfacing transport errors to the store.

mod api_types;
mod client;
mod transport;

pub use api_types::{ApiAppData, ApiOperation, ApiSaveResponse};
pub use client::RemoteStore;
pub use transport::{DataTransport, HttpTransport};

#[cfg(test)]
pub(crate) use transport::testing;
