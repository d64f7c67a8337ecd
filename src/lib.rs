//! Data core for a small-shop production logging application.
//!
//! The hosting UI constructs an [`AppStore`] once at its root and hands it
//! down to consumers. Mutations apply to the in-memory collections
//! immediately and are persisted to the remote endpoint after a quiet
//! period; the last known-good dataset is cached locally so the app keeps
//! working when the network does not.
//!
//! ```ignore
//! let config = Config::load(None)?;
//! let (mut store, mut notices) = AppStore::from_config(&config)?;
//! store.load().await;
//!
//! store.add_operation(NewOperation { /* from the form */ });
//! while let Some(notice) = notices.recv().await {
//!     show_toast(notice.level(), notice.to_string());
//! }
//! ```

pub mod cache;
pub mod config;
pub mod import;
pub mod model;
pub mod notify;
pub mod remote;
pub mod report;
pub mod scheduler;
pub mod store;

pub use config::Config;
pub use model::{AppData, Employee, Machine, MachineIcon, Operation, Project};
pub use notify::{Notice, NoticeLevel};
pub use store::{AppStore, NewOperation, StoreState};
