//! `SQLite` storage backends.
//!
//! The corpus and the selection store are independent backends, each with
//! its own connection. They usually share one database file; WAL mode lets
//! several processes read and write it at once.
//!
//! ## Module Structure
//!
//! - [`connection`]: lock acquisition and connection configuration
//! - [`metrics`]: per-operation counters and latency histograms
//! - `corpus`: [`SqliteCorpus`]
//! - `selection`: [`SqliteSelectionStore`]

pub mod connection;
mod corpus;
pub mod metrics;
mod selection;

pub use connection::{acquire_lock, configure_connection};
pub use corpus::SqliteCorpus;
pub use selection::SqliteSelectionStore;
