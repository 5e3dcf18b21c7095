//! History store implementations for Unit agents.
//!
//! The [`HistoryStore`](unit_core::HistoryStore) contract is small — append
//! one record per completed iteration, load a chronological log — and the
//! medium is an implementation choice:
//!
//! - [`RemoteStore`] persists through the platform's interaction resource
//!   (the default in production).
//! - [`FileStore`] keeps one JSON document per agent on local disk.
//! - [`MemoryStore`] backs tests and ephemeral runs.

mod file;
mod memory;
mod remote;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;
