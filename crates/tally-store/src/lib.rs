//! # tally-store
//!
//! Local-first task persistence for Tally: the task repository, the
//! key-value store implementations behind it, and the remote seed client.

pub mod kv;
pub mod remote;
pub mod repository;

pub use kv::{MemoryStore, SqliteStore};
pub use remote::RemoteApi;
pub use repository::Repository;
