//! Persistence substrate for the City Guide response cache.
//!
//! Entries live in a single SQLite table so a restarted process can serve
//! answers computed before the restart.

pub mod cache_store;
pub mod migration;

pub use cache_store::SqliteCacheStore;
