//! Persisted configuration.
//!
//! Configuration that operators change at runtime (credentials, the repo to
//! deploy, the branch → deploy target map) lives in a [`SettingsStore`] rather
//! than in process configuration, so it can be updated over RPC without a
//! restart.

pub mod keys;
pub mod store;

pub use keys::{get_string, require_string, set_string};
pub use store::{FileSettingsStore, MemorySettingsStore, SettingsError, SettingsStore};
