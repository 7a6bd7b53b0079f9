//! Credential store backends.
//!
//! - [`traits`] - the [`UserStore`](traits::UserStore) trait the services
//!   depend on, plus the [`StoreProvider`](traits::StoreProvider) selector
//! - [`sqlite`] - libsql-backed implementation (in-memory or file)

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{StoreProvider, UserStore};
