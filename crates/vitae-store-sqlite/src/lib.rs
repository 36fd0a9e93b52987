//! SQLite backend for the vitae profile store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Besides row storage this
//! crate owns the two store-side halves of the system's core: the schema
//! migrator ([`migrate`]) and the portable-snapshot exporter ([`snapshot`]).

mod encode;
mod schema;
mod store;

pub mod error;
pub mod migrate;
pub mod snapshot;

pub use error::{Error, Result};
pub use store::{PROFILE_TABLES, SqliteStore};
