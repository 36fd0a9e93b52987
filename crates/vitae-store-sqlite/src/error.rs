//! Error type for `vitae-store-sqlite`.

use thiserror::Error;

/// Store-operation failures carry the native SQLite detail (error code and
/// message) through [`tokio_rusqlite::Error`]; nothing is retried here.
#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
