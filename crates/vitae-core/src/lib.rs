//! Core types and canonical forms for the vitae profile store.
//!
//! This crate is deliberately free of database and file-system dependencies.
//! All other crates depend on it; it depends on nothing heavier than serde.

pub mod canon;
pub mod embedding;
pub mod profile;
