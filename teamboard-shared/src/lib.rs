//! # Teamboard Shared Library
//!
//! Domain core of the Teamboard project-collaboration backend, shared by the
//! API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: database models and the pagination contract
//! - `db`: connection pool and embedded migrations
//! - `store`: storage traits with PostgreSQL and in-memory backends
//! - `auth`: passwords, JWTs, bearer authentication and the Access Guard
//! - `ledger`: membership, project, task and identity operations
//! - `error`: the ledger error type

pub mod auth;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod store;

/// Current version of the Teamboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
