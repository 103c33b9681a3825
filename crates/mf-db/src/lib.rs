//! mf-db: database access and persistence layer.
//!
//! SQLite-backed storage with connection pooling, embedded migrations,
//! typed models, and query modules for jobs and conversion attempts. The
//! store is the single source of truth for job and attempt state; every
//! write is a single-row, single-statement update.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
