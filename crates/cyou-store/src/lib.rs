//! PostgreSQL application store.
//!
//! This crate provides:
//! - Pooled Postgres connection handling with embedded migrations
//! - The `Application` repository
//! - Enforcement of the one-application-per-applicant-per-job invariant
//!   through a unique index, surfaced as `StoreError::Duplicate`

pub mod application_repo;
pub mod db;
pub mod error;

pub use application_repo::{ApplicationRepo, JobListingFilter, Page};
pub use db::{Database, DatabaseConfig};
pub use error::{StoreError, StoreResult};
