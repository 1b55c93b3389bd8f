//! Local-disk resume vault.
//!
//! This crate provides:
//! - Staging of uploaded resumes under a storage root
//! - Document-type allow-listing and the 5 MB size cap
//! - Delete-by-reference for saga compensation
//! - Canonical-path resolution with a traversal guard

pub mod error;
pub mod vault;

pub use error::{FileError, FileResult};
pub use vault::{ResumeVault, StagedResume, MAX_RESUME_BYTES};
