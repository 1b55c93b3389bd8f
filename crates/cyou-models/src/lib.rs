//! Shared data models for the ConnectYou application service.
//!
//! This crate provides:
//! - Id newtypes for cross-service references
//! - The `Application` aggregate and its immutable snapshots
//! - The application status enum

pub mod application;
pub mod ids;
pub mod status;

pub use application::{Application, ApplicantSnapshot, JobSnapshot};
pub use ids::{ApplicationId, JobId, UserId};
pub use status::{ApplicationStatus, ParseStatusError};
