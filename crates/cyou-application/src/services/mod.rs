//! Domain services.

pub mod submission;

pub use submission::SubmissionService;
