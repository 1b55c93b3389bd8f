//! HTTP clients for the sibling Jobs and Profile services.
//!
//! Both clients carry bounded timeouts and a bounded retry for transport
//! failures, and translate wire-level outcomes into the `ClientError`
//! taxonomy so raw transport errors never leak past the service boundary.

pub mod error;
pub mod jobs;
pub mod profile;
mod retry;

pub use error::{ClientError, ClientResult};
pub use jobs::{JobDetails, JobsClient, JobsClientConfig};
pub use profile::{ProfileClient, ProfileClientConfig};
