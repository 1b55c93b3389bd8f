//! Application status enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of an application.
///
/// No transition graph is enforced: recruiters may move an application to
/// any status at any time. Transitions are logged for audit at the API
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ApplicationStatus {
    /// Submitted, not yet looked at
    #[default]
    Applied,
    /// Recruiter has reviewed the application
    Reviewed,
    /// An interview has been scheduled
    InterviewScheduled,
    /// Interview took place
    Interviewed,
    /// An offer was extended to the applicant
    OfferExtended,
    /// Applicant accepted the offer
    Accepted,
    /// Application was rejected
    Rejected,
    /// Applicant withdrew the application
    Withdrawn,
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Error)]
#[error("invalid application status: {0}")]
pub struct ParseStatusError(pub String);

impl ApplicationStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Reviewed,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Interviewed,
        ApplicationStatus::OfferExtended,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Reviewed => "Reviewed",
            ApplicationStatus::InterviewScheduled => "InterviewScheduled",
            ApplicationStatus::Interviewed => "Interviewed",
            ApplicationStatus::OfferExtended => "OfferExtended",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Withdrawn => "Withdrawn",
        }
    }

    /// Check if this is a terminal state (no further recruiter action expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Applied" => Ok(ApplicationStatus::Applied),
            "Reviewed" => Ok(ApplicationStatus::Reviewed),
            "InterviewScheduled" => Ok(ApplicationStatus::InterviewScheduled),
            "Interviewed" => Ok(ApplicationStatus::Interviewed),
            "OfferExtended" => Ok(ApplicationStatus::OfferExtended),
            "Accepted" => Ok(ApplicationStatus::Accepted),
            "Rejected" => Ok(ApplicationStatus::Rejected),
            "Withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("Shortlisted".parse::<ApplicationStatus>().is_err());
        assert!("applied".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_default_is_applied() {
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::Applied);
        assert!(!ApplicationStatus::Applied.is_terminal());
        assert!(ApplicationStatus::Withdrawn.is_terminal());
    }
}
