use serde::{Deserialize, Serialize};

/// Requirement a failing status is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Provide answers through sampling.
    UncoveredQuestions,
    /// Validate sampling requirements.
    MissingTestHome,
    /// The home's own rating is not complete.
    RatingIncomplete,
    /// The anchoring test home cannot certify yet.
    TestHomeIneligible,
    /// The sampled home no longer holds an active membership.
    InactiveMembership,
    /// Contributed answers contain failures nobody has corrected.
    UncorrectedFailures,
}

impl Requirement {
    pub const fn label(self) -> &'static str {
        match self {
            Requirement::UncoveredQuestions => "Provide answers through sampling",
            Requirement::MissingTestHome => "Validate sampling requirements",
            Requirement::RatingIncomplete => "Complete the home rating",
            Requirement::TestHomeIneligible => "Certify the test home",
            Requirement::InactiveMembership => "Sampling check",
            Requirement::UncorrectedFailures => "Correct failing test answers",
        }
    }
}

/// Detail attached to a failing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub requirement: Requirement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<usize>,
    pub message: String,
}

/// Outcome of a coverage or eligibility check.
///
/// A gap in coverage is an expected, transient condition and is reported as a value rather than
/// an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    Passing,
    Failing(Failure),
}

impl Status {
    pub fn failing(requirement: Requirement, data: Option<usize>, message: impl Into<String>) -> Self {
        Status::Failing(Failure {
            requirement,
            data,
            message: message.into(),
        })
    }

    pub fn is_passing(&self) -> bool {
        matches!(self, Status::Passing)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Status::Passing => None,
            Status::Failing(failure) => Some(failure),
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Status::Passing => "passing".to_string(),
            Status::Failing(failure) => {
                format!("{}: {}", failure.requirement.label(), failure.message)
            }
        }
    }
}
