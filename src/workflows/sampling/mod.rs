//! Sample-group membership, coverage, revision advances, and the certification gate.
//!
//! Test homes contribute answer references to their revision; sampled homes riding on that
//! revision are covered once every required question has a contributed answer.

pub mod advance;
pub mod answers;
pub mod coverage;
pub mod domain;
pub mod gate;
pub mod group;
pub mod repository;
pub mod service;
pub mod sources;

#[cfg(test)]
mod tests;

pub use advance::{
    AdvanceError, AdvanceOutcome, AnswerDistribution, ConfigurationError, PartitionPlan,
    PartitionPolicy, RevisionAdvancer,
};
pub use answers::{AnswerViews, FailureSummary};
pub use coverage::{CoverageEvaluator, Failure, Requirement, Status};
pub use domain::{
    Answer, AnswerId, CompanyId, HomeId, Membership, Question, QuestionId, RatingType,
    SampleGroupId,
};
pub use gate::{classify, CertificationGate, CertificationVerdict};
pub use group::{ConsistencyViolation, SampleGroup};
pub use repository::{
    MembershipLookup, MemoryGroupRepository, RepositoryError, SampleGroupRepository,
};
pub use service::{SamplingService, SamplingServiceError};
pub use sources::{ChecklistSource, RatingSignal};
