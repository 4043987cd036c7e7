use serde::{Deserialize, Serialize};
use tracing::debug;

use super::coverage::{CoverageEvaluator, Requirement, Status};
use super::domain::{HomeId, RatingType};
use super::repository::MembershipLookup;
use super::sources::{ChecklistSource, RatingSignal};

/// Classify a home from the groups it belongs to.
///
/// A home with no membership anywhere is `Confirmed`. A home whose memberships are all retired
/// keeps the role of its most recent one; removal from a group never turns it back into a
/// direct rating. [`CertificationGate`] blocks such homes with
/// [`Requirement::InactiveMembership`] whichever role they held.
pub fn classify(lookup: &MembershipLookup<'_>, home: &HomeId) -> RatingType {
    match lookup
        .current_membership(home)
        .or_else(|| lookup.latest_membership(home))
    {
        Some(membership) => membership.rating_type(),
        None => RatingType::Confirmed,
    }
}

/// Decision handed to the certification workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationVerdict {
    pub home: HomeId,
    pub rating: RatingType,
    pub status: Status,
}

impl CertificationVerdict {
    pub fn is_eligible(&self) -> bool {
        self.status.is_passing()
    }
}

/// Single decision point answering "may this home certify now?".
pub struct CertificationGate<'a, C: ?Sized, S: ?Sized> {
    checklist: &'a C,
    ratings: &'a S,
}

impl<'a, C, S> CertificationGate<'a, C, S>
where
    C: ChecklistSource + ?Sized,
    S: RatingSignal + ?Sized,
{
    pub fn new(checklist: &'a C, ratings: &'a S) -> Self {
        Self { checklist, ratings }
    }

    pub fn can_certify(&self, lookup: &MembershipLookup<'_>, home: &HomeId) -> CertificationVerdict {
        let rating = classify(lookup, home);
        let status = match rating {
            RatingType::Confirmed => Status::Passing,
            RatingType::SampledTestHouse => self.test_house_status(lookup, home),
            RatingType::SampledHouse => self.sampled_house_status(lookup, home),
        };

        if let Some(failure) = status.failure() {
            debug!(%home, rating = rating.label(), reason = %failure.message, "certification blocked");
        }

        CertificationVerdict {
            home: home.clone(),
            rating,
            status,
        }
    }

    fn test_house_status(&self, lookup: &MembershipLookup<'_>, home: &HomeId) -> Status {
        if lookup.current_membership(home).is_none() {
            return Status::failing(
                Requirement::InactiveMembership,
                None,
                "Sampled Test House is not active in any sample group",
            );
        }
        if self.ratings.is_rating_complete(home) {
            Status::Passing
        } else {
            Status::failing(
                Requirement::RatingIncomplete,
                None,
                format!("Test Project {home} has not completed its rating"),
            )
        }
    }

    fn sampled_house_status(&self, lookup: &MembershipLookup<'_>, home: &HomeId) -> Status {
        let Some(membership) = lookup.current_membership(home) else {
            return Status::failing(
                Requirement::InactiveMembership,
                None,
                "Sampled House is not active in any sample group",
            );
        };
        let Some(group) = lookup.group(&membership.sample_group) else {
            return Status::failing(
                Requirement::InactiveMembership,
                None,
                format!("sample group {} is not loaded", membership.sample_group),
            );
        };

        let coverage = CoverageEvaluator::new(self.checklist).coverage_status(group, membership.revision);
        if !coverage.is_passing() {
            return coverage;
        }

        match group.test_home_at(membership.revision) {
            Some(test_home) if self.ratings.is_rating_complete(&test_home.rated_home) => {
                Status::Passing
            }
            Some(test_home) => Status::failing(
                Requirement::TestHomeIneligible,
                None,
                format!(
                    "Test Project {} has not completed its rating",
                    test_home.rated_home
                ),
            ),
            None => Status::failing(
                Requirement::MissingTestHome,
                None,
                "Sampled House does not have a Test Project in sample group",
            ),
        }
    }
}
