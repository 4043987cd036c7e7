use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for sample groups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SampleGroupId(pub String);

/// Stable identifier of a rated home owned by the rated-home subsystem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HomeId(pub String);

/// Reference to the company that owns a sample group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnswerId(pub u64);

impl fmt::Display for SampleGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for HomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checklist question as published by the checklist subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub is_optional: bool,
}

/// Checklist answer record. Owned by the checklist subsystem; memberships only hold its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub is_considered_failure: bool,
    pub confirmed: bool,
}

impl Answer {
    /// A failing answer that has not been confirmed as corrected by a reviewer.
    pub fn is_uncorrected_failure(&self) -> bool {
        self.is_considered_failure && !self.confirmed
    }
}

/// How a rated home participates in certification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingType {
    /// Rated directly, never sampled.
    Confirmed,
    /// Provides answers to the sampled homes of its revision.
    SampledTestHouse,
    /// Inherits coverage from its revision's test home.
    SampledHouse,
}

impl RatingType {
    pub const fn label(self) -> &'static str {
        match self {
            RatingType::Confirmed => "Confirmed",
            RatingType::SampledTestHouse => "Sampled Test House",
            RatingType::SampledHouse => "Sampled House",
        }
    }
}

/// Binding of one rated home to one sample group at one revision, with a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub sample_group: SampleGroupId,
    pub rated_home: HomeId,
    pub revision: u32,
    pub is_active: bool,
    pub is_test_home: bool,
    pub contributed_answers: BTreeSet<AnswerId>,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub(crate) fn new(
        sample_group: SampleGroupId,
        rated_home: HomeId,
        revision: u32,
        is_test_home: bool,
    ) -> Self {
        Self {
            sample_group,
            rated_home,
            revision,
            is_active: true,
            is_test_home,
            contributed_answers: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn rating_type(&self) -> RatingType {
        if self.is_test_home {
            RatingType::SampledTestHouse
        } else {
            RatingType::SampledHouse
        }
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = if self.is_active { "ACTIVE " } else { "" };
        let role = if self.is_test_home { "Test" } else { "Sampled" };
        write!(
            f,
            "{active}{role} home {} [revision={}]",
            self.rated_home, self.revision
        )?;
        if self.is_test_home {
            write!(f, " ({} contributed answers)", self.contributed_answers.len())?;
        }
        Ok(())
    }
}
