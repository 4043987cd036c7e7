use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Answer, AnswerId, HomeId, QuestionId};
use super::group::SampleGroup;
use super::repository::MembershipLookup;
use super::sources::ChecklistSource;

/// Failing contributed answers grouped under one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub question_id: QuestionId,
    pub answers: Vec<AnswerId>,
    pub failure_count: usize,
    pub corrected_count: usize,
}

impl FailureSummary {
    pub fn is_corrected(&self) -> bool {
        self.corrected_count >= self.failure_count
    }
}

/// Read-only answer views. Answers are resolved through the checklist, never copied into
/// memberships.
pub struct AnswerViews<'a, C: ?Sized> {
    checklist: &'a C,
}

impl<'a, C> AnswerViews<'a, C>
where
    C: ChecklistSource + ?Sized,
{
    pub fn new(checklist: &'a C) -> Self {
        Self { checklist }
    }

    /// The home's own answers, available whatever its sampling role.
    pub fn source_answers(&self, home: &HomeId) -> Vec<Answer> {
        self.checklist.answers_for_home(home)
    }

    /// Answers the home currently contributes; empty unless it is a current test home.
    pub fn contributed_answers(&self, lookup: &MembershipLookup<'_>, home: &HomeId) -> Vec<Answer> {
        lookup
            .current_membership(home)
            .map(|membership| self.resolve(membership.contributed_answers.iter()))
            .unwrap_or_default()
    }

    pub fn failing_contributed_answers(
        &self,
        lookup: &MembershipLookup<'_>,
        home: &HomeId,
    ) -> Vec<Answer> {
        self.contributed_answers(lookup, home)
            .into_iter()
            .filter(|answer| answer.is_considered_failure)
            .collect()
    }

    /// Failing answers offered by the test home of `revision`, grouped per question.
    pub fn failure_summary(&self, group: &SampleGroup, revision: u32) -> Vec<FailureSummary> {
        let Some(test_home) = group.test_home_at(revision) else {
            return Vec::new();
        };

        let mut by_question: BTreeMap<QuestionId, FailureSummary> = BTreeMap::new();
        for answer in self
            .resolve(test_home.contributed_answers.iter())
            .into_iter()
            .filter(|answer| answer.is_considered_failure)
        {
            let entry = by_question
                .entry(answer.question_id)
                .or_insert_with(|| FailureSummary {
                    question_id: answer.question_id,
                    answers: Vec::new(),
                    failure_count: 0,
                    corrected_count: 0,
                });
            entry.answers.push(answer.id);
            entry.failure_count += 1;
            if answer.confirmed {
                entry.corrected_count += 1;
            }
        }
        by_question.into_values().collect()
    }

    fn resolve<'i>(&self, ids: impl Iterator<Item = &'i AnswerId>) -> Vec<Answer> {
        ids.filter_map(|id| self.checklist.answer(*id)).collect()
    }
}
