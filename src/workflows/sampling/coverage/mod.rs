mod status;

pub use status::{Failure, Requirement, Status};

use std::collections::BTreeSet;

use tracing::warn;

use super::domain::{AnswerId, QuestionId};
use super::group::SampleGroup;
use super::sources::ChecklistSource;

/// Stateless evaluator resolving a revision's contributed answers against the program checklist.
pub struct CoverageEvaluator<'a, C: ?Sized> {
    checklist: &'a C,
}

impl<'a, C> CoverageEvaluator<'a, C>
where
    C: ChecklistSource + ?Sized,
{
    pub fn new(checklist: &'a C) -> Self {
        Self { checklist }
    }

    pub fn required_questions(&self, group: &SampleGroup) -> BTreeSet<QuestionId> {
        self.checklist
            .questions_for(group)
            .into_iter()
            .filter(|question| !question.is_optional)
            .map(|question| question.id)
            .collect()
    }

    /// Questions answered by the given answer references. Unknown answer ids are skipped.
    pub fn covered_questions<'i>(
        &self,
        answers: impl IntoIterator<Item = &'i AnswerId>,
    ) -> BTreeSet<QuestionId> {
        answers
            .into_iter()
            .filter_map(|id| {
                let answer = self.checklist.answer(*id);
                if answer.is_none() {
                    warn!(answer = id.0, "contributed answer no longer resolves");
                }
                answer
            })
            .map(|answer| answer.question_id)
            .collect()
    }

    pub fn find_uncovered_required_questions(
        &self,
        group: &SampleGroup,
        revision: u32,
    ) -> BTreeSet<QuestionId> {
        let required = self.required_questions(group);
        let covered = match group.test_home_at(revision) {
            Some(test_home) => self.covered_questions(&test_home.contributed_answers),
            None => BTreeSet::new(),
        };
        required.difference(&covered).copied().collect()
    }

    pub fn coverage_status(&self, group: &SampleGroup, revision: u32) -> Status {
        if group.test_home_at(revision).is_none() {
            return Status::failing(
                Requirement::MissingTestHome,
                None,
                "Sampled House does not have a Test Project in sample group",
            );
        }

        let uncovered = self.find_uncovered_required_questions(group, revision).len();
        match uncovered {
            0 => Status::Passing,
            1 => Status::failing(
                Requirement::UncoveredQuestions,
                Some(1),
                "1 unprovided question from its sample group",
            ),
            n => Status::failing(
                Requirement::UncoveredQuestions,
                Some(n),
                format!("{n} unprovided questions from its sample group"),
            ),
        }
    }

    /// Every answer contributed to the group at any revision, including retired test homes.
    pub fn historical_answers(&self, group: &SampleGroup) -> BTreeSet<AnswerId> {
        group
            .memberships()
            .iter()
            .flat_map(|membership| membership.contributed_answers.iter().copied())
            .collect()
    }

    /// Share of the program's questions answered by anything the group has ever received.
    pub fn completion_percentage(&self, group: &SampleGroup) -> f64 {
        let questions: BTreeSet<QuestionId> = self
            .checklist
            .questions_for(group)
            .into_iter()
            .map(|question| question.id)
            .collect();
        if questions.is_empty() {
            return 0.0;
        }

        let history = self.historical_answers(group);
        let answered = self.covered_questions(&history);
        let matched = questions.intersection(&answered).count();
        100.0 * matched as f64 / questions.len() as f64
    }
}
