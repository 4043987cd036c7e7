use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use crate::workflows::sampling::domain::{
    Answer, AnswerId, CompanyId, HomeId, Question, QuestionId, SampleGroupId,
};
use crate::workflows::sampling::group::SampleGroup;
use crate::workflows::sampling::repository::{
    MemoryGroupRepository, RepositoryError, SampleGroupRepository,
};
use crate::workflows::sampling::service::SamplingService;
use crate::workflows::sampling::sources::{ChecklistSource, RatingSignal};

pub(super) fn home(id: &str) -> HomeId {
    HomeId(id.to_string())
}

pub(super) fn group_id(id: &str) -> SampleGroupId {
    SampleGroupId(id.to_string())
}

pub(super) fn sample_group(id: &str) -> SampleGroup {
    SampleGroup::new(
        group_id(id),
        CompanyId("provider-1".to_string()),
        format!("Riverbend {id}"),
        false,
    )
}

/// Group with test home `t1` and sampled homes `s1`, `s2` at revision 0.
pub(super) fn seeded_group(id: &str) -> SampleGroup {
    let mut group = sample_group(id);
    group
        .add_membership(home("t1"), true, 0)
        .expect("test home added");
    group
        .add_membership(home("s1"), false, 0)
        .expect("sampled home added");
    group
        .add_membership(home("s2"), false, 0)
        .expect("sampled home added");
    group
}

pub(super) fn answer_ids(ids: &[u64]) -> BTreeSet<AnswerId> {
    ids.iter().copied().map(AnswerId).collect()
}

/// Checklist with required questions 1..=3 and optional question 4.
///
/// Answers 101..=104 belong to `t1` and answer questions 1..=4; answer 105 is a failing answer
/// to question 2 entered against `t2`.
#[derive(Default)]
pub(super) struct MemoryChecklist {
    questions: Vec<Question>,
    answers: BTreeMap<AnswerId, (HomeId, Answer)>,
}

impl MemoryChecklist {
    pub(super) fn standard() -> Self {
        let mut checklist = Self {
            questions: (1..=4)
                .map(|id| Question {
                    id: QuestionId(id),
                    is_optional: id == 4,
                })
                .collect(),
            answers: BTreeMap::new(),
        };
        for question in 1..=4 {
            checklist.record(home("t1"), 100 + question, question, false, true);
        }
        checklist.record(home("t2"), 105, 2, true, false);
        checklist
    }

    pub(super) fn record(
        &mut self,
        owner: HomeId,
        answer: u64,
        question: u64,
        is_considered_failure: bool,
        confirmed: bool,
    ) {
        self.answers.insert(
            AnswerId(answer),
            (
                owner,
                Answer {
                    id: AnswerId(answer),
                    question_id: QuestionId(question),
                    is_considered_failure,
                    confirmed,
                },
            ),
        );
    }
}

impl ChecklistSource for MemoryChecklist {
    fn questions_for(&self, _group: &SampleGroup) -> Vec<Question> {
        self.questions.clone()
    }

    fn answer(&self, id: AnswerId) -> Option<Answer> {
        self.answers.get(&id).map(|(_, answer)| *answer)
    }

    fn answers_for_home(&self, home: &HomeId) -> Vec<Answer> {
        self.answers
            .values()
            .filter(|(owner, _)| owner == home)
            .map(|(_, answer)| *answer)
            .collect()
    }
}

#[derive(Default)]
pub(super) struct MemoryRatings {
    complete: Mutex<BTreeSet<HomeId>>,
}

impl MemoryRatings {
    pub(super) fn complete(&self, home: HomeId) {
        self.complete
            .lock()
            .expect("ratings mutex poisoned")
            .insert(home);
    }
}

impl RatingSignal for MemoryRatings {
    fn is_rating_complete(&self, home: &HomeId) -> bool {
        self.complete
            .lock()
            .expect("ratings mutex poisoned")
            .contains(home)
    }
}

pub(super) type TestService = SamplingService<MemoryGroupRepository, MemoryChecklist, MemoryRatings>;

pub(super) fn build_service() -> (TestService, Arc<MemoryGroupRepository>, Arc<MemoryRatings>) {
    let repository = Arc::new(MemoryGroupRepository::new());
    let checklist = Arc::new(MemoryChecklist::standard());
    let ratings = Arc::new(MemoryRatings::default());
    let service = SamplingService::new(repository.clone(), checklist, ratings.clone());
    (service, repository, ratings)
}

pub(super) struct UnavailableRepository;

impl SampleGroupRepository for UnavailableRepository {
    fn insert(&self, _group: SampleGroup) -> Result<SampleGroup, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _group: SampleGroup) -> Result<SampleGroup, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SampleGroupId) -> Result<Option<SampleGroup>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn groups_for_home(&self, _home: &HomeId) -> Result<Vec<SampleGroup>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
