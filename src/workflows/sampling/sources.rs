use super::domain::{Answer, AnswerId, HomeId, Question};
use super::group::SampleGroup;

/// Read-only view of the checklist subsystem.
pub trait ChecklistSource: Send + Sync {
    /// Questions of the program governing the group, optional ones included.
    fn questions_for(&self, group: &SampleGroup) -> Vec<Question>;
    fn answer(&self, id: AnswerId) -> Option<Answer>;
    /// Answers entered directly against the home, regardless of its sampling role.
    fn answers_for_home(&self, home: &HomeId) -> Vec<Answer>;
}

/// Rating-completeness signal owned by the rated-home subsystem.
pub trait RatingSignal: Send + Sync {
    fn is_rating_complete(&self, home: &HomeId) -> bool;
}
