use super::errors::{GuardError, GuardResult};
use crate::models::Session;

/// Trait for implementing state transition guards
pub trait StateGuard<T> {
    /// Check if a transition is allowed
    fn check(&self, entity: &T) -> GuardResult<bool>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// The session's index must point at a question
pub struct CurrentQuestionExistsGuard;

impl StateGuard<Session> for CurrentQuestionExistsGuard {
    fn check(&self, session: &Session) -> GuardResult<bool> {
        if session.current_question().is_none() {
            return Err(GuardError::NoCurrentQuestion {
                index: session.current_question_index,
                total: session.questions.len(),
            });
        }
        Ok(true)
    }

    fn description(&self) -> &'static str {
        "Current question index must be within the question list"
    }
}

/// A follow-up may be asked when the current question has one and the
/// session's follow-up budget is not exhausted
pub struct FollowUpAvailableGuard {
    pub max_follow_ups: Option<usize>,
}

impl StateGuard<Session> for FollowUpAvailableGuard {
    fn check(&self, session: &Session) -> GuardResult<bool> {
        let has_follow_up = session
            .current_question()
            .is_some_and(|question| question.has_follow_up());
        let within_budget = self
            .max_follow_ups
            .map_or(true, |max| session.follow_ups_asked < max);
        Ok(has_follow_up && within_budget)
    }

    fn description(&self) -> &'static str {
        "Question must have a follow-up and the follow-up budget must not be exhausted"
    }
}

/// In follow-up stage the main answer must already be recorded
pub struct MainAnswerRecordedGuard;

impl StateGuard<Session> for MainAnswerRecordedGuard {
    fn check(&self, session: &Session) -> GuardResult<bool> {
        let question = session
            .current_question()
            .ok_or(GuardError::NoCurrentQuestion {
                index: session.current_question_index,
                total: session.questions.len(),
            })?;
        if session.main_answer_for(question.id).is_none() {
            return Err(GuardError::MissingMainAnswer {
                question_id: question.id.to_string(),
            });
        }
        Ok(true)
    }

    fn description(&self) -> &'static str {
        "Main answer must be recorded before the follow-up answer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionCategory, QuestionDifficulty};

    fn session_with_follow_up() -> Session {
        Session::new(
            "user_1",
            "Backend Engineer",
            vec![Question::new(
                "Describe a hard bug",
                "How would you prevent it?",
                QuestionCategory::Technical,
                QuestionDifficulty::Hard,
                5,
            )],
        )
        .unwrap()
    }

    #[test]
    fn test_follow_up_budget() {
        let mut session = session_with_follow_up();
        assert!(FollowUpAvailableGuard { max_follow_ups: None }.check(&session).unwrap());
        assert!(FollowUpAvailableGuard { max_follow_ups: Some(1) }.check(&session).unwrap());

        session.follow_ups_asked = 1;
        assert!(!FollowUpAvailableGuard { max_follow_ups: Some(1) }.check(&session).unwrap());
        assert!(!FollowUpAvailableGuard { max_follow_ups: Some(0) }.check(&session).unwrap());
    }

    #[test]
    fn test_out_of_range_index_fails_guard() {
        let mut session = session_with_follow_up();
        session.current_question_index = 3;
        assert!(matches!(
            CurrentQuestionExistsGuard.check(&session),
            Err(GuardError::NoCurrentQuestion { index: 3, total: 1 })
        ));
    }

    #[test]
    fn test_missing_main_answer() {
        let session = session_with_follow_up();
        assert!(matches!(
            MainAnswerRecordedGuard.check(&session),
            Err(GuardError::MissingMainAnswer { .. })
        ));
    }
}
