use super::{
    errors::{StateMachineError, StateMachineResult},
    events::SessionEvent,
    guards::{CurrentQuestionExistsGuard, FollowUpAvailableGuard, MainAnswerRecordedGuard, StateGuard},
    scoring::ScoringStrategy,
    states::{NextAction, SessionStage},
};
use crate::config::InterviewConfig;
use crate::models::{Answer, AnswerKind, AnswerScore, Question, Session};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything a scorer needs to judge one question's exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub position: String,
    pub question: Question,
    pub main_answer: String,
    pub follow_up_prompt: Option<String>,
    pub follow_up_answer: Option<String>,
}

impl ScoringRequest {
    /// Main answer and follow-up answer joined for scorers that read one text
    pub fn combined_answer(&self) -> String {
        match &self.follow_up_answer {
            Some(follow_up) => format!("{}\n\n{}", self.main_answer, follow_up),
            None => self.main_answer.clone(),
        }
    }
}

/// Outcome of [`SessionStateMachine::determine_transition`]
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionPlan {
    /// Record the main answer unscored and ask the follow-up
    FollowUp { prompt: String },
    /// Record the answer and move on. `scoring` is `None` for a skip.
    Advance { scoring: Option<ScoringRequest> },
}

impl TransitionPlan {
    pub fn scoring_request(&self) -> Option<&ScoringRequest> {
        match self {
            Self::Advance { scoring } => scoring.as_ref(),
            Self::FollowUp { .. } => None,
        }
    }
}

/// Pure transition logic for interview sessions.
///
/// A submission is handled in two steps so scoring can happen outside the
/// machine: [`determine_transition`](Self::determine_transition) inspects the
/// session and says whether a score is needed, then [`apply`](Self::apply)
/// records the answer and moves the session on.
#[derive(Debug, Clone, Default)]
pub struct SessionStateMachine {
    max_follow_ups: Option<usize>,
    scoring: ScoringStrategy,
}

impl SessionStateMachine {
    pub fn new(max_follow_ups: Option<usize>, scoring: ScoringStrategy) -> Self {
        Self {
            max_follow_ups,
            scoring,
        }
    }

    pub fn from_config(config: &InterviewConfig) -> Self {
        Self::new(
            config.session.max_follow_ups,
            ScoringStrategy::from(&config.scoring),
        )
    }

    pub fn scoring(&self) -> &ScoringStrategy {
        &self.scoring
    }

    /// Decide what `event` does to `session` without changing it
    pub fn determine_transition(
        &self,
        session: &Session,
        event: &SessionEvent,
    ) -> StateMachineResult<TransitionPlan> {
        if session.stage.is_terminal() {
            return Err(StateMachineError::InvalidTransition {
                from: session.stage,
                event: event.event_type().to_string(),
            });
        }

        CurrentQuestionExistsGuard.check(session)?;
        let question = session
            .current_question()
            .ok_or_else(|| StateMachineError::Internal("current question vanished".to_string()))?;

        let plan = match (session.stage, event) {
            (_, SessionEvent::Skip) => TransitionPlan::Advance { scoring: None },

            (SessionStage::Question, SessionEvent::SubmitAnswer(text)) => {
                let guard = FollowUpAvailableGuard {
                    max_follow_ups: self.max_follow_ups,
                };
                if guard.check(session)? {
                    TransitionPlan::FollowUp {
                        prompt: question.follow_up.clone(),
                    }
                } else {
                    TransitionPlan::Advance {
                        scoring: Some(ScoringRequest {
                            position: session.position.clone(),
                            question: question.clone(),
                            main_answer: text.clone(),
                            follow_up_prompt: None,
                            follow_up_answer: None,
                        }),
                    }
                }
            }

            (SessionStage::FollowUp, SessionEvent::SubmitAnswer(text)) => {
                MainAnswerRecordedGuard.check(session)?;
                let main_answer = session
                    .main_answer_for(question.id)
                    .map(|answer| answer.text.clone())
                    .unwrap_or_default();
                TransitionPlan::Advance {
                    scoring: Some(ScoringRequest {
                        position: session.position.clone(),
                        question: question.clone(),
                        main_answer,
                        follow_up_prompt: Some(question.follow_up.clone()),
                        follow_up_answer: Some(text.clone()),
                    }),
                }
            }

            (SessionStage::Completed, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: session.stage,
                    event: event.event_type().to_string(),
                })
            }
        };

        debug!(
            session_id = %session.id,
            stage = %session.stage,
            event = event.event_type(),
            follow_up = matches!(plan, TransitionPlan::FollowUp { .. }),
            "Determined session transition"
        );

        Ok(plan)
    }

    /// Record the answer for `event` and advance `session` per `plan`.
    ///
    /// `score` is required when the plan carries a scoring request.
    pub fn apply(
        &self,
        session: &mut Session,
        event: &SessionEvent,
        plan: &TransitionPlan,
        score: Option<AnswerScore>,
    ) -> StateMachineResult<NextAction> {
        if session.stage.is_terminal() {
            return Err(StateMachineError::InvalidTransition {
                from: session.stage,
                event: event.event_type().to_string(),
            });
        }
        CurrentQuestionExistsGuard.check(session)?;
        let question_id = session.questions[session.current_question_index].id;

        match plan {
            TransitionPlan::FollowUp { prompt } => {
                let text = event.answer_text().unwrap_or_default();
                session
                    .answers
                    .push(Answer::new(question_id, AnswerKind::Main, text, None));
                session.stage = SessionStage::FollowUp;
                session.follow_ups_asked += 1;
                Ok(NextAction::FollowUp {
                    prompt: prompt.clone(),
                })
            }
            TransitionPlan::Advance { scoring } => {
                let kind = match session.stage {
                    SessionStage::FollowUp => AnswerKind::FollowUp,
                    _ => AnswerKind::Main,
                };

                let answer = match (event, scoring) {
                    (SessionEvent::Skip, _) => Answer::skipped(question_id, kind),
                    (SessionEvent::SubmitAnswer(text), Some(_)) => {
                        let score = score.ok_or_else(|| StateMachineError::ScoreRequired {
                            event: event.event_type().to_string(),
                        })?;
                        Answer::new(question_id, kind, text.clone(), Some(score))
                    }
                    (SessionEvent::SubmitAnswer(_), None) => {
                        return Err(StateMachineError::Internal(
                            "answer submission planned without a scoring request".to_string(),
                        ))
                    }
                };
                session.answers.push(answer);
                Ok(self.advance(session))
            }
        }
    }

    /// Determine and apply in one call, scoring synchronously with `scorer`
    pub fn process<F>(
        &self,
        session: &mut Session,
        event: &SessionEvent,
        scorer: F,
    ) -> StateMachineResult<NextAction>
    where
        F: FnOnce(&ScoringRequest) -> AnswerScore,
    {
        let plan = self.determine_transition(session, event)?;
        let score = plan.scoring_request().map(scorer);
        self.apply(session, event, &plan, score)
    }

    fn advance(&self, session: &mut Session) -> NextAction {
        if !session.is_last_question() {
            session.current_question_index += 1;
            session.stage = SessionStage::Question;
            let question = session.questions[session.current_question_index].clone();
            return NextAction::NextQuestion { question };
        }

        session.stage = SessionStage::Completed;
        let evaluation = self.scoring.evaluate(session);
        session.overall_score = Some(evaluation.overall_score);
        session.final_evaluation = Some(evaluation.clone());
        session.completed_at = Some(Utc::now());

        info!(
            session_id = %session.id,
            overall_score = evaluation.overall_score,
            answered = evaluation.answered,
            skipped = evaluation.skipped,
            "🏁 Interview session completed"
        );

        NextAction::Completed { evaluation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SKIPPED_ANSWER;
    use crate::models::{QuestionCategory, QuestionDifficulty};

    fn questions(n: usize, follow_up: &str) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    format!("Question {i}"),
                    follow_up,
                    QuestionCategory::Behavioral,
                    QuestionDifficulty::Medium,
                    3,
                )
            })
            .collect()
    }

    fn fixed(score: f64) -> impl Fn(&ScoringRequest) -> AnswerScore {
        move |_| AnswerScore::uniform(score, "ok")
    }

    #[test]
    fn test_question_without_follow_up_advances() {
        let machine = SessionStateMachine::default();
        let mut session = Session::new("u", "Designer", questions(2, "")).unwrap();

        let action = machine
            .process(&mut session, &SessionEvent::SubmitAnswer("first".into()), fixed(8.0))
            .unwrap();

        assert_eq!(action.label(), "next-question");
        assert_eq!(session.current_question_index, 1);
        assert_eq!(session.stage, SessionStage::Question);
        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.answers[0].score.as_ref().unwrap().overall, 8.0);
    }

    #[test]
    fn test_follow_up_path_takes_two_submissions_per_question() {
        let machine = SessionStateMachine::default();
        let mut session = Session::new("u", "Designer", questions(3, "Why?")).unwrap();

        let mut submissions = 0;
        let mut scored_requests = Vec::new();
        while !session.is_completed() {
            machine
                .process(
                    &mut session,
                    &SessionEvent::SubmitAnswer(format!("answer {submissions}")),
                    |request| {
                        scored_requests.push(request.clone());
                        AnswerScore::uniform(6.0, "")
                    },
                )
                .unwrap();
            submissions += 1;
        }

        assert_eq!(submissions, 6);
        assert_eq!(session.answers.len(), 6);
        assert_eq!(session.follow_ups_asked, 3);
        assert_eq!(session.current_question_index, 2);
        assert_eq!(session.overall_score, Some(6.0));
        assert!(session.completed_at.is_some());

        assert_eq!(scored_requests.len(), 3);
        assert_eq!(scored_requests[0].main_answer, "answer 0");
        assert_eq!(scored_requests[0].follow_up_answer.as_deref(), Some("answer 1"));
        assert!(session.answers[0].score.is_none());
        assert_eq!(session.answers[1].kind, AnswerKind::FollowUp);
    }

    #[test]
    fn test_follow_up_budget_is_respected() {
        let machine = SessionStateMachine::new(Some(1), ScoringStrategy::SimpleAverage);
        let mut session = Session::new("u", "Designer", questions(3, "Why?")).unwrap();

        let mut submissions = 0;
        while !session.is_completed() {
            machine
                .process(&mut session, &SessionEvent::SubmitAnswer("a".into()), fixed(5.0))
                .unwrap();
            submissions += 1;
        }

        assert_eq!(session.follow_ups_asked, 1);
        assert_eq!(submissions, 4);
    }

    #[test]
    fn test_skip_bypasses_follow_up() {
        let machine = SessionStateMachine::default();
        let mut session = Session::new("u", "Designer", questions(2, "Why?")).unwrap();

        let action = machine
            .process(&mut session, &SessionEvent::Skip, |_| panic!("scorer must not run"))
            .unwrap();

        assert!(matches!(action, NextAction::NextQuestion { .. }));
        assert_eq!(session.answers[0].text, SKIPPED_ANSWER);
        assert_eq!(session.answers[0].score.as_ref().unwrap().overall, 0.0);
        assert_eq!(session.follow_ups_asked, 0);
    }

    #[test]
    fn test_skip_during_follow_up_records_skipped_follow_up() {
        let machine = SessionStateMachine::default();
        let mut session = Session::new("u", "Designer", questions(1, "Why?")).unwrap();

        machine
            .process(&mut session, &SessionEvent::SubmitAnswer("main".into()), fixed(9.0))
            .unwrap();
        let action = machine
            .process(&mut session, &SessionEvent::Skip, fixed(9.0))
            .unwrap();

        assert!(matches!(action, NextAction::Completed { .. }));
        assert_eq!(session.answers[1].kind, AnswerKind::FollowUp);
        assert!(session.answers[1].is_skipped());
        assert_eq!(session.overall_score, Some(0.0));
    }

    #[test]
    fn test_completed_session_rejects_submissions() {
        let machine = SessionStateMachine::default();
        let mut session = Session::new("u", "Designer", questions(1, "")).unwrap();
        machine
            .process(&mut session, &SessionEvent::SubmitAnswer("done".into()), fixed(7.0))
            .unwrap();
        assert_eq!(session.current_question_index, 0);

        let result = machine.process(&mut session, &SessionEvent::SubmitAnswer("again".into()), fixed(7.0));
        assert!(matches!(
            result,
            Err(StateMachineError::InvalidTransition {
                from: SessionStage::Completed,
                ..
            })
        ));
        assert_eq!(session.answers.len(), 1);
    }

    #[test]
    fn test_apply_without_score_is_rejected() {
        let machine = SessionStateMachine::default();
        let mut session = Session::new("u", "Designer", questions(1, "")).unwrap();
        let event = SessionEvent::SubmitAnswer("text".into());
        let plan = machine.determine_transition(&session, &event).unwrap();

        let result = machine.apply(&mut session, &event, &plan, None);
        assert!(matches!(result, Err(StateMachineError::ScoreRequired { .. })));
        assert!(session.answers.is_empty());
    }
}
