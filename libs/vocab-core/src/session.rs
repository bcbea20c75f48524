//! Study session state machine.
//!
//! `SessionState::handle` is a reducer: it takes one event, updates the state
//! and returns the side effect the driver has to perform next, if any. The
//! outcome of that effect comes back as another event. Nothing here does I/O.
//!
//! ```text
//! selection -> loading -> question -> evaluating -> feedback -> loading | finished
//!                 \            \           \
//!                  +-----------+-----------+--> error -> loading (retry)
//! ```

use std::collections::VecDeque;

use crate::error::TransitionError;
use crate::grading::GradeOptions;
use crate::types::{Evaluation, Grade, LearningItem, Quiz, QuizType, SessionType};
use crate::xp::XpPolicy;

/// Default number of due items fetched for one session.
pub const DEFAULT_BATCH_SIZE: usize = 20;

pub const GRADING_UNAVAILABLE: &str = "AI grading unavailable, please rate manually.";
pub const QUIZ_UNAVAILABLE: &str = "AI quiz unavailable, showing the flashcard instead.";

/// What the evaluating state is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatingStage {
    /// The grading oracle is scoring the answer.
    Grading,
    /// The review is being written to storage.
    Saving,
}

/// Which feedback view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// Answer revealed, the learner still has to pick a grade.
    ManualGrade,
    /// Review saved; shows grade and XP.
    Graded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Selection,
    Loading,
    Question,
    Evaluating(EvaluatingStage),
    Feedback(FeedbackKind),
    Finished,
    Error(String),
}

impl SessionMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Selection => "selection",
            Self::Loading => "loading",
            Self::Question => "question",
            Self::Evaluating(_) => "evaluating",
            Self::Feedback(_) => "feedback",
            Self::Finished => "finished",
            Self::Error(_) => "error",
        }
    }
}

/// Why quiz generation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiFailure {
    /// Credentials or endpoint missing; the learner has to fix configuration.
    NotConfigured(String),
    /// Transient failure; the item falls back to a flashcard.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Start {
        session_type: SessionType,
        preferred_quiz_type: Option<QuizType>,
    },
    ItemsLoaded(Vec<LearningItem>),
    LoadFailed(String),
    QuizReady(Quiz),
    QuizFailed(AiFailure),
    SubmitAnswer(String),
    SelectGrade(Grade),
    AnswerEvaluated(Evaluation),
    EvaluationFailed,
    ReviewSaved { grade: Grade, xp: i64 },
    SaveFailed(String),
    Continue,
    Retry,
    ChangeMode,
    Restart,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::ItemsLoaded(_) => "items_loaded",
            Self::LoadFailed(_) => "load_failed",
            Self::QuizReady(_) => "quiz_ready",
            Self::QuizFailed(_) => "quiz_failed",
            Self::SubmitAnswer(_) => "submit_answer",
            Self::SelectGrade(_) => "select_grade",
            Self::AnswerEvaluated(_) => "answer_evaluated",
            Self::EvaluationFailed => "evaluation_failed",
            Self::ReviewSaved { .. } => "review_saved",
            Self::SaveFailed(_) => "save_failed",
            Self::Continue => "continue",
            Self::Retry => "retry",
            Self::ChangeMode => "change_mode",
            Self::Restart => "restart",
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadDueItems {
        limit: usize,
    },
    GenerateQuiz {
        item: LearningItem,
        preferred_quiz_type: Option<QuizType>,
    },
    EvaluateAnswer {
        item: LearningItem,
        quiz: Quiz,
        answer: String,
    },
    PersistReview {
        term_id: i64,
        grade: Grade,
        policy: XpPolicy,
    },
}

/// State of one study session. Not persisted.
#[derive(Debug, Clone)]
pub struct SessionState {
    mode: SessionMode,
    session_type: SessionType,
    preferred_quiz_type: Option<QuizType>,
    batch_size: usize,
    queue: VecDeque<LearningItem>,
    current_item: Option<LearningItem>,
    pending_quiz: Option<Quiz>,
    answer: Option<String>,
    evaluation: Option<Evaluation>,
    note: Option<String>,
    last_grade: Option<Grade>,
    last_xp_awarded: Option<i64>,
    reviewed: usize,
    xp_earned: i64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl SessionState {
    pub fn new(batch_size: usize) -> Self {
        Self {
            mode: SessionMode::Selection,
            session_type: SessionType::default(),
            preferred_quiz_type: None,
            batch_size,
            queue: VecDeque::new(),
            current_item: None,
            pending_quiz: None,
            answer: None,
            evaluation: None,
            note: None,
            last_grade: None,
            last_xp_awarded: None,
            reviewed: 0,
            xp_earned: 0,
        }
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn preferred_quiz_type(&self) -> Option<QuizType> {
        self.preferred_quiz_type
    }

    pub fn current_item(&self) -> Option<&LearningItem> {
        self.current_item.as_ref()
    }

    pub fn pending_quiz(&self) -> Option<&Quiz> {
        self.pending_quiz.as_ref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    /// Short message about a degraded step, if any.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn last_grade(&self) -> Option<Grade> {
        self.last_grade
    }

    pub fn last_xp_awarded(&self) -> Option<i64> {
        self.last_xp_awarded
    }

    /// Items still waiting behind the current one.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Reviews saved in this session.
    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    pub fn xp_earned(&self) -> i64 {
        self.xp_earned
    }

    /// Grade buttons for the manual rating view.
    pub fn manual_grade_options(&self) -> GradeOptions {
        GradeOptions::manual()
    }

    /// Apply one event.
    ///
    /// Returns the effect to run next. An event the current mode does not
    /// accept yields `TransitionError::Ignored` and changes nothing.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Option<Effect>, TransitionError> {
        let ignored = TransitionError::Ignored {
            event: event.name(),
            mode: self.mode.name(),
        };

        match (&self.mode, event) {
            (
                SessionMode::Selection,
                SessionEvent::Start {
                    session_type,
                    preferred_quiz_type,
                },
            ) => {
                self.reset();
                self.session_type = session_type;
                self.preferred_quiz_type = preferred_quiz_type;
                Ok(Some(self.begin_loading()))
            }

            (SessionMode::Loading, SessionEvent::ItemsLoaded(mut items))
                if self.current_item.is_none() =>
            {
                items.sort_by_key(|item| item.progress.next_review_at);
                self.queue = items.into();
                Ok(self.advance())
            }

            (SessionMode::Loading, SessionEvent::LoadFailed(message))
                if self.current_item.is_none() =>
            {
                self.mode = SessionMode::Error(message);
                Ok(None)
            }

            (SessionMode::Loading, SessionEvent::QuizReady(quiz)) if self.current_item.is_some() => {
                self.pending_quiz = Some(quiz);
                self.mode = SessionMode::Question;
                Ok(None)
            }

            (SessionMode::Loading, SessionEvent::QuizFailed(failure))
                if self.current_item.is_some() =>
            {
                match failure {
                    AiFailure::NotConfigured(message) => {
                        self.mode = SessionMode::Error(message);
                    }
                    AiFailure::Unavailable(_) => {
                        self.note = Some(QUIZ_UNAVAILABLE.to_string());
                        self.mode = SessionMode::Question;
                    }
                }
                Ok(None)
            }

            (SessionMode::Question, SessionEvent::SubmitAnswer(answer)) => {
                self.answer = Some(answer.clone());
                match (&self.pending_quiz, &self.current_item) {
                    (Some(quiz), Some(item)) => {
                        let effect = Effect::EvaluateAnswer {
                            item: item.clone(),
                            quiz: quiz.clone(),
                            answer,
                        };
                        self.mode = SessionMode::Evaluating(EvaluatingStage::Grading);
                        Ok(Some(effect))
                    }
                    _ => {
                        self.mode = SessionMode::Feedback(FeedbackKind::ManualGrade);
                        Ok(None)
                    }
                }
            }

            (
                SessionMode::Question | SessionMode::Feedback(FeedbackKind::ManualGrade),
                SessionEvent::SelectGrade(grade),
            ) => match self.persist(grade) {
                Some(effect) => Ok(Some(effect)),
                None => Err(ignored),
            },

            (
                SessionMode::Evaluating(EvaluatingStage::Grading),
                SessionEvent::AnswerEvaluated(evaluation),
            ) => {
                match self.persist(evaluation.grade) {
                    Some(effect) => {
                        self.evaluation = Some(evaluation);
                        Ok(Some(effect))
                    }
                    None => Err(ignored),
                }
            }

            (SessionMode::Evaluating(EvaluatingStage::Grading), SessionEvent::EvaluationFailed) => {
                self.note = Some(GRADING_UNAVAILABLE.to_string());
                self.mode = SessionMode::Feedback(FeedbackKind::ManualGrade);
                Ok(None)
            }

            (
                SessionMode::Evaluating(EvaluatingStage::Saving),
                SessionEvent::ReviewSaved { grade, xp },
            ) => {
                self.last_grade = Some(grade);
                self.last_xp_awarded = Some(xp);
                self.reviewed += 1;
                self.xp_earned += xp;
                self.mode = SessionMode::Feedback(FeedbackKind::Graded);
                Ok(None)
            }

            (SessionMode::Evaluating(EvaluatingStage::Saving), SessionEvent::SaveFailed(message)) => {
                self.mode = SessionMode::Error(message);
                Ok(None)
            }

            (SessionMode::Feedback(FeedbackKind::Graded), SessionEvent::Continue) => {
                Ok(self.advance())
            }

            (SessionMode::Error(_), SessionEvent::Retry) => {
                self.queue.clear();
                self.clear_item();
                self.current_item = None;
                Ok(Some(self.begin_loading()))
            }

            (mode, SessionEvent::ChangeMode) if *mode != SessionMode::Selection => {
                self.reset();
                Ok(None)
            }

            (SessionMode::Finished, SessionEvent::Restart) => {
                self.reset();
                Ok(None)
            }

            _ => Err(ignored),
        }
    }

    fn begin_loading(&mut self) -> Effect {
        self.mode = SessionMode::Loading;
        Effect::LoadDueItems {
            limit: self.batch_size,
        }
    }

    /// Move to the next queued item, or finish when the queue is empty.
    fn advance(&mut self) -> Option<Effect> {
        self.clear_item();
        self.current_item = self.queue.pop_front();

        let item = match &self.current_item {
            Some(item) => item,
            None => {
                self.mode = SessionMode::Finished;
                return None;
            }
        };

        match self.session_type {
            SessionType::Ai => {
                self.mode = SessionMode::Loading;
                Some(Effect::GenerateQuiz {
                    item: item.clone(),
                    preferred_quiz_type: self.preferred_quiz_type,
                })
            }
            SessionType::Standard => {
                self.mode = SessionMode::Question;
                None
            }
        }
    }

    /// Quiz answers earn mentor XP; flashcards, including degraded quiz items,
    /// earn review XP.
    fn persist(&mut self, grade: Grade) -> Option<Effect> {
        let term_id = self.current_item.as_ref()?.id;
        let policy = match self.pending_quiz {
            Some(_) => XpPolicy::Mentor,
            None => XpPolicy::Review,
        };
        self.mode = SessionMode::Evaluating(EvaluatingStage::Saving);
        Some(Effect::PersistReview {
            term_id,
            grade,
            policy,
        })
    }

    fn clear_item(&mut self) {
        self.pending_quiz = None;
        self.answer = None;
        self.evaluation = None;
        self.note = None;
        self.last_grade = None;
        self.last_xp_awarded = None;
    }

    fn reset(&mut self) {
        *self = Self::new(self.batch_size);
    }
}
