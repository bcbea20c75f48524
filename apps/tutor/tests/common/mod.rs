//! Shared fixtures for session integration tests.
//!
//! - `FakeOracle`: scripted quiz and grading oracle with call counters
//! - `FlakyStore`: SQLite store that can be told to fail loads or profile saves
//! - helpers to seed terms

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vocab_core::types::{
    Evaluation, Grade, LearningItem, Profile, Progress, Quiz, QuizType,
};
use vocab_tutor::ai::{AiError, EvaluationRequest, GradingOracle, QuizOracle, QuizRequest};
use vocab_tutor::db::{
    DbError, NewTerm, ProfileRepository, ProgressRepository, SqliteRepository, TermRepository,
    Transactional,
};
use vocab_tutor::session::SessionController;

#[derive(Debug, Clone, Copy)]
pub enum QuizBehavior {
    Succeed,
    Unavailable,
    NotConfigured,
}

#[derive(Debug, Clone, Copy)]
pub enum GradingBehavior {
    Grade(u8),
    Fail,
}

/// Oracle returning canned answers.
#[derive(Clone)]
pub struct FakeOracle {
    pub quiz: QuizBehavior,
    pub grading: GradingBehavior,
    pub quiz_calls: Arc<AtomicUsize>,
    pub grading_calls: Arc<AtomicUsize>,
}

impl FakeOracle {
    pub fn new(quiz: QuizBehavior, grading: GradingBehavior) -> Self {
        Self {
            quiz,
            grading,
            quiz_calls: Arc::new(AtomicUsize::new(0)),
            grading_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl QuizOracle for FakeOracle {
    async fn generate_quiz(&self, request: &QuizRequest) -> Result<Quiz, AiError> {
        self.quiz_calls.fetch_add(1, Ordering::SeqCst);
        match self.quiz {
            QuizBehavior::Succeed => Ok(Quiz {
                question: format!("Use \"{}\" in a sentence.", request.term),
                quiz_type: request.preferred_quiz_type.unwrap_or(QuizType::OpenEnded),
                options: None,
            }),
            QuizBehavior::Unavailable => Err(AiError::Network("connection reset".to_string())),
            QuizBehavior::NotConfigured => {
                Err(AiError::NotConfigured("no API key".to_string()))
            }
        }
    }
}

#[async_trait]
impl GradingOracle for FakeOracle {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation, AiError> {
        self.grading_calls.fetch_add(1, Ordering::SeqCst);
        match self.grading {
            GradingBehavior::Grade(grade) => Ok(Evaluation {
                grade: Grade::clamped(grade as i64),
                feedback: format!("You answered: {}", request.answer),
                ideal_answer: request.definition.clone(),
            }),
            GradingBehavior::Fail => Err(AiError::Backend {
                status: 503,
                message: "overloaded".to_string(),
            }),
        }
    }
}

/// SQLite store with switchable failures.
pub struct FlakyStore {
    pub inner: SqliteRepository,
    pub fail_loads: AtomicBool,
    pub fail_profile_save: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: SqliteRepository) -> Self {
        Self {
            inner,
            fail_loads: AtomicBool::new(false),
            fail_profile_save: AtomicBool::new(false),
        }
    }
}

impl ProgressRepository for FlakyStore {
    fn get_due_items(
        &self,
        limit: usize,
        now: chrono::DateTime<Utc>,
    ) -> Result<Vec<LearningItem>, DbError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(DbError::InvalidData("simulated load failure".to_string()));
        }
        self.inner.get_due_items(limit, now)
    }

    fn count_due(&self, now: chrono::DateTime<Utc>) -> Result<usize, DbError> {
        self.inner.count_due(now)
    }

    fn get_progress(&self, term_id: i64) -> Result<Option<Progress>, DbError> {
        self.inner.get_progress(term_id)
    }

    fn put_progress(&self, term_id: i64, progress: &Progress) -> Result<(), DbError> {
        self.inner.put_progress(term_id, progress)
    }
}

impl ProfileRepository for FlakyStore {
    fn get_profile(&self) -> Result<Option<Profile>, DbError> {
        self.inner.get_profile()
    }

    fn save_profile(&self, profile: &Profile) -> Result<(), DbError> {
        if self.fail_profile_save.load(Ordering::SeqCst) {
            return Err(DbError::InvalidData("simulated write failure".to_string()));
        }
        self.inner.save_profile(profile)
    }
}

impl Transactional for FlakyStore {
    fn atomically<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.inner.atomically(|_| f(self))
    }
}

/// Add `count` terms, all due, the first one due earliest.
pub fn seed_terms(repo: &SqliteRepository, count: usize) -> Vec<i64> {
    let now = Utc::now();
    (0..count)
        .map(|i| {
            repo.add_term(
                &NewTerm {
                    content: format!("term-{i}"),
                    definition: format!("definition {i}"),
                    context: Some(format!("example {i}")),
                },
                now - Duration::minutes((count - i) as i64),
            )
            .expect("seed term")
            .id
        })
        .collect()
}

/// Make a term due again without touching its history.
pub fn make_due(repo: &SqliteRepository, term_id: i64) {
    let mut progress = repo
        .get_progress(term_id)
        .expect("read progress")
        .expect("progress exists");
    progress.next_review_at = Utc::now() - Duration::minutes(1);
    repo.put_progress(term_id, &progress).expect("write progress");
}

pub fn grade(value: u8) -> Grade {
    Grade::new(value).expect("valid grade")
}

pub type TestController = SessionController<SqliteRepository, FakeOracle>;

/// Controller over an in-memory database seeded with `count` due terms.
pub fn controller_with_terms(
    count: usize,
    oracle: FakeOracle,
) -> (TestController, Arc<Mutex<SqliteRepository>>, Vec<i64>) {
    let repo = SqliteRepository::open_in_memory().expect("open database");
    let ids = seed_terms(&repo, count);
    let store = Arc::new(Mutex::new(repo));
    let controller = SessionController::new(store.clone(), oracle, 20, "English");
    (controller, store, ids)
}
