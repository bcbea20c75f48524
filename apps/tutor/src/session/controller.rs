//! Drives a `SessionState` by performing the effects it requests.

use chrono::{Local, Utc};
use std::sync::{Arc, Mutex};
use vocab_core::error::TransitionError;
use vocab_core::session::{AiFailure, Effect, SessionEvent, SessionState};

use super::persist::persist_review;
use crate::ai::{EvaluationRequest, GradingOracle, QuizOracle, QuizRequest};
use crate::db::{DbError, ProfileRepository, ProgressRepository, Transactional};

/// Runs one study session against storage `S` and AI oracle `A`.
///
/// Collaborator failures never escape `dispatch`; they become session events
/// (fatal load errors, degraded AI steps). The storage lock is only held for
/// synchronous calls, never across an await.
pub struct SessionController<S, A> {
    state: SessionState,
    store: Arc<Mutex<S>>,
    oracle: A,
    default_language: String,
}

impl<S, A> SessionController<S, A>
where
    S: ProgressRepository + ProfileRepository + Transactional,
    A: QuizOracle + GradingOracle,
{
    pub fn new(
        store: Arc<Mutex<S>>,
        oracle: A,
        batch_size: usize,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            state: SessionState::new(batch_size),
            store,
            oracle,
            default_language: default_language.into(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply a user event and run every effect that follows from it.
    ///
    /// Returns once the session waits for the user again. An event the
    /// current mode does not accept is reported and otherwise has no effect.
    pub async fn dispatch(&mut self, event: SessionEvent) -> Result<(), TransitionError> {
        let mut next = self.apply(event)?;

        while let Some(effect) = next {
            let outcome = self.perform(effect).await;
            next = match self.apply(outcome) {
                Ok(effect) => effect,
                Err(err) => {
                    tracing::warn!(error = %err, "effect outcome rejected");
                    None
                }
            };
        }

        Ok(())
    }

    fn apply(&mut self, event: SessionEvent) -> Result<Option<Effect>, TransitionError> {
        let name = event.name();
        let from = self.state.mode().name();

        match self.state.handle(event) {
            Ok(effect) => {
                tracing::debug!(event = name, from, to = self.state.mode().name(), "session transition");
                Ok(effect)
            }
            Err(err) => {
                tracing::debug!(error = %err, "session event ignored");
                Err(err)
            }
        }
    }

    async fn perform(&self, effect: Effect) -> SessionEvent {
        match effect {
            Effect::LoadDueItems { limit } => {
                match self.with_store(|store| store.get_due_items(limit, Utc::now())) {
                    Ok(items) => {
                        tracing::info!(count = items.len(), "loaded due items");
                        SessionEvent::ItemsLoaded(items)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to load due items");
                        SessionEvent::LoadFailed(
                            "Could not load your due words. Please try again.".to_string(),
                        )
                    }
                }
            }

            Effect::GenerateQuiz {
                item,
                preferred_quiz_type,
            } => {
                let request = QuizRequest::for_item(&item, &self.language(), preferred_quiz_type);
                match self.oracle.generate_quiz(&request).await {
                    Ok(quiz) => SessionEvent::QuizReady(quiz),
                    Err(e) if e.is_configuration() => {
                        tracing::error!(error = %e, "AI quiz generation is not configured");
                        SessionEvent::QuizFailed(AiFailure::NotConfigured(
                            "AI sessions need an API key. Check your AI settings.".to_string(),
                        ))
                    }
                    Err(e) => {
                        tracing::warn!(term_id = item.id, error = %e, "quiz generation failed");
                        SessionEvent::QuizFailed(AiFailure::Unavailable(e.to_string()))
                    }
                }
            }

            Effect::EvaluateAnswer { item, quiz, answer } => {
                let request =
                    EvaluationRequest::for_answer(&item, &quiz, &answer, &self.language());
                match self.oracle.evaluate(&request).await {
                    Ok(evaluation) => SessionEvent::AnswerEvaluated(evaluation),
                    Err(e) => {
                        tracing::warn!(term_id = item.id, error = %e, "AI grading failed");
                        SessionEvent::EvaluationFailed
                    }
                }
            }

            Effect::PersistReview {
                term_id,
                grade,
                policy,
            } => {
                let language = self.language();
                let now = Local::now();
                match self.with_store(|store| {
                    persist_review(store, term_id, grade, policy, &now, &language)
                }) {
                    Ok(saved) => {
                        tracing::info!(
                            term_id,
                            grade = grade.value(),
                            xp = saved.xp,
                            interval = saved.schedule.interval,
                            "review saved"
                        );
                        SessionEvent::ReviewSaved {
                            grade,
                            xp: saved.xp,
                        }
                    }
                    Err(e) => {
                        tracing::error!(term_id, error = %e, "failed to save review");
                        SessionEvent::SaveFailed(
                            "Could not save your review. Please try again.".to_string(),
                        )
                    }
                }
            }
        }
    }

    /// Profile language, or the configured default before a profile exists.
    fn language(&self) -> String {
        self.with_store(|store| store.get_profile())
            .ok()
            .flatten()
            .map(|profile| profile.language)
            .unwrap_or_else(|| self.default_language.clone())
    }

    fn with_store<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&S) -> Result<T, DbError>,
    {
        let store = self
            .store
            .lock()
            .map_err(|_| DbError::InvalidData("storage lock poisoned".to_string()))?;
        f(&store)
    }
}
